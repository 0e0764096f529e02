//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data is stored in
//! memory using `BTreeMap`s keyed by id, so listings come out in id order
//! without extra sorting. The hierarchy invariants are enforced exactly as
//! in the SQLite backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::db::repository::*;
use crate::models::{District, DistrictId, Institution, InstitutionId, Region, RegionId};
use crate::services::filtering::InstitutionFilter;

/// In-memory local repository.
///
/// Clones share the same underlying data.
///
/// # Example
/// ```
/// use edu_registry::db::repositories::LocalRepository;
/// use edu_registry::db::repository::RegionRepository;
/// use edu_registry::models::Region;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let repo = LocalRepository::new();
/// let region = repo.add_region(&Region::new("Минская область")).await.unwrap();
/// assert!(region.id.is_assigned());
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    regions: BTreeMap<RegionId, Region>,
    districts: BTreeMap<DistrictId, District>,
    institutions: BTreeMap<InstitutionId, Institution>,

    // ID counters
    next_region_id: i32,
    next_district_id: i32,
    next_institution_id: i32,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            regions: BTreeMap::new(),
            districts: BTreeMap::new(),
            institutions: BTreeMap::new(),
            next_region_id: 1,
            next_district_id: 1,
            next_institution_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn hydrate_district(&self, district: &District) -> District {
        let mut district = district.clone();
        district.region = self.regions.get(&district.region_id).cloned();
        district
    }

    fn hydrate_institution(&self, institution: &Institution) -> Institution {
        let mut institution = institution.clone();
        institution.district = self
            .districts
            .get(&institution.district_id)
            .map(|d| self.hydrate_district(d));
        institution
    }

    fn require_region(&self, region_id: RegionId, operation: &str) -> RepositoryResult<()> {
        if self.regions.contains_key(&region_id) {
            Ok(())
        } else {
            Err(RepositoryError::validation_with_context(
                format!("Region {} does not exist", region_id),
                ErrorContext::new(operation)
                    .with_entity("region")
                    .with_entity_id(region_id),
            ))
        }
    }

    fn require_district(&self, district_id: DistrictId, operation: &str) -> RepositoryResult<()> {
        if self.districts.contains_key(&district_id) {
            Ok(())
        } else {
            Err(RepositoryError::validation_with_context(
                format!("District {} does not exist", district_id),
                ErrorContext::new(operation)
                    .with_entity("district")
                    .with_entity_id(district_id),
            ))
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository, keeping the health flag.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    pub fn region_count(&self) -> usize {
        self.data.read().regions.len()
    }

    pub fn district_count(&self) -> usize {
        self.data.read().districts.len()
    }

    pub fn institution_count(&self) -> usize {
        self.data.read().institutions.len()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegionRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn list_regions(&self) -> RepositoryResult<Vec<Region>> {
        self.check_health()?;
        Ok(self.data.read().regions.values().cloned().collect())
    }

    async fn get_region(&self, id: RegionId) -> RepositoryResult<Option<Region>> {
        self.check_health()?;
        Ok(self.data.read().regions.get(&id).cloned())
    }

    async fn add_region(&self, region: &Region) -> RepositoryResult<Region> {
        self.check_health()?;
        let mut data = self.data.write();
        let id = RegionId(data.next_region_id);
        data.next_region_id += 1;

        let stored = Region {
            id,
            name: region.name.clone(),
        };
        data.regions.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_region(&self, region: &Region) -> RepositoryResult<bool> {
        self.check_health()?;
        let mut data = self.data.write();
        match data.regions.get_mut(&region.id) {
            Some(existing) => {
                existing.name = region.name.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_region(&self, id: RegionId) -> RepositoryResult<bool> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.regions.contains_key(&id) {
            return Ok(false);
        }

        let dependents = data.districts.values().filter(|d| d.region_id == id).count();
        if dependents > 0 {
            return Err(RepositoryError::has_dependents(
                format!("Region {} still has districts", id),
                dependents,
                ErrorContext::new("delete_region")
                    .with_entity("region")
                    .with_entity_id(id),
            ));
        }

        data.regions.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl DistrictRepository for LocalRepository {
    async fn list_districts(&self) -> RepositoryResult<Vec<District>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(data
            .districts
            .values()
            .map(|d| data.hydrate_district(d))
            .collect())
    }

    async fn list_districts_by_region(&self, region_id: RegionId) -> RepositoryResult<Vec<District>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(data
            .districts
            .values()
            .filter(|d| d.region_id == region_id)
            .map(|d| data.hydrate_district(d))
            .collect())
    }

    async fn get_district(&self, id: DistrictId) -> RepositoryResult<Option<District>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(data.districts.get(&id).map(|d| data.hydrate_district(d)))
    }

    async fn add_district(&self, district: &District) -> RepositoryResult<District> {
        self.check_health()?;
        let mut data = self.data.write();
        data.require_region(district.region_id, "add_district")?;

        let id = DistrictId(data.next_district_id);
        data.next_district_id += 1;

        let stored = District {
            id,
            name: district.name.clone(),
            region_id: district.region_id,
            region: None,
        };
        data.districts.insert(id, stored.clone());
        Ok(data.hydrate_district(&stored))
    }

    async fn update_district(&self, district: &District) -> RepositoryResult<bool> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.districts.contains_key(&district.id) {
            return Ok(false);
        }
        data.require_region(district.region_id, "update_district")?;

        if let Some(existing) = data.districts.get_mut(&district.id) {
            existing.name = district.name.clone();
            existing.region_id = district.region_id;
        }
        Ok(true)
    }

    async fn delete_district(&self, id: DistrictId) -> RepositoryResult<bool> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.districts.contains_key(&id) {
            return Ok(false);
        }

        let dependents = data
            .institutions
            .values()
            .filter(|i| i.district_id == id)
            .count();
        if dependents > 0 {
            return Err(RepositoryError::has_dependents(
                format!("District {} still has institutions", id),
                dependents,
                ErrorContext::new("delete_district")
                    .with_entity("district")
                    .with_entity_id(id),
            ));
        }

        data.districts.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl InstitutionRepository for LocalRepository {
    async fn list_institutions(&self) -> RepositoryResult<Vec<Institution>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(data
            .institutions
            .values()
            .map(|i| data.hydrate_institution(i))
            .collect())
    }

    async fn get_institution(&self, id: InstitutionId) -> RepositoryResult<Option<Institution>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(data.institutions.get(&id).map(|i| data.hydrate_institution(i)))
    }

    async fn add_institution(&self, institution: &Institution) -> RepositoryResult<Institution> {
        self.check_health()?;
        let mut data = self.data.write();
        data.require_district(institution.district_id, "add_institution")?;

        let id = InstitutionId(data.next_institution_id);
        data.next_institution_id += 1;

        let mut stored = institution.clone();
        stored.id = id;
        stored.district = None;
        data.institutions.insert(id, stored.clone());
        Ok(data.hydrate_institution(&stored))
    }

    async fn update_institution(&self, institution: &Institution) -> RepositoryResult<bool> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.institutions.contains_key(&institution.id) {
            return Ok(false);
        }
        data.require_district(institution.district_id, "update_institution")?;

        let mut stored = institution.clone();
        stored.district = None;
        data.institutions.insert(institution.id, stored);
        Ok(true)
    }

    async fn delete_institution(&self, id: InstitutionId) -> RepositoryResult<bool> {
        self.check_health()?;
        Ok(self.data.write().institutions.remove(&id).is_some())
    }

    async fn search_institutions(
        &self,
        filter: &InstitutionFilter,
    ) -> RepositoryResult<Vec<Institution>> {
        self.check_health()?;
        let data = self.data.read();
        let hydrated: Vec<Institution> = data
            .institutions
            .values()
            .map(|i| data.hydrate_institution(i))
            .collect();
        Ok(filter.apply(&hydrated))
    }
}
