//! High-level database service layer.
//!
//! Repository-agnostic operations that work with any implementation of the
//! repository traits. Business logic that must behave the same regardless of
//! the storage backend (snapshot loading, sample data seeding, registry
//! counts) lives here rather than in the backends.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (edu-report CLI, ReportSession)       │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs) - Business Logic           │
//! │  - Snapshot loading for reports                          │
//! │  - Sample data seeding                                   │
//! │  - Registry counts                                       │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface    │
//! │  - RegionRepository                                      │
//! │  - DistrictRepository                                    │
//! │  - InstitutionRepository                                 │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴────────────────┐
//!     │                                 │
//! ┌───▼──────────────┐     ┌──────────▼──────────────┐
//! │ Sqlite Repository│     │ Local Repository        │
//! │ (Diesel)         │     │ (in-memory)             │
//! └──────────────────┘     └─────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use edu_registry::db::{services, repositories::LocalRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = LocalRepository::new();
//!     services::seed_sample_data(&repo).await?;
//!
//!     let regions = services::list_regions(&repo).await?;
//!     println!("Found {} regions", regions.len());
//!     Ok(())
//! }
//! ```

use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};
use crate::models::{
    District, DistrictId, Institution, InstitutionId, Region, RegionId, DEFAULT_STATUS,
};
use crate::services::filtering::InstitutionFilter;
use crate::services::reports::ReportSnapshot;

// ==================== Health & Info ====================

/// Check if the storage backend is reachable.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

/// Row counts of the three registry tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub regions: usize,
    pub districts: usize,
    pub institutions: usize,
}

/// Count regions, districts and institutions.
pub async fn database_info<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<DatabaseInfo> {
    let info = DatabaseInfo {
        regions: repo.list_regions().await?.len(),
        districts: repo.list_districts().await?.len(),
        institutions: repo.list_institutions().await?.len(),
    };
    debug!(
        "Database info: {} regions, {} districts, {} institutions",
        info.regions, info.districts, info.institutions
    );
    Ok(info)
}

// ==================== Snapshot ====================

/// Fetch regions, districts and hydrated institutions once for reporting.
pub async fn load_snapshot<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<ReportSnapshot> {
    let regions = repo.list_regions().await?;
    let districts = repo.list_districts().await?;
    let institutions = repo.list_institutions().await?;

    info!(
        "Loaded report snapshot: {} regions, {} districts, {} institutions",
        regions.len(),
        districts.len(),
        institutions.len()
    );

    Ok(ReportSnapshot::new(regions, districts, institutions))
}

// ==================== Seeding ====================

/// Insert the sample registry when no regions exist yet.
///
/// Returns `Ok(true)` when data was inserted, `Ok(false)` when the store
/// already had regions and was left untouched.
pub async fn seed_sample_data<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    if !repo.list_regions().await?.is_empty() {
        debug!("Registry already has regions, skipping sample data");
        return Ok(false);
    }

    info!("Seeding sample registry data");

    let minsk = repo.add_region(&Region::new("Минская область")).await?;
    let grodno = repo.add_region(&Region::new("Гродненская область")).await?;
    let brest = repo.add_region(&Region::new("Брестская область")).await?;

    let minsk_district = repo
        .add_district(&District::new("Минский район", minsk.id))
        .await?;
    let grodno_district = repo
        .add_district(&District::new("Гродненский район", grodno.id))
        .await?;
    repo.add_district(&District::new("Брестский район", brest.id))
        .await?;

    let mut gymnasium = Institution::new("Гимназия №1 г. Минска", "Гимназия", minsk_district.id);
    gymnasium.address = "г. Минск, ул. Примерная, 1".to_string();
    gymnasium.contacts = "+375-17-123-45-67".to_string();
    gymnasium.status = DEFAULT_STATUS.to_string();
    gymnasium.registration_date = sample_date(2020, 1, 15)?;
    gymnasium.student_count = 850;
    gymnasium.admitted_count = 120;
    gymnasium.expelled_count = 15;
    gymnasium.staff_count = 65;
    gymnasium.teacher_count = 45;
    gymnasium.administrative_staff_count = 20;
    gymnasium.classroom_count = 30;
    gymnasium.computer_count = 50;
    gymnasium.has_sports_hall = true;
    gymnasium.has_dining_room = true;
    gymnasium.has_library = true;
    gymnasium.total_area = 2500.5;
    gymnasium.license_number = "12345-Л".to_string();
    gymnasium.director_name = "Иванова Мария Петровна".to_string();
    gymnasium.email = "gym1@edu.by".to_string();
    gymnasium.website = "https://gym1.edu.by".to_string();
    gymnasium.foundation_year = 1990;
    gymnasium.accreditation_category = "I категория".to_string();
    repo.add_institution(&gymnasium).await?;

    let mut school = Institution::new("Средняя школа №2 г. Гродно", "Школа", grodno_district.id);
    school.address = "г. Гродно, ул. Школьная, 10".to_string();
    school.contacts = "+375-152-345-678".to_string();
    school.status = DEFAULT_STATUS.to_string();
    school.registration_date = sample_date(2018, 9, 1)?;
    school.student_count = 620;
    school.admitted_count = 85;
    school.expelled_count = 8;
    school.staff_count = 45;
    school.teacher_count = 38;
    school.administrative_staff_count = 7;
    school.classroom_count = 25;
    school.computer_count = 35;
    school.has_sports_hall = true;
    school.has_dining_room = false;
    school.has_library = true;
    school.total_area = 1800.0;
    school.license_number = "67890-Л".to_string();
    school.director_name = "Петров Алексей Иванович".to_string();
    school.email = "school2@grodno.by".to_string();
    school.website = "https://school2.edu.by".to_string();
    school.foundation_year = 1985;
    school.accreditation_category = "II категория".to_string();
    repo.add_institution(&school).await?;

    info!("Sample data seeded: 3 regions, 3 districts, 2 institutions");
    Ok(true)
}

fn sample_date(year: i32, month: u32, day: u32) -> RepositoryResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| RepositoryError::internal(format!("Invalid sample date {}-{}-{}", year, month, day)))
}

// ==================== Region Operations ====================

pub async fn list_regions<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<Region>> {
    repo.list_regions().await
}

pub async fn get_region<R: FullRepository + ?Sized>(
    repo: &R,
    id: RegionId,
) -> RepositoryResult<Option<Region>> {
    repo.get_region(id).await
}

/// Like [`get_region`], but absence is a [`RepositoryError::NotFound`].
pub async fn require_region<R: FullRepository + ?Sized>(repo: &R, id: RegionId) -> RepositoryResult<Region> {
    repo.get_region(id)
        .await?
        .ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Region {} not found", id),
                ErrorContext::new("require_region")
                    .with_entity("region")
                    .with_entity_id(id),
            )
        })
}

pub async fn add_region<R: FullRepository + ?Sized>(repo: &R, region: &Region) -> RepositoryResult<Region> {
    repo.add_region(region).await
}

pub async fn update_region<R: FullRepository + ?Sized>(repo: &R, region: &Region) -> RepositoryResult<bool> {
    repo.update_region(region).await
}

pub async fn delete_region<R: FullRepository + ?Sized>(repo: &R, id: RegionId) -> RepositoryResult<bool> {
    repo.delete_region(id).await
}

// ==================== District Operations ====================

pub async fn list_districts<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<District>> {
    repo.list_districts().await
}

pub async fn list_districts_by_region<R: FullRepository + ?Sized>(
    repo: &R,
    region_id: RegionId,
) -> RepositoryResult<Vec<District>> {
    repo.list_districts_by_region(region_id).await
}

pub async fn get_district<R: FullRepository + ?Sized>(
    repo: &R,
    id: DistrictId,
) -> RepositoryResult<Option<District>> {
    repo.get_district(id).await
}

pub async fn add_district<R: FullRepository + ?Sized>(
    repo: &R,
    district: &District,
) -> RepositoryResult<District> {
    repo.add_district(district).await
}

pub async fn update_district<R: FullRepository + ?Sized>(
    repo: &R,
    district: &District,
) -> RepositoryResult<bool> {
    repo.update_district(district).await
}

pub async fn delete_district<R: FullRepository + ?Sized>(repo: &R, id: DistrictId) -> RepositoryResult<bool> {
    repo.delete_district(id).await
}

// ==================== Institution Operations ====================

pub async fn list_institutions<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<Institution>> {
    repo.list_institutions().await
}

pub async fn get_institution<R: FullRepository + ?Sized>(
    repo: &R,
    id: InstitutionId,
) -> RepositoryResult<Option<Institution>> {
    repo.get_institution(id).await
}

pub async fn add_institution<R: FullRepository + ?Sized>(
    repo: &R,
    institution: &Institution,
) -> RepositoryResult<Institution> {
    repo.add_institution(institution).await
}

pub async fn update_institution<R: FullRepository + ?Sized>(
    repo: &R,
    institution: &Institution,
) -> RepositoryResult<bool> {
    repo.update_institution(institution).await
}

pub async fn delete_institution<R: FullRepository + ?Sized>(
    repo: &R,
    id: InstitutionId,
) -> RepositoryResult<bool> {
    repo.delete_institution(id).await
}

/// Institutions matching `filter`, hydrated and ordered by id.
pub async fn search_institutions<R: FullRepository + ?Sized>(
    repo: &R,
    filter: &InstitutionFilter,
) -> RepositoryResult<Vec<Institution>> {
    repo.search_institutions(filter).await
}
