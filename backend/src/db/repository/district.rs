//! District repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{District, DistrictId, RegionId};

/// Repository trait for districts.
///
/// Every district returned carries its parent region in `District::region`.
#[async_trait]
pub trait DistrictRepository: Send + Sync {
    /// All districts ordered by id, hydrated with their region.
    async fn list_districts(&self) -> RepositoryResult<Vec<District>>;

    /// Districts of one region ordered by id.
    async fn list_districts_by_region(&self, region_id: RegionId)
        -> RepositoryResult<Vec<District>>;

    /// Look up a district. An unknown id yields `Ok(None)`.
    async fn get_district(&self, id: DistrictId) -> RepositoryResult<Option<District>>;

    /// Store a new district.
    ///
    /// # Returns
    /// * `Ok(District)` - The stored district with its assigned id
    /// * `Err(RepositoryError::ValidationError)` - `region_id` does not exist
    async fn add_district(&self, district: &District) -> RepositoryResult<District>;

    /// Overwrite name and region of an existing district.
    ///
    /// # Returns
    /// * `Ok(true)` - The district was updated
    /// * `Ok(false)` - No district with this id exists (nothing changed)
    /// * `Err(RepositoryError::ValidationError)` - `region_id` does not exist
    async fn update_district(&self, district: &District) -> RepositoryResult<bool>;

    /// Delete a district.
    ///
    /// # Returns
    /// * `Ok(true)` - The district was removed
    /// * `Ok(false)` - No district with this id exists
    /// * `Err(RepositoryError::HasDependents)` - Institutions still reference it
    async fn delete_district(&self, id: DistrictId) -> RepositoryResult<bool>;
}
