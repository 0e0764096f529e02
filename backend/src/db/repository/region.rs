//! Region repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Region, RegionId};

/// Repository trait for regions, the root of the hierarchy.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait RegionRepository: Send + Sync {
    /// Check if the storage is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if storage is healthy
    /// - `Ok(false)` if unhealthy but no error occurred
    /// - `Err(RepositoryError)` if the check itself failed
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// All regions ordered by id.
    async fn list_regions(&self) -> RepositoryResult<Vec<Region>>;

    /// Look up a region. An unknown id yields `Ok(None)`.
    async fn get_region(&self, id: RegionId) -> RepositoryResult<Option<Region>>;

    /// Store a new region; the supplied id is ignored.
    ///
    /// # Returns
    /// * `Ok(Region)` - The stored region with its assigned id
    async fn add_region(&self, region: &Region) -> RepositoryResult<Region>;

    /// Overwrite the name of an existing region.
    ///
    /// # Returns
    /// * `Ok(true)` - The region was updated
    /// * `Ok(false)` - No region with this id exists (nothing changed)
    async fn update_region(&self, region: &Region) -> RepositoryResult<bool>;

    /// Delete a region.
    ///
    /// # Returns
    /// * `Ok(true)` - The region was removed
    /// * `Ok(false)` - No region with this id exists
    /// * `Err(RepositoryError::HasDependents)` - Districts still reference it
    async fn delete_region(&self, id: RegionId) -> RepositoryResult<bool>;
}
