//! Institution repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Institution, InstitutionId};
use crate::services::filtering::InstitutionFilter;

/// Repository trait for institutions.
///
/// Every institution returned carries its district, and through it the
/// region (`Institution::district.region`).
#[async_trait]
pub trait InstitutionRepository: Send + Sync {
    /// All institutions ordered by id, fully hydrated.
    async fn list_institutions(&self) -> RepositoryResult<Vec<Institution>>;

    /// Look up an institution. An unknown id yields `Ok(None)`.
    async fn get_institution(&self, id: InstitutionId) -> RepositoryResult<Option<Institution>>;

    /// Store a new institution.
    ///
    /// # Returns
    /// * `Ok(Institution)` - The stored, hydrated institution with its assigned id
    /// * `Err(RepositoryError::ValidationError)` - `district_id` does not exist
    async fn add_institution(&self, institution: &Institution) -> RepositoryResult<Institution>;

    /// Overwrite every mutable field of an existing institution.
    ///
    /// A concurrent-modification conflict is retried once on a fresh
    /// connection before being reported.
    ///
    /// # Returns
    /// * `Ok(true)` - The institution was updated
    /// * `Ok(false)` - No institution with this id exists (nothing changed)
    /// * `Err(RepositoryError::ValidationError)` - `district_id` does not exist
    /// * `Err(RepositoryError::ConflictError)` - The retry also hit a conflict
    async fn update_institution(&self, institution: &Institution) -> RepositoryResult<bool>;

    /// Delete an institution. Returns `Ok(false)` when the id is unknown.
    async fn delete_institution(&self, id: InstitutionId) -> RepositoryResult<bool>;

    /// Institutions matching every criterion of `filter`, ordered by id.
    async fn search_institutions(
        &self,
        filter: &InstitutionFilter,
    ) -> RepositoryResult<Vec<Institution>>;
}
