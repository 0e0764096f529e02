//! Repository trait definitions for the administrative hierarchy.
//!
//! Each level of the hierarchy gets its own focused trait so that
//! implementations and tests can target one entity at a time.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`region`]: CRUD for regions, plus the health check
//! - [`district`]: CRUD for districts
//! - [`institution`]: CRUD and search for institutions
//!
//! # Integrity rules
//!
//! Implementations guarantee the hierarchy invariants themselves rather than
//! leaving them to callers:
//! - adding or updating a district requires its region to exist
//! - adding or updating an institution requires its district to exist
//! - a region with districts, or a district with institutions, cannot be deleted
//!   ([`RepositoryError::HasDependents`])
//!
//! Update and delete of an unknown id are no-ops reported as `Ok(false)`.
//!
//! # Convenience Trait Bound
//!
//! ```ignore
//! async fn rename<R: FullRepository + ?Sized>(repo: &R, id: RegionId) -> RepositoryResult<()> {
//!     if let Some(mut region) = repo.get_region(id).await? {
//!         region.name.push_str(" (upd)");
//!         repo.update_region(&region).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod district;
pub mod error;
pub mod institution;
pub mod region;

// Re-export error types
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

// Re-export all traits
pub use district::DistrictRepository;
pub use institution::InstitutionRepository;
pub use region::RegionRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements all three
/// entity traits.
pub trait FullRepository: RegionRepository + DistrictRepository + InstitutionRepository {}

// Blanket implementation: any type implementing all three traits automatically implements FullRepository
impl<T> FullRepository for T where T: RegionRepository + DistrictRepository + InstitutionRepository {}
