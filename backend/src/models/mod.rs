//! Domain models for the administrative hierarchy.
//!
//! - [`Region`]: root of the hierarchy
//! - [`District`]: belongs to a region
//! - [`Institution`]: belongs to a district
//!
//! Children carry their parent id plus an optional hydrated copy of the
//! parent. The copy is a snapshot taken at read time, never a live reference.

pub mod hierarchy;
pub mod institution;
pub mod macros;

pub use hierarchy::*;
pub use institution::*;
