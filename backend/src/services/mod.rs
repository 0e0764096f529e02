//! Service layer for filtering, reporting and the dashboard overview.
//!
//! Everything here is storage-agnostic: reports and the overview are pure
//! functions over a [`ReportSnapshot`], which callers obtain once through
//! [`crate::db::services::load_snapshot`].

pub mod catalog;
pub mod filtering;
pub mod overview;
pub mod reports;
pub mod session;

pub use catalog::{institution_types, status_types};
pub use filtering::InstitutionFilter;
pub use overview::{overview, Overview};
pub use reports::{
    generate_report, Report, ReportKind, ReportRow, ReportScope, ReportSnapshot, ReportTotals,
};
pub use session::ReportSession;
