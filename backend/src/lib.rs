//! # Education Institutions Registry
//!
//! Registry of educational institutions organised in a three-level hierarchy
//! (Region → District → Institution) with aggregate reporting.
//!
//! ## Features
//!
//! - **Storage**: Embedded SQLite via Diesel, or an in-memory repository
//! - **Integrity**: Parent references validated on write; deletion blocked while
//!   dependents exist
//! - **Schema upgrades**: Idempotent additive column migration for older database files
//! - **Filtering**: AND-composed institution search by name, region, district, type and status
//! - **Reports**: By region, by district, by type, statistics, infrastructure and financial
//!
//! ## Architecture
//!
//! - [`models`]: Region, District and Institution with strongly-typed ids
//! - [`db`]: Repository traits, SQLite and local implementations, factory and service layer
//! - [`services`]: Filter engine, aggregation engine, report session and overview
//!
//! ## Example
//!
//! ```no_run
//! use edu_registry::db::{services, LocalRepository};
//! use edu_registry::services::{ReportKind, ReportScope, ReportSession};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = LocalRepository::new();
//! services::seed_sample_data(&repo).await?;
//!
//! let mut session = ReportSession::load(&repo).await?;
//! let report = session.set_kind(ReportKind::Financial);
//! for row in &report.rows {
//!     println!("{}: {}", row.category, row.value_display());
//! }
//! # let _ = ReportScope::Country;
//! # Ok(())
//! # }
//! ```

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod db;
pub mod models;
pub mod services;
