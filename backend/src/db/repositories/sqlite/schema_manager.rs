//! Schema creation and additive column migration.
//!
//! Startup runs two steps on every repository construction:
//!
//! 1. [`ensure_schema`] creates the three registry tables. The embedded Diesel
//!    migrations are tried first; if they cannot be applied, a raw
//!    `CREATE TABLE IF NOT EXISTS` batch is executed instead.
//! 2. [`migrate_additive_columns`] adds any extended `Institutions` column that
//!    an older database file lacks. Columns are added one at a time, and a
//!    failure on one column is logged and does not stop the others.

use chrono::{Datelike, Local};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Text;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};

pub const MIGRATIONS: EmbeddedMigrations =
    embed_migrations!("src/db/repositories/sqlite/migrations");

const FALLBACK_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS Regions (
    Id INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS Districts (
    Id INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL,
    RegionId INTEGER NOT NULL,
    FOREIGN KEY (RegionId) REFERENCES Regions(Id)
);
CREATE TABLE IF NOT EXISTS Institutions (
    Id INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL,
    Type TEXT NOT NULL,
    Address TEXT NOT NULL,
    Contacts TEXT,
    DistrictId INTEGER NOT NULL,
    Status TEXT NOT NULL,
    RegistrationDate TEXT NOT NULL,
    StudentCount INTEGER NOT NULL DEFAULT 0,
    AdmittedCount INTEGER NOT NULL DEFAULT 0,
    ExpelledCount INTEGER NOT NULL DEFAULT 0,
    StaffCount INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (DistrictId) REFERENCES Districts(Id)
);
"#;

/// Storage class of an extended column, which determines its DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Boolean,
    Date,
    Decimal,
    Integer,
    Year,
    Text,
}

/// Extended `Institutions` columns added to databases that predate them.
pub const EXTENDED_COLUMNS: [(&str, ColumnKind); 21] = [
    ("LicenseNumber", ColumnKind::Text),
    ("LicenseExpiryDate", ColumnKind::Date),
    ("AccreditationCategory", ColumnKind::Text),
    ("OwnershipType", ColumnKind::Text),
    ("LanguageOfEducation", ColumnKind::Text),
    ("DirectorName", ColumnKind::Text),
    ("Email", ColumnKind::Text),
    ("Website", ColumnKind::Text),
    ("FoundationYear", ColumnKind::Year),
    ("InstitutionStatus", ColumnKind::Text),
    ("ClassroomCount", ColumnKind::Integer),
    ("TeacherCount", ColumnKind::Integer),
    ("AdministrativeStaffCount", ColumnKind::Integer),
    ("ComputerCount", ColumnKind::Integer),
    ("HasSportsHall", ColumnKind::Boolean),
    ("HasDiningRoom", ColumnKind::Boolean),
    ("HasLibrary", ColumnKind::Boolean),
    ("TotalArea", ColumnKind::Decimal),
    ("Specialization", ColumnKind::Text),
    ("EducationalPrograms", ColumnKind::Text),
    ("Infrastructure", ColumnKind::Text),
];

/// Which path created the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaSource {
    Migrations,
    Fallback,
}

/// Outcome of [`migrate_additive_columns`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub added: Vec<String>,
    pub existing: Vec<String>,
    pub failed: Vec<String>,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, QueryableByName)]
struct TableInfoRow {
    #[diesel(sql_type = Text)]
    name: String,
}

/// SQL type and default for a column of `kind`.
pub fn column_definition(kind: ColumnKind, current_year: i32) -> String {
    match kind {
        ColumnKind::Boolean | ColumnKind::Integer => "INTEGER DEFAULT 0".to_string(),
        ColumnKind::Date => "TEXT".to_string(),
        ColumnKind::Decimal => "REAL DEFAULT 0".to_string(),
        ColumnKind::Year => format!("INTEGER DEFAULT {}", current_year),
        ColumnKind::Text => "TEXT DEFAULT ''".to_string(),
    }
}

/// Create the registry tables if they do not exist.
pub fn ensure_schema(conn: &mut SqliteConnection) -> RepositoryResult<SchemaSource> {
    match conn.run_pending_migrations(MIGRATIONS) {
        Ok(applied) => {
            if !applied.is_empty() {
                info!("Applied {} schema migration(s)", applied.len());
            }
            Ok(SchemaSource::Migrations)
        }
        Err(migration_err) => {
            warn!(
                "Embedded migrations failed ({}), creating schema directly",
                migration_err
            );
            conn.batch_execute(FALLBACK_SCHEMA).map_err(|fallback_err| {
                RepositoryError::configuration_with_context(
                    format!(
                        "Unable to create schema: migrations failed ({}) and fallback failed ({})",
                        migration_err, fallback_err
                    ),
                    ErrorContext::new("ensure_schema"),
                )
            })?;
            Ok(SchemaSource::Fallback)
        }
    }
}

/// Column names of `table`, as reported by SQLite.
pub fn table_columns(conn: &mut SqliteConnection, table: &str) -> RepositoryResult<Vec<String>> {
    let rows: Vec<TableInfoRow> = sql_query(format!("PRAGMA table_info({})", table))
        .load(conn)
        .map_err(|e| RepositoryError::from(e).with_operation("table_info"))?;
    Ok(rows.into_iter().map(|r| r.name).collect())
}

/// Add every missing extended column to `Institutions`.
///
/// Name comparison is case-insensitive. Running it twice adds nothing the
/// second time.
pub fn migrate_additive_columns(conn: &mut SqliteConnection) -> RepositoryResult<MigrationReport> {
    let present: Vec<String> = table_columns(conn, "Institutions")?
        .into_iter()
        .map(|c| c.to_lowercase())
        .collect();
    let current_year = Local::now().year();
    let mut report = MigrationReport::default();

    for (column, kind) in EXTENDED_COLUMNS {
        if present.contains(&column.to_lowercase()) {
            report.existing.push(column.to_string());
            continue;
        }

        let ddl = format!(
            "ALTER TABLE Institutions ADD COLUMN {} {};",
            column,
            column_definition(kind, current_year)
        );
        match conn.batch_execute(&ddl) {
            Ok(()) => {
                debug!("Added column Institutions.{}", column);
                report.added.push(column.to_string());
            }
            Err(e) => {
                warn!("Failed to add column Institutions.{}: {}", column, e);
                report.failed.push(column.to_string());
            }
        }
    }

    if !report.added.is_empty() {
        info!(
            "Additive migration added {} column(s): {}",
            report.added.len(),
            report.added.join(", ")
        );
    }

    Ok(report)
}
