//! SQLite repository implementation using Diesel.
//!
//! ## Features
//!
//! - One connection per unit of work, opened inside `spawn_blocking` and
//!   dropped before the operation returns (no pool, no cached handle)
//! - `PRAGMA foreign_keys = ON` and a busy timeout on every connection
//! - Schema creation and additive column migration on construction
//! - Updates that hit a locked or busy database are retried on a fresh
//!   connection
//! - Operation counters for monitoring
//!
//! ## Configuration
//!
//! Environment variables:
//! - `EDU_DATABASE_PATH` or `DATABASE_URL`: Database file (default: `education.db`)
//! - `EDU_BUSY_TIMEOUT_MS`: SQLite busy timeout in milliseconds (default: 5000)
//! - `EDU_MAX_RETRIES`: Retries for conflicting updates (default: 1)

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::{debug, info, warn};
use tokio::task;

use crate::db::repository::{
    DistrictRepository, ErrorContext, InstitutionRepository, RegionRepository, RepositoryError,
    RepositoryResult,
};
use crate::models::{District, DistrictId, Institution, InstitutionId, Region, RegionId};
use crate::services::filtering::InstitutionFilter;

mod models;
mod schema;
pub mod schema_manager;

use models::*;
use schema::*;
pub use schema_manager::{MigrationReport, SchemaSource};

/// Configuration for opening the SQLite database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    /// Path of the database file (`:memory:` is not useful here since every
    /// operation opens its own connection)
    pub database_path: String,
    /// How long a connection waits on a locked database, in milliseconds
    pub busy_timeout_ms: u64,
    /// Extra attempts for an update that fails with a conflict
    pub max_retries: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            database_path: "education.db".to_string(),
            busy_timeout_ms: 5000,
            max_retries: 1,
        }
    }
}

impl SqliteConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `EDU_DATABASE_PATH` or `DATABASE_URL`: Database file (default: `education.db`)
    /// - `EDU_BUSY_TIMEOUT_MS`: Busy timeout in milliseconds (default: 5000)
    /// - `EDU_MAX_RETRIES`: Conflict retries for updates (default: 1)
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let database_path = std::env::var("EDU_DATABASE_PATH")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map(|v| v.trim_start_matches("sqlite://").to_string())
            .unwrap_or(defaults.database_path);

        if database_path.trim().is_empty() {
            return Err("EDU_DATABASE_PATH must not be empty".to_string());
        }

        let busy_timeout_ms = match std::env::var("EDU_BUSY_TIMEOUT_MS") {
            Ok(v) => v
                .parse::<u64>()
                .map_err(|_| format!("Invalid EDU_BUSY_TIMEOUT_MS: {}", v))?,
            Err(_) => defaults.busy_timeout_ms,
        };

        let max_retries = match std::env::var("EDU_MAX_RETRIES") {
            Ok(v) => v
                .parse::<u32>()
                .map_err(|_| format!("Invalid EDU_MAX_RETRIES: {}", v))?,
            Err(_) => defaults.max_retries,
        };

        Ok(Self {
            database_path,
            busy_timeout_ms,
            max_retries,
        })
    }

    /// Create a new configuration for a database file.
    pub fn with_path(database_path: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Default::default()
        }
    }
}

/// Operation statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    /// Connections opened since construction
    pub connections_opened: u64,
    /// Total operations executed
    pub total_operations: u64,
    /// Operations that returned an error
    pub failed_operations: u64,
    /// Operations retried after a conflict
    pub retried_operations: u64,
}

#[derive(Debug, Default)]
struct Counters {
    connections_opened: AtomicU64,
    total_operations: AtomicU64,
    failed_operations: AtomicU64,
    retried_operations: AtomicU64,
}

/// Diesel-backed repository for SQLite.
#[derive(Clone, Debug)]
pub struct SqliteRepository {
    config: SqliteConfig,
    counters: Arc<Counters>,
    schema_source: SchemaSource,
    migration_report: MigrationReport,
}

impl SqliteRepository {
    /// Open the database, create the schema and add missing columns.
    ///
    /// # Returns
    /// * `Ok(SqliteRepository)` on success
    /// * `Err(RepositoryError::ConnectionError)` if the file cannot be opened
    /// * `Err(RepositoryError::ConfigurationError)` if no schema could be created
    pub fn new(config: SqliteConfig) -> RepositoryResult<Self> {
        let counters = Arc::new(Counters::default());
        let mut conn = open_connection(&config, &counters)?;

        let schema_source = schema_manager::ensure_schema(&mut conn)?;
        let migration_report = schema_manager::migrate_additive_columns(&mut conn)?;
        if !migration_report.is_clean() {
            warn!(
                "Some columns could not be added: {}",
                migration_report.failed.join(", ")
            );
        }

        info!(
            "Opened SQLite registry at {} (schema via {:?})",
            config.database_path, schema_source
        );

        Ok(Self {
            config,
            counters,
            schema_source,
            migration_report,
        })
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// How the schema was created at construction.
    pub fn schema_source(&self) -> SchemaSource {
        self.schema_source
    }

    /// Result of the additive column migration at construction.
    pub fn migration_report(&self) -> &MigrationReport {
        &self.migration_report
    }

    /// Get operation statistics.
    pub fn stats(&self) -> RepositoryStats {
        RepositoryStats {
            connections_opened: self.counters.connections_opened.load(Ordering::Relaxed),
            total_operations: self.counters.total_operations.load(Ordering::Relaxed),
            failed_operations: self.counters.failed_operations.load(Ordering::Relaxed),
            retried_operations: self.counters.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Run a unit of work on a fresh connection, once.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: Fn(&mut SqliteConnection) -> RepositoryResult<T> + Send + 'static,
    {
        self.run_blocking(0, f).await
    }

    /// Run a unit of work, retrying on a fresh connection when it fails with
    /// a retryable error (locked or busy database).
    async fn with_conn_retry<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: Fn(&mut SqliteConnection) -> RepositoryResult<T> + Send + 'static,
    {
        self.run_blocking(self.config.max_retries, f).await
    }

    async fn run_blocking<T, F>(&self, max_retries: u32, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: Fn(&mut SqliteConnection) -> RepositoryResult<T> + Send + 'static,
    {
        let config = self.config.clone();
        let counters = self.counters.clone();

        task::spawn_blocking(move || {
            let mut attempt = 0;
            loop {
                if attempt > 0 {
                    counters.retried_operations.fetch_add(1, Ordering::Relaxed);
                }

                counters.total_operations.fetch_add(1, Ordering::Relaxed);
                let result = open_connection(&config, &counters).and_then(|mut conn| f(&mut conn));

                match result {
                    Ok(value) => return Ok(value),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        debug!("Retrying after conflict (attempt {}): {}", attempt + 1, e);
                        attempt += 1;
                    }
                    Err(e) => {
                        counters.failed_operations.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

fn open_connection(config: &SqliteConfig, counters: &Counters) -> RepositoryResult<SqliteConnection> {
    let mut conn = SqliteConnection::establish(&config.database_path).map_err(|e| {
        RepositoryError::connection_with_context(
            e.to_string(),
            ErrorContext::new("open_connection").with_details(config.database_path.clone()),
        )
    })?;
    conn.batch_execute(&format!(
        "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
        config.busy_timeout_ms
    ))?;
    counters.connections_opened.fetch_add(1, Ordering::Relaxed);
    Ok(conn)
}

// ==================== Row loading helpers ====================

fn region_exists(conn: &mut SqliteConnection, id: RegionId) -> RepositoryResult<bool> {
    Ok(diesel::select(exists(regions::table.find(id.value()))).get_result(conn)?)
}

fn district_exists(conn: &mut SqliteConnection, id: DistrictId) -> RepositoryResult<bool> {
    Ok(diesel::select(exists(districts::table.find(id.value()))).get_result(conn)?)
}

fn institution_exists(conn: &mut SqliteConnection, id: InstitutionId) -> RepositoryResult<bool> {
    Ok(diesel::select(exists(institutions::table.find(id.value()))).get_result(conn)?)
}

fn require_region(conn: &mut SqliteConnection, id: RegionId, operation: &str) -> RepositoryResult<()> {
    if region_exists(conn, id)? {
        return Ok(());
    }
    Err(RepositoryError::validation_with_context(
        format!("Region {} does not exist", id),
        ErrorContext::new(operation)
            .with_entity("region")
            .with_entity_id(id),
    ))
}

fn require_district(
    conn: &mut SqliteConnection,
    id: DistrictId,
    operation: &str,
) -> RepositoryResult<()> {
    if district_exists(conn, id)? {
        return Ok(());
    }
    Err(RepositoryError::validation_with_context(
        format!("District {} does not exist", id),
        ErrorContext::new(operation)
            .with_entity("district")
            .with_entity_id(id),
    ))
}

fn load_districts(
    conn: &mut SqliteConnection,
    region_id: Option<RegionId>,
    district_id: Option<DistrictId>,
) -> RepositoryResult<Vec<District>> {
    let mut query = districts::table
        .inner_join(regions::table)
        .select((DistrictRow::as_select(), RegionRow::as_select()))
        .order(districts::id.asc())
        .into_boxed();

    if let Some(region_id) = region_id {
        query = query.filter(districts::region_id.eq(region_id.value()));
    }
    if let Some(district_id) = district_id {
        query = query.filter(districts::id.eq(district_id.value()));
    }

    let rows: Vec<(DistrictRow, RegionRow)> = query.load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(district, region)| district.into_district(Some(region)))
        .collect())
}

/// Hydrated institutions, ordered by id.
///
/// Exact-match criteria of `filter` are evaluated in SQL; the name criterion
/// is applied afterwards so that case folding covers non-ASCII names.
fn load_institutions(
    conn: &mut SqliteConnection,
    id: Option<InstitutionId>,
    filter: Option<&InstitutionFilter>,
) -> RepositoryResult<Vec<Institution>> {
    let mut query = institutions::table
        .inner_join(districts::table.inner_join(regions::table))
        .select((
            InstitutionRow::as_select(),
            DistrictRow::as_select(),
            RegionRow::as_select(),
        ))
        .order(institutions::id.asc())
        .into_boxed();

    if let Some(id) = id {
        query = query.filter(institutions::id.eq(id.value()));
    }

    if let Some(filter) = filter {
        if let Some(region_id) = filter.region_id {
            query = query.filter(regions::id.eq(region_id.value()));
        }
        if let Some(district_id) = filter.district_id {
            query = query.filter(institutions::district_id.eq(district_id.value()));
        }
        if let Some(institution_type) = filter.type_criterion() {
            query = query.filter(institutions::institution_type.eq(institution_type.to_string()));
        }
        if let Some(status) = filter.status_criterion() {
            query = query.filter(institutions::status.eq(status.to_string()));
        }
    }

    let rows: Vec<(InstitutionRow, DistrictRow, RegionRow)> = query.load(conn)?;

    let mut result = Vec::with_capacity(rows.len());
    for (institution, district, region) in rows {
        let institution = institution.into_institution(Some(district.into_district(Some(region))))?;
        if filter.map_or(true, |f| f.matches_name(&institution)) {
            result.push(institution);
        }
    }
    Ok(result)
}

fn fetch_institution(
    conn: &mut SqliteConnection,
    id: InstitutionId,
) -> RepositoryResult<Option<Institution>> {
    Ok(load_institutions(conn, Some(id), None)?.into_iter().next())
}

// ==================== Trait implementations ====================

#[async_trait]
impl RegionRepository for SqliteRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            conn.batch_execute("SELECT 1")?;
            Ok(true)
        })
        .await
    }

    async fn list_regions(&self) -> RepositoryResult<Vec<Region>> {
        self.with_conn(|conn| {
            let rows: Vec<RegionRow> = regions::table
                .select(RegionRow::as_select())
                .order(regions::id.asc())
                .load(conn)?;
            Ok(rows.into_iter().map(Region::from).collect())
        })
        .await
    }

    async fn get_region(&self, id: RegionId) -> RepositoryResult<Option<Region>> {
        self.with_conn(move |conn| {
            let row: Option<RegionRow> = regions::table
                .find(id.value())
                .select(RegionRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(Region::from))
        })
        .await
    }

    async fn add_region(&self, region: &Region) -> RepositoryResult<Region> {
        let row = NewRegionRow::from(region);
        self.with_conn(move |conn| {
            conn.immediate_transaction(|tx| {
                let inserted: RegionRow = diesel::insert_into(regions::table)
                    .values(&row)
                    .returning(RegionRow::as_returning())
                    .get_result(tx)?;
                Ok(Region::from(inserted))
            })
        })
        .await
    }

    async fn update_region(&self, region: &Region) -> RepositoryResult<bool> {
        let id = region.id;
        let row = NewRegionRow::from(region);
        self.with_conn_retry(move |conn| {
            conn.immediate_transaction(|tx| {
                let updated = diesel::update(regions::table.find(id.value()))
                    .set(&row)
                    .execute(tx)?;
                Ok(updated > 0)
            })
        })
        .await
    }

    async fn delete_region(&self, id: RegionId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            conn.immediate_transaction(|tx| {
                if !region_exists(tx, id)? {
                    return Ok(false);
                }

                let dependents: i64 = districts::table
                    .filter(districts::region_id.eq(id.value()))
                    .count()
                    .get_result(tx)?;
                if dependents > 0 {
                    return Err(RepositoryError::has_dependents(
                        format!("Region {} still has districts", id),
                        dependents as usize,
                        ErrorContext::new("delete_region")
                            .with_entity("region")
                            .with_entity_id(id),
                    ));
                }

                let deleted = diesel::delete(regions::table.find(id.value())).execute(tx)?;
                Ok(deleted > 0)
            })
        })
        .await
    }
}

#[async_trait]
impl DistrictRepository for SqliteRepository {
    async fn list_districts(&self) -> RepositoryResult<Vec<District>> {
        self.with_conn(|conn| load_districts(conn, None, None)).await
    }

    async fn list_districts_by_region(&self, region_id: RegionId) -> RepositoryResult<Vec<District>> {
        self.with_conn(move |conn| load_districts(conn, Some(region_id), None))
            .await
    }

    async fn get_district(&self, id: DistrictId) -> RepositoryResult<Option<District>> {
        self.with_conn(move |conn| Ok(load_districts(conn, None, Some(id))?.into_iter().next()))
            .await
    }

    async fn add_district(&self, district: &District) -> RepositoryResult<District> {
        let region_id = district.region_id;
        let row = NewDistrictRow::from(district);
        self.with_conn(move |conn| {
            conn.immediate_transaction(|tx| {
                require_region(tx, region_id, "add_district")?;
                let id: i32 = diesel::insert_into(districts::table)
                    .values(&row)
                    .returning(districts::id)
                    .get_result(tx)?;
                load_districts(tx, None, Some(DistrictId(id)))?
                    .into_iter()
                    .next()
                    .ok_or_else(|| RepositoryError::internal("Inserted district not found"))
            })
        })
        .await
    }

    async fn update_district(&self, district: &District) -> RepositoryResult<bool> {
        let id = district.id;
        let region_id = district.region_id;
        let row = NewDistrictRow::from(district);
        self.with_conn_retry(move |conn| {
            conn.immediate_transaction(|tx| {
                if !district_exists(tx, id)? {
                    return Ok(false);
                }
                require_region(tx, region_id, "update_district")?;
                let updated = diesel::update(districts::table.find(id.value()))
                    .set(&row)
                    .execute(tx)?;
                Ok(updated > 0)
            })
        })
        .await
    }

    async fn delete_district(&self, id: DistrictId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            conn.immediate_transaction(|tx| {
                if !district_exists(tx, id)? {
                    return Ok(false);
                }

                let dependents: i64 = institutions::table
                    .filter(institutions::district_id.eq(id.value()))
                    .count()
                    .get_result(tx)?;
                if dependents > 0 {
                    return Err(RepositoryError::has_dependents(
                        format!("District {} still has institutions", id),
                        dependents as usize,
                        ErrorContext::new("delete_district")
                            .with_entity("district")
                            .with_entity_id(id),
                    ));
                }

                let deleted = diesel::delete(districts::table.find(id.value())).execute(tx)?;
                Ok(deleted > 0)
            })
        })
        .await
    }
}

#[async_trait]
impl InstitutionRepository for SqliteRepository {
    async fn list_institutions(&self) -> RepositoryResult<Vec<Institution>> {
        self.with_conn(|conn| load_institutions(conn, None, None)).await
    }

    async fn get_institution(&self, id: InstitutionId) -> RepositoryResult<Option<Institution>> {
        self.with_conn(move |conn| fetch_institution(conn, id)).await
    }

    async fn add_institution(&self, institution: &Institution) -> RepositoryResult<Institution> {
        let district_id = institution.district_id;
        let row = NewInstitutionRow::from(institution);
        self.with_conn(move |conn| {
            conn.immediate_transaction(|tx| {
                require_district(tx, district_id, "add_institution")?;
                let id: i32 = diesel::insert_into(institutions::table)
                    .values(&row)
                    .returning(institutions::id)
                    .get_result(tx)?;
                fetch_institution(tx, InstitutionId(id))?
                    .ok_or_else(|| RepositoryError::internal("Inserted institution not found"))
            })
        })
        .await
    }

    async fn update_institution(&self, institution: &Institution) -> RepositoryResult<bool> {
        let id = institution.id;
        let district_id = institution.district_id;
        let row = NewInstitutionRow::from(institution);
        self.with_conn_retry(move |conn| {
            conn.immediate_transaction(|tx| {
                if !institution_exists(tx, id)? {
                    return Ok(false);
                }
                require_district(tx, district_id, "update_institution")?;
                let updated = diesel::update(institutions::table.find(id.value()))
                    .set(&row)
                    .execute(tx)?;
                Ok(updated > 0)
            })
        })
        .await
    }

    async fn delete_institution(&self, id: InstitutionId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            conn.immediate_transaction(|tx| {
                let deleted = diesel::delete(institutions::table.find(id.value())).execute(tx)?;
                Ok(deleted > 0)
            })
        })
        .await
    }

    async fn search_institutions(
        &self,
        filter: &InstitutionFilter,
    ) -> RepositoryResult<Vec<Institution>> {
        let filter = filter.clone();
        self.with_conn(move |conn| load_institutions(conn, None, Some(&filter)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SqliteConfig::default();
        assert_eq!(config.database_path, "education.db");
        assert_eq!(config.busy_timeout_ms, 5000);
        assert_eq!(config.max_retries, 1);
    }

    #[test]
    fn test_with_path() {
        let config = SqliteConfig::with_path("/tmp/registry.db");
        assert_eq!(config.database_path, "/tmp/registry.db");
        assert_eq!(config.max_retries, 1);
    }

    #[tokio::test]
    async fn test_counters_track_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.db");
        let repo = SqliteRepository::new(SqliteConfig::with_path(path.to_string_lossy())).unwrap();
        let opened = repo.stats().connections_opened;

        repo.list_regions().await.unwrap();
        let stats = repo.stats();
        assert_eq!(stats.connections_opened, opened + 1);
        assert_eq!(stats.total_operations, 1);
        assert_eq!(stats.failed_operations, 0);
    }
}
