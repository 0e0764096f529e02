//! Integration tests for the SQLite repository against temporary database files.

#![cfg(feature = "sqlite-repo")]

mod support;

use chrono::{Datelike, Local, NaiveDate};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use edu_registry::db::repositories::SchemaSource;
use edu_registry::db::repository::{
    DistrictRepository, InstitutionRepository, RegionRepository, RepositoryError,
};
use edu_registry::db::{SqliteConfig, SqliteRepository};
use edu_registry::models::{District, Institution, InstitutionId, Region, RegionId};
use edu_registry::services::InstitutionFilter;

fn open_repo(dir: &tempfile::TempDir) -> SqliteRepository {
    let path = dir.path().join("registry.db");
    SqliteRepository::new(SqliteConfig::with_path(path.to_string_lossy())).unwrap()
}

const LEGACY_SCHEMA: &str = r#"
CREATE TABLE Regions (Id INTEGER PRIMARY KEY AUTOINCREMENT, Name TEXT NOT NULL);
CREATE TABLE Districts (
    Id INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL,
    RegionId INTEGER NOT NULL REFERENCES Regions(Id)
);
CREATE TABLE Institutions (
    Id INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL,
    Type TEXT NOT NULL,
    Address TEXT NOT NULL,
    Contacts TEXT,
    DistrictId INTEGER NOT NULL REFERENCES Districts(Id),
    Status TEXT NOT NULL,
    RegistrationDate TEXT NOT NULL,
    StudentCount INTEGER NOT NULL DEFAULT 0,
    AdmittedCount INTEGER NOT NULL DEFAULT 0,
    ExpelledCount INTEGER NOT NULL DEFAULT 0,
    StaffCount INTEGER NOT NULL DEFAULT 0
);
INSERT INTO Regions (Name) VALUES ('Витебская область');
INSERT INTO Districts (Name, RegionId) VALUES ('Оршанский район', 1);
INSERT INTO Institutions (Name, Type, Address, Contacts, DistrictId, Status, RegistrationDate, StudentCount)
VALUES ('Школа №7', 'Школа', 'г. Орша', NULL, 1, 'Активно', '2019-09-01 00:00:00', 410);
"#;

#[tokio::test]
async fn test_fresh_database_uses_migrations() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open_repo(&dir);

    assert_eq!(repo.schema_source(), SchemaSource::Migrations);
    assert!(repo.migration_report().added.is_empty());
    assert!(repo.migration_report().is_clean());
    assert!(repo.health_check().await.unwrap());
}

#[tokio::test]
async fn test_reopening_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    {
        let repo = open_repo(&dir);
        repo.add_region(&Region::new("Минская область")).await.unwrap();
    }

    let reopened = open_repo(&dir);
    assert!(reopened.migration_report().added.is_empty());
    assert!(reopened.migration_report().failed.is_empty());
    assert_eq!(reopened.list_regions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_legacy_database_gains_extended_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.db");
    {
        let mut conn = SqliteConnection::establish(&path.to_string_lossy()).unwrap();
        conn.batch_execute(LEGACY_SCHEMA).unwrap();
    }

    let repo = SqliteRepository::new(SqliteConfig::with_path(path.to_string_lossy())).unwrap();
    let report = repo.migration_report();
    assert!(report.is_clean());
    assert!(report.added.iter().any(|c| c == "LicenseNumber"));
    assert!(report.added.iter().any(|c| c == "FoundationYear"));
    assert!(report.added.iter().any(|c| c == "HasLibrary"));

    let institutions = repo.list_institutions().await.unwrap();
    assert_eq!(institutions.len(), 1);
    let school = &institutions[0];
    assert_eq!(school.student_count, 410);
    assert_eq!(school.registration_date, NaiveDate::from_ymd_opt(2019, 9, 1).unwrap());
    assert_eq!(school.contacts, "");
    assert_eq!(school.license_number, "");
    assert!(school.license_expiry_date.is_none());
    assert!(!school.has_library);
    assert_eq!(school.total_area, 0.0);
    assert_eq!(school.foundation_year, Local::now().year());
    assert_eq!(
        school.district.as_ref().unwrap().region.as_ref().unwrap().name,
        "Витебская область"
    );

    // A second start finds every column in place.
    let again = SqliteRepository::new(SqliteConfig::with_path(path.to_string_lossy())).unwrap();
    assert!(again.migration_report().added.is_empty());
}

#[tokio::test]
async fn test_institution_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open_repo(&dir);
    let h = support::build_hierarchy(&repo).await;

    let mut gym = Institution::new("Гимназия №1 г. Минска", "Гимназия", h.minsk_district.id);
    gym.address = "г. Минск, ул. Примерная, 1".to_string();
    gym.contacts = "+375-17-123-45-67".to_string();
    gym.registration_date = NaiveDate::from_ymd_opt(2020, 1, 15).unwrap();
    gym.student_count = 850;
    gym.teacher_count = 45;
    gym.has_sports_hall = true;
    gym.total_area = 2500.5;
    gym.license_expiry_date = NaiveDate::from_ymd_opt(2030, 6, 1);
    gym.foundation_year = 1990;

    let stored = repo.add_institution(&gym).await.unwrap();
    assert!(stored.id.is_assigned());

    let loaded = repo.get_institution(stored.id).await.unwrap().unwrap();
    assert_eq!(loaded.name, gym.name);
    assert_eq!(loaded.contacts, gym.contacts);
    assert_eq!(loaded.registration_date_display(), "15.01.2020");
    assert_eq!(loaded.license_expiry_display(), "01.06.2030");
    assert_eq!(loaded.ratio_display(), "1:18.9");
    assert!(loaded.has_sports_hall);
    assert_eq!(loaded.total_area, 2500.5);
    assert_eq!(loaded.foundation_year, 1990);
    assert_eq!(loaded.ownership_type, "Государственное");
    assert_eq!(loaded.region_id(), Some(h.minsk.id));
}

#[tokio::test]
async fn test_integrity_rules() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open_repo(&dir);
    let h = support::build_hierarchy(&repo).await;
    let school =
        support::add_institution(&repo, "Школа", "Школа", &h.grodno_district, 100, 10).await;

    let orphan = repo.add_district(&District::new("Нигде", RegionId(77))).await;
    assert!(matches!(orphan, Err(RepositoryError::ValidationError { .. })));

    assert!(repo.delete_region(h.grodno.id).await.unwrap_err().is_has_dependents());
    assert!(repo
        .delete_district(h.grodno_district.id)
        .await
        .unwrap_err()
        .is_has_dependents());

    assert!(repo.delete_institution(school.id).await.unwrap());
    assert!(!repo.delete_institution(school.id).await.unwrap());
    assert!(repo.delete_district(h.grodno_district.id).await.unwrap());
    assert!(repo.delete_region(h.grodno.id).await.unwrap());
}

#[tokio::test]
async fn test_update_missing_rows_returns_false() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open_repo(&dir);
    let h = support::build_hierarchy(&repo).await;

    let mut ghost = Institution::new("Призрак", "Школа", h.minsk_district.id);
    ghost.id = InstitutionId(404);
    assert!(!repo.update_institution(&ghost).await.unwrap());

    let mut region = Region::new("Призрак");
    region.id = RegionId(404);
    assert!(!repo.update_region(&region).await.unwrap());
}

#[tokio::test]
async fn test_search_is_case_insensitive_for_cyrillic() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open_repo(&dir);
    let h = support::build_hierarchy(&repo).await;
    support::add_institution(&repo, "Гимназия №1", "Гимназия", &h.minsk_district, 850, 45).await;
    support::add_institution(&repo, "Средняя школа №2", "Школа", &h.grodno_district, 620, 38)
        .await;

    let found = repo
        .search_institutions(&InstitutionFilter::new().with_text("ГИМНАЗИЯ"))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Гимназия №1");

    let by_region = repo
        .search_institutions(&InstitutionFilter::new().with_region(h.grodno.id))
        .await
        .unwrap();
    assert_eq!(by_region.len(), 1);
    assert_eq!(by_region[0].institution_type, "Школа");

    let none = repo
        .search_institutions(
            &InstitutionFilter::new()
                .with_text("гимназия")
                .with_district(h.grodno_district.id),
        )
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_locked_update_is_retried_then_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.db");
    let config = SqliteConfig {
        database_path: path.to_string_lossy().to_string(),
        busy_timeout_ms: 10,
        max_retries: 1,
    };
    let repo = SqliteRepository::new(config).unwrap();
    let region = repo.add_region(&Region::new("Минская область")).await.unwrap();

    let mut holder = SqliteConnection::establish(&path.to_string_lossy()).unwrap();
    holder.batch_execute("BEGIN EXCLUSIVE;").unwrap();

    let mut renamed = region.clone();
    renamed.name = "Минская обл.".to_string();
    let err = repo.update_region(&renamed).await.unwrap_err();
    assert!(matches!(err, RepositoryError::ConflictError { .. }));
    assert_eq!(repo.stats().retried_operations, 1);

    holder.batch_execute("COMMIT;").unwrap();
    assert!(repo.update_region(&renamed).await.unwrap());
    assert_eq!(
        repo.get_region(region.id).await.unwrap().unwrap().name,
        "Минская обл."
    );
}

#[tokio::test]
async fn test_stats_count_failures() {
    let dir = tempfile::tempdir().unwrap();
    let repo = open_repo(&dir);

    let _ = repo
        .add_institution(&Institution::new("Нигде", "Школа", Default::default()))
        .await;
    let stats = repo.stats();
    assert_eq!(stats.total_operations, 1);
    assert_eq!(stats.failed_operations, 1);
}

#[tokio::test]
async fn test_null_extended_columns_read_as_defaults() {
    use edu_registry::db::load_snapshot;
    use edu_registry::services::{generate_report, ReportKind, ReportScope};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nulls.db");
    let repo = SqliteRepository::new(SqliteConfig::with_path(path.to_string_lossy())).unwrap();
    let h = support::build_hierarchy(&repo).await;
    support::add_institution(&repo, "Гимназия №1", "Гимназия", &h.minsk_district, 850, 45).await;

    let mut conn = SqliteConnection::establish(&path.to_string_lossy()).unwrap();
    conn.batch_execute(&format!(
        "INSERT INTO Institutions (Name, Type, Address, DistrictId, Status, RegistrationDate, \
         Email, TeacherCount, HasLibrary, TotalArea, FoundationYear, OwnershipType) \
         VALUES ('Школа №9', 'Школа', 'г. Минск', {}, 'Активно', '2021-02-01', \
         NULL, NULL, NULL, NULL, NULL, NULL);",
        h.minsk_district.id
    ))
    .unwrap();

    let institutions = repo.list_institutions().await.unwrap();
    assert_eq!(institutions.len(), 2);

    let school = &institutions[1];
    assert_eq!(school.name, "Школа №9");
    assert_eq!(school.email, "");
    assert_eq!(school.teacher_count, 0);
    assert!(!school.has_library);
    assert_eq!(school.total_area, 0.0);
    assert_eq!(school.foundation_year, Local::now().year());
    assert_eq!(school.ownership_type, "Государственное");
    assert_eq!(school.ratio_display(), "0");

    let found = repo
        .search_institutions(&InstitutionFilter::new().with_text("школа"))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    let snapshot = load_snapshot(&repo).await.unwrap();
    let report = generate_report(&snapshot, ReportKind::ByRegion, ReportScope::Country);
    assert_eq!(report.totals.institutions, 2);
    assert_eq!(report.totals.teachers, 45);
}

/// A migrations table with the wrong shape makes the embedded migrations fail.
const BROKEN_MIGRATIONS_TABLE: &str = "CREATE TABLE __diesel_schema_migrations (junk INTEGER);";

#[tokio::test]
async fn test_failed_migrations_fall_back_to_direct_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fallback.db");
    {
        let mut conn = SqliteConnection::establish(&path.to_string_lossy()).unwrap();
        conn.batch_execute(BROKEN_MIGRATIONS_TABLE).unwrap();
    }

    let repo = SqliteRepository::new(SqliteConfig::with_path(path.to_string_lossy())).unwrap();
    assert_eq!(repo.schema_source(), SchemaSource::Fallback);
    assert_eq!(repo.migration_report().added.len(), 21);
    assert!(repo.migration_report().is_clean());

    let h = support::build_hierarchy(&repo).await;
    let gym =
        support::add_institution(&repo, "Гимназия №1", "Гимназия", &h.minsk_district, 850, 45)
            .await;
    let loaded = repo.get_institution(gym.id).await.unwrap().unwrap();
    assert_eq!(loaded.teacher_count, 45);
    assert_eq!(loaded.region_id(), Some(h.minsk.id));

    let reopened = SqliteRepository::new(SqliteConfig::with_path(path.to_string_lossy())).unwrap();
    assert_eq!(reopened.schema_source(), SchemaSource::Fallback);
    assert!(reopened.migration_report().added.is_empty());
}

#[test]
fn test_schema_creation_failure_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blocked.db");
    {
        // An index already named Regions blocks CREATE TABLE on both paths.
        let mut conn = SqliteConnection::establish(&path.to_string_lossy()).unwrap();
        conn.batch_execute(
            "CREATE TABLE Placeholder (Value INTEGER); \
             CREATE INDEX Regions ON Placeholder (Value);",
        )
        .unwrap();
        conn.batch_execute(BROKEN_MIGRATIONS_TABLE).unwrap();
    }

    let result = SqliteRepository::new(SqliteConfig::with_path(path.to_string_lossy()));
    assert!(matches!(
        result,
        Err(RepositoryError::ConfigurationError { .. })
    ));
}
