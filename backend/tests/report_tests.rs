//! End-to-end report tests over the sample registry.

mod support;

use edu_registry::db::repository::DistrictRepository;
use edu_registry::db::{load_snapshot, seed_sample_data, LocalRepository};
use edu_registry::services::{
    generate_report, overview, Report, ReportKind, ReportScope, ReportSession,
};

async fn seeded_local() -> LocalRepository {
    let repo = LocalRepository::new();
    assert!(seed_sample_data(&repo).await.unwrap());
    repo
}

fn row<'a>(report: &'a Report, category: &str) -> &'a edu_registry::services::ReportRow {
    report
        .rows
        .iter()
        .find(|r| r.category == category)
        .unwrap_or_else(|| panic!("missing row {}", category))
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.01
}

#[tokio::test]
async fn test_by_region_skips_empty_regions() {
    let repo = seeded_local().await;
    let snapshot = load_snapshot(&repo).await.unwrap();
    let report = generate_report(&snapshot, ReportKind::ByRegion, ReportScope::Country);

    let categories: Vec<&str> = report.rows.iter().map(|r| r.category.as_str()).collect();
    assert_eq!(categories, vec!["Минская область", "Гродненская область"]);

    let minsk = &report.rows[0];
    assert_eq!(minsk.institution_count, 1);
    assert_eq!(minsk.student_count, 850);
    assert_eq!(minsk.ratio_display(), "1:18.9");

    assert_eq!(report.totals.institutions, 2);
    assert_eq!(report.totals.students, 1470);
    assert_eq!(report.totals.teachers, 83);
    assert_eq!(report.totals.staff, 110);
}

#[tokio::test]
async fn test_by_district_labels_include_region() {
    let repo = seeded_local().await;
    let snapshot = load_snapshot(&repo).await.unwrap();
    let report = generate_report(&snapshot, ReportKind::ByDistrict, ReportScope::Country);

    let categories: Vec<&str> = report.rows.iter().map(|r| r.category.as_str()).collect();
    assert_eq!(
        categories,
        vec![
            "Минский район (Минская область)",
            "Гродненский район (Гродненская область)"
        ]
    );
}

#[tokio::test]
async fn test_by_type_follows_first_appearance() {
    let repo = seeded_local().await;
    let snapshot = load_snapshot(&repo).await.unwrap();
    let report = generate_report(&snapshot, ReportKind::ByType, ReportScope::Country);

    let categories: Vec<&str> = report.rows.iter().map(|r| r.category.as_str()).collect();
    assert_eq!(categories, vec!["Гимназия", "Школа"]);
}

#[tokio::test]
async fn test_statistics_and_financial_ratios_differ() {
    let repo = seeded_local().await;
    let snapshot = load_snapshot(&repo).await.unwrap();

    let statistics = generate_report(&snapshot, ReportKind::Statistics, ReportScope::Country);
    assert_eq!(row(&statistics, "Всего учреждений").value_display(), "2");
    assert_eq!(row(&statistics, "Принято учащихся").value, 205.0);
    assert_eq!(row(&statistics, "Отчислено учащихся").value, 23.0);
    // Mean of per-institution ratios.
    assert!(approx(
        row(&statistics, "Среднее соотношение ученик/учитель").value,
        17.60
    ));

    let financial = generate_report(&snapshot, ReportKind::Financial, ReportScope::Country);
    // Sum of students over sum of teachers.
    assert!(approx(
        row(&financial, "Общее соотношение ученик/учитель").value,
        17.71
    ));
    assert_eq!(
        row(&financial, "Среднее количество учащихся на учреждение").value,
        735.0
    );
    assert_eq!(row(&financial, "Процент учреждений с библиотекой").value, 100.0);
    assert_eq!(row(&financial, "Процент учреждений со спортзалом").value, 100.0);
}

#[tokio::test]
async fn test_infrastructure_counts() {
    let repo = seeded_local().await;
    let snapshot = load_snapshot(&repo).await.unwrap();
    let report = generate_report(&snapshot, ReportKind::Infrastructure, ReportScope::Country);

    assert_eq!(row(&report, "Учреждения со спортзалом").value, 2.0);
    assert_eq!(row(&report, "Учреждения со столовой").value, 1.0);
    assert_eq!(row(&report, "Всего компьютеров").value, 85.0);
    assert_eq!(row(&report, "Всего учебных кабинетов").value, 55.0);
    assert_eq!(
        row(&report, "Средняя площадь учреждений (м²)").value_display(),
        "2150.25"
    );
}

#[tokio::test]
async fn test_region_scope_limits_rows() {
    let repo = seeded_local().await;
    let snapshot = load_snapshot(&repo).await.unwrap();
    let grodno = snapshot
        .regions
        .iter()
        .find(|r| r.name == "Гродненская область")
        .unwrap()
        .id;

    let report = generate_report(&snapshot, ReportKind::Statistics, ReportScope::Region(grodno));
    assert_eq!(row(&report, "Всего учащихся").value, 620.0);

    let brest = snapshot
        .regions
        .iter()
        .find(|r| r.name == "Брестская область")
        .unwrap()
        .id;
    let empty = generate_report(&snapshot, ReportKind::ByRegion, ReportScope::Region(brest));
    assert!(empty.rows.is_empty());
    assert_eq!(empty.totals.institutions, 0);
}

#[tokio::test]
async fn test_overview_lists_newest_first() {
    let repo = seeded_local().await;
    let snapshot = load_snapshot(&repo).await.unwrap();
    let summary = overview(&snapshot);

    assert_eq!(summary.total_institutions, 2);
    assert_eq!(summary.total_students, 1470);
    assert_eq!(summary.total_teachers, 83);
    assert_eq!(summary.total_staff, 110);
    let names: Vec<&str> = summary
        .recent_institutions
        .iter()
        .map(|i| i.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["Гимназия №1 г. Минска", "Средняя школа №2 г. Гродно"]
    );
}

#[tokio::test]
async fn test_session_reload_sees_new_data() {
    let repo = seeded_local().await;
    let mut session = ReportSession::load(&repo).await.unwrap();
    let before = session.set_kind(ReportKind::ByRegion);
    assert_eq!(before.rows.len(), 2);

    let brest_district = repo
        .list_districts()
        .await
        .unwrap()
        .into_iter()
        .find(|d| d.name == "Брестский район")
        .unwrap();
    support::add_institution(&repo, "Лицей №1 г. Бреста", "Лицей", &brest_district, 300, 25)
        .await;

    // The snapshot is not refreshed until reload.
    assert_eq!(session.regenerate().rows.len(), 2);
    let after = session.reload(&repo).await.unwrap();
    assert_eq!(after.rows.len(), 3);
    assert_eq!(after.kind, ReportKind::ByRegion);
}

#[cfg(feature = "sqlite-repo")]
#[tokio::test]
async fn test_sqlite_and_local_reports_agree() {
    use edu_registry::db::{SqliteConfig, SqliteRepository};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parity.db");
    let sqlite = SqliteRepository::new(SqliteConfig::with_path(path.to_string_lossy())).unwrap();
    assert!(seed_sample_data(&sqlite).await.unwrap());
    let local = seeded_local().await;

    let sqlite_snapshot = load_snapshot(&sqlite).await.unwrap();
    let local_snapshot = load_snapshot(&local).await.unwrap();

    for kind in ReportKind::ALL {
        let a = generate_report(&sqlite_snapshot, kind, ReportScope::Country);
        let b = generate_report(&local_snapshot, kind, ReportScope::Country);
        assert_eq!(a.rows, b.rows, "{} differs", kind);
        assert_eq!(a.totals, b.totals);
    }
}
