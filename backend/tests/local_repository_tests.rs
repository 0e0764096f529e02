//! Integration tests for the in-memory repository: hierarchy integrity,
//! deletion guards and search composition.

mod support;

use chrono::NaiveDate;
use edu_registry::db::repository::{
    DistrictRepository, InstitutionRepository, RegionRepository, RepositoryError,
};
use edu_registry::db::LocalRepository;
use edu_registry::models::{District, DistrictId, Institution, InstitutionId, Region, RegionId};
use edu_registry::services::InstitutionFilter;

#[tokio::test]
async fn test_hierarchy_is_hydrated_on_read() {
    let repo = LocalRepository::new();
    let h = support::build_hierarchy(&repo).await;
    let school =
        support::add_institution(&repo, "Средняя школа №2", "Школа", &h.grodno_district, 620, 38)
            .await;

    let loaded = repo.get_institution(school.id).await.unwrap().unwrap();
    let district = loaded.district.as_ref().unwrap();
    assert_eq!(district.name, "Гродненский район");
    assert_eq!(district.region.as_ref().unwrap().name, "Гродненская область");
    assert_eq!(loaded.region_id(), Some(h.grodno.id));
}

#[tokio::test]
async fn test_hydrated_parent_is_a_copy() {
    let repo = LocalRepository::new();
    let h = support::build_hierarchy(&repo).await;
    let gym = support::add_institution(&repo, "Гимназия №1", "Гимназия", &h.minsk_district, 850, 45)
        .await;

    let mut renamed = h.minsk.clone();
    renamed.name = "Минская обл.".to_string();
    assert!(repo.update_region(&renamed).await.unwrap());

    // Values read before the rename keep the old name.
    assert_eq!(
        gym.district.as_ref().unwrap().region.as_ref().unwrap().name,
        "Минская область"
    );
    let reread = repo.get_institution(gym.id).await.unwrap().unwrap();
    assert_eq!(
        reread.district.unwrap().region.unwrap().name,
        "Минская обл."
    );
}

#[tokio::test]
async fn test_children_require_existing_parent() {
    let repo = LocalRepository::new();

    let orphan_district = repo
        .add_district(&District::new("Нигде", RegionId(42)))
        .await;
    assert!(matches!(
        orphan_district,
        Err(RepositoryError::ValidationError { .. })
    ));

    let orphan_institution = repo
        .add_institution(&Institution::new("Нигде", "Школа", DistrictId(42)))
        .await;
    assert!(matches!(
        orphan_institution,
        Err(RepositoryError::ValidationError { .. })
    ));

    assert!(repo.list_districts().await.unwrap().is_empty());
    assert!(repo.list_institutions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_moving_a_district_to_missing_region_is_rejected() {
    let repo = LocalRepository::new();
    let h = support::build_hierarchy(&repo).await;

    let mut moved = h.minsk_district.clone();
    moved.region_id = RegionId(999);
    let result = repo.update_district(&moved).await;
    assert!(matches!(result, Err(RepositoryError::ValidationError { .. })));

    let unchanged = repo.get_district(h.minsk_district.id).await.unwrap().unwrap();
    assert_eq!(unchanged.region_id, h.minsk.id);
}

#[tokio::test]
async fn test_delete_guards_walk_up_the_hierarchy() {
    let repo = LocalRepository::new();
    let h = support::build_hierarchy(&repo).await;
    let school =
        support::add_institution(&repo, "Школа", "Школа", &h.grodno_district, 100, 10).await;

    let err = repo.delete_region(h.grodno.id).await.unwrap_err();
    assert!(err.is_has_dependents());
    let err = repo.delete_district(h.grodno_district.id).await.unwrap_err();
    assert!(err.is_has_dependents());

    assert!(repo.delete_institution(school.id).await.unwrap());
    assert!(repo.delete_district(h.grodno_district.id).await.unwrap());
    assert!(repo.delete_region(h.grodno.id).await.unwrap());

    let regions: Vec<String> = repo
        .list_regions()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(regions, vec!["Минская область".to_string()]);
}

#[tokio::test]
async fn test_missing_ids_report_false() {
    let repo = LocalRepository::new();
    let mut region = Region::new("Призрак");
    region.id = RegionId(7);

    assert!(!repo.update_region(&region).await.unwrap());
    assert!(!repo.delete_region(RegionId(7)).await.unwrap());
    assert!(!repo.delete_district(DistrictId(7)).await.unwrap());
    assert!(!repo.delete_institution(InstitutionId(7)).await.unwrap());
    assert!(repo.get_institution(InstitutionId(7)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_replaces_every_field() {
    let repo = LocalRepository::new();
    let h = support::build_hierarchy(&repo).await;
    let original =
        support::add_institution(&repo, "Школа №5", "Школа", &h.minsk_district, 300, 20).await;

    let mut edited = original.clone();
    edited.name = "Лицей №5".to_string();
    edited.institution_type = "Лицей".to_string();
    edited.district_id = h.grodno_district.id;
    edited.has_library = true;
    edited.license_expiry_date = NaiveDate::from_ymd_opt(2031, 8, 31);
    edited.foundation_year = 1979;
    assert!(repo.update_institution(&edited).await.unwrap());

    let stored = repo.get_institution(original.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Лицей №5");
    assert_eq!(stored.institution_type, "Лицей");
    assert_eq!(stored.region_id(), Some(h.grodno.id));
    assert!(stored.has_library);
    assert_eq!(stored.license_expiry_display(), "31.08.2031");
    assert_eq!(stored.foundation_year, 1979);
}

#[tokio::test]
async fn test_search_combines_criteria() {
    let repo = LocalRepository::new();
    let h = support::build_hierarchy(&repo).await;
    support::add_institution(&repo, "Гимназия №1", "Гимназия", &h.minsk_district, 850, 45).await;
    support::add_institution(&repo, "Средняя школа №2", "Школа", &h.grodno_district, 620, 38)
        .await;
    support::add_institution(&repo, "Средняя школа №3", "Школа", &h.minsk_district, 410, 30)
        .await;

    let by_text = repo
        .search_institutions(&InstitutionFilter::new().with_text("ШКОЛА"))
        .await
        .unwrap();
    assert_eq!(by_text.len(), 2);

    let combined = repo
        .search_institutions(
            &InstitutionFilter::new()
                .with_text("школа")
                .with_region(h.minsk.id),
        )
        .await
        .unwrap();
    assert_eq!(combined.len(), 1);
    assert_eq!(combined[0].name, "Средняя школа №3");

    let everything = repo
        .search_institutions(&InstitutionFilter::new().with_type("   "))
        .await
        .unwrap();
    assert_eq!(everything.len(), 3);
    assert!(everything.windows(2).all(|w| w[0].id.value() < w[1].id.value()));
}
