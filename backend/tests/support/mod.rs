#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use edu_registry::db::repository::{DistrictRepository, InstitutionRepository, RegionRepository};
use edu_registry::models::{District, Institution, Region};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the previous values on unwind, and serializes access to the
/// process-global environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Ids of a small two-region hierarchy created by [`build_hierarchy`].
pub struct Hierarchy {
    pub minsk: Region,
    pub grodno: Region,
    pub minsk_district: District,
    pub grodno_district: District,
}

/// Two regions with one district each.
pub async fn build_hierarchy<R>(repo: &R) -> Hierarchy
where
    R: RegionRepository + DistrictRepository + ?Sized,
{
    let minsk = repo.add_region(&Region::new("Минская область")).await.unwrap();
    let grodno = repo
        .add_region(&Region::new("Гродненская область"))
        .await
        .unwrap();
    let minsk_district = repo
        .add_district(&District::new("Минский район", minsk.id))
        .await
        .unwrap();
    let grodno_district = repo
        .add_district(&District::new("Гродненский район", grodno.id))
        .await
        .unwrap();

    Hierarchy {
        minsk,
        grodno,
        minsk_district,
        grodno_district,
    }
}

/// Insert an institution with the given counters.
pub async fn add_institution<R>(
    repo: &R,
    name: &str,
    institution_type: &str,
    district: &District,
    students: i32,
    teachers: i32,
) -> Institution
where
    R: InstitutionRepository + ?Sized,
{
    let mut institution = Institution::new(name, institution_type, district.id);
    institution.student_count = students;
    institution.teacher_count = teachers;
    repo.add_institution(&institution).await.unwrap()
}
