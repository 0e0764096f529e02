//! Dashboard summary of the registry.

use serde::{Deserialize, Serialize};

use super::reports::ReportSnapshot;
use crate::models::Institution;

/// Number of institutions listed as recently registered.
pub const RECENT_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total_institutions: usize,
    pub total_students: i64,
    pub total_teachers: i64,
    pub total_staff: i64,
    /// Most recently registered institutions, newest first.
    pub recent_institutions: Vec<Institution>,
}

/// Totals over every institution in the snapshot plus the latest registrations.
///
/// Institutions registered on the same day keep id order.
pub fn overview(snapshot: &ReportSnapshot) -> Overview {
    let institutions = &snapshot.institutions;

    let mut recent: Vec<&Institution> = institutions.iter().collect();
    recent.sort_by(|a, b| {
        b.registration_date
            .cmp(&a.registration_date)
            .then(a.id.cmp(&b.id))
    });

    Overview {
        total_institutions: institutions.len(),
        total_students: institutions.iter().map(|i| i.student_count as i64).sum(),
        total_teachers: institutions.iter().map(|i| i.teacher_count as i64).sum(),
        total_staff: institutions.iter().map(|i| i.staff_count as i64).sum(),
        recent_institutions: recent.into_iter().take(RECENT_LIMIT).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DistrictId, InstitutionId};
    use chrono::NaiveDate;

    fn registered(id: i32, y: i32, m: u32, d: u32, students: i32) -> Institution {
        let mut inst = Institution::new(format!("I{}", id), "Школа", DistrictId(1));
        inst.id = InstitutionId(id);
        inst.registration_date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        inst.student_count = students;
        inst.teacher_count = 1;
        inst.staff_count = 2;
        inst
    }

    #[test]
    fn test_recent_institutions_newest_first() {
        let snapshot = ReportSnapshot::new(
            vec![],
            vec![],
            vec![
                registered(1, 2018, 9, 1, 10),
                registered(2, 2021, 3, 1, 20),
                registered(3, 2020, 1, 15, 30),
                registered(4, 2019, 5, 5, 40),
            ],
        );
        let o = overview(&snapshot);
        assert_eq!(o.total_institutions, 4);
        assert_eq!(o.total_students, 100);
        assert_eq!(o.total_teachers, 4);
        assert_eq!(o.total_staff, 8);
        let ids: Vec<i32> = o.recent_institutions.iter().map(|i| i.id.value()).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_empty_overview() {
        let o = overview(&ReportSnapshot::new(vec![], vec![], vec![]));
        assert_eq!(o.total_institutions, 0);
        assert!(o.recent_institutions.is_empty());
    }
}
