//! Institution model and its derived display values.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::hierarchy::{District, DistrictId, RegionId};

crate::define_id_type!(
    /// Strongly-typed identifier for an institution row.
    i32,
    InstitutionId
);

pub const DEFAULT_STATUS: &str = "Активно";
pub const DEFAULT_OWNERSHIP_TYPE: &str = "Государственное";
pub const DEFAULT_LANGUAGE: &str = "Русский";
pub const DEFAULT_INSTITUTION_STATUS: &str = "Действующее";

/// Educational institution registered in a district.
///
/// Counters are plain integers; callers are trusted to keep them non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    pub id: InstitutionId,
    pub name: String,
    #[serde(rename = "type")]
    pub institution_type: String,
    pub address: String,
    pub contacts: String,
    pub district_id: DistrictId,
    /// Parent district (with its region), filled in by the repository on reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<District>,
    pub status: String,
    pub registration_date: NaiveDate,

    // Contingent
    pub student_count: i32,
    pub admitted_count: i32,
    pub expelled_count: i32,
    pub staff_count: i32,
    pub teacher_count: i32,
    pub administrative_staff_count: i32,

    // Infrastructure
    pub classroom_count: i32,
    pub computer_count: i32,
    pub has_sports_hall: bool,
    pub has_dining_room: bool,
    pub has_library: bool,
    pub total_area: f64,

    // Registration details
    pub license_number: String,
    pub license_expiry_date: Option<NaiveDate>,
    pub accreditation_category: String,
    pub ownership_type: String,
    pub language_of_education: String,
    pub director_name: String,
    pub email: String,
    pub website: String,
    pub foundation_year: i32,
    pub institution_status: String,
    pub specialization: String,
    pub educational_programs: String,
    pub infrastructure: String,
}

impl Default for Institution {
    fn default() -> Self {
        let today = Local::now().date_naive();
        Self {
            id: InstitutionId::default(),
            name: String::new(),
            institution_type: String::new(),
            address: String::new(),
            contacts: String::new(),
            district_id: DistrictId::default(),
            district: None,
            status: DEFAULT_STATUS.to_string(),
            registration_date: today,
            student_count: 0,
            admitted_count: 0,
            expelled_count: 0,
            staff_count: 0,
            teacher_count: 0,
            administrative_staff_count: 0,
            classroom_count: 0,
            computer_count: 0,
            has_sports_hall: false,
            has_dining_room: false,
            has_library: false,
            total_area: 0.0,
            license_number: String::new(),
            license_expiry_date: None,
            accreditation_category: String::new(),
            ownership_type: DEFAULT_OWNERSHIP_TYPE.to_string(),
            language_of_education: DEFAULT_LANGUAGE.to_string(),
            director_name: String::new(),
            email: String::new(),
            website: String::new(),
            foundation_year: today.year(),
            institution_status: DEFAULT_INSTITUTION_STATUS.to_string(),
            specialization: String::new(),
            educational_programs: String::new(),
            infrastructure: String::new(),
        }
    }
}

impl Institution {
    /// A new, unsaved institution with the registry defaults.
    pub fn new(
        name: impl Into<String>,
        institution_type: impl Into<String>,
        district_id: DistrictId,
    ) -> Self {
        Self {
            name: name.into(),
            institution_type: institution_type.into(),
            district_id,
            ..Default::default()
        }
    }

    /// Region of the hydrated parent district, if loaded.
    pub fn region_id(&self) -> Option<RegionId> {
        self.district.as_ref().map(|d| d.region_id)
    }

    /// Students per teacher, or `0.0` when there are no teachers.
    pub fn student_teacher_ratio(&self) -> f64 {
        if self.teacher_count > 0 {
            self.student_count as f64 / self.teacher_count as f64
        } else {
            0.0
        }
    }

    /// Ratio formatted as `"1:R"`, or `"0"` when either count is zero.
    pub fn ratio_display(&self) -> String {
        if self.teacher_count > 0 && self.student_count > 0 {
            format!("1:{:.1}", self.student_teacher_ratio())
        } else {
            "0".to_string()
        }
    }

    pub fn registration_date_display(&self) -> String {
        self.registration_date.format("%d.%m.%Y").to_string()
    }

    pub fn license_expiry_display(&self) -> String {
        self.license_expiry_date
            .map(|d| d.format("%d.%m.%Y").to_string())
            .unwrap_or_else(|| "Не указана".to_string())
    }
}

impl std::fmt::Display for Institution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
