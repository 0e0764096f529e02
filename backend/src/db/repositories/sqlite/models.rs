use chrono::NaiveDate;
use diesel::prelude::*;

use super::schema::{districts, institutions, regions};
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::{District, DistrictId, Institution, InstitutionId, Region, RegionId};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = regions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RegionRow {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = regions)]
pub struct NewRegionRow {
    pub name: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = districts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DistrictRow {
    pub id: i32,
    pub name: String,
    pub region_id: i32,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = districts)]
pub struct NewDistrictRow {
    pub name: String,
    pub region_id: i32,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = institutions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InstitutionRow {
    pub id: i32,
    pub name: String,
    pub institution_type: String,
    pub address: String,
    pub contacts: Option<String>,
    pub district_id: i32,
    pub status: String,
    pub registration_date: String,
    pub student_count: i32,
    pub admitted_count: i32,
    pub expelled_count: i32,
    pub staff_count: i32,
    pub license_number: Option<String>,
    pub license_expiry_date: Option<String>,
    pub accreditation_category: Option<String>,
    pub ownership_type: Option<String>,
    pub language_of_education: Option<String>,
    pub director_name: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub foundation_year: Option<i32>,
    pub institution_status: Option<String>,
    pub classroom_count: Option<i32>,
    pub teacher_count: Option<i32>,
    pub administrative_staff_count: Option<i32>,
    pub computer_count: Option<i32>,
    pub has_sports_hall: Option<bool>,
    pub has_dining_room: Option<bool>,
    pub has_library: Option<bool>,
    pub total_area: Option<f64>,
    pub specialization: Option<String>,
    pub educational_programs: Option<String>,
    pub infrastructure: Option<String>,
}

/// Every mutable institution column; used for inserts and full-replace updates.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = institutions)]
#[diesel(treat_none_as_null = true)]
pub struct NewInstitutionRow {
    pub name: String,
    pub institution_type: String,
    pub address: String,
    pub contacts: Option<String>,
    pub district_id: i32,
    pub status: String,
    pub registration_date: String,
    pub student_count: i32,
    pub admitted_count: i32,
    pub expelled_count: i32,
    pub staff_count: i32,
    pub license_number: String,
    pub license_expiry_date: Option<String>,
    pub accreditation_category: String,
    pub ownership_type: String,
    pub language_of_education: String,
    pub director_name: String,
    pub email: String,
    pub website: String,
    pub foundation_year: i32,
    pub institution_status: String,
    pub classroom_count: i32,
    pub teacher_count: i32,
    pub administrative_staff_count: i32,
    pub computer_count: i32,
    pub has_sports_hall: bool,
    pub has_dining_room: bool,
    pub has_library: bool,
    pub total_area: f64,
    pub specialization: String,
    pub educational_programs: String,
    pub infrastructure: String,
}

impl From<RegionRow> for Region {
    fn from(row: RegionRow) -> Self {
        Region {
            id: RegionId(row.id),
            name: row.name,
        }
    }
}

impl From<&Region> for NewRegionRow {
    fn from(region: &Region) -> Self {
        NewRegionRow {
            name: region.name.clone(),
        }
    }
}

impl DistrictRow {
    pub fn into_district(self, region: Option<RegionRow>) -> District {
        District {
            id: DistrictId(self.id),
            name: self.name,
            region_id: RegionId(self.region_id),
            region: region.map(Region::from),
        }
    }
}

impl From<&District> for NewDistrictRow {
    fn from(district: &District) -> Self {
        NewDistrictRow {
            name: district.name.clone(),
            region_id: district.region_id.value(),
        }
    }
}

/// Parse a stored date.
///
/// Only the leading `YYYY-MM-DD` part is read, so values written with a time
/// component (`2020-01-15 00:00:00`) are accepted too.
pub fn parse_stored_date(value: &str) -> RepositoryResult<NaiveDate> {
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .map_err(|e| RepositoryError::internal(format!("Invalid stored date '{}': {}", value, e)))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

impl InstitutionRow {
    pub fn into_institution(self, district: Option<District>) -> RepositoryResult<Institution> {
        let registration_date = parse_stored_date(&self.registration_date)?;
        let license_expiry_date = match self.license_expiry_date.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Some(parse_stored_date(s)?),
            _ => None,
        };

        let defaults = Institution::default();

        Ok(Institution {
            id: InstitutionId(self.id),
            name: self.name,
            institution_type: self.institution_type,
            address: self.address,
            contacts: self.contacts.unwrap_or_default(),
            district_id: DistrictId(self.district_id),
            district,
            status: self.status,
            registration_date,
            student_count: self.student_count,
            admitted_count: self.admitted_count,
            expelled_count: self.expelled_count,
            staff_count: self.staff_count,
            teacher_count: self.teacher_count.unwrap_or(defaults.teacher_count),
            administrative_staff_count: self
                .administrative_staff_count
                .unwrap_or(defaults.administrative_staff_count),
            classroom_count: self.classroom_count.unwrap_or(defaults.classroom_count),
            computer_count: self.computer_count.unwrap_or(defaults.computer_count),
            has_sports_hall: self.has_sports_hall.unwrap_or(defaults.has_sports_hall),
            has_dining_room: self.has_dining_room.unwrap_or(defaults.has_dining_room),
            has_library: self.has_library.unwrap_or(defaults.has_library),
            total_area: self.total_area.unwrap_or(defaults.total_area),
            license_number: self.license_number.unwrap_or(defaults.license_number),
            license_expiry_date,
            accreditation_category: self
                .accreditation_category
                .unwrap_or(defaults.accreditation_category),
            ownership_type: self.ownership_type.unwrap_or(defaults.ownership_type),
            language_of_education: self
                .language_of_education
                .unwrap_or(defaults.language_of_education),
            director_name: self.director_name.unwrap_or(defaults.director_name),
            email: self.email.unwrap_or(defaults.email),
            website: self.website.unwrap_or(defaults.website),
            foundation_year: self.foundation_year.unwrap_or(defaults.foundation_year),
            institution_status: self.institution_status.unwrap_or(defaults.institution_status),
            specialization: self.specialization.unwrap_or(defaults.specialization),
            educational_programs: self
                .educational_programs
                .unwrap_or(defaults.educational_programs),
            infrastructure: self.infrastructure.unwrap_or(defaults.infrastructure),
        })
    }
}

impl From<&Institution> for NewInstitutionRow {
    fn from(i: &Institution) -> Self {
        NewInstitutionRow {
            name: i.name.clone(),
            institution_type: i.institution_type.clone(),
            address: i.address.clone(),
            contacts: Some(i.contacts.clone()),
            district_id: i.district_id.value(),
            status: i.status.clone(),
            registration_date: format_date(i.registration_date),
            student_count: i.student_count,
            admitted_count: i.admitted_count,
            expelled_count: i.expelled_count,
            staff_count: i.staff_count,
            license_number: i.license_number.clone(),
            license_expiry_date: i.license_expiry_date.map(format_date),
            accreditation_category: i.accreditation_category.clone(),
            ownership_type: i.ownership_type.clone(),
            language_of_education: i.language_of_education.clone(),
            director_name: i.director_name.clone(),
            email: i.email.clone(),
            website: i.website.clone(),
            foundation_year: i.foundation_year,
            institution_status: i.institution_status.clone(),
            classroom_count: i.classroom_count,
            teacher_count: i.teacher_count,
            administrative_staff_count: i.administrative_staff_count,
            computer_count: i.computer_count,
            has_sports_hall: i.has_sports_hall,
            has_dining_room: i.has_dining_room,
            has_library: i.has_library,
            total_area: i.total_area,
            specialization: i.specialization.clone(),
            educational_programs: i.educational_programs.clone(),
            infrastructure: i.infrastructure.clone(),
        }
    }
}
