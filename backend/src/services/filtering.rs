//! Institution filter engine.
//!
//! An [`InstitutionFilter`] is an AND-composition of optional criteria. Any
//! criterion left unset (or set to an empty string) is not applied, so the
//! default filter matches every institution.
//!
//! Name matching is a case-insensitive substring test using Unicode lowercase
//! on both sides, so Cyrillic names fold the same way Latin ones do.
//! Filtered results keep institution id order.

use serde::{Deserialize, Serialize};

use crate::models::{DistrictId, Institution, RegionId};

/// Combinable predicate over institutions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionFilter {
    /// Substring of the institution name.
    pub text: Option<String>,
    /// Region of the institution's district.
    pub region_id: Option<RegionId>,
    pub district_id: Option<DistrictId>,
    /// Exact institution type, e.g. `"Школа"`.
    pub institution_type: Option<String>,
    /// Exact status, e.g. `"Активно"`.
    pub status: Option<String>,
}

impl InstitutionFilter {
    /// Filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_region(mut self, region_id: RegionId) -> Self {
        self.region_id = Some(region_id);
        self
    }

    pub fn with_district(mut self, district_id: DistrictId) -> Self {
        self.district_id = Some(district_id);
        self
    }

    pub fn with_type(mut self, institution_type: impl Into<String>) -> Self {
        self.institution_type = Some(institution_type.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Lowercased name needle, or `None` when the text criterion is omitted.
    pub fn name_needle(&self) -> Option<String> {
        non_empty(&self.text).map(|t| t.to_lowercase())
    }

    /// Type criterion, ignoring empty strings.
    pub fn type_criterion(&self) -> Option<&str> {
        non_empty(&self.institution_type)
    }

    /// Status criterion, ignoring empty strings.
    pub fn status_criterion(&self) -> Option<&str> {
        non_empty(&self.status)
    }

    /// True when no criterion is applied.
    pub fn is_empty(&self) -> bool {
        self.name_needle().is_none()
            && self.region_id.is_none()
            && self.district_id.is_none()
            && self.type_criterion().is_none()
            && self.status_criterion().is_none()
    }

    /// Name criterion only. Storage backends that evaluate the exact-match
    /// criteria in SQL use this for the remaining in-process step.
    pub fn matches_name(&self, institution: &Institution) -> bool {
        match self.name_needle() {
            Some(needle) => institution.name.to_lowercase().contains(&needle),
            None => true,
        }
    }

    /// Full predicate.
    ///
    /// The region criterion needs the hydrated district; an institution
    /// without one never matches a region filter.
    pub fn matches(&self, institution: &Institution) -> bool {
        if let Some(region_id) = self.region_id {
            if institution.region_id() != Some(region_id) {
                return false;
            }
        }

        if let Some(district_id) = self.district_id {
            if institution.district_id != district_id {
                return false;
            }
        }

        if let Some(institution_type) = self.type_criterion() {
            if institution.institution_type != institution_type {
                return false;
            }
        }

        if let Some(status) = self.status_criterion() {
            if institution.status != status {
                return false;
            }
        }

        self.matches_name(institution)
    }

    /// Apply the filter to a set of institutions, returning matches in id order.
    pub fn apply<'a, I>(&self, institutions: I) -> Vec<Institution>
    where
        I: IntoIterator<Item = &'a Institution>,
    {
        let mut matched: Vec<Institution> = institutions
            .into_iter()
            .filter(|i| self.matches(i))
            .cloned()
            .collect();
        matched.sort_by_key(|i| i.id);
        matched
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
