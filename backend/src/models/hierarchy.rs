//! Region and District models.

use serde::{Deserialize, Serialize};

crate::define_id_type!(
    /// Strongly-typed identifier for a region row.
    i32,
    RegionId
);
crate::define_id_type!(
    /// Strongly-typed identifier for a district row.
    i32,
    DistrictId
);

/// Top-level administrative unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
}

impl Region {
    /// A region that has not been stored yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RegionId::default(),
            name: name.into(),
        }
    }
}

/// District within a region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub id: DistrictId,
    pub name: String,
    pub region_id: RegionId,
    /// Parent region, filled in by the repository on reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

impl District {
    /// A district that has not been stored yet.
    pub fn new(name: impl Into<String>, region_id: RegionId) -> Self {
        Self {
            id: DistrictId::default(),
            name: name.into(),
            region_id,
            region: None,
        }
    }

    /// Label used by district reports: `"district (region)"`.
    ///
    /// The region name comes from the hydrated parent, or from `regions` when
    /// the district was not hydrated.
    pub fn display_label(&self, regions: &[Region]) -> String {
        let region_name = self
            .region
            .as_ref()
            .or_else(|| regions.iter().find(|r| r.id == self.region_id))
            .map(|r| r.name.as_str())
            .unwrap_or("");
        format!("{} ({})", self.name, region_name)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl std::fmt::Display for District {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
