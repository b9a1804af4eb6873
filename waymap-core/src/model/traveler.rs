use std::collections::HashSet;

use indexmap::IndexMap;

use crate::model::{RegionId, RouteId, SegmentId, SystemId};

/// one user's travels, read from a .list file named after the traveler.
///
/// the mileage maps are created with all required keys during list
/// processing and concurrency augmentation so that the stats reduction
/// only ever updates existing entries.
#[derive(Debug, Clone, Default)]
pub struct TravelerList {
    pub name: String,
    pub clinched_segments: HashSet<SegmentId>,
    pub active_preview_mileage_by_region: IndexMap<RegionId, f64>,
    pub active_only_mileage_by_region: IndexMap<RegionId, f64>,
    pub system_region_mileages: IndexMap<SystemId, IndexMap<RegionId, f64>>,
    /// routes listed by this traveler, for "route updated" notices
    pub routes: HashSet<RouteId>,
    /// .list file modification date, YYYY-MM-DD
    pub file_date: Option<String>,
}

impl TravelerList {
    pub fn new(name: String, file_date: Option<String>) -> Self {
        Self {
            name,
            file_date,
            ..Self::default()
        }
    }

    /// total active-system mileage across regions.
    pub fn active_only_miles(&self) -> f64 {
        self.active_only_mileage_by_region.values().sum()
    }

    /// total active+preview mileage across regions.
    pub fn active_preview_miles(&self) -> f64 {
        self.active_preview_mileage_by_region.values().sum()
    }

    /// mileage across all regions for one system.
    pub fn system_miles(&self, system: SystemId) -> f64 {
        self.system_region_mileages
            .get(&system)
            .map(|by_region| by_region.values().sum())
            .unwrap_or(0.0)
    }
}
