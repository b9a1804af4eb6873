use std::collections::{BTreeSet, HashMap, HashSet};

use crate::model::{ConnectedRouteId, RegionId, SegmentId, SystemId, WaypointId};

/// one chopped route: a line of a system's route csv plus the waypoints
/// read from its .wpt file.
///
/// the label hashes map canonical (uppercased, mark-stripped) labels to
/// point indices for traveler-list matching; labels that appear more than
/// once land in `duplicate_labels` and cannot be matched.
#[derive(Debug, Clone)]
pub struct Route {
    pub system: SystemId,
    pub region: RegionId,
    pub route: String,
    pub banner: String,
    pub abbrev: String,
    pub city: String,
    pub root: String,
    pub alt_route_names: Vec<String>,

    pub con_route: Option<ConnectedRouteId>,
    /// position within the connected route, -1 until assigned
    pub root_order: i32,
    pub is_reversed: bool,
    pub disconnected: bool,

    pub points: Vec<WaypointId>,
    pub segments: Vec<SegmentId>,

    pub pri_label_hash: HashMap<String, usize>,
    pub alt_label_hash: HashMap<String, usize>,
    pub duplicate_labels: HashSet<String>,
    pub labels_in_use: BTreeSet<String>,
    pub unused_alt_labels: BTreeSet<String>,

    pub mileage: f64,
    /// newest updates.csv entry matching this root, if any
    pub last_update: Option<usize>,
}

impl Route {
    /// route name as it appears in traveler list files.
    pub fn list_entry_name(&self) -> String {
        format!("{}{}{}", self.route, self.banner, self.abbrev)
    }

    /// name form commonly used in intersecting-route labels, where the
    /// abbrev is usually omitted.
    pub fn name_no_abbrev(&self) -> String {
        format!("{}{}", self.route, self.banner)
    }

    /// resolve a canonical label to a point index, primary hash first.
    pub fn label_index(&self, canonical: &str) -> Option<usize> {
        self.pri_label_hash
            .get(canonical)
            .or_else(|| self.alt_label_hash.get(canonical))
            .copied()
    }

    /// index of the first point when walking in connected-route order.
    pub fn con_beg(&self) -> Option<WaypointId> {
        if self.is_reversed {
            self.points.last().copied()
        } else {
            self.points.first().copied()
        }
    }

    /// index of the last point when walking in connected-route order.
    pub fn con_end(&self) -> Option<WaypointId> {
        if self.is_reversed {
            self.points.first().copied()
        } else {
            self.points.last().copied()
        }
    }
}
