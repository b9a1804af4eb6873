use crate::bitset::TravelerBitset;
use crate::model::{ConcurrencyId, RouteId, WaypointId};

/// the stretch of one route between two adjacent waypoints. segments on
/// shared pavement point at a common concurrency group.
#[derive(Debug, Clone)]
pub struct HighwaySegment {
    pub waypoint1: WaypointId,
    pub waypoint2: WaypointId,
    pub route: RouteId,
    pub length: f64,
    pub concurrent: Option<ConcurrencyId>,
    /// travelers who clinched this segment, by traveler index
    pub clinched_by: TravelerBitset,
}

impl HighwaySegment {
    pub fn new(waypoint1: WaypointId, waypoint2: WaypointId, route: RouteId, length: f64) -> Self {
        Self {
            waypoint1,
            waypoint2,
            route,
            length,
            concurrent: None,
            clinched_by: TravelerBitset::new(),
        }
    }

    pub fn endpoints(&self) -> (WaypointId, WaypointId) {
        (self.waypoint1, self.waypoint2)
    }

    pub fn joins(&self, a: WaypointId, b: WaypointId) -> bool {
        (self.waypoint1 == a && self.waypoint2 == b)
            || (self.waypoint1 == b && self.waypoint2 == a)
    }
}
