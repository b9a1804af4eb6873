use crate::geo;
use crate::model::{ColocationId, RouteId, WaypointId};

/// one waypoint from a route's .wpt file: a primary label, any hidden or
/// deprecated alternate labels, and coordinates decoded from the OSM URL.
#[derive(Debug, Clone)]
pub struct Waypoint {
    pub label: String,
    pub alt_labels: Vec<String>,
    pub lat: f64,
    pub lng: f64,
    /// hidden shaping points have labels starting with '+'
    pub is_hidden: bool,
    pub route: RouteId,
    /// shared list of all waypoints at this exact location, if any
    pub colocated: Option<ColocationId>,
    /// waypoints within the near-miss tolerance but not colocated
    pub near_miss_points: Vec<WaypointId>,
}

impl Waypoint {
    pub fn same_coords(&self, other: &Waypoint) -> bool {
        self.lat == other.lat && self.lng == other.lng
    }

    pub fn nearby(&self, other: &Waypoint, tolerance: f64) -> bool {
        geo::nearby(self.lat, self.lng, other.lat, other.lng, tolerance)
    }

    pub fn distance_to(&self, other: &Waypoint) -> f64 {
        geo::distance(self.lat, self.lng, other.lat, other.lng)
    }
}
