use waymap_core::model::{RegionId, SystemId, WaypointId};

use crate::edge::EdgeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

impl VertexId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// a graph vertex: one surviving location with a unique canonical name.
///
/// visibility values:
/// - 0: hidden everywhere outside simple graphs
/// - 1: visible only in the traveled graph (a traveler's clinched
///   travels end here)
/// - 2: visible in collapsed and traveled graphs
#[derive(Debug, Clone)]
pub struct HGVertex {
    pub lat: f64,
    pub lng: f64,
    pub unique_name: String,
    pub visibility: u8,
    /// front of the colocation list this vertex represents
    pub first_waypoint: WaypointId,
    pub regions: Vec<RegionId>,
    pub systems: Vec<SystemId>,
    pub incident_s_edges: Vec<EdgeId>,
    pub incident_c_edges: Vec<EdgeId>,
    pub incident_t_edges: Vec<EdgeId>,
}

impl HGVertex {
    pub fn new(
        lat: f64,
        lng: f64,
        unique_name: String,
        first_waypoint: WaypointId,
    ) -> Self {
        Self {
            lat,
            lng,
            unique_name,
            visibility: 0,
            first_waypoint,
            regions: vec![],
            systems: vec![],
            incident_s_edges: vec![],
            incident_c_edges: vec![],
            incident_t_edges: vec![],
        }
    }
}
