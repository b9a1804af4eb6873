use waymap_core::model::{SegmentId, SystemId};

use crate::vertex::VertexId;

/// format mask bits: which graph views an edge currently belongs to.
pub const SIMPLE: u8 = 1;
pub const COLLAPSED: u8 = 2;
pub const TRAVELED: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl EdgeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// a graph edge, possibly carrying intermediate points for compressed
/// chains through hidden vertices.
///
/// an edge with format 0 has been fully replaced by collapse merges and
/// is dead; it stays in the arena but belongs to no view.
#[derive(Debug, Clone)]
pub struct HGEdge {
    pub format: u8,
    pub segment_name: String,
    pub vertex1: VertexId,
    pub vertex2: VertexId,
    /// run from vertex1 to vertex2
    pub intermediate_points: Vec<VertexId>,
    /// canonical segment, for region and traveler lookups
    pub segment: SegmentId,
    /// list name and system of each concurrent non-devel route
    pub route_names_and_systems: Vec<(String, SystemId)>,
}

impl HGEdge {
    /// the comma-joined edge label, optionally restricted to a system set.
    pub fn label(&self, systems: Option<&[SystemId]>) -> String {
        let mut out = String::new();
        for (name, system) in &self.route_names_and_systems {
            if systems.is_some_and(|set| !set.contains(system)) {
                continue;
            }
            if !out.is_empty() {
                out.push(',');
            }
            out.push_str(name);
        }
        out
    }

    /// the endpoint opposite `v`.
    pub fn other_vertex(&self, v: VertexId) -> VertexId {
        if self.vertex1 == v {
            self.vertex2
        } else {
            self.vertex1
        }
    }
}
