use waymap_core::geo;

use crate::edge::HGEdge;
use crate::graph::HighwayGraph;
use crate::vertex::HGVertex;

/// a geographic disk restricting an area subgraph: a place name, file
/// base name, center, and radius in miles.
#[derive(Debug, Clone)]
pub struct PlaceRadius {
    pub place: String,
    pub base: String,
    pub lat: f64,
    pub lng: f64,
    pub radius: u32,
}

impl PlaceRadius {
    pub fn new(place: String, base: String, lat: f64, lng: f64, radius: u32) -> Self {
        Self {
            place,
            base,
            lat,
            lng,
            radius,
        }
    }

    /// whether a vertex lies within the disk, by unscaled great-circle
    /// distance.
    pub fn contains_vertex(&self, v: &HGVertex) -> bool {
        geo::arc_distance(self.lat, self.lng, v.lat, v.lng) <= self.radius as f64
    }

    /// whether both endpoints of an edge lie within the disk.
    pub fn contains_edge(&self, graph: &HighwayGraph, e: &HGEdge) -> bool {
        self.contains_vertex(graph.vertex(e.vertex1)) && self.contains_vertex(graph.vertex(e.vertex2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waymap_core::model::WaypointId;

    #[test]
    fn test_contains_vertex() {
        let pr = PlaceRadius::new(String::from("Philadelphia"), String::from("phl"), 40.0, -75.0, 5);
        let near = HGVertex::new(40.01, -75.01, String::from("near"), WaypointId(0));
        let far = HGVertex::new(41.0, -75.0, String::from("far"), WaypointId(1));
        assert!(pr.contains_vertex(&near));
        assert!(!pr.contains_vertex(&far));
    }
}
