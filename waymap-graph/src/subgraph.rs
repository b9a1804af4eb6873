//! subgraph descriptors and the vertex/edge matching that slices the
//! master graph by region, system, and place radius.

use std::collections::HashSet;

use waymap_core::model::{HighwayData, RegionId, SystemId};

use crate::edge::EdgeId;
use crate::graph::HighwayGraph;
use crate::place_radius::PlaceRadius;
use crate::vertex::VertexId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Simple,
    Collapsed,
    Traveled,
}

impl GraphFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Collapsed => "collapsed",
            Self::Traveled => "traveled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphCategory {
    Master,
    Area,
    Region,
    System,
    Multisystem,
    Multiregion,
    Country,
    Continent,
    Fullcustom,
}

impl GraphCategory {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Area => "area",
            Self::Region => "region",
            Self::System => "system",
            Self::Multisystem => "multisystem",
            Self::Multiregion => "multiregion",
            Self::Country => "country",
            Self::Continent => "continent",
            Self::Fullcustom => "fullcustom",
        }
    }
}

/// one generated graph file, and the row describing it in the graphs
/// database table. subgraph restrictions live here so workers can write
/// each descriptor independently.
#[derive(Debug, Clone)]
pub struct GraphListEntry {
    pub root: String,
    pub descr: String,
    pub format: GraphFormat,
    pub category: GraphCategory,
    pub regions: Option<Vec<RegionId>>,
    pub systems: Option<Vec<SystemId>>,
    pub placeradius: Option<PlaceRadius>,
    pub vertices: usize,
    pub edges: usize,
    pub travelers: usize,
}

impl GraphListEntry {
    /// the three descriptor rows (simple, collapsed, traveled) for one
    /// subgraph.
    pub fn trio(
        root: String,
        descr: String,
        category: GraphCategory,
        regions: Option<Vec<RegionId>>,
        systems: Option<Vec<SystemId>>,
        placeradius: Option<PlaceRadius>,
    ) -> Vec<GraphListEntry> {
        [GraphFormat::Simple, GraphFormat::Collapsed, GraphFormat::Traveled]
            .into_iter()
            .map(|format| GraphListEntry {
                root: root.clone(),
                descr: descr.clone(),
                format,
                category,
                regions: regions.clone(),
                systems: systems.clone(),
                placeradius: placeradius.clone(),
                vertices: 0,
                edges: 0,
                travelers: 0,
            })
            .collect()
    }

    pub fn filename(&self) -> String {
        match self.format {
            GraphFormat::Simple => format!("{}-simple.tmg", self.root),
            GraphFormat::Collapsed => format!("{}.tmg", self.root),
            GraphFormat::Traveled => format!("{}-traveled.tmg", self.root),
        }
    }
}

/// the vertex and edge sets matched for one subgraph descriptor, in
/// deterministic (id) order.
#[derive(Debug, Default)]
pub struct MatchedSubgraph {
    pub vertices: Vec<VertexId>,
    pub simple_edges: Vec<EdgeId>,
    pub collapsed_edges: Vec<EdgeId>,
    pub traveled_edges: Vec<EdgeId>,
}

impl HighwayGraph {
    /// compute the vertices and per-format edges matching a descriptor's
    /// restrictions. region and system restrictions intersect; a place
    /// radius keeps only in-range vertices and edges with both endpoints
    /// in range.
    pub fn matching_subgraph(
        &self,
        data: &HighwayData,
        entry: &GraphListEntry,
    ) -> MatchedSubgraph {
        let mut matched = MatchedSubgraph::default();
        let pr = entry.placeradius.as_ref();

        let mut vertex_set: HashSet<VertexId> = match (&entry.regions, &entry.systems) {
            (Some(regions), systems) => {
                let mut set = HashSet::new();
                for r in regions {
                    if let Some(vs) = self.region_vertices.get(r) {
                        set.extend(vs);
                    }
                }
                if let Some(systems) = systems {
                    let mut sys_set: HashSet<VertexId> = HashSet::new();
                    for s in systems {
                        if let Some(vs) = self.system_vertices.get(s) {
                            sys_set.extend(vs);
                        }
                    }
                    set.retain(|v| sys_set.contains(v));
                }
                set
            }
            (None, Some(systems)) => {
                let mut set = HashSet::new();
                for s in systems {
                    if let Some(vs) = self.system_vertices.get(s) {
                        set.extend(vs);
                    }
                }
                set
            }
            (None, None) => (0..self.vertices.len() as u32)
                .map(VertexId)
                .filter(|&v| pr.map_or(true, |p| p.contains_vertex(self.vertex(v))))
                .collect(),
        };
        if pr.is_some() && (entry.regions.is_some() || entry.systems.is_some()) {
            vertex_set.retain(|&v| pr.unwrap().contains_vertex(self.vertex(v)));
        }

        // simple edges, from the per-region and per-system edge sets
        let mut simple_set: HashSet<EdgeId> = match (&entry.regions, &entry.systems) {
            (Some(regions), systems) => {
                let mut set = HashSet::new();
                for r in regions {
                    if let Some(es) = self.region_edges.get(r) {
                        set.extend(es);
                    }
                }
                if let Some(systems) = systems {
                    let mut sys_set: HashSet<EdgeId> = HashSet::new();
                    for s in systems {
                        if let Some(es) = self.system_edges.get(s) {
                            sys_set.extend(es);
                        }
                    }
                    set.retain(|e| sys_set.contains(e));
                }
                set
            }
            (None, Some(systems)) => {
                let mut set = HashSet::new();
                for s in systems {
                    if let Some(es) = self.system_edges.get(s) {
                        set.extend(es);
                    }
                }
                set
            }
            (None, None) => {
                let mut set = HashSet::new();
                for &v in &vertex_set {
                    for &e in &self.vertex(v).incident_s_edges {
                        if pr.map_or(true, |p| p.contains_edge(self, self.edge(e))) {
                            set.insert(e);
                        }
                    }
                }
                set
            }
        };
        if pr.is_some() && (entry.regions.is_some() || entry.systems.is_some()) {
            simple_set.retain(|&e| pr.unwrap().contains_edge(self, self.edge(e)));
        }

        // collapsed and traveled edges, via incident lists of matched
        // visible vertices
        let mut collapsed_set: HashSet<EdgeId> = HashSet::new();
        let mut traveled_set: HashSet<EdgeId> = HashSet::new();
        for &v in &vertex_set {
            let vertex = self.vertex(v);
            if vertex.visibility >= 2 {
                for &e in &vertex.incident_c_edges {
                    if self.edge_matches(data, e, entry) {
                        collapsed_set.insert(e);
                    }
                }
            }
            if vertex.visibility >= 1 {
                for &e in &vertex.incident_t_edges {
                    if self.edge_matches(data, e, entry) {
                        traveled_set.insert(e);
                    }
                }
            }
        }

        matched.vertices = sorted(vertex_set);
        matched.simple_edges = sorted(simple_set);
        matched.collapsed_edges = sorted(collapsed_set);
        matched.traveled_edges = sorted(traveled_set);
        matched
    }

    fn edge_matches(&self, data: &HighwayData, e: EdgeId, entry: &GraphListEntry) -> bool {
        let edge = self.edge(e);
        if let Some(pr) = entry.placeradius.as_ref() {
            if !pr.contains_edge(self, edge) {
                return false;
            }
        }
        if let Some(regions) = &entry.regions {
            let region = data.route(data.segment(edge.segment).route).region;
            if !regions.contains(&region) {
                return false;
            }
        }
        if let Some(systems) = &entry.systems {
            if !edge
                .route_names_and_systems
                .iter()
                .any(|(_, s)| systems.contains(s))
            {
                return false;
            }
        }
        true
    }
}

fn sorted<T: Ord + Copy>(set: HashSet<T>) -> Vec<T> {
    let mut out: Vec<T> = set.into_iter().collect();
    out.sort();
    out
}
