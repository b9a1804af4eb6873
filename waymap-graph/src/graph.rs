//! construction of the highway graph: uniquely-named vertices for every
//! surviving location, one edge per concurrency representative, and the
//! hidden-vertex collapse producing the collapsed and traveled views.

use std::collections::{HashMap, HashSet};

use kdam::tqdm;
use waymap_core::datacheck::{DatacheckCode, DatacheckList};
use waymap_core::model::{HighwayData, RegionId, SegmentId, SystemId, WaypointId};
use waymap_core::quadtree::WaypointQuadtree;

use crate::edge::{EdgeId, HGEdge, COLLAPSED, SIMPLE, TRAVELED};
use crate::naming;
use crate::vertex::{HGVertex, VertexId};

#[derive(Debug, Default)]
pub struct HighwayGraph {
    pub vertices: Vec<HGVertex>,
    pub edges: Vec<HGEdge>,
    /// canonical waypoint (colocation front) -> vertex
    pub vertex_by_waypoint: HashMap<WaypointId, VertexId>,
    pub region_vertices: HashMap<RegionId, HashSet<VertexId>>,
    pub system_vertices: HashMap<SystemId, HashSet<VertexId>>,
    pub region_edges: HashMap<RegionId, HashSet<EdgeId>>,
    pub system_edges: HashMap<SystemId, HashSet<EdgeId>>,
    /// one line per naming rewrite, for waypointsimplification.log
    pub naming_log: Vec<String>,
}

impl HighwayGraph {
    pub fn vertex(&self, id: VertexId) -> &HGVertex {
        &self.vertices[id.index()]
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> &mut HGVertex {
        &mut self.vertices[id.index()]
    }

    pub fn edge(&self, id: EdgeId) -> &HGEdge {
        &self.edges[id.index()]
    }

    /// build the graph from loaded highway data. traveler lists must be
    /// processed first so traveled visibility can be assigned.
    pub fn build(
        data: &HighwayData,
        tree: &WaypointQuadtree,
        datachecks: &mut DatacheckList,
    ) -> Self {
        let mut graph = Self::default();
        let (hi_priority, lo_priority) = graph_points(data, tree);
        log::info!(
            "creating unique names and vertices for {} locations",
            hi_priority.len() + lo_priority.len()
        );

        let mut names: HashSet<String> = HashSet::new();
        for w in tqdm!(hi_priority.iter().chain(lo_priority.iter()).copied()) {
            graph.create_vertex(data, w, &mut names, datachecks);
        }

        log::info!("creating edges");
        graph.create_edges(data);
        log::info!(
            "full graph has {} vertices, {} edges",
            graph.vertices.len(),
            graph.simple_edge_count()
        );

        graph.assign_traveled_visibility(data);

        log::info!("compressing collapsed edges");
        graph.collapse(data, datachecks);
        log::info!(
            "edge compressed graph has {} vertices, {} edges",
            graph.visible_vertex_count(),
            graph.collapsed_edge_count()
        );
        graph
    }

    /// choose a unique name and create the vertex for one location.
    fn create_vertex(
        &mut self,
        data: &HighwayData,
        w: WaypointId,
        names: &mut HashSet<String>,
        datachecks: &mut DatacheckList,
    ) {
        let ap_coloc = active_preview_members(data, w);
        let mut point_name =
            naming::canonical_waypoint_name(data, w, &ap_coloc, &mut self.naming_log);
        let mut good_to_go = true;

        // if that's taken, append the region code
        if names.contains(&point_name) {
            point_name = format!(
                "{point_name}|{}",
                data.region(data.route(data.waypoint(w).route).region).code
            );
            self.naming_log.push(format!("Appended region: {point_name}"));
            good_to_go = false;
        }
        // if that's taken too, see if the simple name is available
        if !good_to_go && names.contains(&point_name) {
            let simple_name = naming::simple_waypoint_name(data, w);
            if !names.contains(&simple_name) {
                self.naming_log.push(format!(
                    "Revert to simple: {simple_name} from (taken) {point_name}"
                ));
                point_name = simple_name;
                good_to_go = true;
            }
        }
        // if we have not yet succeeded, add !'s until we do
        if !good_to_go {
            while names.contains(&point_name) {
                point_name.push('!');
                self.naming_log.push(format!("Appended !: {point_name}"));
            }
        }
        names.insert(point_name.clone());

        let wp = data.waypoint(w);
        let mut vertex = HGVertex::new(wp.lat, wp.lng, point_name, w);
        let members: Vec<WaypointId> = match data.colocation(w) {
            Some(m) => m.to_vec(),
            None => vec![w],
        };
        for &m in &members {
            let mw = data.waypoint(m);
            if !mw.is_hidden {
                vertex.visibility = 2;
            }
            let region = data.route(mw.route).region;
            let system = data.route(mw.route).system;
            if !vertex.regions.contains(&region) {
                vertex.regions.push(region);
            }
            if !vertex.systems.contains(&system) {
                vertex.systems.push(system);
            }
        }
        // flag colocations mixing hidden and visible points
        if members.len() > 1 && members.iter().any(|&m| data.waypoint(m).is_hidden)
            && members.iter().any(|&m| !data.waypoint(m).is_hidden)
        {
            let vis = members
                .iter()
                .copied()
                .find(|&m| !data.waypoint(m).is_hidden)
                .unwrap();
            let hid = members
                .iter()
                .copied()
                .find(|&m| data.waypoint(m).is_hidden)
                .unwrap();
            datachecks.add(
                data.waypoint(vis).route,
                &data.waypoint(vis).label,
                "",
                "",
                DatacheckCode::VisibleHiddenColoc,
                data.root_at_label(hid),
            );
        }

        let id = VertexId(self.vertices.len() as u32);
        for &r in &vertex.regions {
            self.region_vertices.entry(r).or_default().insert(id);
        }
        for &s in &vertex.systems {
            self.system_vertices.entry(s).or_default().insert(id);
        }
        self.vertices.push(vertex);
        self.vertex_by_waypoint.insert(w, id);
    }

    /// one edge per concurrency-group representative in non-devel
    /// systems, skipping endpoint pairs already joined.
    fn create_edges(&mut self, data: &HighwayData) {
        for system in &data.systems {
            if system.devel() {
                continue;
            }
            for &route_id in &system.routes {
                for &seg_id in &data.route(route_id).segments {
                    let representative = match data.concurrency(seg_id) {
                        None => true,
                        Some(group) => group[0] == seg_id,
                    };
                    if representative {
                        self.create_edge(data, seg_id);
                    }
                }
            }
        }
    }

    fn create_edge(&mut self, data: &HighwayData, seg_id: SegmentId) {
        let seg = data.segment(seg_id);
        let v1 = self.vertex_by_waypoint[&data.hashpoint(seg.waypoint1)];
        let v2 = self.vertex_by_waypoint[&data.hashpoint(seg.waypoint2)];
        // the very rare case where the same endpoint pair is already joined
        let duplicate = self.vertices[v1.index()]
            .incident_s_edges
            .iter()
            .any(|&e| {
                let edge = self.edge(e);
                (edge.vertex1 == v1 && edge.vertex2 == v2)
                    || (edge.vertex1 == v2 && edge.vertex2 == v1)
            });
        if duplicate {
            return;
        }
        let mut route_names_and_systems: Vec<(String, SystemId)> = vec![];
        match data.concurrency(seg_id) {
            None => {
                let route = data.route(seg.route);
                route_names_and_systems.push((route.list_entry_name(), route.system));
            }
            Some(group) => {
                for &cs in group {
                    let route = data.route(data.segment(cs).route);
                    if data.system(route.system).devel() {
                        continue;
                    }
                    route_names_and_systems.push((route.list_entry_name(), route.system));
                }
            }
        }

        let id = EdgeId(self.edges.len() as u32);
        self.region_edges
            .entry(data.route(seg.route).region)
            .or_default()
            .insert(id);
        for (_, sys) in &route_names_and_systems {
            self.system_edges.entry(*sys).or_default().insert(id);
        }
        self.edges.push(HGEdge {
            format: SIMPLE | COLLAPSED | TRAVELED,
            segment_name: data.segment_name(seg_id),
            vertex1: v1,
            vertex2: v2,
            intermediate_points: vec![],
            segment: seg_id,
            route_names_and_systems,
        });
        for v in [v1, v2] {
            let vertex = self.vertex_mut(v);
            vertex.incident_s_edges.push(id);
            vertex.incident_c_edges.push(id);
            vertex.incident_t_edges.push(id);
        }
    }

    /// raise endpoint vertices of clinched segments to traveled-only
    /// visibility, so collapse keeps travelers' endpoints addressable.
    fn assign_traveled_visibility(&mut self, data: &HighwayData) {
        for segment in &data.segments {
            if segment.clinched_by.is_empty() {
                continue;
            }
            for w in [segment.waypoint1, segment.waypoint2] {
                if let Some(&v) = self.vertex_by_waypoint.get(&data.hashpoint(w)) {
                    let vertex = self.vertex_mut(v);
                    if vertex.visibility == 0 {
                        vertex.visibility = 1;
                    }
                }
            }
        }
    }

    /// the hidden-vertex state machine: promote termini and junctions to
    /// visible, merge everything else out of the collapsed and traveled
    /// views.
    fn collapse(&mut self, data: &HighwayData, datachecks: &mut DatacheckList) {
        // collapsed view: pass through every vertex hidden to it
        for v in 0..self.vertices.len() {
            let v = VertexId(v as u32);
            if self.vertex(v).visibility >= 2 {
                continue;
            }
            match self.vertex(v).incident_c_edges.len() {
                0 => {}
                1 => self.vertex_mut(v).visibility = 2,
                2 => self.merge_at(v, COLLAPSED),
                n => {
                    // flag using the asciibetically first colocated point
                    let dcw = match data.colocation(self.vertex(v).first_waypoint) {
                        Some(members) => members
                            .iter()
                            .copied()
                            .min_by_key(|&m| data.root_at_label(m))
                            .unwrap(),
                        None => self.vertex(v).first_waypoint,
                    };
                    datachecks.add(
                        data.waypoint(dcw).route,
                        &data.waypoint(dcw).label,
                        "",
                        "",
                        DatacheckCode::HiddenJunction,
                        n.to_string(),
                    );
                    self.vertex_mut(v).visibility = 2;
                }
            }
        }
        // traveled view: only pass through vertices hidden there too
        for v in 0..self.vertices.len() {
            let v = VertexId(v as u32);
            if self.vertex(v).visibility == 0 && self.vertex(v).incident_t_edges.len() == 2 {
                self.merge_at(v, TRAVELED);
            }
        }
    }

    /// replace the two format-incident edges at a hidden vertex with one
    /// edge whose intermediate points run endpoint to endpoint.
    fn merge_at(&mut self, v: VertexId, format: u8) {
        let (e1, e2) = {
            let list = self.incident_list(v, format);
            (list[0], list[1])
        };
        if self.edge(e1).segment_name != self.edge(e2).segment_name {
            log::error!(
                "segment name mismatch in edge collapse: '{}' vs '{}'",
                self.edge(e1).segment_name,
                self.edge(e2).segment_name
            );
        }

        let mut intermediate_points = self.edge(e1).intermediate_points.clone();
        let vertex1 = if self.edge(e1).vertex1 == v {
            intermediate_points.reverse();
            self.edge(e1).vertex2
        } else {
            self.edge(e1).vertex1
        };
        intermediate_points.push(v);
        let vertex2 = if self.edge(e2).vertex1 == v {
            intermediate_points.extend_from_slice(&self.edge(e2).intermediate_points);
            self.edge(e2).vertex2
        } else {
            let mut rest = self.edge(e2).intermediate_points.clone();
            rest.reverse();
            intermediate_points.extend_from_slice(&rest);
            self.edge(e2).vertex1
        };

        let merged = HGEdge {
            format,
            segment_name: self.edge(e1).segment_name.clone(),
            vertex1,
            vertex2,
            intermediate_points,
            segment: self.edge(e1).segment,
            route_names_and_systems: self.edge(e1).route_names_and_systems.clone(),
        };
        let id = EdgeId(self.edges.len() as u32);
        for old in [e1, e2] {
            self.detach(old, format);
        }
        self.edges.push(merged);
        for endpoint in [vertex1, vertex2] {
            self.incident_list_mut(endpoint, format).push(id);
        }
        // the collapsed-away vertex keeps no edges in this format
        self.incident_list_mut(v, format).clear();
    }

    /// remove one format from an edge, detaching it from its endpoints'
    /// incident lists for that format.
    fn detach(&mut self, e: EdgeId, format: u8) {
        let (v1, v2) = (self.edge(e).vertex1, self.edge(e).vertex2);
        for v in [v1, v2] {
            self.incident_list_mut(v, format).retain(|&x| x != e);
        }
        self.edges[e.index()].format &= !format;
    }

    fn incident_list(&self, v: VertexId, format: u8) -> &Vec<EdgeId> {
        let vertex = self.vertex(v);
        match format {
            SIMPLE => &vertex.incident_s_edges,
            COLLAPSED => &vertex.incident_c_edges,
            _ => &vertex.incident_t_edges,
        }
    }

    fn incident_list_mut(&mut self, v: VertexId, format: u8) -> &mut Vec<EdgeId> {
        let vertex = self.vertex_mut(v);
        match format {
            SIMPLE => &mut vertex.incident_s_edges,
            COLLAPSED => &mut vertex.incident_c_edges,
            _ => &mut vertex.incident_t_edges,
        }
    }

    pub fn visible_vertex_count(&self) -> usize {
        self.vertices.iter().filter(|v| v.visibility >= 2).count()
    }

    pub fn traveled_vertex_count(&self) -> usize {
        self.vertices.iter().filter(|v| v.visibility >= 1).count()
    }

    pub fn simple_edge_count(&self) -> usize {
        self.vertices
            .iter()
            .map(|v| v.incident_s_edges.len())
            .sum::<usize>()
            / 2
    }

    pub fn collapsed_edge_count(&self) -> usize {
        self.vertices
            .iter()
            .filter(|v| v.visibility >= 2)
            .map(|v| v.incident_c_edges.len())
            .sum::<usize>()
            / 2
    }

    pub fn traveled_edge_count(&self) -> usize {
        self.vertices
            .iter()
            .filter(|v| v.visibility >= 1)
            .map(|v| v.incident_t_edges.len())
            .sum::<usize>()
            / 2
    }
}

/// locations that survive to the graph, split into naming priority
/// classes: two-route colocations without abbrevs first, everything
/// else second. processing order follows the quadtree traversal for
/// deterministic naming.
fn graph_points(data: &HighwayData, tree: &WaypointQuadtree) -> (Vec<WaypointId>, Vec<WaypointId>) {
    let mut hi_priority = vec![];
    let mut lo_priority = vec![];
    for w in tree.point_list() {
        if !data.is_or_colocated_with_active_or_preview(w) {
            continue;
        }
        if let Some(members) = data.colocation(w) {
            if members[0] != w {
                continue;
            }
        }
        let ap_coloc = active_preview_members(data, w);
        let hi = ap_coloc.len() == 2
            && ap_coloc.iter().all(|&m| {
                data.route(data.waypoint(m).route).abbrev.is_empty()
            });
        if hi {
            hi_priority.push(w);
        } else {
            lo_priority.push(w);
        }
    }
    (hi_priority, lo_priority)
}

/// the colocation list with devel-system entries removed, or the point
/// itself when alone.
fn active_preview_members(data: &HighwayData, w: WaypointId) -> Vec<WaypointId> {
    match data.colocation(w) {
        None => vec![w],
        Some(members) => members
            .iter()
            .copied()
            .filter(|&m| data.waypoint_system(m).active_or_preview())
            .collect(),
    }
}
