//! end-to-end graph construction scenarios over small hand-built
//! highway datasets.

use std::collections::HashSet;

use waymap_core::datacheck::DatacheckList;
use waymap_core::model::{
    CodedName, ConcurrencyId, HighwayData, HighwaySegment, HighwaySystem, Region, RegionId, Route,
    RouteId, SegmentId, SystemId, SystemLevel, Waypoint, WaypointId,
};
use waymap_core::quadtree::WaypointQuadtree;
use waymap_graph::{GraphCategory, GraphListEntry, HighwayGraph, PlaceRadius};

struct DataBuilder {
    data: HighwayData,
    tree: WaypointQuadtree,
}

impl DataBuilder {
    fn new() -> Self {
        let mut data = HighwayData::default();
        data.countries.push(CodedName {
            code: String::from("USA"),
            name: String::from("United States"),
        });
        data.continents.push(CodedName {
            code: String::from("NA"),
            name: String::from("North America"),
        });
        data.regions.push(Region::new(
            String::from("PA"),
            String::from("Pennsylvania"),
            0,
            0,
            String::from("State"),
        ));
        Self {
            data,
            tree: WaypointQuadtree::whole_world(),
        }
    }

    fn add_system(&mut self, name: &str, level: SystemLevel) -> SystemId {
        let id = SystemId(self.data.systems.len() as u16);
        self.data.systems.push(HighwaySystem {
            systemname: String::from(name),
            country: 0,
            fullname: format!("{name} full name"),
            color: String::from("blue"),
            tier: 1,
            level,
            routes: vec![],
            con_routes: vec![],
            mileage_by_region: Default::default(),
            list_names_in_use: Default::default(),
            unused_alt_route_names: Default::default(),
        });
        id
    }

    fn add_route(
        &mut self,
        system: SystemId,
        name: &str,
        root: &str,
        points: &[(&str, f64, f64)],
    ) -> RouteId {
        let route_id = RouteId(self.data.routes.len() as u32);
        self.data.routes.push(Route {
            system,
            region: RegionId(0),
            route: String::from(name),
            banner: String::new(),
            abbrev: String::new(),
            city: String::new(),
            root: String::from(root),
            alt_route_names: vec![],
            con_route: None,
            root_order: -1,
            is_reversed: false,
            disconnected: false,
            points: vec![],
            segments: vec![],
            pri_label_hash: Default::default(),
            alt_label_hash: Default::default(),
            duplicate_labels: Default::default(),
            labels_in_use: Default::default(),
            unused_alt_labels: Default::default(),
            mileage: 0.0,
            last_update: None,
        });
        self.data.systems[system.index()].routes.push(route_id);
        let mut point_ids = vec![];
        for &(label, lat, lng) in points {
            let id = WaypointId(self.data.waypoints.len() as u32);
            self.data.waypoints.push(Waypoint {
                label: String::from(label),
                alt_labels: vec![],
                lat,
                lng,
                is_hidden: label.starts_with('+'),
                route: route_id,
                colocated: None,
                near_miss_points: vec![],
            });
            self.tree
                .insert(id, &mut self.data.waypoints, &mut self.data.colocations);
            point_ids.push(id);
        }
        let mut segment_ids = vec![];
        for pair in point_ids.windows(2) {
            let id = SegmentId(self.data.segments.len() as u32);
            let length = self
                .data
                .waypoint(pair[0])
                .distance_to(self.data.waypoint(pair[1]));
            self.data
                .segments
                .push(HighwaySegment::new(pair[0], pair[1], route_id, length));
            segment_ids.push(id);
        }
        let r = self.data.route_mut(route_id);
        r.points = point_ids;
        r.segments = segment_ids;
        route_id
    }

    /// place the given segments into one shared concurrency group.
    fn make_concurrent(&mut self, segments: &[SegmentId]) {
        let group = ConcurrencyId(self.data.concurrencies.len() as u32);
        self.data.concurrencies.push(segments.to_vec());
        for &s in segments {
            self.data.segment_mut(s).concurrent = Some(group);
        }
    }

    fn build_graph(&mut self) -> (HighwayGraph, DatacheckList) {
        let mut datachecks = DatacheckList::new();
        let graph = HighwayGraph::build(&self.data, &self.tree, &mut datachecks);
        (graph, datachecks)
    }
}

fn vertex_names(graph: &HighwayGraph) -> HashSet<String> {
    graph
        .vertices
        .iter()
        .map(|v| v.unique_name.clone())
        .collect()
}

#[test]
fn test_t_intersection_concurrency_style_name() {
    // two routes sharing a point with the same label compress to a
    // route/route@label vertex name
    let mut builder = DataBuilder::new();
    let sys = builder.add_system("usapa", SystemLevel::Active);
    builder.add_route(sys, "A", "pa.a", &[("X", 10.0, 10.0), ("A2", 10.0, 11.0)]);
    builder.add_route(sys, "B", "pa.b", &[("X", 10.0, 10.0), ("B2", 10.1, 10.0)]);
    let (graph, _) = builder.build_graph();
    assert!(
        vertex_names(&graph).contains("A/B@X"),
        "names: {:?}",
        vertex_names(&graph)
    );
}

#[test]
fn test_t_intersection_failsafe_name() {
    // labels that match no rewrite keep the &-joined failsafe
    let mut builder = DataBuilder::new();
    let sys = builder.add_system("usapa", SystemLevel::Active);
    builder.add_route(sys, "A", "pa.a", &[("A1", 10.0, 10.0), ("A2", 10.0, 11.0)]);
    builder.add_route(sys, "B", "pa.b", &[("B1", 10.0, 10.0), ("B2", 10.1, 10.0)]);
    let (graph, _) = builder.build_graph();
    assert!(
        vertex_names(&graph).contains("A@A1&B@B1"),
        "names: {:?}",
        vertex_names(&graph)
    );
}

#[test]
fn test_hidden_waypoint_collapse() {
    // P1 -- +H -- P2 collapses to one edge through +H
    let mut builder = DataBuilder::new();
    let sys = builder.add_system("usapa", SystemLevel::Active);
    builder.add_route(
        sys,
        "A",
        "pa.a",
        &[("P1", 40.0, -75.0), ("+H", 40.1, -75.0), ("P2", 40.2, -75.0)],
    );
    let (graph, _) = builder.build_graph();
    assert_eq!(graph.simple_edge_count(), 2);
    assert_eq!(graph.collapsed_edge_count(), 1);
    assert_eq!(graph.visible_vertex_count(), 2);
    // the merged edge runs endpoint to endpoint through the hidden point
    let merged = graph
        .edges
        .iter()
        .find(|e| e.format & waymap_graph::COLLAPSED != 0)
        .expect("a collapsed edge exists");
    assert_eq!(merged.intermediate_points.len(), 1);
    let mid = graph.vertex(merged.intermediate_points[0]);
    assert_eq!(mid.lat, 40.1);
    // no hidden vertex with exactly two collapsed edges remains
    for v in &graph.vertices {
        assert!(!(v.visibility < 2 && v.incident_c_edges.len() == 2));
    }
}

#[test]
fn test_hidden_terminus_promoted_visible() {
    let mut builder = DataBuilder::new();
    let sys = builder.add_system("usapa", SystemLevel::Active);
    builder.add_route(
        sys,
        "A",
        "pa.a",
        &[("+X", 40.0, -75.0), ("P1", 40.1, -75.0), ("P2", 40.2, -75.0)],
    );
    let (graph, _) = builder.build_graph();
    let terminus = graph
        .vertices
        .iter()
        .find(|v| v.lat == 40.0)
        .expect("terminus vertex exists");
    assert_eq!(terminus.visibility, 2);
    assert_eq!(graph.collapsed_edge_count(), 2);
}

#[test]
fn test_hidden_junction_flagged() {
    // three routes meet at a point where every member is hidden
    let mut builder = DataBuilder::new();
    let sys = builder.add_system("usapa", SystemLevel::Active);
    builder.add_route(
        sys,
        "A",
        "pa.a",
        &[("A1", 40.0, -75.0), ("+J", 40.1, -75.0), ("A2", 40.2, -75.0)],
    );
    builder.add_route(
        sys,
        "B",
        "pa.b",
        &[("B1", 40.1, -74.9), ("+J", 40.1, -75.0)],
    );
    let (graph, datachecks) = builder.build_graph();
    let junction = graph
        .vertices
        .iter()
        .find(|v| v.lat == 40.1 && v.lng == -75.0)
        .expect("junction vertex exists");
    assert_eq!(junction.visibility, 2);
    assert!(datachecks
        .entries
        .iter()
        .any(|e| e.code == waymap_core::datacheck::DatacheckCode::HiddenJunction
            && e.info == "3"));
}

#[test]
fn test_concurrency_single_edge_with_joined_label() {
    let mut builder = DataBuilder::new();
    let sys = builder.add_system("usapa", SystemLevel::Active);
    let i10 = builder.add_route(
        sys,
        "I-10",
        "pa.i010",
        &[("1", 30.0, -90.0), ("2", 30.0, -89.9)],
    );
    let us90 = builder.add_route(
        sys,
        "US90",
        "pa.us090",
        &[("1", 30.0, -90.0), ("2", 30.0, -89.9)],
    );
    let s1 = builder.data.route(i10).segments[0];
    let s2 = builder.data.route(us90).segments[0];
    builder.make_concurrent(&[s1, s2]);
    let (graph, _) = builder.build_graph();
    assert_eq!(graph.simple_edge_count(), 1);
    let edge = graph
        .edges
        .iter()
        .find(|e| e.format != 0)
        .expect("the shared edge exists");
    assert_eq!(edge.label(None), "I-10,US90");
}

#[test]
fn test_traveled_visibility_and_bitset() {
    // a clinched segment keeps its endpoints in the traveled graph
    let mut builder = DataBuilder::new();
    let sys = builder.add_system("usapa", SystemLevel::Active);
    let route = builder.add_route(
        sys,
        "A",
        "pa.a",
        &[
            ("P1", 40.0, -75.0),
            ("+H1", 40.1, -75.0),
            ("+H2", 40.2, -75.0),
            ("P2", 40.3, -75.0),
        ],
    );
    // traveler 0 clinches only the first segment, ending at hidden +H1
    let seg = builder.data.route(route).segments[0];
    builder.data.segment_mut(seg).clinched_by.insert(0);
    let (graph, _) = builder.build_graph();

    // +H1 is traveled-only; +H2 stays hidden everywhere
    let h1 = graph.vertices.iter().find(|v| v.lat == 40.1).unwrap();
    let h2 = graph.vertices.iter().find(|v| v.lat == 40.2).unwrap();
    assert_eq!(h1.visibility, 1);
    assert_eq!(h2.visibility, 0);
    assert_eq!(graph.collapsed_edge_count(), 1);
    assert_eq!(graph.traveled_edge_count(), 2);
    assert_eq!(graph.traveled_vertex_count(), 3);
}

#[test]
fn test_simple_edge_count_accounts_for_concurrencies() {
    // |E_simple| = total active segments minus concurrency duplicates
    let mut builder = DataBuilder::new();
    let sys = builder.add_system("usapa", SystemLevel::Active);
    let a = builder.add_route(
        sys,
        "A",
        "pa.a",
        &[("1", 41.0, -75.0), ("2", 41.0, -74.9), ("3", 41.0, -74.8)],
    );
    let b = builder.add_route(
        sys,
        "B",
        "pa.b",
        &[("1", 41.0, -75.0), ("2", 41.0, -74.9)],
    );
    let sa = builder.data.route(a).segments[0];
    let sb = builder.data.route(b).segments[0];
    builder.make_concurrent(&[sa, sb]);
    let (graph, _) = builder.build_graph();
    // 3 segments total, one concurrency group of size 2
    assert_eq!(graph.simple_edge_count(), 3 - 1);
}

#[test]
fn test_place_radius_subgraph() {
    let mut builder = DataBuilder::new();
    let sys = builder.add_system("usapa", SystemLevel::Active);
    builder.add_route(
        sys,
        "A",
        "pa.a",
        &[
            ("IN1", 40.0, -75.0),
            ("IN2", 40.02, -75.0),
            ("FAR", 41.0, -75.0),
        ],
    );
    let (graph, _) = builder.build_graph();
    let entries = GraphListEntry::trio(
        String::from("test5-area"),
        String::from("Test (5 mi radius)"),
        GraphCategory::Area,
        None,
        None,
        Some(PlaceRadius::new(
            String::from("Test"),
            String::from("test"),
            40.0,
            -75.0,
            5,
        )),
    );
    let matched = graph.matching_subgraph(&builder.data, &entries[0]);
    // only the two nearby vertices are in range, joined by one edge
    assert_eq!(matched.vertices.len(), 2);
    assert_eq!(matched.simple_edges.len(), 1);
    for &v in &matched.vertices {
        assert!((graph.vertex(v).lat - 40.0).abs() < 0.1);
    }
}

#[test]
fn test_devel_routes_excluded_from_graph() {
    let mut builder = DataBuilder::new();
    let active = builder.add_system("usapa", SystemLevel::Active);
    let devel = builder.add_system("devsys", SystemLevel::Devel);
    builder.add_route(
        active,
        "A",
        "pa.a",
        &[("1", 42.0, -75.0), ("2", 42.0, -74.9)],
    );
    builder.add_route(
        devel,
        "D",
        "pa.d",
        &[("1", 43.0, -75.0), ("2", 43.0, -74.9)],
    );
    let (graph, _) = builder.build_graph();
    assert_eq!(graph.vertices.len(), 2);
    assert_eq!(graph.simple_edge_count(), 1);
}

#[test]
fn test_tmg_round_trip() {
    let mut builder = DataBuilder::new();
    let sys = builder.add_system("usapa", SystemLevel::Active);
    let route = builder.add_route(
        sys,
        "A",
        "pa.a",
        &[
            ("P1", 40.123456789012345, -75.0),
            ("+H", 40.2, -75.1),
            ("P2", 40.3, -75.2),
        ],
    );
    let seg = builder.data.route(route).segments[0];
    builder.data.segment_mut(seg).clinched_by.insert(0);
    builder.data.travelers.push(Default::default());
    let (graph, _) = builder.build_graph();

    let dir = std::env::temp_dir().join(format!("waymap-tmg-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let mut entries = GraphListEntry::trio(
        String::from("tm-master"),
        String::from("All Travel Mapping Data"),
        GraphCategory::Master,
        None,
        None,
        None,
    );
    let travelers = vec![String::from("wanderer")];
    graph
        .write_subgraph_tmg(&builder.data, &mut entries, &dir, &travelers)
        .unwrap();

    // simple: all three vertices and both edges, 15 significant digits
    let simple = std::fs::read_to_string(dir.join("tm-master-simple.tmg")).unwrap();
    let lines: Vec<&str> = simple.lines().collect();
    assert_eq!(lines[0], "TMG 2.0 simple");
    assert_eq!(lines[1], "3 2");
    assert_eq!(lines.len(), 2 + 3 + 2);
    assert!(lines[2..5].iter().any(|l| l.contains("40.1234567890123")));

    // collapsed: hidden point compressed into the single edge
    let collapsed = std::fs::read_to_string(dir.join("tm-master.tmg")).unwrap();
    let lines: Vec<&str> = collapsed.lines().collect();
    assert_eq!(lines[0], "TMG 2.0 collapsed");
    assert_eq!(lines[1], "2 1");
    let edge_line = lines[4];
    assert!(edge_line.contains("40.2"), "edge line: {edge_line}");

    // traveled: three tokens in the counts line, bitset on each edge,
    // traveler roster on the final line
    let traveled = std::fs::read_to_string(dir.join("tm-master-traveled.tmg")).unwrap();
    let lines: Vec<&str> = traveled.lines().collect();
    assert_eq!(lines[0], "TMG 2.0 traveled");
    assert_eq!(lines[1], "3 2 1");
    assert_eq!(*lines.last().unwrap(), "wanderer");
    let clinched_edges = lines[5..7]
        .iter()
        .filter(|l| l.split_whitespace().nth(3) == Some("1"))
        .count();
    assert_eq!(clinched_edges, 1);

    assert_eq!(entries[0].vertices, 3);
    assert_eq!(entries[1].edges, 1);
    assert_eq!(entries[2].travelers, 1);

    std::fs::remove_dir_all(&dir).ok();
}
