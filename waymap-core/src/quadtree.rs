//! recursive quadtree over all waypoints, for colocation detection and
//! near-miss searching.
//!
//! insertion happens on a single thread during waypoint loading; lookups
//! afterwards are read-only and safe to fan out across workers.

use std::io::Write;

use rayon::prelude::*;

use crate::model::{ColocationId, Waypoint, WaypointId};

/// a leaf holds at most this many unique locations before refining.
const MAX_UNIQUE_LOCATIONS: usize = 50;

/// children are stored NW, NE, SW, SE.
const NW: usize = 0;
const NE: usize = 1;
const SW: usize = 2;
const SE: usize = 3;

#[derive(Debug)]
pub struct WaypointQuadtree {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
    mid_lat: f64,
    mid_lng: f64,
    children: Option<Box<[WaypointQuadtree; 4]>>,
    points: Vec<WaypointId>,
    unique_locations: usize,
}

impl WaypointQuadtree {
    /// an empty node covering the given space.
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            min_lng,
            max_lat,
            max_lng,
            mid_lat: (min_lat + max_lat) / 2.0,
            mid_lng: (min_lng + max_lng) / 2.0,
            children: None,
            points: vec![],
            unique_locations: 0,
        }
    }

    /// the root node covering the whole globe.
    pub fn whole_world() -> Self {
        Self::new(-90.0, -180.0, 90.0, 180.0)
    }

    fn refined(&self) -> bool {
        self.children.is_some()
    }

    fn child_for(&self, lat: f64, lng: f64) -> usize {
        if lat < self.mid_lat {
            if lng < self.mid_lng {
                SW
            } else {
                SE
            }
        } else if lng < self.mid_lng {
            NW
        } else {
            NE
        }
    }

    /// split this leaf into four quadrants and redistribute its points.
    fn refine(&mut self, waypoints: &mut [Waypoint], colocations: &mut Vec<Vec<WaypointId>>) {
        self.children = Some(Box::new([
            Self::new(self.mid_lat, self.min_lng, self.max_lat, self.mid_lng),
            Self::new(self.mid_lat, self.mid_lng, self.max_lat, self.max_lng),
            Self::new(self.min_lat, self.min_lng, self.mid_lat, self.mid_lng),
            Self::new(self.min_lat, self.mid_lng, self.mid_lat, self.max_lng),
        ]));
        let points = std::mem::take(&mut self.points);
        for p in points {
            self.insert_inner(p, waypoints, colocations, false);
        }
    }

    /// insert a waypoint, attaching it to a colocation list when an
    /// existing waypoint shares its exact coordinates.
    pub fn insert(
        &mut self,
        w: WaypointId,
        waypoints: &mut [Waypoint],
        colocations: &mut Vec<Vec<WaypointId>>,
    ) {
        self.insert_inner(w, waypoints, colocations, true)
    }

    fn insert_inner(
        &mut self,
        w: WaypointId,
        waypoints: &mut [Waypoint],
        colocations: &mut Vec<Vec<WaypointId>>,
        initial: bool,
    ) {
        if self.refined() {
            let (lat, lng) = (waypoints[w.index()].lat, waypoints[w.index()].lng);
            let child = self.child_for(lat, lng);
            self.children.as_mut().unwrap()[child].insert_inner(w, waypoints, colocations, initial);
            return;
        }
        // look for colocated points during initial insertion
        if initial {
            let other = self
                .points
                .iter()
                .copied()
                .find(|&p| waypoints[p.index()].same_coords(&waypoints[w.index()]));
            if let Some(other) = other {
                let coloc = match waypoints[other.index()].colocated {
                    Some(c) => c,
                    None => {
                        // first point colocated with other
                        let c = ColocationId(colocations.len() as u32);
                        colocations.push(vec![other]);
                        waypoints[other.index()].colocated = Some(c);
                        c
                    }
                };
                colocations[coloc.index()].push(w);
                waypoints[w.index()].colocated = Some(coloc);
            }
        }
        // only the first point at a location counts toward refinement
        let counts = match waypoints[w.index()].colocated {
            None => true,
            Some(c) => colocations[c.index()][0] == w,
        };
        if counts {
            self.unique_locations += 1;
        }
        self.points.push(w);
        if self.unique_locations > MAX_UNIQUE_LOCATIONS {
            self.refine(waypoints, colocations);
        }
    }

    /// an existing waypoint at exactly the given coordinates, other than
    /// `w` itself.
    pub fn waypoint_at_same_point(
        &self,
        w: WaypointId,
        waypoints: &[Waypoint],
    ) -> Option<WaypointId> {
        let target = &waypoints[w.index()];
        let mut node = self;
        while let Some(children) = node.children.as_ref() {
            node = &children[node.child_for(target.lat, target.lng)];
        }
        node.points
            .iter()
            .copied()
            .find(|&p| p != w && waypoints[p.index()].same_coords(target))
    }

    /// all waypoints within the near-miss tolerance of `w`, excluding
    /// exact-coordinate matches and `w` itself.
    pub fn near_miss_waypoints(
        &self,
        w: WaypointId,
        tolerance: f64,
        waypoints: &[Waypoint],
    ) -> Vec<WaypointId> {
        let mut found = vec![];
        self.near_miss_search(w, tolerance, waypoints, &mut found);
        found
    }

    fn near_miss_search(
        &self,
        w: WaypointId,
        tolerance: f64,
        waypoints: &[Waypoint],
        found: &mut Vec<WaypointId>,
    ) {
        let target = &waypoints[w.index()];
        match self.children.as_ref() {
            None => {
                for &p in &self.points {
                    let other = &waypoints[p.index()];
                    if p != w && !other.same_coords(target) && other.nearby(target, tolerance) {
                        found.push(p);
                    }
                }
            }
            Some(children) => {
                // recurse into every quadrant the tolerance box overlaps
                let look_north = target.lat + tolerance >= self.mid_lat;
                let look_south = target.lat - tolerance <= self.mid_lat;
                let look_east = target.lng + tolerance >= self.mid_lng;
                let look_west = target.lng - tolerance <= self.mid_lng;
                if look_north && look_west {
                    children[NW].near_miss_search(w, tolerance, waypoints, found);
                }
                if look_north && look_east {
                    children[NE].near_miss_search(w, tolerance, waypoints, found);
                }
                if look_south && look_west {
                    children[SW].near_miss_search(w, tolerance, waypoints, found);
                }
                if look_south && look_east {
                    children[SE].near_miss_search(w, tolerance, waypoints, found);
                }
            }
        }
    }

    /// every waypoint in the tree, in NE, NW, SE, SW traversal order.
    pub fn point_list(&self) -> Vec<WaypointId> {
        let mut out = vec![];
        self.collect_points(&mut out);
        out
    }

    fn collect_points(&self, out: &mut Vec<WaypointId>) {
        match self.children.as_ref() {
            None => out.extend_from_slice(&self.points),
            Some(children) => {
                children[NE].collect_points(out);
                children[NW].collect_points(out);
                children[SE].collect_points(out);
                children[SW].collect_points(out);
            }
        }
    }

    pub fn size(&self) -> usize {
        match self.children.as_ref() {
            None => self.points.len(),
            Some(children) => children.iter().map(|c| c.size()).sum(),
        }
    }

    pub fn total_nodes(&self) -> usize {
        match self.children.as_ref() {
            None => 1,
            Some(children) => 1 + children.iter().map(|c| c.total_nodes()).sum::<usize>(),
        }
    }

    fn leaves_mut<'a>(&'a mut self, out: &mut Vec<&'a mut WaypointQuadtree>) {
        if self.children.is_none() {
            out.push(self);
            return;
        }
        for child in self.children.as_mut().unwrap().iter_mut() {
            child.leaves_mut(out);
        }
    }

    /// sort every leaf's point list by `root@label`, leaves partitioned
    /// among workers. `keys` is indexed by waypoint id.
    pub fn sort(&mut self, keys: &[String]) {
        let mut leaves = vec![];
        self.leaves_mut(&mut leaves);
        leaves.par_iter_mut().for_each(|leaf| {
            leaf.points.sort_by(|a, b| keys[a.index()].cmp(&keys[b.index()]));
        });
    }

    /// verify structural invariants: refined nodes hold no points and
    /// leaves hold at most the unique-location limit.
    pub fn is_valid(&self, problems: &mut Vec<String>) -> bool {
        if self.refined() {
            if !self.points.is_empty() {
                problems.push(format!(
                    "{} contains {} waypoints",
                    self.describe(),
                    self.points.len()
                ));
                return false;
            }
            self.children
                .as_ref()
                .unwrap()
                .iter()
                .all(|c| c.is_valid(problems))
        } else {
            if self.unique_locations > MAX_UNIQUE_LOCATIONS {
                problems.push(format!(
                    "terminal quadrant has too many unique points ({})",
                    self.unique_locations
                ));
                return false;
            }
            true
        }
    }

    fn describe(&self) -> String {
        use crate::util::fmt_g;
        let base = format!(
            "WaypointQuadtree at ({},{}) to ({},{})",
            fmt_g(self.min_lat),
            fmt_g(self.min_lng),
            fmt_g(self.max_lat),
            fmt_g(self.max_lng)
        );
        if self.refined() {
            format!("{base} REFINED")
        } else {
            format!("{base} contains {} waypoints", self.points.len())
        }
    }

    fn tmg_lines(&self, vertices: &mut Vec<String>, edges: &mut Vec<String>, name: &str) {
        let Some(children) = self.children.as_ref() else {
            return;
        };
        // clamp latitudes for friendlier plotting
        let cmn_lat = self.min_lat.max(-80.0);
        let cmx_lat = self.max_lat.min(80.0);
        edges.push(format!("{} {} {name}_NS", vertices.len(), vertices.len() + 1));
        edges.push(format!("{} {} {name}_EW", vertices.len() + 2, vertices.len() + 3));
        vertices.push(format!("{name}@+S {cmn_lat} {}", self.mid_lng));
        vertices.push(format!("{name}@+N {cmx_lat} {}", self.mid_lng));
        vertices.push(format!("{name}@+W {} {}", self.mid_lat, self.min_lng));
        vertices.push(format!("{name}@+E {} {}", self.mid_lat, self.max_lng));
        children[NW].tmg_lines(vertices, edges, &format!("{name}A"));
        children[NE].tmg_lines(vertices, edges, &format!("{name}B"));
        children[SW].tmg_lines(vertices, edges, &format!("{name}C"));
        children[SE].tmg_lines(vertices, edges, &format!("{name}D"));
    }

    /// emit the tree's subdivision structure as a diagnostic graph file.
    pub fn write_qt_tmg(&self, path: &std::path::Path) -> std::io::Result<()> {
        let mut vertices = vec![];
        let mut edges = vec![];
        self.tmg_lines(&mut vertices, &mut edges, "M");
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        writeln!(file, "TMG 1.0 simple")?;
        writeln!(file, "{} {}", vertices.len(), edges.len())?;
        for v in &vertices {
            writeln!(file, "{v}")?;
        }
        for e in &edges {
            writeln!(file, "{e}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RouteId;

    fn make_waypoint(lat: f64, lng: f64) -> Waypoint {
        Waypoint {
            label: String::from("P"),
            alt_labels: vec![],
            lat,
            lng,
            is_hidden: false,
            route: RouteId(0),
            colocated: None,
            near_miss_points: vec![],
        }
    }

    fn insert_all(
        coords: &[(f64, f64)],
    ) -> (WaypointQuadtree, Vec<Waypoint>, Vec<Vec<WaypointId>>) {
        let mut tree = WaypointQuadtree::whole_world();
        let mut waypoints: Vec<Waypoint> =
            coords.iter().map(|&(lat, lng)| make_waypoint(lat, lng)).collect();
        let mut colocations = vec![];
        for i in 0..waypoints.len() {
            tree.insert(WaypointId(i as u32), &mut waypoints, &mut colocations);
        }
        (tree, waypoints, colocations)
    }

    #[test]
    fn test_colocation_groups_form_on_exact_match() {
        let (tree, waypoints, colocations) =
            insert_all(&[(10.0, 10.0), (10.0, 11.0), (10.0, 10.0), (10.0, 10.0)]);
        assert_eq!(colocations.len(), 1);
        assert_eq!(
            colocations[0],
            vec![WaypointId(0), WaypointId(2), WaypointId(3)]
        );
        assert_eq!(waypoints[0].colocated, Some(ColocationId(0)));
        assert_eq!(waypoints[1].colocated, None);
        assert_eq!(waypoints[3].colocated, Some(ColocationId(0)));
        // lookup returns a colocated partner
        let found = tree.waypoint_at_same_point(WaypointId(0), &waypoints);
        assert!(matches!(found, Some(WaypointId(2)) | Some(WaypointId(3))));
        assert_eq!(tree.waypoint_at_same_point(WaypointId(1), &waypoints), None);
    }

    #[test]
    fn test_refinement_keeps_all_points_findable() {
        // 60 unique locations along a line forces at least one refine
        let coords: Vec<(f64, f64)> =
            (0..60).map(|i| (10.0 + i as f64 * 0.001, 20.0)).collect();
        let (tree, waypoints, _) = insert_all(&coords);
        assert!(tree.total_nodes() > 1, "tree never refined");
        assert_eq!(tree.size(), 60);
        assert_eq!(tree.point_list().len(), 60);
        let mut problems = vec![];
        assert!(tree.is_valid(&mut problems), "{problems:?}");
        for i in 0..60 {
            assert_eq!(tree.waypoint_at_same_point(WaypointId(i), &waypoints), None);
        }
    }

    #[test]
    fn test_near_miss_matches_brute_force() {
        // cluster points across a refinement boundary and compare the
        // tree search against a direct scan
        let mut coords = vec![];
        for i in 0..55 {
            coords.push((i as f64 * 0.01, 0.0));
        }
        coords.push((0.0001, 0.0003));
        coords.push((0.0004, -0.0002));
        coords.push((-0.0003, 0.0001));
        let (tree, waypoints, _) = insert_all(&coords);
        let tol = 0.0005;
        for w in 0..waypoints.len() {
            let w = WaypointId(w as u32);
            let mut expected: Vec<WaypointId> = (0..waypoints.len() as u32)
                .map(WaypointId)
                .filter(|&p| {
                    p != w
                        && !waypoints[p.index()].same_coords(&waypoints[w.index()])
                        && waypoints[p.index()].nearby(&waypoints[w.index()], tol)
                })
                .collect();
            let mut got = tree.near_miss_waypoints(w, tol, &waypoints);
            expected.sort();
            got.sort();
            assert_eq!(got, expected, "mismatch for {w:?}");
        }
    }

    #[test]
    fn test_sort_orders_leaf_points() {
        let (mut tree, waypoints, _) = insert_all(&[(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        let keys: Vec<String> = (0..waypoints.len()).map(|i| format!("k{}", 9 - i)).collect();
        tree.sort(&keys);
        let order = tree.point_list();
        assert_eq!(order, vec![WaypointId(2), WaypointId(1), WaypointId(0)]);
    }
}
