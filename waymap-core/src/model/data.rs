use std::collections::HashMap;

use crate::model::{
    CodedName, ColocationId, ConnectedRoute, ConnectedRouteId, ConcurrencyId, HighwaySegment,
    HighwaySystem, Region, RegionId, Route, RouteId, SegmentId, SystemId, TravelerId,
    TravelerList, Waypoint, WaypointId,
};
use crate::util::fmt_g_dot0;

/// one updates.csv row, kept verbatim for the database and for per-user
/// "route updated" notices.
#[derive(Debug, Clone)]
pub struct Update {
    pub date: String,
    pub region: String,
    pub route: String,
    pub root: String,
    pub description: String,
}

/// one systemupdates.csv row.
#[derive(Debug, Clone)]
pub struct SystemUpdate {
    pub date: String,
    pub region: String,
    pub system_name: String,
    pub description: String,
    pub status_change: String,
}

/// owner of every arena in the pipeline. cross-references between records
/// are typed indices; shared colocation lists and concurrency groups live
/// in their own arenas so that any member can reach the whole group.
#[derive(Debug, Default)]
pub struct HighwayData {
    pub continents: Vec<CodedName>,
    pub countries: Vec<CodedName>,
    pub regions: Vec<Region>,
    pub region_hash: HashMap<String, RegionId>,

    pub systems: Vec<HighwaySystem>,
    pub routes: Vec<Route>,
    pub con_routes: Vec<ConnectedRoute>,
    /// lowercased root -> route
    pub root_hash: HashMap<String, RouteId>,
    /// uppercased "REGION ROUTE" -> route, for primary list names
    pub pri_list_hash: HashMap<String, RouteId>,
    /// same, for alternate route names
    pub alt_list_hash: HashMap<String, RouteId>,

    pub waypoints: Vec<Waypoint>,
    pub segments: Vec<HighwaySegment>,
    pub colocations: Vec<Vec<WaypointId>>,
    pub concurrencies: Vec<Vec<SegmentId>>,

    pub travelers: Vec<TravelerList>,
    pub updates: Vec<Update>,
    pub system_updates: Vec<SystemUpdate>,
}

impl HighwayData {
    pub fn waypoint(&self, id: WaypointId) -> &Waypoint {
        &self.waypoints[id.index()]
    }

    pub fn waypoint_mut(&mut self, id: WaypointId) -> &mut Waypoint {
        &mut self.waypoints[id.index()]
    }

    pub fn segment(&self, id: SegmentId) -> &HighwaySegment {
        &self.segments[id.index()]
    }

    pub fn segment_mut(&mut self, id: SegmentId) -> &mut HighwaySegment {
        &mut self.segments[id.index()]
    }

    pub fn route(&self, id: RouteId) -> &Route {
        &self.routes[id.index()]
    }

    pub fn route_mut(&mut self, id: RouteId) -> &mut Route {
        &mut self.routes[id.index()]
    }

    pub fn system(&self, id: SystemId) -> &HighwaySystem {
        &self.systems[id.index()]
    }

    pub fn region(&self, id: RegionId) -> &Region {
        &self.regions[id.index()]
    }

    pub fn con_route(&self, id: ConnectedRouteId) -> &ConnectedRoute {
        &self.con_routes[id.index()]
    }

    pub fn traveler(&self, id: TravelerId) -> &TravelerList {
        &self.travelers[id.index()]
    }

    pub fn route_system(&self, route: RouteId) -> &HighwaySystem {
        self.system(self.route(route).system)
    }

    pub fn waypoint_system(&self, wpt: WaypointId) -> &HighwaySystem {
        self.route_system(self.waypoint(wpt).route)
    }

    /// `root@label` identity used for sorting and log output.
    pub fn root_at_label(&self, wpt: WaypointId) -> String {
        let w = self.waypoint(wpt);
        format!("{}@{}", self.route(w.route).root, w.label)
    }

    /// printable waypoint description used in nmp and concurrency logs.
    pub fn waypoint_str(&self, wpt: WaypointId) -> String {
        let w = self.waypoint(wpt);
        let mut out = format!("{} {}", self.route(w.route).root, w.label);
        if !w.alt_labels.is_empty() {
            out.push_str(" [alt: ['");
            out.push_str(&w.alt_labels.join("', '"));
            out.push_str("']]");
        }
        out.push_str(&format!(
            " ({},{})",
            fmt_g_dot0(w.lat),
            fmt_g_dot0(w.lng)
        ));
        out
    }

    /// human-readable route name, region code included.
    pub fn readable_name(&self, route: RouteId) -> String {
        let r = self.route(route);
        format!("{} {}", self.region(r.region).code, r.list_entry_name())
    }

    /// printable segment description.
    pub fn segment_str(&self, seg: SegmentId) -> String {
        let s = self.segment(seg);
        format!(
            "{} {} {}",
            self.readable_name(s.route),
            self.waypoint(s.waypoint1).label,
            self.waypoint(s.waypoint2).label
        )
    }

    /// graph edge label: comma-joined list names of every active or
    /// preview route concurrent with this segment.
    pub fn segment_name(&self, seg: SegmentId) -> String {
        let s = self.segment(seg);
        match s.concurrent {
            None => {
                if self.route_system(s.route).active_or_preview() {
                    self.route(s.route).list_entry_name()
                } else {
                    String::new()
                }
            }
            Some(group) => {
                let mut name = String::new();
                for &cs in &self.concurrencies[group.index()] {
                    let other = self.segment(cs);
                    if self.route_system(other.route).active_or_preview() {
                        if !name.is_empty() {
                            name.push(',');
                        }
                        name.push_str(&self.route(other.route).list_entry_name());
                    }
                }
                name
            }
        }
    }

    /// members of the waypoint's colocation list, or None if it is alone.
    pub fn colocation(&self, wpt: WaypointId) -> Option<&[WaypointId]> {
        self.waypoint(wpt)
            .colocated
            .map(|c: ColocationId| self.colocations[c.index()].as_slice())
    }

    /// canonical representative for graph vertex lookup: the front of the
    /// colocation list, or the waypoint itself.
    pub fn hashpoint(&self, wpt: WaypointId) -> WaypointId {
        match self.colocation(wpt) {
            Some(members) => members[0],
            None => wpt,
        }
    }

    pub fn num_colocated(&self, wpt: WaypointId) -> usize {
        self.colocation(wpt).map(|m| m.len()).unwrap_or(1)
    }

    pub fn is_or_colocated_with_active_or_preview(&self, wpt: WaypointId) -> bool {
        match self.colocation(wpt) {
            Some(members) => members
                .iter()
                .any(|&m| self.waypoint_system(m).active_or_preview()),
            None => self.waypoint_system(wpt).active_or_preview(),
        }
    }

    /// members of a segment's concurrency group, or None.
    pub fn concurrency(&self, seg: SegmentId) -> Option<&[SegmentId]> {
        self.segment(seg)
            .concurrent
            .map(|c: ConcurrencyId| self.concurrencies[c.index()].as_slice())
    }

    /// the segment of a route joining two waypoints, if adjacent.
    pub fn find_segment_by_waypoints(
        &self,
        route: RouteId,
        w1: WaypointId,
        w2: WaypointId,
    ) -> Option<SegmentId> {
        self.route(route)
            .segments
            .iter()
            .copied()
            .find(|&s| self.segment(s).joins(w1, w2))
    }

    /// miles of a route clinched by one traveler.
    pub fn route_clinched_by(&self, route: RouteId, traveler: TravelerId) -> f64 {
        self.route(route)
            .segments
            .iter()
            .map(|&s| {
                let seg = self.segment(s);
                if seg.clinched_by.contains(traveler.index()) {
                    seg.length
                } else {
                    0.0
                }
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SystemLevel;

    /// minimal dataset: one system, one region, one route with three
    /// points, the middle one hidden.
    fn build_test_data() -> HighwayData {
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
        data.systems.push(HighwaySystem {
            systemname: String::from("usai"),
            country: 0,
            fullname: String::from("United States Interstate Highways"),
            color: String::from("blue"),
            tier: 1,
            level: SystemLevel::Active,
            routes: vec![RouteId(0)],
            con_routes: vec![],
            mileage_by_region: Default::default(),
            list_names_in_use: Default::default(),
            unused_alt_route_names: Default::default(),
        });
        data.routes.push(Route {
            system: SystemId(0),
            region: RegionId(0),
            route: String::from("I-70"),
            banner: String::new(),
            abbrev: String::new(),
            city: String::new(),
            root: String::from("pa.i070"),
            alt_route_names: vec![],
            con_route: None,
            root_order: -1,
            is_reversed: false,
            disconnected: false,
            points: vec![WaypointId(0), WaypointId(1), WaypointId(2)],
            segments: vec![SegmentId(0), SegmentId(1)],
            pri_label_hash: Default::default(),
            alt_label_hash: Default::default(),
            duplicate_labels: Default::default(),
            labels_in_use: Default::default(),
            unused_alt_labels: Default::default(),
            mileage: 0.0,
            last_update: None,
        });
        for (i, (label, lat)) in [("1", 40.0), ("+X01", 40.1), ("2", 40.2)]
            .iter()
            .enumerate()
        {
            data.waypoints.push(Waypoint {
                label: String::from(*label),
                alt_labels: vec![],
                lat: *lat,
                lng: -78.0,
                is_hidden: label.starts_with('+'),
                route: RouteId(0),
                colocated: None,
                near_miss_points: vec![],
            });
            if i > 0 {
                let w1 = WaypointId(i as u32 - 1);
                let w2 = WaypointId(i as u32);
                let length = data.waypoint(w1).distance_to(data.waypoint(w2));
                data.segments
                    .push(HighwaySegment::new(w1, w2, RouteId(0), length));
            }
        }
        data
    }

    #[test]
    fn test_root_at_label() {
        let data = build_test_data();
        assert_eq!(data.root_at_label(WaypointId(0)), "pa.i070@1");
        assert_eq!(data.root_at_label(WaypointId(1)), "pa.i070@+X01");
    }

    #[test]
    fn test_find_segment_by_waypoints() {
        let data = build_test_data();
        assert_eq!(
            data.find_segment_by_waypoints(RouteId(0), WaypointId(1), WaypointId(0)),
            Some(SegmentId(0))
        );
        assert_eq!(
            data.find_segment_by_waypoints(RouteId(0), WaypointId(0), WaypointId(2)),
            None
        );
    }

    #[test]
    fn test_segment_name_single_route() {
        let data = build_test_data();
        assert_eq!(data.segment_name(SegmentId(0)), "I-70");
    }

    #[test]
    fn test_hashpoint_of_lone_waypoint_is_itself() {
        let data = build_test_data();
        assert_eq!(data.hashpoint(WaypointId(2)), WaypointId(2));
    }

    #[test]
    fn test_route_clinched_by() {
        let mut data = build_test_data();
        data.travelers.push(TravelerList::new(String::from("soul"), None));
        data.segment_mut(SegmentId(0)).clinched_by.insert(0);
        let expected = data.segment(SegmentId(0)).length;
        let clinched = data.route_clinched_by(RouteId(0), TravelerId(0));
        assert!((clinched - expected).abs() < 1e-12);
        assert!(clinched > 0.0);
    }
}
