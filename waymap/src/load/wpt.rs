//! .wpt file reading: parsing waypoint lines, running per-route data
//! checks, and inserting every waypoint into the shared quadtree.
//!
//! files are parsed in parallel; quadtree insertion and colocation
//! assembly happen on one thread afterwards so grouping needs no locks.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use kdam::tqdm;
use rayon::prelude::*;
use regex::Regex;
use waymap_core::datacheck::{DatacheckCode, DatacheckList};
use waymap_core::error::ErrorList;
use waymap_core::field;
use waymap_core::geo;
use waymap_core::label::{scan_label, visible_label_checks, CharScan};
use waymap_core::model::{HighwayData, HighwaySegment, RouteId, SegmentId, Waypoint, WaypointId};
use waymap_core::quadtree::WaypointQuadtree;
use waymap_core::util::{fmt_g, valid_num_str};

static URL_COORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(lat|lon|lng)=([^&]*)").expect("coordinate pattern compiles"));

#[derive(Debug, Clone)]
struct ParsedPoint {
    label: String,
    alt_labels: Vec<String>,
    lat: f64,
    lng: f64,
    is_hidden: bool,
}

#[derive(Debug)]
struct ParsedRoute {
    route: RouteId,
    points: Vec<ParsedPoint>,
    datachecks: DatacheckList,
    fatal: Vec<String>,
}

/// every .wpt file under the data path, for the unprocessed-file sweep.
pub fn find_wpt_files(datapath: &Path) -> HashSet<PathBuf> {
    let mut files = HashSet::new();
    let mut stack = vec![datapath.join("hwy_data")];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|e| e == "wpt") {
                files.insert(path);
            }
        }
    }
    files
}

/// read every route's .wpt file, run the load-time datachecks, create
/// segments, and insert all waypoints into the quadtree. returns the
/// set of files consumed.
pub fn read_all_wpts(
    data: &mut HighwayData,
    tree: &mut WaypointQuadtree,
    datachecks: &mut DatacheckList,
    el: &ErrorList,
    datapath: &Path,
) -> HashSet<PathBuf> {
    let route_ids: Vec<RouteId> = (0..data.routes.len() as u32).map(RouteId).collect();
    let parsed: Vec<(ParsedRoute, PathBuf)> = {
        let data: &HighwayData = data;
        route_ids
            .par_iter()
            .map(|&route_id| parse_route_file(data, route_id, datapath, el))
            .collect()
    };

    let mut consumed = HashSet::new();
    log::info!("inserting waypoints for {} routes", parsed.len());
    for (route, path) in tqdm!(parsed.into_iter()) {
        consumed.insert(path);
        for msg in route.fatal {
            el.add_error(msg);
        }
        datachecks.merge(route.datachecks);
        let mut point_ids = vec![];
        for point in route.points {
            let id = WaypointId(data.waypoints.len() as u32);
            data.waypoints.push(Waypoint {
                label: point.label,
                alt_labels: point.alt_labels,
                lat: point.lat,
                lng: point.lng,
                is_hidden: point.is_hidden,
                route: route.route,
                colocated: None,
                near_miss_points: vec![],
            });
            tree.insert(id, &mut data.waypoints, &mut data.colocations);
            point_ids.push(id);
        }
        let mut segment_ids = vec![];
        for pair in point_ids.windows(2) {
            let id = SegmentId(data.segments.len() as u32);
            let length = data.waypoint(pair[0]).distance_to(data.waypoint(pair[1]));
            data.segments
                .push(HighwaySegment::new(pair[0], pair[1], route.route, length));
            segment_ids.push(id);
        }
        let r = data.route_mut(route.route);
        r.points = point_ids;
        r.segments = segment_ids;
    }
    consumed
}

fn parse_route_file(
    data: &HighwayData,
    route_id: RouteId,
    datapath: &Path,
    el: &ErrorList,
) -> (ParsedRoute, PathBuf) {
    let route = data.route(route_id);
    let region_code = &data.region(route.region).code;
    let sysname = &data.system(route.system).systemname;
    let path = datapath
        .join("hwy_data")
        .join(region_code)
        .join(sysname)
        .join(format!("{}.wpt", route.root));

    let mut parsed = ParsedRoute {
        route: route_id,
        points: vec![],
        datachecks: DatacheckList::new(),
        fatal: vec![],
    };
    let contents = match std::fs::read(&path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => {
            el.add_error(format!("Could not open {}", path.display()));
            return (parsed, path);
        }
    };
    let wpt_name = format!("{region_code}/{sysname}/{}.wpt", route.root);
    for line in contents.split(['\r', '\n']) {
        if let Some(point) = parse_wpt_line(line, route_id, &mut parsed.datachecks) {
            parsed.points.push(point);
        }
    }
    if parsed.points.len() < 2 {
        el.add_error(format!(
            "Route contains fewer than 2 points: {} ({} total points)",
            route.root,
            parsed.points.len()
        ));
    }
    route_datachecks(data, route_id, &wpt_name, &mut parsed);
    (parsed, path)
}

/// one waypoint line: a primary label, any alternate labels, and an OSM
/// URL carrying the coordinates.
fn parse_wpt_line(
    line: &str,
    route_id: RouteId,
    datachecks: &mut DatacheckList,
) -> Option<ParsedPoint> {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }
    let url = if tokens.len() > 1 {
        tokens.pop()
    } else {
        None
    };
    let label = String::from(tokens[0]);
    let alt_labels: Vec<String> = tokens[1..].iter().map(|t| String::from(*t)).collect();
    let is_hidden = label.starts_with('+');

    let mut lat = 0.0;
    let mut lng = 0.0;
    match url {
        None => {
            datachecks.add(
                route_id,
                &label,
                "",
                "",
                DatacheckCode::MalformedUrl,
                String::from("MISSING_ARG(S)"),
            );
        }
        Some(url) => {
            let mut lat_val = None;
            let mut lng_val = None;
            for cap in URL_COORD.captures_iter(url) {
                match &cap[1] {
                    "lat" => lat_val = Some(String::from(&cap[2])),
                    _ => lng_val = Some(String::from(&cap[2])),
                }
            }
            if lat_val.is_none() || lng_val.is_none() {
                let info = if url.len() <= field::DC_ERR_VALUE {
                    String::from(url)
                } else {
                    String::from("MISSING_ARG(S)")
                };
                datachecks.add(route_id, &label, "", "", DatacheckCode::MalformedUrl, info);
            }
            if let Some(val) = lat_val {
                if valid_num_str(&val) {
                    lat = val.parse().unwrap_or(0.0);
                } else {
                    datachecks.add(
                        route_id,
                        &label,
                        "",
                        "",
                        DatacheckCode::MalformedLat,
                        truncate(&val),
                    );
                }
            }
            if let Some(val) = lng_val {
                if valid_num_str(&val) {
                    lng = val.parse().unwrap_or(0.0);
                } else {
                    datachecks.add(
                        route_id,
                        &label,
                        "",
                        "",
                        DatacheckCode::MalformedLon,
                        truncate(&val),
                    );
                }
            }
        }
    }
    Some(ParsedPoint {
        label,
        alt_labels,
        lat,
        lng,
        is_hidden,
    })
}

fn truncate(value: &str) -> String {
    value.chars().take(field::DC_ERR_VALUE).collect()
}

/// the single-point and per-route checks run at load time.
fn route_datachecks(data: &HighwayData, route_id: RouteId, wpt_name: &str, parsed: &mut ParsedRoute) {
    let route = data.route(route_id);
    let active = data.system(route.system).active();
    let dc = &mut parsed.datachecks;
    let points = &parsed.points;

    let mut coords_used: HashSet<(u64, u64)> = HashSet::new();
    let mut vis_dist = 0.0;
    let mut last_visible: Option<usize> = None;

    for (i, point) in points.iter().enumerate() {
        // out-of-bounds coordinates
        if point.lat > 90.0 || point.lat < -90.0 || point.lng > 180.0 || point.lng < -180.0 {
            dc.add(
                route_id,
                &point.label,
                "",
                "",
                DatacheckCode::OutOfBounds,
                format!("({},{})", fmt_g(point.lat), fmt_g(point.lng)),
            );
        }
        // duplicate coordinates within the route
        if !coords_used.insert((point.lat.to_bits(), point.lng.to_bits())) {
            if let Some(first) = points[..i]
                .iter()
                .find(|p| p.lat == point.lat && p.lng == point.lng)
            {
                dc.add(
                    route_id,
                    &first.label,
                    &point.label,
                    "",
                    DatacheckCode::DuplicateCoords,
                    format!("({},{})", fmt_g(point.lat), fmt_g(point.lng)),
                );
            }
        }
        // segment length checks
        if i > 0 {
            let prev = &points[i - 1];
            let length = geo::distance(prev.lat, prev.lng, point.lat, point.lng);
            vis_dist += length;
            if length > 20.0 {
                dc.add(
                    route_id,
                    &prev.label,
                    &point.label,
                    "",
                    DatacheckCode::LongSegment,
                    format!("{length:.2}"),
                );
            }
        }
        // character validation applies to every label
        for lbl in std::iter::once(&point.label).chain(point.alt_labels.iter()) {
            match scan_label(lbl) {
                CharScan::Ok => {}
                CharScan::InvalidChar => {
                    dc.add(route_id, lbl, "", "", DatacheckCode::LabelInvalidChar, String::new());
                }
                CharScan::Fatal(what) => {
                    parsed.fatal.push(format!("{what} in {wpt_name}"));
                }
            }
        }
        // checks for visible points
        if !point.is_hidden {
            if vis_dist > 10.0 && !active {
                if let Some(lv) = last_visible {
                    dc.add(
                        route_id,
                        &points[lv].label,
                        &point.label,
                        "",
                        DatacheckCode::VisibleDistance,
                        format!("{vis_dist:.2}"),
                    );
                }
            }
            last_visible = Some(i);
            vis_dist = 0.0;
            for (code, info) in visible_label_checks(&point.label, &route.route, &route.banner) {
                dc.add(route_id, &point.label, "", "", code, info);
            }
        }
    }

    // hidden termini
    if let Some(first) = points.first() {
        if first.is_hidden {
            dc.add(route_id, &first.label, "", "", DatacheckCode::HiddenTerminus, String::new());
        }
    }
    if points.len() > 1 {
        if let Some(last) = points.last() {
            if last.is_hidden {
                dc.add(route_id, &last.label, "", "", DatacheckCode::HiddenTerminus, String::new());
            }
        }
    }

    // angle checks over interior points
    for i in 1..points.len().saturating_sub(1) {
        let (prev, mid, succ) = (&points[i - 1], &points[i], &points[i + 1]);
        let coincident = (prev.lat == mid.lat && prev.lng == mid.lng)
            || (succ.lat == mid.lat && succ.lng == mid.lng);
        if coincident {
            dc.add(
                route_id,
                &prev.label,
                &mid.label,
                &succ.label,
                DatacheckCode::BadAngle,
                String::new(),
            );
        } else {
            let angle = geo::angle(
                (prev.lat, prev.lng),
                (mid.lat, mid.lng),
                (succ.lat, succ.lng),
            );
            if angle > 135.0 {
                dc.add(
                    route_id,
                    &prev.label,
                    &mid.label,
                    &succ.label,
                    DatacheckCode::SharpAngle,
                    format!("{angle:.2}"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> (Option<ParsedPoint>, DatacheckList) {
        let mut dc = DatacheckList::new();
        let point = parse_wpt_line(line, RouteId(0), &mut dc);
        (point, dc)
    }

    #[test]
    fn test_parse_full_line() {
        let (point, dc) = parse(
            "US30 +X001 http://www.openstreetmap.org/?lat=40.123456&lon=-75.654321",
        );
        let point = point.unwrap();
        assert_eq!(point.label, "US30");
        assert_eq!(point.alt_labels, vec!["+X001"]);
        assert_eq!(point.lat, 40.123456);
        assert_eq!(point.lng, -75.654321);
        assert!(!point.is_hidden);
        assert!(dc.entries.is_empty());
    }

    #[test]
    fn test_parse_hidden_point() {
        let (point, _) = parse("+X550 http://www.openstreetmap.org/?lat=40.0&lon=-75.0");
        assert!(point.unwrap().is_hidden);
    }

    #[test]
    fn test_malformed_lat() {
        let (point, dc) = parse("P http://www.openstreetmap.org/?lat=40.1.2&lon=-75.0");
        assert_eq!(point.unwrap().lat, 0.0);
        assert_eq!(dc.entries.len(), 1);
        assert_eq!(dc.entries[0].code, DatacheckCode::MalformedLat);
        assert_eq!(dc.entries[0].info, "40.1.2");
    }

    #[test]
    fn test_missing_coordinate_parameter() {
        let (_, dc) = parse("P http://www.openstreetmap.org/?lat=40.0");
        assert_eq!(dc.entries.len(), 1);
        assert_eq!(dc.entries[0].code, DatacheckCode::MalformedUrl);
    }

    #[test]
    fn test_no_url() {
        let (point, dc) = parse("Lonely");
        assert!(point.is_some());
        assert_eq!(dc.entries[0].code, DatacheckCode::MalformedUrl);
        assert_eq!(dc.entries[0].info, "MISSING_ARG(S)");
    }

    #[test]
    fn test_blank_line_skipped() {
        let (point, dc) = parse("   ");
        assert!(point.is_none());
        assert!(dc.entries.is_empty());
    }

    #[test]
    fn test_lng_parameter_accepted() {
        let (point, dc) = parse("P http://www.openstreetmap.org/?lat=40.0&lng=-75.0");
        assert_eq!(point.unwrap().lng, -75.0);
        assert!(dc.entries.is_empty());
    }
}
