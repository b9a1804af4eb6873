//! systems.csv, per-system chopped-route csv, and connected-route csv
//! readers, plus the post-load route integrity pass.

use std::path::Path;

use serde::Deserialize;
use waymap_core::datacheck::{DatacheckCode, DatacheckList};
use waymap_core::error::ErrorList;
use waymap_core::field;
use waymap_core::model::{
    ConnectedRoute, ConnectedRouteId, HighwayData, HighwaySystem, Route, RouteId, SystemId,
    SystemLevel,
};
use waymap_core::util::canonical_label;

use crate::load::{read_semicolon_csv, record_line};

#[derive(Debug, Deserialize)]
struct SystemRow {
    systemname: String,
    country: String,
    fullname: String,
    color: String,
    tier: String,
    level: String,
}

#[derive(Debug, Deserialize)]
struct ChoppedRow {
    system: String,
    region: String,
    route: String,
    banner: String,
    abbrev: String,
    city: String,
    root: String,
    alt_route_names: String,
}

#[derive(Debug, Deserialize)]
struct ConnectedRow {
    system: String,
    route: String,
    banner: String,
    groupname: String,
    roots: String,
}

/// read the systems list and, for each system, its chopped and
/// connected route csv files.
pub fn read_systems(data: &mut HighwayData, datapath: &Path, systemsfile: &str, el: &ErrorList) {
    let syspath = datapath.join(systemsfile);
    for record in read_semicolon_csv(&syspath, el) {
        if record.len() != 6 {
            el.add_error(format!(
                "Could not parse {} line: [{}], expected 6 fields, found {}",
                syspath.display(),
                record_line(&record),
                record.len()
            ));
            continue;
        }
        let row: SystemRow = match record.deserialize(None) {
            Ok(row) => row,
            Err(e) => {
                el.add_error(format!(
                    "Could not parse {} line: [{}]: {e}",
                    syspath.display(),
                    record_line(&record)
                ));
                continue;
            }
        };
        if row.systemname.len() > field::SYSTEM_NAME {
            el.add_error(format!(
                "System code > {} bytes in {} line {}",
                field::SYSTEM_NAME,
                syspath.display(),
                record_line(&record)
            ));
        }
        if row.fullname.len() > field::SYSTEM_FULL_NAME {
            el.add_error(format!(
                "System name > {} bytes in {} line {}",
                field::SYSTEM_FULL_NAME,
                syspath.display(),
                record_line(&record)
            ));
        }
        if row.color.len() > field::COLOR {
            el.add_error(format!(
                "Color > {} bytes in {} line {}",
                field::COLOR,
                syspath.display(),
                record_line(&record)
            ));
        }
        let country = match data.countries.iter().position(|c| c.code == row.country) {
            Some(i) => i,
            None => {
                el.add_error(format!(
                    "Could not find country matching {} line: {}",
                    syspath.display(),
                    record_line(&record)
                ));
                data.countries.len() - 1
            }
        };
        let tier: u32 = match row.tier.parse() {
            Ok(t) if t >= 1 => t,
            _ => {
                el.add_error(format!(
                    "Invalid tier in {} line {}",
                    syspath.display(),
                    record_line(&record)
                ));
                1
            }
        };
        let level = match SystemLevel::parse(&row.level) {
            Some(l) => l,
            None => {
                el.add_error(format!(
                    "Unrecognized level in {} line: {}",
                    syspath.display(),
                    record_line(&record)
                ));
                SystemLevel::Devel
            }
        };
        let system_id = SystemId(data.systems.len() as u16);
        data.systems.push(HighwaySystem {
            systemname: row.systemname,
            country,
            fullname: row.fullname,
            color: row.color,
            tier,
            level,
            routes: vec![],
            con_routes: vec![],
            mileage_by_region: Default::default(),
            list_names_in_use: Default::default(),
            unused_alt_route_names: Default::default(),
        });
        read_chopped_routes(data, datapath, system_id, el);
        read_connected_routes(data, datapath, system_id, el);
    }
}

fn read_chopped_routes(data: &mut HighwayData, datapath: &Path, system: SystemId, el: &ErrorList) {
    let sysname = data.system(system).systemname.clone();
    let path = datapath
        .join("hwy_data/_systems")
        .join(format!("{sysname}.csv"));
    for record in read_semicolon_csv(&path, el) {
        if record.len() != 8 {
            el.add_error(format!(
                "Could not parse {sysname}.csv line: [{}], expected 8 fields, found {}",
                record_line(&record),
                record.len()
            ));
            continue;
        }
        let row: ChoppedRow = match record.deserialize(None) {
            Ok(row) => row,
            Err(e) => {
                el.add_error(format!(
                    "Could not parse {sysname}.csv line: [{}]: {e}",
                    record_line(&record)
                ));
                continue;
            }
        };
        if row.system != sysname {
            el.add_error(format!(
                "System mismatch parsing {sysname}.csv line [{}], expected {sysname}",
                record_line(&record)
            ));
        }
        if row.root.is_empty() {
            el.add_error(format!(
                "Unable to find root in {sysname}.csv line: [{}]",
                record_line(&record)
            ));
            continue;
        }
        for (value, limit, what) in [
            (&row.route, field::ROUTE, "Route"),
            (&row.banner, field::BANNER, "Banner"),
            (&row.abbrev, field::ABBREV, "Abbrev"),
            (&row.city, field::CITY, "City"),
            (&row.root, field::ROOT, "Root"),
        ] {
            if value.len() > limit {
                el.add_error(format!(
                    "{what} > {limit} bytes in {sysname}.csv line: {}",
                    record_line(&record)
                ));
            }
        }
        let region = match data.region_hash.get(&row.region) {
            Some(&r) => r,
            None => {
                el.add_error(format!(
                    "Unrecognized region in {sysname}.csv line: {}",
                    record_line(&record)
                ));
                *data.region_hash.get("error").unwrap()
            }
        };
        let alt_route_names: Vec<String> = if row.alt_route_names.is_empty() {
            vec![]
        } else {
            row.alt_route_names
                .split(',')
                .map(String::from)
                .collect()
        };
        let route_id = RouteId(data.routes.len() as u32);
        // root uniqueness across the whole corpus
        if data
            .root_hash
            .insert(row.root.to_lowercase(), route_id)
            .is_some()
        {
            el.add_error(format!("Duplicate root in route lists: {}", row.root));
        }
        let route = Route {
            system,
            region,
            route: row.route,
            banner: row.banner,
            abbrev: row.abbrev,
            city: row.city,
            root: row.root,
            alt_route_names,
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
        };
        // list name hashes for traveler-list lookups
        let region_code = data.region(region).code.clone();
        let pri_key = format!("{region_code} {}", route.list_entry_name()).to_uppercase();
        if data.pri_list_hash.insert(pri_key, route_id).is_some() {
            el.add_error(format!(
                "Duplicate listname in route lists: {region_code} {}",
                route.list_entry_name()
            ));
        }
        for alt in &route.alt_route_names {
            let alt_key = format!("{region_code} {alt}").to_uppercase();
            data.alt_list_hash.insert(alt_key.clone(), route_id);
            data.systems[system.index()]
                .unused_alt_route_names
                .insert(alt_key);
        }
        data.routes.push(route);
        data.systems[system.index()].routes.push(route_id);
    }
}

fn read_connected_routes(
    data: &mut HighwayData,
    datapath: &Path,
    system: SystemId,
    el: &ErrorList,
) {
    let sysname = data.system(system).systemname.clone();
    let path = datapath
        .join("hwy_data/_systems")
        .join(format!("{sysname}_con.csv"));
    for record in read_semicolon_csv(&path, el) {
        if record.len() != 5 {
            el.add_error(format!(
                "Could not parse {sysname}_con.csv line: [{}], expected 5 fields, found {}",
                record_line(&record),
                record.len()
            ));
            continue;
        }
        let row: ConnectedRow = match record.deserialize(None) {
            Ok(row) => row,
            Err(e) => {
                el.add_error(format!(
                    "Could not parse {sysname}_con.csv line: [{}]: {e}",
                    record_line(&record)
                ));
                continue;
            }
        };
        if row.system != sysname {
            el.add_error(format!(
                "System mismatch parsing {sysname}_con.csv line [{}], expected {sysname}",
                record_line(&record)
            ));
        }
        if row.route.len() > field::ROUTE {
            el.add_error(format!(
                "route > {} bytes in {sysname}_con.csv line: {}",
                field::ROUTE,
                record_line(&record)
            ));
        }
        if row.banner.len() > field::BANNER {
            el.add_error(format!(
                "banner > {} bytes in {sysname}_con.csv line: {}",
                field::BANNER,
                record_line(&record)
            ));
        }
        if row.groupname.len() > field::CITY {
            el.add_error(format!(
                "groupname > {} bytes in {sysname}_con.csv line: {}",
                field::CITY,
                record_line(&record)
            ));
        }
        let con_id = ConnectedRouteId(data.con_routes.len() as u32);
        let mut roots = vec![];
        for (order, root) in row.roots.to_lowercase().split(',').enumerate() {
            match data.root_hash.get(root) {
                Some(&route_id) => {
                    if let Some(existing) = data.route(route_id).con_route {
                        el.add_error(format!(
                            "Duplicate root in {sysname}_con.csv: {} already in {}_con.csv",
                            data.route(route_id).root,
                            data.system(data.con_route(existing).system).systemname
                        ));
                    }
                    if data.route(route_id).system != system {
                        el.add_error(format!(
                            "System mismatch: chopped route {} from {}.csv in connected route in {sysname}_con.csv",
                            data.route(route_id).root,
                            data.system(data.route(route_id).system).systemname
                        ));
                    }
                    let route = data.route_mut(route_id);
                    route.con_route = Some(con_id);
                    route.root_order = order as i32;
                    roots.push(route_id);
                }
                None => el.add_error(format!(
                    "Could not find Route matching ConnectedRoute root {root} in system {sysname}."
                )),
            }
        }
        if roots.is_empty() {
            el.add_error(format!(
                "No valid roots in {sysname}_con.csv line: {}",
                record_line(&record)
            ));
        }
        data.con_routes.push(ConnectedRoute {
            system,
            route: row.route,
            banner: row.banner,
            groupname: row.groupname,
            roots,
            mileage: 0.0,
            disconnected: false,
        });
        data.systems[system.index()].con_routes.push(con_id);
    }
}

/// post-wpt pass: verify every route joined a connected route, flag
/// banner/abbrev inconsistencies, build per-route label hashes, and
/// decide reversals within connected routes.
pub fn route_integrity(data: &mut HighwayData, el: &ErrorList, datachecks: &mut DatacheckList) {
    for system_index in 0..data.systems.len() {
        let system = SystemId(system_index as u16);
        for route_pos in 0..data.system(system).routes.len() {
            let route_id = data.system(system).routes[route_pos];
            let sysname = data.system(system).systemname.clone();
            if data.route(route_id).con_route.is_none() {
                el.add_error(format!(
                    "{sysname}.csv: root {} not matched by any connected route root.",
                    data.route(route_id).root
                ));
            }
            let r = data.route(route_id);
            let csv_line_ref = format!("{sysname}.csv#L{}", route_pos + 2);
            if r.abbrev.is_empty() {
                if !r.banner.is_empty() && r.city.starts_with(&r.banner) {
                    datachecks.add(
                        route_id,
                        "",
                        "",
                        "",
                        DatacheckCode::AbbrevAsChopBanner,
                        csv_line_ref,
                    );
                }
            } else if r.city.is_empty() {
                datachecks.add(
                    route_id,
                    "",
                    "",
                    "",
                    DatacheckCode::AbbrevNoCity,
                    csv_line_ref,
                );
            }
            build_label_hashes(data, route_id, datachecks);
        }
        for con_pos in 0..data.system(system).con_routes.len() {
            let con_id = data.system(system).con_routes[con_pos];
            con_mismatch_checks(data, con_id, datachecks);
            verify_connectivity(data, con_id, datachecks);
        }
    }
}

/// canonical label -> point index hashes, duplicate detection, and the
/// unused-alt-label pool.
fn build_label_hashes(data: &mut HighwayData, route_id: RouteId, datachecks: &mut DatacheckList) {
    let points = data.route(route_id).points.clone();
    for (index, &wpt) in points.iter().enumerate() {
        let primary = canonical_label(&data.waypoint(wpt).label);
        let route = data.route_mut(route_id);
        if route.alt_label_hash.contains_key(&primary)
            || route
                .pri_label_hash
                .insert(primary.clone(), index)
                .is_some()
        {
            route.duplicate_labels.insert(primary.clone());
            datachecks.add(route_id, &primary, "", "", DatacheckCode::DuplicateLabel, String::new());
        }
        let alts: Vec<String> = data.waypoint(wpt).alt_labels.iter().map(|a| canonical_label(a)).collect();
        for alt in alts {
            let route = data.route_mut(route_id);
            route.unused_alt_labels.insert(alt.clone());
            if route.pri_label_hash.contains_key(&alt)
                || route.alt_label_hash.insert(alt.clone(), index).is_some()
            {
                route.duplicate_labels.insert(alt.clone());
                datachecks.add(route_id, &alt, "", "", DatacheckCode::DuplicateLabel, String::new());
            }
        }
    }
}

/// route and banner fields of each member must match its connected
/// route; a connected banner matching a member's abbrev is its own flag.
fn con_mismatch_checks(data: &HighwayData, con_id: ConnectedRouteId, datachecks: &mut DatacheckList) {
    let con = data.con_route(con_id);
    for (order, &root) in con.roots.iter().enumerate() {
        let route = data.route(root);
        if route.route != con.route {
            datachecks.add(
                root,
                "",
                "",
                "",
                DatacheckCode::ConRouteMismatch,
                format!("{};{}", route.route, con.route),
            );
        }
        if route.banner != con.banner {
            if !route.abbrev.is_empty() && con.banner == route.abbrev {
                datachecks.add(
                    root,
                    "",
                    "",
                    "",
                    DatacheckCode::AbbrevAsConBanner,
                    format!(
                        "{}_con.csv#R{}",
                        data.system(con.system).systemname,
                        order + 1
                    ),
                );
            } else {
                datachecks.add(
                    root,
                    "",
                    "",
                    "",
                    DatacheckCode::ConBannerMismatch,
                    format!("{};{}", route.banner, con.banner),
                );
            }
        }
    }
}

/// decide which members of a connected route run reversed, flagging
/// DISCONNECTED_ROUTE pairs whose endpoints never meet.
fn verify_connectivity(data: &mut HighwayData, con_id: ConnectedRouteId, datachecks: &mut DatacheckList) {
    let roots = data.con_route(con_id).roots.clone();
    for i in 1..roots.len() {
        let q = roots[i - 1];
        let r = roots[i];
        if data.route(q).points.len() < 2 || data.route(r).points.len() < 2 {
            continue;
        }
        let q_beg = data.route(q).con_beg().unwrap();
        let q_end = data.route(q).con_end().unwrap();
        let r_beg = data.route(r).con_beg().unwrap();
        let r_end = data.route(r).con_end().unwrap();
        let joined = data.waypoint(r_beg).same_coords(data.waypoint(q_end));
        let q_flippable = data.waypoint(q_beg).same_coords(data.waypoint(r_beg));
        let r_flippable = data.waypoint(q_end).same_coords(data.waypoint(r_end));
        let both_flippable = data.waypoint(q_beg).same_coords(data.waypoint(r_end));
        if joined {
            continue;
        }
        if q_flippable {
            data.route_mut(q).is_reversed = true;
        } else if r_flippable {
            data.route_mut(r).is_reversed = true;
        } else if both_flippable {
            data.route_mut(q).is_reversed = true;
            data.route_mut(r).is_reversed = true;
        } else {
            let q_end_label = data.waypoint(q_end).label.clone();
            let r_beg_label = data.waypoint(r_beg).label.clone();
            datachecks.add(
                r,
                &r_beg_label,
                "",
                "",
                DatacheckCode::DisconnectedRoute,
                data.root_at_label(q_end),
            );
            datachecks.add(
                q,
                &q_end_label,
                "",
                "",
                DatacheckCode::DisconnectedRoute,
                data.root_at_label(r_beg),
            );
            data.con_routes[con_id.index()].disconnected = true;
            data.route_mut(q).disconnected = true;
            data.route_mut(r).disconnected = true;
        }
    }
}
