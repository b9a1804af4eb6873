//! log file emission: route/label usage reports and per-traveler
//! statistics logs.

use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;
use waymap_core::error::DataError;
use waymap_core::model::{
    ConnectedRouteId, HighwayData, RegionId, RouteId, SystemId, TravelerId,
};
use waymap_core::util::format_clinched_mi;

/// timestamp used in log file headers.
pub fn log_timestamp() -> String {
    chrono::Local::now().format("%a %b %e %H:%M:%S %Y").to_string()
}

fn write_log_file(path: &Path, contents: String) -> Result<(), DataError> {
    std::fs::write(path, contents).map_err(|source| DataError::FileWrite {
        path: path.display().to_string(),
        source,
    })
}

/// pointsinuse.log, listnamesinuse.log, unusedaltroutenames.log,
/// flippedroutes.log, and unusedaltlabels.log.
pub fn route_and_label_logs(data: &HighwayData, logpath: &Path) -> Result<(), DataError> {
    let stamp = log_timestamp();
    let mut piu = format!("Log file created at: {stamp}\n");
    let mut lniu = format!("Log file created at: {stamp}\n");
    let mut uarn = format!("Log file created at: {stamp}\n");
    let mut flipped = String::new();
    let mut unused_alt_entries = vec![];
    let mut total_unused_alt_labels = 0;
    let mut total_unused_alt_route_names = 0;

    for system in &data.systems {
        for &route_id in &system.routes {
            let route = data.route(route_id);
            if !route.labels_in_use.is_empty() {
                let _ = write!(piu, "{}({}):", route.root, route.points.len());
                for label in &route.labels_in_use {
                    let _ = write!(piu, " {label}");
                }
                piu.push('\n');
            }
            if !route.unused_alt_labels.is_empty() {
                total_unused_alt_labels += route.unused_alt_labels.len();
                let mut entry = format!("{}({}):", route.root, route.unused_alt_labels.len());
                for label in &route.unused_alt_labels {
                    let _ = write!(entry, " {label}");
                }
                unused_alt_entries.push(entry);
            }
            if route.is_reversed {
                flipped.push_str(&route.root);
                flipped.push('\n');
            }
        }
        if !system.list_names_in_use.is_empty() {
            let _ = write!(lniu, "{}({}):", system.systemname, system.routes.len());
            for name in &system.list_names_in_use {
                let _ = write!(lniu, " \"{name}\"");
            }
            lniu.push('\n');
        }
        if !system.unused_alt_route_names.is_empty() {
            total_unused_alt_route_names += system.unused_alt_route_names.len();
            let _ = write!(
                uarn,
                "{}({}):",
                system.systemname,
                system.unused_alt_route_names.len()
            );
            for name in &system.unused_alt_route_names {
                let _ = write!(uarn, " \"{name}\"");
            }
            uarn.push('\n');
        }
    }
    let _ = writeln!(uarn, "Total: {total_unused_alt_route_names}");

    unused_alt_entries.sort();
    let mut ual = format!("Log file created at: {stamp}\n");
    for entry in unused_alt_entries {
        ual.push_str(&entry);
        ual.push('\n');
    }
    let _ = writeln!(ual, "Total: {total_unused_alt_labels}");

    write_log_file(&logpath.join("pointsinuse.log"), piu)?;
    write_log_file(&logpath.join("listnamesinuse.log"), lniu)?;
    write_log_file(&logpath.join("unusedaltroutenames.log"), uarn)?;
    write_log_file(&logpath.join("flippedroutes.log"), flipped)?;
    write_log_file(&logpath.join("unusedaltlabels.log"), ual)
}

/// per-traveler clinched mileage rows destined for the database.
#[derive(Debug, Default)]
pub struct ClinchedTables {
    /// (route, traveler, miles, fully clinched)
    pub routes: Vec<(RouteId, TravelerId, f64, bool)>,
    /// (connected route, traveler, miles, fully clinched)
    pub con_routes: Vec<(ConnectedRouteId, TravelerId, f64, bool)>,
}

/// append clinched-statistics sections to every traveler's log file and
/// collect the clinched route tables for the database writer. log text
/// is composed in parallel; files are written in traveler order.
pub fn write_user_logs(
    data: &HighwayData,
    total_active_only: f64,
    total_active_preview: f64,
    logpath: &Path,
) -> Result<ClinchedTables, DataError> {
    let num_active = data.systems.iter().filter(|h| h.active()).count();
    let num_preview = data.systems.iter().filter(|h| h.preview()).count();

    let composed: Vec<(String, ClinchedTables)> = (0..data.travelers.len() as u16)
        .into_par_iter()
        .map(|t| {
            compose_user_log(
                data,
                TravelerId(t),
                total_active_only,
                total_active_preview,
                num_active,
                num_preview,
            )
        })
        .collect();

    let mut tables = ClinchedTables::default();
    for (t, (text, traveler_tables)) in composed.into_iter().enumerate() {
        let path = logpath
            .join("users")
            .join(format!("{}.log", data.travelers[t].name));
        let write = || -> std::io::Result<()> {
            let mut out = BufWriter::new(OpenOptions::new().append(true).open(&path)?);
            out.write_all(text.as_bytes())
        };
        write().map_err(|source| DataError::FileWrite {
            path: path.display().to_string(),
            source,
        })?;
        tables.routes.extend(traveler_tables.routes);
        tables.con_routes.extend(traveler_tables.con_routes);
    }
    Ok(tables)
}

fn compose_user_log(
    data: &HighwayData,
    traveler_id: TravelerId,
    total_active_only: f64,
    total_active_preview: f64,
    num_active: usize,
    num_preview: usize,
) -> (String, ClinchedTables) {
    let traveler = data.traveler(traveler_id);
    let mut tables = ClinchedTables::default();
    let mut log = String::from("Clinched Highway Statistics\n");
    let _ = writeln!(
        log,
        "Overall in active systems: {}",
        format_clinched_mi(traveler.active_only_miles(), total_active_only)
    );
    let _ = writeln!(
        log,
        "Overall in active+preview systems: {}",
        format_clinched_mi(traveler.active_preview_miles(), total_active_preview)
    );

    log.push_str("Overall by region: (each line reports active only then active+preview)\n");
    let mut regions: Vec<RegionId> = traveler
        .active_preview_mileage_by_region
        .keys()
        .copied()
        .collect();
    regions.sort_by(|a, b| data.region(*a).code.cmp(&data.region(*b).code));
    for region in regions {
        let active_miles = traveler
            .active_only_mileage_by_region
            .get(&region)
            .copied()
            .unwrap_or(0.0);
        let _ = writeln!(
            log,
            "{}: {}, {}",
            data.region(region).code,
            format_clinched_mi(active_miles, data.region(region).active_only_mileage),
            format_clinched_mi(
                traveler.active_preview_mileage_by_region[&region],
                data.region(region).active_preview_mileage
            )
        );
    }

    let mut active_systems_traveled = 0;
    let mut active_systems_clinched = 0;
    let mut preview_systems_traveled = 0;
    let mut preview_systems_clinched = 0;

    for (s, system) in data.systems.iter().enumerate() {
        if !system.active_or_preview() {
            continue;
        }
        let system_id = SystemId(s as u16);
        let Some(by_region) = traveler.system_region_mileages.get(&system_id) else {
            continue;
        };
        if system.active() {
            active_systems_traveled += 1;
        } else {
            preview_systems_traveled += 1;
        }
        let system_overall: f64 = by_region.values().sum();
        let _ = writeln!(
            log,
            "System {} ({}) overall: {}",
            system.systemname,
            system.level.name(),
            format_clinched_mi(system_overall, system.total_mileage())
        );
        if system.mileage_by_region.len() > 1 {
            let _ = writeln!(log, "System {} by region:", system.systemname);
            let mut sys_regions: Vec<RegionId> =
                system.mileage_by_region.keys().copied().collect();
            sys_regions.sort_by(|a, b| data.region(*a).code.cmp(&data.region(*b).code));
            for region in sys_regions {
                let miles = by_region.get(&region).copied().unwrap_or(0.0);
                let _ = writeln!(
                    log,
                    "  {}: {}",
                    data.region(region).code,
                    format_clinched_mi(miles, system.mileage_by_region[&region])
                );
            }
        }
        let mut con_rtes_traveled = 0;
        let mut con_rtes_clinched = 0;
        let _ = writeln!(
            log,
            "System {} by route (traveled routes only):",
            system.systemname
        );
        for &con_id in &system.con_routes {
            let con = data.con_route(con_id);
            let mut con_clinched = 0.0;
            let mut chop_mi = vec![];
            for &root in &con.roots {
                let miles = data.route_clinched_by(root, traveler_id);
                if miles > 0.0 {
                    let clinched = miles == data.route(root).mileage;
                    tables.routes.push((root, traveler_id, miles, clinched));
                    con_clinched += miles;
                    chop_mi.push((root, miles));
                }
            }
            if con_clinched > 0.0 {
                con_rtes_traveled += 1;
                let fully = con_clinched == con.mileage;
                if fully {
                    con_rtes_clinched += 1;
                }
                tables
                    .con_routes
                    .push((con_id, traveler_id, con_clinched, fully));
                let _ = writeln!(
                    log,
                    "{}: {}",
                    con.readable_name(),
                    format_clinched_mi(con_clinched, con.mileage)
                );
                if con.roots.len() == 1 {
                    let _ = writeln!(log, " ({} only)", data.readable_name(con.roots[0]));
                } else {
                    for (root, miles) in chop_mi {
                        let _ = writeln!(
                            log,
                            "  {}: {}",
                            data.readable_name(root),
                            format_clinched_mi(miles, data.route(root).mileage)
                        );
                    }
                }
            }
        }
        if con_rtes_clinched == system.con_routes.len() && !system.con_routes.is_empty() {
            if system.active() {
                active_systems_clinched += 1;
            } else {
                preview_systems_clinched += 1;
            }
        }
        let count = system.con_routes.len().max(1);
        let _ = writeln!(
            log,
            "System {} connected routes traveled: {} of {} ({:.1}%), clinched: {} of {} ({:.1}%).",
            system.systemname,
            con_rtes_traveled,
            system.con_routes.len(),
            100.0 * con_rtes_traveled as f64 / count as f64,
            con_rtes_clinched,
            system.con_routes.len(),
            100.0 * con_rtes_clinched as f64 / count as f64
        );
    }

    let pct = |n: usize, d: usize| {
        if d == 0 {
            0.0
        } else {
            100.0 * n as f64 / d as f64
        }
    };
    let _ = writeln!(
        log,
        "\nTraveled {} of {} ({:.1}%), Clinched {} of {} ({:.1}%) active systems",
        active_systems_traveled,
        num_active,
        pct(active_systems_traveled, num_active),
        active_systems_clinched,
        num_active,
        pct(active_systems_clinched, num_active)
    );
    let _ = writeln!(
        log,
        "Traveled {} of {} ({:.1}%), Clinched {} of {} ({:.1}%) preview systems",
        preview_systems_traveled,
        num_preview,
        pct(preview_systems_traveled, num_preview),
        preview_systems_clinched,
        num_preview,
        pct(preview_systems_clinched, num_preview)
    );

    log.push_str("\nMost recent updates for listed routes:\n");
    let mut updated: Vec<RouteId> = traveler
        .routes
        .iter()
        .copied()
        .filter(|&r| data.route(r).last_update.is_some())
        .collect();
    updated.sort_by_key(|&r| {
        let u = &data.updates[data.route(r).last_update.unwrap()];
        (u.date.clone(), data.route(r).root.clone())
    });
    for r in updated {
        let u = &data.updates[data.route(r).last_update.unwrap()];
        let _ = writeln!(
            log,
            "{} | {} | {} | {} | {}",
            u.date, u.region, u.route, u.root, u.description
        );
    }
    (log, tables)
}

/// the waypoint naming log produced during graph construction.
pub fn write_waypoint_simplification_log(
    lines: &[String],
    logpath: &Path,
) -> Result<(), DataError> {
    let path = logpath.join("waypointsimplification.log");
    let write = || -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(&path)?);
        for line in lines {
            writeln!(out, "{line}")?;
        }
        Ok(())
    };
    write().map_err(|source| DataError::FileWrite {
        path: path.display().to_string(),
        source,
    })
}

/// wpt files present on disk that no route consumed.
pub fn write_unprocessed_wpts(
    unprocessed: &mut Vec<String>,
    logpath: &Path,
) -> Result<(), DataError> {
    unprocessed.sort();
    let path = logpath.join("unprocessedwpts.log");
    let mut out = String::new();
    for file in unprocessed {
        out.push_str(file);
        out.push('\n');
    }
    write_log_file(&path, out)
}
