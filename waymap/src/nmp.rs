//! near-miss point detection, reporting, and the optional merged wpt
//! rewrite.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use rayon::prelude::*;
use waymap_core::error::DataError;
use waymap_core::model::{HighwayData, RouteId, WaypointId};
use waymap_core::quadtree::WaypointQuadtree;
use waymap_core::util::fmt_g_dot0;

use crate::logs::log_timestamp;

/// pairs closer than this in both axes look like an intentional
/// same-point placement rather than an error.
const LOOKS_INTENTIONAL_TOLERANCE: f64 = 0.0000015;

/// populate every waypoint's near-miss list from the finished quadtree.
/// the search is read-only, so waypoints fan out across workers; each
/// list is sorted by root@label for stable downstream output.
pub fn compute_near_miss_points(data: &mut HighwayData, tree: &WaypointQuadtree, tolerance: f64) {
    let lists: Vec<Vec<WaypointId>> = {
        let data: &HighwayData = data;
        (0..data.waypoints.len() as u32)
            .into_par_iter()
            .map(|w| {
                let w = WaypointId(w);
                let mut nmps = tree.near_miss_waypoints(w, tolerance, &data.waypoints);
                nmps.sort_by_cached_key(|&p| data.root_at_label(p));
                nmps
            })
            .collect()
    };
    for (w, list) in lists.into_iter().enumerate() {
        data.waypoints[w].near_miss_points = list;
    }
}

/// write nearmisspoints.log, tm-master.nmp, and nmpfpsunmatched.log,
/// marking false positives and obviously-intentional pairs. marked
/// waypoints have their near-miss lists cleared so the merged wpt
/// rewrite leaves them alone.
pub fn write_nmp_logs(
    data: &mut HighwayData,
    tree: &WaypointQuadtree,
    datapath: &Path,
    logpath: &Path,
) -> Result<(), DataError> {
    // previously-reviewed false positive lines
    let fp_path = datapath.join("nmpfps.log");
    let mut fp_lines: Vec<String> = match std::fs::read_to_string(&fp_path) {
        Ok(text) => text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(String::from)
            .collect(),
        Err(_) => vec![],
    };

    let mut log_lines = vec![];
    let mut nmp_file_lines = vec![];
    let mut cleared: HashSet<WaypointId> = HashSet::new();

    for w in tree.point_list() {
        let nmps = data.waypoint(w).near_miss_points.clone();
        if nmps.is_empty() {
            continue;
        }
        let wp = data.waypoint(w);
        let mut looks_intentional = false;
        let mut nmp_line = format!("{} NMP", data.waypoint_str(w));
        let mut pair_lines = vec![];
        for &other in &nmps {
            let ow = data.waypoint(other);
            if (wp.lat - ow.lat).abs() < LOOKS_INTENTIONAL_TOLERANCE
                && (wp.lng - ow.lng).abs() < LOOKS_INTENTIONAL_TOLERANCE
            {
                looks_intentional = true;
            }
            nmp_line.push(' ');
            nmp_line.push_str(&data.waypoint_str(other));
            // plot each pair once; the NMP is listed from both sides
            if data.root_at_label(w) < data.root_at_label(other) {
                pair_lines.push(format!(
                    "{} {} {}",
                    data.root_at_label(w),
                    fmt_g_dot0(wp.lat),
                    fmt_g_dot0(wp.lng)
                ));
                pair_lines.push(format!(
                    "{} {} {}",
                    data.root_at_label(other),
                    fmt_g_dot0(ow.lat),
                    fmt_g_dot0(ow.lng)
                ));
            }
        }
        let mut extra_field = String::new();
        if let Some(pos) = fp_lines.iter().position(|l| *l == nmp_line) {
            fp_lines.remove(pos);
            nmp_line.push_str(" [MARKED FP]");
            extra_field.push_str("FP");
            cleared.insert(w);
        }
        if looks_intentional {
            nmp_line.push_str(" [LOOKS INTENTIONAL]");
            extra_field.push_str("LI");
            cleared.insert(w);
        }
        log_lines.push(nmp_line);
        for line in pair_lines {
            if extra_field.is_empty() {
                nmp_file_lines.push(line);
            } else {
                nmp_file_lines.push(format!("{line} {extra_field}"));
            }
        }
    }
    for w in cleared {
        data.waypoint_mut(w).near_miss_points.clear();
    }

    log_lines.sort();
    let nmp_log = logpath.join("nearmisspoints.log");
    let mut out = format!("Log file created at: {}\n", log_timestamp());
    for line in &log_lines {
        out.push_str(line);
        out.push('\n');
    }
    std::fs::write(&nmp_log, out).map_err(|source| DataError::FileWrite {
        path: nmp_log.display().to_string(),
        source,
    })?;

    let nmp_path = logpath.join("tm-master.nmp");
    let nmp_contents = if nmp_file_lines.is_empty() {
        String::new()
    } else {
        nmp_file_lines.join("\n") + "\n"
    };
    std::fs::write(&nmp_path, nmp_contents).map_err(|source| {
        DataError::FileWrite {
            path: nmp_path.display().to_string(),
            source,
        }
    })?;

    let unmatched_path = logpath.join("nmpfpsunmatched.log");
    let mut out = format!("Log file created at: {}\n", log_timestamp());
    for line in &fp_lines {
        out.push_str(line);
        out.push('\n');
    }
    std::fs::write(&unmatched_path, out).map_err(|source| DataError::FileWrite {
        path: unmatched_path.display().to_string(),
        source,
    })?;
    Ok(())
}

/// rewrite every route's wpt file with near-miss clusters merged to one
/// point at the cluster's maximum latitude and longitude, marked by an
/// https URL scheme.
pub fn write_nmp_merged(data: &HighwayData, merge_path: &Path) -> Result<(), DataError> {
    let results: Vec<Result<(), DataError>> = (0..data.routes.len() as u32)
        .into_par_iter()
        .map(|r| write_route_merged(data, RouteId(r), merge_path))
        .collect();
    for result in results {
        result?;
    }
    Ok(())
}

fn write_route_merged(
    data: &HighwayData,
    route_id: RouteId,
    merge_path: &Path,
) -> Result<(), DataError> {
    let route = data.route(route_id);
    let dir = merge_path
        .join(&data.region(route.region).code)
        .join(&data.system(route.system).systemname);
    let path = dir.join(format!("{}.wpt", route.root));
    let write = || -> std::io::Result<()> {
        std::fs::create_dir_all(&dir)?;
        let mut out = std::io::BufWriter::new(std::fs::File::create(&path)?);
        for &w in &route.points {
            let wp = data.waypoint(w);
            write!(out, "{} ", wp.label)?;
            for alt in &wp.alt_labels {
                write!(out, "{alt} ")?;
            }
            if wp.near_miss_points.is_empty() {
                writeln!(
                    out,
                    "http://www.openstreetmap.org/?lat={:.6}&lon={:.6}",
                    wp.lat, wp.lng
                )?;
            } else {
                // merge to the northernmost and easternmost coordinates
                let mut lat = wp.lat;
                let mut lng = wp.lng;
                for &other in &wp.near_miss_points {
                    lat = lat.max(data.waypoint(other).lat);
                    lng = lng.max(data.waypoint(other).lng);
                }
                writeln!(
                    out,
                    "https://www.openstreetmap.org/?lat={lat:.6}&lon={lng:.6}"
                )?;
            }
        }
        Ok(())
    };
    write().map_err(|source| DataError::FileWrite {
        path: path.display().to_string(),
        source,
    })
}
