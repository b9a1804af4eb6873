//! shared-pavement detection: unifying segments whose endpoints are
//! colocated into concurrency groups, crediting travelers across group
//! members, and the split-region sanity check.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use waymap_core::error::DataError;
use waymap_core::model::{ConcurrencyId, HighwayData, SegmentId, TravelerId};

use crate::logs::log_timestamp;

/// detect concurrencies across all routes, logging each new group and
/// extension to concurrencies.log. the log file stays open for later
/// augmentation lines.
pub fn detect(data: &mut HighwayData, logpath: &Path) -> Result<BufWriter<File>, DataError> {
    let path = logpath.join("concurrencies.log");
    let mut log = BufWriter::new(File::create(&path).map_err(|source| DataError::FileWrite {
        path: path.display().to_string(),
        source,
    })?);
    writeln!(log, "Log file created at: {}", log_timestamp()).map_err(|source| {
        DataError::FileWrite {
            path: path.display().to_string(),
            source,
        }
    })?;

    let segment_order = segments_in_system_order(data);
    // cross-route concurrencies via colocated endpoint pairs
    for &s in &segment_order {
        let (w1, w2, route) = {
            let seg = data.segment(s);
            (seg.waypoint1, seg.waypoint2, seg.route)
        };
        let (Some(coloc1), Some(coloc2)) = (
            data.waypoint(w1).colocated,
            data.waypoint(w2).colocated,
        ) else {
            continue;
        };
        let members1 = data.colocations[coloc1.index()].clone();
        let members2 = data.colocations[coloc2.index()].clone();
        for &other_w1 in &members1 {
            if data.waypoint(other_w1).route == route {
                continue;
            }
            for &other_w2 in &members2 {
                if data.waypoint(other_w2).route != data.waypoint(other_w1).route {
                    continue;
                }
                let other_route = data.waypoint(other_w1).route;
                if let Some(other) = data.find_segment_by_waypoints(other_route, other_w1, other_w2)
                {
                    unify(data, s, other, &mut log);
                }
            }
        }
    }
    // U-turn concurrencies within a single route
    for &s in &segment_order {
        let (w1, w2, route) = {
            let seg = data.segment(s);
            (seg.waypoint1, seg.waypoint2, seg.route)
        };
        let (Some(coloc1), Some(coloc2)) = (
            data.waypoint(w1).colocated,
            data.waypoint(w2).colocated,
        ) else {
            continue;
        };
        let members1 = data.colocations[coloc1.index()].clone();
        let members2 = data.colocations[coloc2.index()].clone();
        for &other_w1 in &members1 {
            if data.waypoint(other_w1).route != route {
                continue;
            }
            for &other_w2 in &members2 {
                if data.waypoint(other_w2).route != route {
                    continue;
                }
                if let Some(other) = data.find_segment_by_waypoints(route, other_w1, other_w2) {
                    if other != s {
                        unify(data, s, other, &mut log);
                    }
                }
            }
        }
    }
    Ok(log)
}

/// put `s` and `other` into one shared group, creating or extending as
/// needed.
fn unify(data: &mut HighwayData, s: SegmentId, other: SegmentId, log: &mut impl Write) {
    match data.segment(s).concurrent {
        None => {
            let group = ConcurrencyId(data.concurrencies.len() as u32);
            data.concurrencies.push(vec![s, other]);
            data.segment_mut(s).concurrent = Some(group);
            data.segment_mut(other).concurrent = Some(group);
            let _ = writeln!(
                log,
                "New concurrency [{}][{}] (2)",
                data.segment_str(s),
                data.segment_str(other)
            );
        }
        Some(group) => {
            data.segment_mut(other).concurrent = Some(group);
            if !data.concurrencies[group.index()].contains(&other) {
                data.concurrencies[group.index()].push(other);
                let mut line = String::from("Extended concurrency ");
                for &member in &data.concurrencies[group.index()] {
                    line.push('[');
                    line.push_str(&data.segment_str(member));
                    line.push(']');
                }
                let _ = writeln!(
                    log,
                    "{line} ({})",
                    data.concurrencies[group.index()].len()
                );
            }
        }
    }
}

/// credit every traveler of a clinched segment with the other active or
/// preview members of its concurrency group, and pre-create all mileage
/// map entries so stats accumulation never inserts.
pub fn augment_travelers(data: &mut HighwayData, log: &mut impl Write) {
    for t in 0..data.travelers.len() {
        let traveler = TravelerId(t as u16);
        let mut clinched: Vec<SegmentId> = data.travelers[t].clinched_segments.iter().copied().collect();
        clinched.sort();
        for s in clinched {
            let Some(group) = data.segment(s).concurrent else {
                continue;
            };
            let members = data.concurrencies[group.index()].clone();
            for other in members {
                if other == s {
                    continue;
                }
                let other_system = data.route_system(data.segment(other).route);
                if !other_system.active_or_preview() {
                    continue;
                }
                if data.segment_mut(other).clinched_by.insert(traveler.index()) {
                    data.travelers[t].clinched_segments.insert(other);
                    let _ = writeln!(
                        log,
                        "{} clinched concurrent [{}] with [{}]",
                        data.travelers[t].name,
                        data.segment_str(other),
                        data.segment_str(s)
                    );
                }
            }
        }
        // pre-populate the traveler's mileage maps for lock-free stats
        let clinched: Vec<SegmentId> = data.travelers[t].clinched_segments.iter().copied().collect();
        for s in clinched {
            let route = data.segment(s).route;
            let (system, region) = (data.route(route).system, data.route(route).region);
            let (active, active_or_preview) = {
                let h = data.system(system);
                (h.active(), h.active_or_preview())
            };
            if !active_or_preview {
                continue;
            }
            let traveler = &mut data.travelers[t];
            traveler
                .active_preview_mileage_by_region
                .entry(region)
                .or_insert(0.0);
            if active {
                traveler
                    .active_only_mileage_by_region
                    .entry(region)
                    .or_insert(0.0);
            }
            traveler
                .system_region_mileages
                .entry(system)
                .or_default()
                .entry(region)
                .or_insert(0.0);
        }
    }
}

/// when a region is being split into subregions, report segments in the
/// region whose concurrency structure looks wrong: no group at all, an
/// odd group size, or no same-name partner in another region.
pub fn split_region_check(
    data: &HighwayData,
    split_path: &Path,
    region_code: &str,
) -> Result<(), DataError> {
    for system in &data.systems {
        let affected: Vec<_> = system
            .routes
            .iter()
            .copied()
            .filter(|&r| data.region(data.route(r).region).code.starts_with(region_code))
            .collect();
        if affected.is_empty() {
            continue;
        }
        let dir = split_path.join("logs");
        let path = dir.join(format!("{}-concurrencies.log", system.systemname));
        let write = || -> std::io::Result<()> {
            std::fs::create_dir_all(&dir)?;
            let mut log = BufWriter::new(File::create(&path)?);
            for &route_id in &affected {
                for &s in &data.route(route_id).segments {
                    match data.concurrency(s) {
                        None => writeln!(log, "{} has no concurrencies", data.segment_str(s))?,
                        Some(members) => {
                            if members.len() % 2 == 1 {
                                writeln!(log, "Odd number of concurrencies:")?;
                                for &m in members {
                                    writeln!(log, "\t{}", data.segment_str(m))?;
                                }
                            }
                            let name = data.route(route_id).list_entry_name();
                            let has_partner = members.iter().any(|&m| {
                                let r = data.route(data.segment(m).route);
                                r.region != data.route(route_id).region
                                    && r.list_entry_name() == name
                            });
                            if !has_partner {
                                writeln!(
                                    log,
                                    "{} has no cross-region partner",
                                    data.segment_str(s)
                                )?;
                            }
                        }
                    }
                }
            }
            Ok(())
        };
        write().map_err(|source| DataError::FileWrite {
            path: path.display().to_string(),
            source,
        })?;
    }
    Ok(())
}

/// all segment ids in system, route, then segment order, the canonical
/// processing order for deterministic group formation and logs.
fn segments_in_system_order(data: &HighwayData) -> Vec<SegmentId> {
    let mut out = vec![];
    for system in &data.systems {
        for &route in &system.routes {
            out.extend_from_slice(&data.route(route).segments);
        }
    }
    out
}
