//! mileage statistics: per-route, per-region, per-system, and
//! per-traveler accumulation under concurrency rules.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;
use waymap_core::error::DataError;
use waymap_core::model::{HighwayData, RegionId, RouteId, SystemId};

use crate::logs::log_timestamp;

#[derive(Debug, Default)]
struct RouteStats {
    mileage: f64,
    overall: f64,
    active_preview: f64,
    active_only: f64,
    system: f64,
    /// traveler index -> (active+preview, active-only, system-region)
    travelers: HashMap<usize, (f64, f64, f64)>,
}

/// segment lengths divided by each concurrency denominator, computed in
/// parallel per route and merged in route order so float accumulation
/// is identical run to run.
pub fn compute_stats(data: &mut HighwayData) {
    let per_route: Vec<RouteStats> = {
        let data: &HighwayData = data;
        (0..data.routes.len() as u32)
            .into_par_iter()
            .map(|r| route_stats(data, RouteId(r)))
            .collect()
    };

    for (r, stats) in per_route.into_iter().enumerate() {
        let route_id = RouteId(r as u32);
        let (region, system) = {
            let route = data.route(route_id);
            (route.region, route.system)
        };
        data.routes[r].mileage = stats.mileage;
        {
            let region = &mut data.regions[region.index()];
            region.overall_mileage += stats.overall;
            region.active_preview_mileage += stats.active_preview;
            region.active_only_mileage += stats.active_only;
        }
        *data.systems[system.index()]
            .mileage_by_region
            .entry(region)
            .or_insert(0.0) += stats.system;
        let system_active = data.system(system).active();
        let mut credits: Vec<_> = stats.travelers.into_iter().collect();
        credits.sort_by_key(|&(t, _)| t);
        for (t, (ap, ao, sys)) in credits {
            let traveler = &mut data.travelers[t];
            *traveler
                .active_preview_mileage_by_region
                .entry(region)
                .or_insert(0.0) += ap;
            if system_active {
                *traveler
                    .active_only_mileage_by_region
                    .entry(region)
                    .or_insert(0.0) += ao;
            }
            *traveler
                .system_region_mileages
                .entry(system)
                .or_default()
                .entry(region)
                .or_insert(0.0) += sys;
        }
    }

    // connected route mileage is the sum over its chopped members
    for c in 0..data.con_routes.len() {
        let total: f64 = data.con_routes[c]
            .roots
            .iter()
            .map(|&r| data.route(r).mileage)
            .sum();
        data.con_routes[c].mileage = total;
    }
}

fn route_stats(data: &HighwayData, route_id: RouteId) -> RouteStats {
    let route = data.route(route_id);
    let system = data.system(route.system);
    let mut stats = RouteStats::default();
    for &seg_id in &route.segments {
        let seg = data.segment(seg_id);
        let mut overall_count = 1u32;
        let mut ap_count = 1u32;
        let mut ao_count = 1u32;
        let mut sys_count = 1u32;
        if let Some(group) = data.concurrency(seg_id) {
            for &other in group {
                if other == seg_id {
                    continue;
                }
                overall_count += 1;
                let other_route = data.route(data.segment(other).route);
                let other_system = data.system(other_route.system);
                if other_system.active_or_preview() {
                    ap_count += 1;
                    if other_system.active() {
                        ao_count += 1;
                    }
                }
                if other_route.system == route.system {
                    sys_count += 1;
                }
            }
        }
        stats.mileage += seg.length;
        stats.overall += seg.length / overall_count as f64;
        if system.active_or_preview() {
            stats.active_preview += seg.length / ap_count as f64;
        }
        if system.active() {
            stats.active_only += seg.length / ao_count as f64;
        }
        stats.system += seg.length / sys_count as f64;

        if system.active_or_preview() {
            for t in seg.clinched_by.iter() {
                let credit = stats.travelers.entry(t).or_insert((0.0, 0.0, 0.0));
                credit.0 += seg.length / ap_count as f64;
                if system.active() {
                    credit.1 += seg.length / ao_count as f64;
                }
                credit.2 += seg.length / sys_count as f64;
            }
        }
    }
    stats
}

/// the highwaydatastats.log rollup: project totals, per-region
/// breakdown, then per-system totals by region and connected route.
/// returns the (active-only, active+preview) grand totals.
pub fn write_highway_data_stats(
    data: &HighwayData,
    logpath: &Path,
) -> Result<(f64, f64), DataError> {
    let path = logpath.join("highwaydatastats.log");
    let mut active_only_miles = 0.0;
    let mut active_preview_miles = 0.0;
    let mut overall_miles = 0.0;
    for region in &data.regions {
        active_only_miles += region.active_only_mileage;
        active_preview_miles += region.active_preview_mileage;
        overall_miles += region.overall_mileage;
    }
    let write = || -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(&path)?);
        writeln!(out, "Travel Mapping highway mileage as of {}", log_timestamp())?;
        writeln!(out, "Active routes (active): {active_only_miles:.2} mi")?;
        writeln!(
            out,
            "Clinchable routes (active, preview): {active_preview_miles:.2} mi"
        )?;
        writeln!(
            out,
            "All routes (active, preview, devel): {overall_miles:.2} mi"
        )?;
        writeln!(out, "Breakdown by region:")?;
        for region in &data.regions {
            if region.overall_mileage == 0.0 {
                continue;
            }
            writeln!(
                out,
                "{}: {:.2} (active), {:.2} (active, preview) {:.2} (active, preview, devel)",
                region.code,
                region.active_only_mileage,
                region.active_preview_mileage,
                region.overall_mileage
            )?;
        }
        for system in &data.systems {
            writeln!(
                out,
                "System {} ({}) total: {:.2} mi",
                system.systemname,
                system.level.name(),
                system.total_mileage()
            )?;
            if system.mileage_by_region.len() > 1 {
                writeln!(out, "System {} by region:", system.systemname)?;
                let mut regions: Vec<RegionId> =
                    system.mileage_by_region.keys().copied().collect();
                regions.sort_by(|a, b| {
                    data.region(*a).code.cmp(&data.region(*b).code)
                });
                for region in regions {
                    writeln!(
                        out,
                        "{}: {:.2} mi",
                        data.region(region).code,
                        system.mileage_by_region[&region]
                    )?;
                }
            }
            writeln!(out, "System {} by route:", system.systemname)?;
            for &con_id in &system.con_routes {
                let con = data.con_route(con_id);
                let mut chopped = String::new();
                for &root in &con.roots {
                    chopped.push_str(&format!(
                        "  {}: {:.2} mi\n",
                        data.readable_name(root),
                        data.route(root).mileage
                    ));
                }
                write!(out, "{}: {:.2} mi", con.readable_name(), con.mileage)?;
                if con.roots.len() == 1 {
                    writeln!(out, " ({} only)", data.readable_name(con.roots[0]))?;
                } else {
                    writeln!(out)?;
                    write!(out, "{chopped}")?;
                }
            }
        }
        Ok(())
    };
    write().map_err(|source| DataError::FileWrite {
        path: path.display().to_string(),
        source,
    })?;
    Ok((active_only_miles, active_preview_miles))
}

/// allbyregionactiveonly.csv and allbyregionactivepreview.csv: traveler
/// by region mileage matrices with a TOTAL footer row.
pub fn write_all_by_region_csvs(data: &HighwayData, csvpath: &Path) -> Result<(), DataError> {
    write_all_by_region(data, csvpath, "allbyregionactiveonly.csv", true)?;
    write_all_by_region(data, csvpath, "allbyregionactivepreview.csv", false)
}

fn write_all_by_region(
    data: &HighwayData,
    csvpath: &Path,
    filename: &str,
    active_only: bool,
) -> Result<(), DataError> {
    let path = csvpath.join(filename);
    let region_total = |r: &waymap_core::model::Region| {
        if active_only {
            r.active_only_mileage
        } else {
            r.active_preview_mileage
        }
    };
    let regions: Vec<RegionId> = (0..data.regions.len() as u16)
        .map(RegionId)
        .filter(|&r| region_total(data.region(r)) > 0.0)
        .collect();
    let total_mi: f64 = regions.iter().map(|&r| region_total(data.region(r))).sum();
    let write = || -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(&path)?);
        write!(out, "Traveler,Total")?;
        for &r in &regions {
            write!(out, ",{}", data.region(r).code)?;
        }
        writeln!(out)?;
        for traveler in &data.travelers {
            let by_region = if active_only {
                &traveler.active_only_mileage_by_region
            } else {
                &traveler.active_preview_mileage_by_region
            };
            let t_total: f64 = by_region.values().sum();
            write!(out, "{},{t_total:.2}", traveler.name)?;
            for &r in &regions {
                match by_region.get(&r) {
                    Some(mi) => write!(out, ",{mi:.2}")?,
                    None => write!(out, ",0")?,
                }
            }
            writeln!(out)?;
        }
        write!(out, "TOTAL,{total_mi:.2}")?;
        for &r in &regions {
            write!(out, ",{:.2}", region_total(data.region(r)))?;
        }
        writeln!(out)?;
        Ok(())
    };
    write().map_err(|source| DataError::FileWrite {
        path: path.display().to_string(),
        source,
    })
}

/// per-system traveler by region matrices, one csv per active or
/// preview system, written in parallel.
pub fn write_system_csvs(data: &HighwayData, csvpath: &Path) -> Result<(), DataError> {
    let results: Vec<Result<(), DataError>> = data
        .systems
        .par_iter()
        .enumerate()
        .filter(|(_, system)| system.active_or_preview())
        .map(|(s, system)| write_one_system_csv(data, SystemId(s as u16), system, csvpath))
        .collect();
    for result in results {
        result?;
    }
    Ok(())
}

fn write_one_system_csv(
    data: &HighwayData,
    system_id: SystemId,
    system: &waymap_core::model::HighwaySystem,
    csvpath: &Path,
) -> Result<(), DataError> {
    {
        let path = csvpath.join(format!("{}-all.csv", system.systemname));
        let mut regions: Vec<RegionId> = system.mileage_by_region.keys().copied().collect();
        regions.sort_by(|a, b| data.region(*a).code.cmp(&data.region(*b).code));
        let write = || -> std::io::Result<()> {
            let mut out = BufWriter::new(File::create(&path)?);
            write!(out, "Traveler,Total")?;
            for &r in &regions {
                write!(out, ",{}", data.region(r).code)?;
            }
            writeln!(out)?;
            for traveler in &data.travelers {
                let by_region = traveler.system_region_mileages.get(&system_id);
                let t_total: f64 = by_region
                    .map(|m| m.values().sum())
                    .unwrap_or(0.0);
                write!(out, "{},{t_total:.2}", traveler.name)?;
                for &r in &regions {
                    match by_region.and_then(|m| m.get(&r)) {
                        Some(mi) => write!(out, ",{mi:.2}")?,
                        None => write!(out, ",0")?,
                    }
                }
                writeln!(out)?;
            }
            write!(out, "TOTAL,{:.2}", system.total_mileage())?;
            for &r in &regions {
                write!(out, ",{:.2}", system.mileage_by_region[&r])?;
            }
            writeln!(out)?;
            Ok(())
        };
        write().map_err(|source| DataError::FileWrite {
            path: path.display().to_string(),
            source,
        })?;
    }
    Ok(())
}
