//! the end-to-end batch pipeline, stage by stage.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use waymap_core::datacheck::{DatacheckCode, DatacheckList, FpEntry};
use waymap_core::error::{DataError, ErrorList};
use waymap_core::model::{HighwayData, RegionId};
use waymap_core::quadtree::WaypointQuadtree;
use waymap_graph::{GraphCategory, GraphListEntry, HighwayGraph};

use crate::app::args::Args;
use crate::app::elapsed::ElapsedTime;
use crate::concurrency;
use crate::load::{graph_csv, read_semicolon_csv_optional, record_line, region_csv, system_csv, updates, wpt};
use crate::logs::{self, log_timestamp};
use crate::nmp;
use crate::sql;
use crate::stats;
use crate::userlist;

/// run the whole pipeline. returns the process exit code.
pub fn run(args: &Args) -> Result<i32, DataError> {
    // worker pool for all parallel fan-outs; in-process reruns may have
    // built it already
    let _ = rayon::ThreadPoolBuilder::new()
        .num_threads(args.numthreads)
        .build_global();

    let et = ElapsedTime::new(args.timeprecision);
    let datapath = Path::new(&args.datapath);
    let logpath = Path::new(&args.logfilepath);
    let csvpath = Path::new(&args.csvstatfilepath);
    let graphpath = Path::new(&args.graphfilepath);

    let el = ErrorList::new();
    let mut datachecks = DatacheckList::new();
    let mut data = HighwayData::default();

    log::info!(
        "{}Reading region, country, and continent descriptions.",
        et.et()
    );
    region_csv::read_region_csvs(&mut data, datapath, &el);

    log::info!("{}Reading systems list.", et.et());
    system_csv::read_systems(&mut data, datapath, &args.systemsfile, &el);

    log::info!("{}Finding all .wpt files.", et.et());
    let all_wpt_files = wpt::find_wpt_files(datapath);

    log::info!("{}Reading waypoints for all routes.", et.et());
    let mut tree = WaypointQuadtree::whole_world();
    let consumed = wpt::read_all_wpts(&mut data, &mut tree, &mut datachecks, &el, datapath);

    log::info!("{}Writing WaypointQuadtree.tmg.", et.et());
    let qt_path = logpath.join("WaypointQuadtree.tmg");
    tree.write_qt_tmg(&qt_path)
        .map_err(|source| DataError::FileWrite {
            path: qt_path.display().to_string(),
            source,
        })?;

    log::info!("{}Sorting waypoints in Quadtree.", et.et());
    let sort_keys: Vec<String> = (0..data.waypoints.len() as u32)
        .map(|w| data.root_at_label(waymap_core::model::WaypointId(w)))
        .collect();
    tree.sort(&sort_keys);

    log::info!("{}Sorting colocated point lists.", et.et());
    data.colocations.par_iter_mut().for_each(|members| {
        members.sort_by(|a, b| sort_keys[a.index()].cmp(&sort_keys[b.index()]));
    });

    let mut qt_problems = vec![];
    if !tree.is_valid(&mut qt_problems) {
        return Err(DataError::Internal(qt_problems.join("; ")));
    }

    if args.colocationlimit > 0 {
        log::info!(
            "{}Waypoint colocation counts, reporting all with {} or more colocations.",
            et.et(),
            args.colocationlimit
        );
        for members in &data.colocations {
            if members.len() >= args.colocationlimit {
                log::info!(
                    "{} are colocated at {}",
                    members.len(),
                    data.waypoint_str(members[0])
                );
            }
        }
    }

    log::info!("{}Finding unprocessed wpt files.", et.et());
    let mut unprocessed: Vec<String> = all_wpt_files
        .difference(&consumed)
        .map(|p: &PathBuf| p.display().to_string())
        .collect();
    logs::write_unprocessed_wpts(&mut unprocessed, logpath)?;

    log::info!("{}Near-miss point log and tm-master.nmp file.", et.et());
    nmp::compute_near_miss_points(&mut data, &tree, args.nmpthreshold);
    nmp::write_nmp_logs(&mut data, &tree, datapath, logpath)?;
    if let Some(merge_path) = &args.nmpmergepath {
        log::info!("{}Writing near-miss point merged wpt files.", et.et());
        nmp::write_nmp_merged(&data, Path::new(merge_path))?;
    }

    log::info!("{}Connecting routes and checking labels.", et.et());
    system_csv::route_integrity(&mut data, &el, &mut datachecks);

    log::info!("{}Reading updates files.", et.et());
    updates::read_updates(&mut data, datapath, &el);

    log::info!("{}Concurrent segment detection.", et.et());
    let mut concurrency_log = concurrency::detect(&mut data, logpath)?;
    if let Some((split_path, _suffix, region_code)) = args.split_region() {
        log::info!("{}Split-region concurrency check.", et.et());
        concurrency::split_region_check(&data, Path::new(split_path), region_code)?;
    }

    log::info!("{}Processing traveler list files.", et.et());
    let processed = userlist::process_traveler_lists(
        &mut data,
        Path::new(&args.userlistfilepath),
        &args.userlistext,
        &args.userlist,
        logpath,
        &el,
    )?;
    log::info!("{}Processed {processed} traveler list files.", et.et());

    log::info!(
        "{}Augmenting travelers for detected concurrent segments.",
        et.et()
    );
    concurrency::augment_travelers(&mut data, &mut concurrency_log);
    drop(concurrency_log);

    log::info!("{}Writing route and label logs.", et.et());
    logs::route_and_label_logs(&data, logpath)?;

    log::info!("{}Computing stats.", et.et());
    stats::compute_stats(&mut data);
    log::info!("{}Writing highway data stats log file.", et.et());
    let (active_only_miles, active_preview_miles) =
        stats::write_highway_data_stats(&data, logpath)?;

    log::info!("{}Creating per-traveler stats logs.", et.et());
    let clinched_tables =
        logs::write_user_logs(&data, active_only_miles, active_preview_miles, logpath)?;

    log::info!("{}Writing stats csv files.", et.et());
    stats::write_all_by_region_csvs(&data, csvpath)?;
    stats::write_system_csvs(&data, csvpath)?;

    log::info!("{}Setting up for graphs of highway data.", et.et());
    let graph = HighwayGraph::build(&data, &tree, &mut datachecks);
    log::info!("{}Writing graph waypoint simplification log.", et.et());
    logs::write_waypoint_simplification_log(&graph.naming_log, logpath)?;

    let mut graph_entries: Vec<GraphListEntry> = vec![];
    let mut graph_types: Vec<(&'static str, String, String)> = vec![];
    // graph files are gated on a clean error list, like the database
    if args.skipgraphs || args.errorcheck || !el.is_empty() {
        log::info!("{}SKIPPING generation of subgraphs.", et.et());
    } else {
        build_graph_descriptors(&data, datapath, &el, &mut graph_entries, &mut graph_types);
        log::info!(
            "{}Writing {} graph files.",
            et.et(),
            graph_entries.len()
        );
        let traveler_names: Vec<String> =
            data.travelers.iter().map(|t| t.name.clone()).collect();
        let results: Vec<Result<(), waymap_graph::GraphError>> = graph_entries
            .par_chunks_mut(3)
            .map(|trio| graph.write_subgraph_tmg(&data, trio, graphpath, &traveler_names))
            .collect();
        for result in results {
            result.map_err(|e| DataError::Internal(e.to_string()))?;
        }
    }

    log::info!("{}Reading datacheckfps.csv.", et.et());
    let fps = read_datacheck_fps(datapath, &el);

    log::info!("{}Marking datacheck false positives.", et.et());
    datachecks.sort(&data);
    let fp_result = datachecks.mark_fps(&data, fps);
    log::info!(
        "{}Found {} datacheck errors and matched {} FP entries.",
        et.et(),
        datachecks.entries.len(),
        fp_result.matched
    );
    write_datacheck_logs(&data, &datachecks, &fp_result, logpath)?;

    // the gate: no database or graph table output on fatal errors
    let error_count = el.count();
    if args.errorcheck {
        log::info!("{}SKIPPING database file.", et.et());
        log::info!("{}Found {error_count} fatal error(s).", et.et());
        return Ok(if error_count == 0 { 0 } else { 1 });
    }
    if error_count != 0 {
        for message in el.take() {
            log::error!("ABORTING: {message}");
        }
        return Err(DataError::FatalDataErrors { count: error_count });
    }

    log::info!(
        "{}Writing database file {}.sql.",
        et.et(),
        args.databasename
    );
    let sql_path = PathBuf::from(format!("{}.sql", args.databasename));
    sql::write_sql_file(
        &data,
        &datachecks,
        &clinched_tables,
        &graph_entries,
        &graph_types,
        args.skipgraphs,
        &sql_path,
    )?;

    log::info!(
        "{}Processed {} highway systems.",
        et.et(),
        data.systems.len()
    );
    log::info!("Total run time: {}", et.et());
    Ok(0)
}

/// all subgraph descriptor trios, in category order, with one
/// graph-types table row per category that produced descriptors.
fn build_graph_descriptors(
    data: &HighwayData,
    datapath: &Path,
    el: &ErrorList,
    entries: &mut Vec<GraphListEntry>,
    types: &mut Vec<(&'static str, String, String)>,
) {
    entries.extend(GraphListEntry::trio(
        String::from("tm-master"),
        String::from("All Travel Mapping Data"),
        GraphCategory::Master,
        None,
        None,
        None,
    ));
    types.push((
        "master",
        String::from("All Travel Mapping Data"),
        String::from("These graphs contain all routes currently plotted in the Travel Mapping project."),
    ));

    let area = graph_csv::area_graphs(datapath, el);
    if !area.is_empty() {
        types.push((
            "area",
            String::from("Routes Within a Given Radius of a Place"),
            String::from("These graphs contain all routes currently plotted within the given distance radius of the given place."),
        ));
        entries.extend(area);
    }

    let mut region_count = 0;
    for (r, region) in data.regions.iter().enumerate() {
        if region.active_preview_mileage == 0.0 {
            continue;
        }
        region_count += 1;
        entries.extend(GraphListEntry::trio(
            format!("{}-region", region.code),
            format!("{} ({})", region.name, region.region_type),
            GraphCategory::Region,
            Some(vec![RegionId(r as u16)]),
            None,
            None,
        ));
    }
    if region_count > 0 {
        types.push((
            "region",
            String::from("Routes Within a Single Region"),
            String::from("These graphs contain all routes currently plotted within the given region."),
        ));
    }

    let system = graph_csv::system_graphs(data, datapath, el);
    if !system.is_empty() {
        types.push((
            "system",
            String::from("Routes Within a Single Highway System"),
            String::from("These graphs contain the routes within a single highway system and are not restricted by region."),
        ));
        entries.extend(system);
    }

    let multisystem = graph_csv::multisystem_graphs(data, datapath, el);
    if !multisystem.is_empty() {
        types.push((
            "multisystem",
            String::from("Routes Within Multiple Highway Systems"),
            String::from("These graphs contain the routes within a set of highway systems."),
        ));
        entries.extend(multisystem);
    }

    let multiregion = graph_csv::multiregion_graphs(data, datapath, el);
    if !multiregion.is_empty() {
        types.push((
            "multiregion",
            String::from("Routes Within Multiple Regions"),
            String::from("These graphs contain the routes within a set of regions."),
        ));
        entries.extend(multiregion);
    }

    let mut country_count = 0;
    for (c, country) in data.countries.iter().enumerate() {
        let regions: Vec<RegionId> = (0..data.regions.len() as u16)
            .map(RegionId)
            .filter(|&r| {
                data.region(r).country == c && data.region(r).active_preview_mileage > 0.0
            })
            .collect();
        // single-region countries are covered by their regional graph
        if regions.len() < 2 {
            continue;
        }
        country_count += 1;
        entries.extend(GraphListEntry::trio(
            format!("{}-country", country.code),
            format!("{} All Routes in Country", country.name),
            GraphCategory::Country,
            Some(regions),
            None,
            None,
        ));
    }
    if country_count > 0 {
        types.push((
            "country",
            String::from("Routes Within a Single Multi-Region Country"),
            String::from("These graphs contain the routes within a single country that is composed of multiple regions that contain plotted routes.  Countries consisting of a single region are represented by their regional graph."),
        ));
    }

    let mut continent_count = 0;
    for (c, continent) in data.continents.iter().enumerate() {
        let regions: Vec<RegionId> = (0..data.regions.len() as u16)
            .map(RegionId)
            .filter(|&r| {
                data.region(r).continent == c && data.region(r).active_preview_mileage > 0.0
            })
            .collect();
        if regions.is_empty() {
            continue;
        }
        continent_count += 1;
        entries.extend(GraphListEntry::trio(
            format!("{}-continent", continent.code),
            format!("{} All Routes on Continent", continent.name),
            GraphCategory::Continent,
            Some(regions),
            None,
            None,
        ));
    }
    if continent_count > 0 {
        types.push((
            "continent",
            String::from("Routes Within a Continent"),
            String::from("These graphs contain the routes on a continent."),
        ));
    }

    let fullcustom = graph_csv::fullcustom_graphs(data, datapath, el);
    if !fullcustom.is_empty() {
        types.push((
            "fullcustom",
            String::from("Custom Route Sets"),
            String::from("These graphs contain custom combinations of regions, systems, and areas."),
        ));
        entries.extend(fullcustom);
    }
}

/// datacheckfps.csv rows, with rows for always-error codes rejected.
fn read_datacheck_fps(datapath: &Path, el: &ErrorList) -> Vec<FpEntry> {
    let path = datapath.join("datacheckfps.csv");
    let mut fps = vec![];
    for record in read_semicolon_csv_optional(&path, el) {
        if record.len() != 6 {
            el.add_error(format!(
                "Could not parse datacheckfps.csv line: [{}], expected 6 fields, found {}",
                record_line(&record),
                record.len()
            ));
            continue;
        }
        let entry = FpEntry {
            root: String::from(&record[0]),
            label1: String::from(&record[1]),
            label2: String::from(&record[2]),
            label3: String::from(&record[3]),
            code: String::from(&record[4]),
            info: String::from(&record[5]),
        };
        if DatacheckCode::parse(&entry.code).is_some_and(|c| c.always_error()) {
            log::warn!(
                "datacheckfps.csv line not allowed (always error): {}",
                record_line(&record)
            );
            continue;
        }
        fps.push(entry);
    }
    fps
}

fn write_datacheck_logs(
    data: &HighwayData,
    datachecks: &DatacheckList,
    fp_result: &waymap_core::datacheck::FpMarkResult,
    logpath: &Path,
) -> Result<(), DataError> {
    let stamp = log_timestamp();

    let mut near_match = format!("Log file created at: {stamp}\n");
    for line in &fp_result.near_match_lines {
        near_match.push_str(line);
        near_match.push('\n');
    }
    let path = logpath.join("nearmatchfps.log");
    std::fs::write(&path, near_match).map_err(|source| DataError::FileWrite {
        path: path.display().to_string(),
        source,
    })?;

    let mut unmatched = format!("Log file created at: {stamp}\n");
    if fp_result.unmatched.is_empty() {
        unmatched.push_str("No unmatched FP entries.\n");
    } else {
        for fp in &fp_result.unmatched {
            unmatched.push_str(&fp.to_line());
            unmatched.push('\n');
        }
    }
    let path = logpath.join("unmatchedfps.log");
    std::fs::write(&path, unmatched).map_err(|source| DataError::FileWrite {
        path: path.display().to_string(),
        source,
    })?;

    let mut log = format!("Log file created at: {stamp}\n");
    log.push_str("Datacheck errors that have been flagged as false positives are not included.\n");
    log.push_str("These entries should be in a format ready to paste into datacheckfps.csv.\n");
    log.push_str("Root;Waypoint1;Waypoint2;Waypoint3;Error;Info\n");
    let mut any = false;
    for entry in &datachecks.entries {
        if !entry.fp {
            log.push_str(&entry.to_line(data));
            log.push('\n');
            any = true;
        }
    }
    if !any {
        log.push_str("No datacheck errors found.\n");
    }
    let path = logpath.join("datacheck.log");
    std::fs::write(&path, log).map_err(|source| DataError::FileWrite {
        path: path.display().to_string(),
        source,
    })
}
