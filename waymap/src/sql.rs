//! the database load script: drops and recreates every table in
//! foreign-key order, then bulk-inserts the processed data.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use waymap_core::datacheck::DatacheckList;
use waymap_core::error::DataError;
use waymap_core::model::HighwayData;
use waymap_core::util::{double_quotes, fmt_g, fmt_g_dot0};
use waymap_graph::GraphListEntry;

use crate::logs::ClinchedTables;

/// rows per INSERT statement for the large bulk tables.
const INSERT_CHUNK: usize = 10000;

fn write_insert(out: &mut impl Write, table: &str, rows: &[String]) -> std::io::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    writeln!(out, "INSERT INTO {table} VALUES")?;
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            write!(out, ",")?;
        }
        writeln!(out, "({row})")?;
    }
    writeln!(out, ";")
}

fn write_insert_chunked(out: &mut impl Write, table: &str, rows: &[String]) -> std::io::Result<()> {
    for chunk in rows.chunks(INSERT_CHUNK) {
        write_insert(out, table, chunk)?;
    }
    Ok(())
}

/// write the complete load script to `<databasename>.sql`.
#[allow(clippy::too_many_arguments)]
pub fn write_sql_file(
    data: &HighwayData,
    datachecks: &DatacheckList,
    clinched: &ClinchedTables,
    graph_entries: &[GraphListEntry],
    graph_types: &[(&'static str, String, String)],
    skipgraphs: bool,
    path: &Path,
) -> Result<(), DataError> {
    let write = || -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);

        // drop tables in reverse dependency order
        for table in [
            "datacheckErrors",
            "clinchedConnectedRoutes",
            "clinchedRoutes",
            "clinchedOverallMileageByRegion",
            "clinchedSystemMileageByRegion",
            "overallMileageByRegion",
            "systemMileageByRegion",
            "clinched",
            "segments",
            "waypoints",
            "connectedRouteRoots",
            "connectedRoutes",
            "routes",
            "systems",
            "updates",
            "systemUpdates",
            "regions",
            "countries",
            "continents",
        ] {
            writeln!(out, "DROP TABLE IF EXISTS {table};")?;
        }

        writeln!(
            out,
            "CREATE TABLE continents (code VARCHAR(3), name VARCHAR(15), PRIMARY KEY(code));"
        )?;
        let rows: Vec<String> = data
            .continents
            .iter()
            .map(|c| format!("'{}','{}'", c.code, double_quotes(&c.name)))
            .collect();
        write_insert(&mut out, "continents", &rows)?;

        writeln!(
            out,
            "CREATE TABLE countries (code VARCHAR(3), name VARCHAR(32), PRIMARY KEY(code));"
        )?;
        let rows: Vec<String> = data
            .countries
            .iter()
            .map(|c| format!("'{}','{}'", c.code, double_quotes(&c.name)))
            .collect();
        write_insert(&mut out, "countries", &rows)?;

        writeln!(out, "CREATE TABLE regions (code VARCHAR(8), name VARCHAR(48), country VARCHAR(3), continent VARCHAR(3), regiontype VARCHAR(32), PRIMARY KEY(code), FOREIGN KEY (country) REFERENCES countries(code), FOREIGN KEY (continent) REFERENCES continents(code));")?;
        let rows: Vec<String> = data
            .regions
            .iter()
            .map(|r| {
                format!(
                    "'{}','{}','{}','{}','{}'",
                    r.code,
                    double_quotes(&r.name),
                    data.countries[r.country].code,
                    data.continents[r.continent].code,
                    r.region_type
                )
            })
            .collect();
        write_insert(&mut out, "regions", &rows)?;

        writeln!(out, "CREATE TABLE systems (systemName VARCHAR(10), countryCode CHAR(3), fullName VARCHAR(60), color VARCHAR(16), level VARCHAR(10), tier INTEGER, csvOrder INTEGER, PRIMARY KEY(systemName));")?;
        let rows: Vec<String> = data
            .systems
            .iter()
            .enumerate()
            .map(|(order, h)| {
                format!(
                    "'{}','{}','{}','{}','{}','{}','{order}'",
                    h.systemname,
                    data.countries[h.country].code,
                    double_quotes(&h.fullname),
                    h.color,
                    h.level.name(),
                    h.tier
                )
            })
            .collect();
        write_insert(&mut out, "systems", &rows)?;

        writeln!(out, "CREATE TABLE routes (systemName VARCHAR(10), region VARCHAR(8), route VARCHAR(16), banner VARCHAR(6), abbrev VARCHAR(3), city VARCHAR(100), root VARCHAR(32), mileage FLOAT, rootOrder INTEGER, csvOrder INTEGER, PRIMARY KEY(root), FOREIGN KEY (systemName) REFERENCES systems(systemName));")?;
        let mut rows = vec![];
        for system in &data.systems {
            for &route_id in &system.routes {
                let r = data.route(route_id);
                rows.push(format!(
                    "'{}','{}','{}','{}','{}','{}','{}','{}','{}','{}'",
                    system.systemname,
                    data.region(r.region).code,
                    r.route,
                    r.banner,
                    r.abbrev,
                    double_quotes(&r.city),
                    r.root,
                    fmt_g_dot0(r.mileage),
                    r.root_order,
                    rows.len()
                ));
            }
        }
        write_insert(&mut out, "routes", &rows)?;

        writeln!(out, "CREATE TABLE connectedRoutes (systemName VARCHAR(10), route VARCHAR(16), banner VARCHAR(6), groupName VARCHAR(100), firstRoot VARCHAR(32), mileage FLOAT, csvOrder INTEGER, PRIMARY KEY(firstRoot), FOREIGN KEY (firstRoot) REFERENCES routes(root));")?;
        let mut rows = vec![];
        for system in &data.systems {
            for &con_id in &system.con_routes {
                let con = data.con_route(con_id);
                let first_root = match con.roots.first() {
                    Some(&r) => data.route(r).root.clone(),
                    None => String::from("ERROR_NO_ROOTS"),
                };
                rows.push(format!(
                    "'{}','{}','{}','{}','{}','{}','{}'",
                    system.systemname,
                    con.route,
                    con.banner,
                    double_quotes(&con.groupname),
                    first_root,
                    fmt_g(con.mileage),
                    rows.len()
                ));
            }
        }
        write_insert(&mut out, "connectedRoutes", &rows)?;

        writeln!(out, "CREATE TABLE connectedRouteRoots (firstRoot VARCHAR(32), root VARCHAR(32), FOREIGN KEY (firstRoot) REFERENCES connectedRoutes(firstRoot));")?;
        let mut rows = vec![];
        for con in &data.con_routes {
            for &root in con.roots.iter().skip(1) {
                rows.push(format!(
                    "'{}','{}'",
                    data.route(con.roots[0]).root,
                    data.route(root).root
                ));
            }
        }
        write_insert(&mut out, "connectedRouteRoots", &rows)?;

        // raw waypoint data, with ids assigned in write order
        writeln!(out, "CREATE TABLE waypoints (pointId INTEGER, pointName VARCHAR(20), latitude DOUBLE, longitude DOUBLE, root VARCHAR(32), PRIMARY KEY(pointId), FOREIGN KEY (root) REFERENCES routes(root));")?;
        let mut point_nums: Vec<u32> = vec![0; data.waypoints.len()];
        let mut point_num = 0u32;
        for system in &data.systems {
            for &route_id in &system.routes {
                let r = data.route(route_id);
                let mut rows = vec![];
                for &w in &r.points {
                    let wp = data.waypoint(w);
                    point_nums[w.index()] = point_num;
                    rows.push(format!(
                        "'{point_num}','{}','{}','{}','{}'",
                        wp.label,
                        fmt_g(wp.lat),
                        fmt_g(wp.lng),
                        r.root
                    ));
                    point_num += 1;
                }
                write_insert(&mut out, "waypoints", &rows)?;
            }
        }
        writeln!(out, "CREATE INDEX `latitude` ON waypoints(`latitude`);")?;
        writeln!(out, "CREATE INDEX `longitude` ON waypoints(`longitude`);")?;

        writeln!(out, "CREATE TABLE segments (segmentId INTEGER, waypoint1 INTEGER, waypoint2 INTEGER, root VARCHAR(32), PRIMARY KEY (segmentId), FOREIGN KEY (waypoint1) REFERENCES waypoints(pointId), FOREIGN KEY (waypoint2) REFERENCES waypoints(pointId), FOREIGN KEY (root) REFERENCES routes(root));")?;
        let mut clinched_rows = vec![];
        let mut segment_num = 0u32;
        for system in &data.systems {
            for &route_id in &system.routes {
                let r = data.route(route_id);
                let mut rows = vec![];
                for &s in &r.segments {
                    let seg = data.segment(s);
                    rows.push(format!(
                        "'{segment_num}','{}','{}','{}'",
                        point_nums[seg.waypoint1.index()],
                        point_nums[seg.waypoint2.index()],
                        r.root
                    ));
                    for t in seg.clinched_by.iter() {
                        clinched_rows.push(format!(
                            "'{segment_num}','{}'",
                            data.travelers[t].name
                        ));
                    }
                    segment_num += 1;
                }
                write_insert(&mut out, "segments", &rows)?;
            }
        }

        writeln!(out, "CREATE TABLE clinched (segmentId INTEGER, traveler VARCHAR(48), FOREIGN KEY (segmentId) REFERENCES segments(segmentId));")?;
        write_insert_chunked(&mut out, "clinched", &clinched_rows)?;

        writeln!(out, "CREATE TABLE overallMileageByRegion (region VARCHAR(8), activeMileage FLOAT, activePreviewMileage FLOAT);")?;
        let rows: Vec<String> = data
            .regions
            .iter()
            .filter(|r| r.active_only_mileage + r.active_preview_mileage != 0.0)
            .map(|r| {
                format!(
                    "'{}','{}','{}'",
                    r.code,
                    fmt_g(r.active_only_mileage),
                    fmt_g(r.active_preview_mileage)
                )
            })
            .collect();
        write_insert(&mut out, "overallMileageByRegion", &rows)?;

        writeln!(out, "CREATE TABLE systemMileageByRegion (systemName VARCHAR(10), region VARCHAR(8), mileage FLOAT, FOREIGN KEY (systemName) REFERENCES systems(systemName));")?;
        let mut rows = vec![];
        for system in &data.systems {
            if !system.active_or_preview() {
                continue;
            }
            for (&region, &mileage) in &system.mileage_by_region {
                rows.push(format!(
                    "'{}','{}','{mileage:.15}'",
                    system.systemname,
                    data.region(region).code
                ));
            }
        }
        write_insert(&mut out, "systemMileageByRegion", &rows)?;

        writeln!(out, "CREATE TABLE clinchedOverallMileageByRegion (region VARCHAR(8), traveler VARCHAR(48), activeMileage FLOAT, activePreviewMileage FLOAT);")?;
        let mut rows = vec![];
        for traveler in &data.travelers {
            let mut regions: Vec<_> = traveler
                .active_preview_mileage_by_region
                .iter()
                .collect();
            regions.sort_by_key(|(r, _)| **r);
            for (&region, &ap_miles) in regions {
                let active_miles = traveler
                    .active_only_mileage_by_region
                    .get(&region)
                    .copied()
                    .unwrap_or(0.0);
                rows.push(format!(
                    "'{}','{}','{}','{}'",
                    data.region(region).code,
                    traveler.name,
                    fmt_g(active_miles),
                    fmt_g(ap_miles)
                ));
            }
        }
        write_insert(&mut out, "clinchedOverallMileageByRegion", &rows)?;

        writeln!(out, "CREATE TABLE clinchedSystemMileageByRegion (systemName VARCHAR(10), region VARCHAR(8), traveler VARCHAR(48), mileage FLOAT, FOREIGN KEY (systemName) REFERENCES systems(systemName));")?;
        let mut rows = vec![];
        for traveler in &data.travelers {
            let mut systems: Vec<_> = traveler.system_region_mileages.iter().collect();
            systems.sort_by_key(|(s, _)| **s);
            for (&system, by_region) in systems {
                let mut regions: Vec<_> = by_region.iter().collect();
                regions.sort_by_key(|(r, _)| **r);
                for (&region, &mileage) in regions {
                    rows.push(format!(
                        "'{}','{}','{}','{}'",
                        data.system(system).systemname,
                        data.region(region).code,
                        traveler.name,
                        fmt_g(mileage)
                    ));
                }
            }
        }
        write_insert(&mut out, "clinchedSystemMileageByRegion", &rows)?;

        writeln!(out, "CREATE TABLE clinchedConnectedRoutes (route VARCHAR(32), traveler VARCHAR(48), mileage FLOAT, clinched BOOLEAN, FOREIGN KEY (route) REFERENCES connectedRoutes(firstRoot));")?;
        let rows: Vec<String> = clinched
            .con_routes
            .iter()
            .filter_map(|&(con_id, traveler, miles, fully)| {
                let con = data.con_route(con_id);
                con.roots.first().map(|&first| {
                    format!(
                        "'{}','{}','{}','{}'",
                        data.route(first).root,
                        data.traveler(traveler).name,
                        fmt_g(miles),
                        fully as u8
                    )
                })
            })
            .collect();
        write_insert_chunked(&mut out, "clinchedConnectedRoutes", &rows)?;

        writeln!(out, "CREATE TABLE clinchedRoutes (route VARCHAR(32), traveler VARCHAR(48), mileage FLOAT, clinched BOOLEAN, FOREIGN KEY (route) REFERENCES routes(root));")?;
        let rows: Vec<String> = clinched
            .routes
            .iter()
            .map(|&(route_id, traveler, miles, fully)| {
                format!(
                    "'{}','{}','{}','{}'",
                    data.route(route_id).root,
                    data.traveler(traveler).name,
                    fmt_g(miles),
                    fully as u8
                )
            })
            .collect();
        write_insert_chunked(&mut out, "clinchedRoutes", &rows)?;

        writeln!(out, "CREATE TABLE updates (date VARCHAR(10), region VARCHAR(60), route VARCHAR(80), root VARCHAR(32), description VARCHAR(1024));")?;
        let rows: Vec<String> = data
            .updates
            .iter()
            .map(|u| {
                format!(
                    "'{}','{}','{}','{}','{}'",
                    u.date,
                    double_quotes(&u.region),
                    double_quotes(&u.route),
                    u.root,
                    double_quotes(&u.description)
                )
            })
            .collect();
        write_insert(&mut out, "updates", &rows)?;

        writeln!(out, "CREATE TABLE systemUpdates (date VARCHAR(10), region VARCHAR(48), systemName VARCHAR(10), description VARCHAR(128), statusChange VARCHAR(16));")?;
        let rows: Vec<String> = data
            .system_updates
            .iter()
            .map(|u| {
                format!(
                    "'{}','{}','{}','{}','{}'",
                    u.date,
                    double_quotes(&u.region),
                    u.system_name,
                    double_quotes(&u.description),
                    u.status_change
                )
            })
            .collect();
        write_insert(&mut out, "systemUpdates", &rows)?;

        writeln!(out, "CREATE TABLE datacheckErrors (route VARCHAR(32), label1 VARCHAR(50), label2 VARCHAR(20), label3 VARCHAR(20), code VARCHAR(20), value VARCHAR(32), falsePositive BOOLEAN, FOREIGN KEY (route) REFERENCES routes(root));")?;
        let rows: Vec<String> = datachecks
            .entries
            .iter()
            .map(|d| {
                format!(
                    "'{}','{}','{}','{}','{}','{}','{}'",
                    data.route(d.route).root,
                    d.label1,
                    d.label2,
                    d.label3,
                    d.code.as_str(),
                    double_quotes(&d.info),
                    d.fp as u8
                )
            })
            .collect();
        write_insert(&mut out, "datacheckErrors", &rows)?;

        if !skipgraphs {
            writeln!(out, "DROP TABLE IF EXISTS graphs;")?;
            writeln!(out, "DROP TABLE IF EXISTS graphTypes;")?;
            writeln!(out, "CREATE TABLE graphTypes (category VARCHAR(12), descr VARCHAR(100), longDescr TEXT, PRIMARY KEY(category));")?;
            let rows: Vec<String> = graph_types
                .iter()
                .map(|(category, descr, long_descr)| {
                    format!(
                        "'{category}','{}','{}'",
                        double_quotes(descr),
                        double_quotes(long_descr)
                    )
                })
                .collect();
            write_insert(&mut out, "graphTypes", &rows)?;

            writeln!(out, "CREATE TABLE graphs (filename VARCHAR(32), descr VARCHAR(100), vertices INTEGER, edges INTEGER, format VARCHAR(10), category VARCHAR(12), FOREIGN KEY (category) REFERENCES graphTypes(category));")?;
            let rows: Vec<String> = graph_entries
                .iter()
                .map(|g| {
                    format!(
                        "'{}','{}','{}','{}','{}','{}'",
                        g.filename(),
                        double_quotes(&g.descr),
                        g.vertices,
                        g.edges,
                        g.format.name(),
                        g.category.name()
                    )
                })
                .collect();
            write_insert(&mut out, "graphs", &rows)?;
        }
        Ok(())
    };
    write().map_err(|source| DataError::FileWrite {
        path: path.display().to_string(),
        source,
    })
}
