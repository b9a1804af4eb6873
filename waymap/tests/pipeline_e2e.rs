//! end-to-end pipeline runs over a small generated highway dataset.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use waymap::app::args::Args;
use waymap::app::pipeline;

struct TestDirs {
    root: PathBuf,
}

impl TestDirs {
    fn new(tag: &str) -> Self {
        let root = std::env::temp_dir().join(format!(
            "waymap-e2e-{tag}-{}",
            std::process::id()
        ));
        fs::remove_dir_all(&root).ok();
        for sub in ["data", "lists", "logs/users", "csv", "graphs"] {
            fs::create_dir_all(root.join(sub)).unwrap();
        }
        Self { root }
    }

    fn data(&self) -> PathBuf {
        self.root.join("data")
    }

    fn write(&self, rel: &str, contents: &str) {
        let path = self.root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn args(&self) -> Args {
        Args::parse_from([
            "waymap",
            "--datapath",
            self.data().to_str().unwrap(),
            "--userlistfilepath",
            self.root.join("lists").to_str().unwrap(),
            "--logfilepath",
            self.root.join("logs").to_str().unwrap(),
            "--csvstatfilepath",
            self.root.join("csv").to_str().unwrap(),
            "--graphfilepath",
            self.root.join("graphs").to_str().unwrap(),
            "--databasename",
            self.root.join("TravelMapping").to_str().unwrap(),
            "--numthreads",
            "2",
        ])
    }
}

impl Drop for TestDirs {
    fn drop(&mut self) {
        fs::remove_dir_all(&self.root).ok();
    }
}

fn osm(lat: f64, lng: f64) -> String {
    format!("http://www.openstreetmap.org/?lat={lat}&lon={lng}")
}

/// two interstates sharing pavement over one segment, one traveler.
fn write_base_dataset(dirs: &TestDirs) {
    dirs.write("data/continents.csv", "code;name\nNA;North America\n");
    dirs.write("data/countries.csv", "code;name\nUSA;United States\n");
    dirs.write(
        "data/regions.csv",
        "code;name;country;continent;regionType\nPA;Pennsylvania;USA;NA;State\n",
    );
    dirs.write(
        "data/systems.csv",
        "name;country;fullname;color;tier;level\nusai;USA;United States Interstate Highways;blue;1;active\n",
    );
    dirs.write(
        "data/hwy_data/_systems/usai.csv",
        "System;Region;Route;Banner;Abbrev;City;Root;AltRouteNames\n\
         usai;PA;I-76;;;;pa.i076;\n\
         usai;PA;I-70;;;;pa.i070;\n",
    );
    dirs.write(
        "data/hwy_data/_systems/usai_con.csv",
        "System;Route;Banner;GroupName;Roots\n\
         usai;I-76;;;pa.i076\n\
         usai;I-70;;;pa.i070\n",
    );
    // I-76 and I-70 share the middle segment between (40.1,-75.4) and
    // (40.2,-75.3)
    dirs.write(
        "data/hwy_data/PA/usai/pa.i076.wpt",
        &format!(
            "1 {}\n5 {}\n10 {}\n15 {}\n",
            osm(40.0, -75.5),
            osm(40.1, -75.4),
            osm(40.2, -75.3),
            osm(40.3, -75.2)
        ),
    );
    dirs.write(
        "data/hwy_data/PA/usai/pa.i070.wpt",
        &format!(
            "2 {}\n6 {}\n11 {}\n",
            osm(40.1, -75.4),
            osm(40.2, -75.3),
            osm(40.3, -75.4)
        ),
    );
    dirs.write(
        "data/updates.csv",
        "date;region;route;root;description\n2023-04-01;Pennsylvania;I-76;pa.i076;Plot improved\n",
    );
    dirs.write("data/systemupdates.csv", "date;region;systemName;description;statusChange\n");
    dirs.write("data/datacheckfps.csv", "Root;Waypoint1;Waypoint2;Waypoint3;Error;Info\n");
    dirs.write("data/nmpfps.log", "");
    dirs.write("lists/oneil.list", "PA I-76 1 15\n");
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|_| panic!("missing output {}", path.display()))
}

#[test]
fn test_full_pipeline_run() {
    let dirs = TestDirs::new("full");
    write_base_dataset(&dirs);
    let exit = pipeline::run(&dirs.args()).unwrap();
    assert_eq!(exit, 0);

    // user log: every I-76 segment clinched
    let user_log = read(&dirs.root.join("logs/users/oneil.log"));
    assert!(
        user_log.contains("Processed 1 good lines marking 3 segments traveled."),
        "{user_log}"
    );
    assert!(user_log.contains("Clinched Highway Statistics"));
    assert!(user_log.contains("Overall in active systems: "));
    assert!(
        user_log.contains("2023-04-01 | Pennsylvania | I-76 | pa.i076 | Plot improved"),
        "{user_log}"
    );

    // concurrency: one group over the shared segment, and the traveler
    // credited on I-70's copy
    let concurrencies = read(&dirs.root.join("logs/concurrencies.log"));
    assert!(concurrencies.contains("New concurrency"), "{concurrencies}");
    assert!(
        concurrencies.contains("oneil clinched concurrent"),
        "{concurrencies}"
    );

    // stats: region and system rollups are present, and with a single
    // system the active total equals the system total
    let stats = read(&dirs.root.join("logs/highwaydatastats.log"));
    assert!(stats.contains("Active routes (active): "));
    assert!(stats.contains("System usai (active) total: "));
    assert!(stats.contains("(PA I-76 only)"), "{stats}");
    let grab = |prefix: &str| -> f64 {
        stats
            .lines()
            .find(|l| l.starts_with(prefix))
            .and_then(|l| l[prefix.len()..].split_whitespace().next())
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| panic!("no total after '{prefix}'"))
    };
    let active_total = grab("Active routes (active): ");
    let system_total = grab("System usai (active) total: ");
    assert!(active_total > 0.0);
    assert!((active_total - system_total).abs() < 0.02);

    // points in use
    let piu = read(&dirs.root.join("logs/pointsinuse.log"));
    assert!(piu.contains("pa.i076(4): 1 15"), "{piu}");

    // master graphs exist with the right headers and counts:
    // 5 distinct locations, 5 segments, one concurrency pair -> 4 edges
    let simple = read(&dirs.root.join("graphs/tm-master-simple.tmg"));
    let mut lines = simple.lines();
    assert_eq!(lines.next().unwrap(), "TMG 2.0 simple");
    assert_eq!(lines.next().unwrap(), "5 4");
    // the shared edge carries both route names
    assert!(simple.contains("I-76,I-70"), "{simple}");

    let traveled = read(&dirs.root.join("graphs/tm-master-traveled.tmg"));
    let mut lines = traveled.lines();
    assert_eq!(lines.next().unwrap(), "TMG 2.0 traveled");
    assert_eq!(lines.next().unwrap(), "5 4 1");
    assert_eq!(traveled.lines().last().unwrap(), "oneil");

    // database load script
    let sql = read(&dirs.root.join("TravelMapping.sql"));
    assert!(sql.contains("CREATE TABLE routes"));
    assert!(sql.contains("'pa.i076'"));
    assert!(sql.contains("CREATE TABLE clinched "));
    assert!(sql.contains("'oneil'"));
    assert!(sql.contains("CREATE TABLE graphs "));
    assert!(sql.contains("'tm-master-simple.tmg'"));
    // region graph row for PA
    assert!(sql.contains("'PA-region.tmg'"), "{sql}");

    // datacheck log exists with its paste-ready header
    let datacheck = read(&dirs.root.join("logs/datacheck.log"));
    assert!(datacheck.contains("Root;Waypoint1;Waypoint2;Waypoint3;Error;Info"));
}

#[test]
fn test_connected_route_list_entry() {
    let dirs = TestDirs::new("conn");
    write_base_dataset(&dirs);
    dirs.write(
        "data/regions.csv",
        "code;name;country;continent;regionType\n\
         NJ;New Jersey;USA;NA;State\n\
         PA;Pennsylvania;USA;NA;State\n",
    );
    // chop I-76 at the PA/NJ border into two connected pieces
    dirs.write(
        "data/hwy_data/_systems/usai.csv",
        "System;Region;Route;Banner;Abbrev;City;Root;AltRouteNames\n\
         usai;PA;I-76;;;;pa.i076;\n\
         usai;NJ;I-76;;;;nj.i076;\n",
    );
    dirs.write(
        "data/hwy_data/_systems/usai_con.csv",
        "System;Route;Banner;GroupName;Roots\n\
         usai;I-76;;;pa.i076,nj.i076\n",
    );
    dirs.write(
        "data/hwy_data/PA/usai/pa.i076.wpt",
        &format!(
            "1 {}\nPA/NJ {}\n",
            osm(40.0, -75.5),
            osm(40.1, -75.4)
        ),
    );
    dirs.write(
        "data/hwy_data/NJ/usai/nj.i076.wpt",
        &format!(
            "PA/NJ {}\n7 {}\n9 {}\n",
            osm(40.1, -75.4),
            osm(40.2, -75.3),
            osm(40.3, -75.2)
        ),
    );
    fs::remove_file(dirs.root.join("data/hwy_data/PA/usai/pa.i070.wpt")).unwrap();
    dirs.write("lists/ranger.list", "PA I-76 1 NJ I-76 9\n");
    fs::remove_file(dirs.root.join("lists/oneil.list")).unwrap();

    let exit = pipeline::run(&dirs.args()).unwrap();
    assert_eq!(exit, 0);
    // the walk marks both chopped pieces end to end: 1 + 2 segments
    let user_log = read(&dirs.root.join("logs/users/ranger.log"));
    assert!(
        user_log.contains("Processed 1 good lines marking 3 segments traveled."),
        "{user_log}"
    );
    // full credit for the connected route in the clinched tables
    let sql = read(&dirs.root.join("TravelMapping.sql"));
    assert!(sql.contains("CREATE TABLE clinchedConnectedRoutes"));
    assert!(sql.contains("'ranger'"), "{sql}");
}

#[test]
fn test_datacheck_fp_suppression() {
    let dirs = TestDirs::new("fps");
    write_base_dataset(&dirs);
    // a hairpin at point 6 triggers SHARP_ANGLE, which may be FP-listed
    dirs.write(
        "data/hwy_data/PA/usai/pa.i070.wpt",
        &format!(
            "2 {}\n6 {}\n11 {}\n",
            osm(40.1, -75.4),
            osm(40.2, -75.3),
            osm(40.1, -75.39)
        ),
    );
    let run_once = |fps: &str| {
        dirs.write("data/datacheckfps.csv", fps);
        pipeline::run(&dirs.args()).unwrap();
        read(&dirs.root.join("logs/datacheck.log"))
    };

    // unsuppressed: the error lands in datacheck.log
    let log = run_once("Root;Waypoint1;Waypoint2;Waypoint3;Error;Info\n");
    let line = log
        .lines()
        .find(|l| l.starts_with("pa.i070;2;6;11;SHARP_ANGLE;"))
        .map(String::from)
        .expect("sharp angle reported");

    // an exact FP row suppresses it
    let log = run_once(&format!("Root;Waypoint1;Waypoint2;Waypoint3;Error;Info\n{line}\n"));
    assert!(!log.contains("SHARP_ANGLE"), "{log}");

    // an FP row with a stale info field only produces an advisory
    let stale = format!("{};0.00\n", line.rsplit_once(';').unwrap().0);
    let log = run_once(&format!("Root;Waypoint1;Waypoint2;Waypoint3;Error;Info\n{stale}"));
    assert!(log.contains("SHARP_ANGLE"), "{log}");
    let near = read(&dirs.root.join("logs/nearmatchfps.log"));
    assert!(near.contains("FP_ENTRY: "), "{near}");
    assert!(near.contains("CHANGETO: "), "{near}");
    let unmatched = read(&dirs.root.join("logs/unmatchedfps.log"));
    assert!(unmatched.contains("SHARP_ANGLE"), "{unmatched}");
}

#[test]
fn test_errorcheck_flags_unknown_region() {
    let dirs = TestDirs::new("errcheck");
    write_base_dataset(&dirs);
    // break one chopped route row with an unknown region
    dirs.write(
        "data/hwy_data/_systems/usai.csv",
        "System;Region;Route;Banner;Abbrev;City;Root;AltRouteNames\n\
         usai;XX;I-76;;;;pa.i076;\n\
         usai;PA;I-70;;;;pa.i070;\n",
    );
    let mut args = dirs.args();
    args.errorcheck = true;
    let exit = pipeline::run(&args).unwrap();
    assert_eq!(exit, 1);
    // the database file must not be written
    assert!(!dirs.root.join("TravelMapping.sql").exists());
}

#[test]
fn test_fatal_errors_abort_before_sql() {
    let dirs = TestDirs::new("abort");
    write_base_dataset(&dirs);
    // missing wpt file for a listed route is fatal
    fs::remove_file(dirs.root.join("data/hwy_data/PA/usai/pa.i070.wpt")).unwrap();
    let result = pipeline::run(&dirs.args());
    assert!(result.is_err());
    assert!(!dirs.root.join("TravelMapping.sql").exists());
}

#[test]
fn test_long_segment_datacheck() {
    let dirs = TestDirs::new("longseg");
    write_base_dataset(&dirs);
    // stretch I-70's last segment beyond 20 miles
    dirs.write(
        "data/hwy_data/PA/usai/pa.i070.wpt",
        &format!(
            "2 {}\n6 {}\n11 {}\n",
            osm(40.1, -75.4),
            osm(40.2, -75.3),
            osm(40.7, -75.4)
        ),
    );
    let exit = pipeline::run(&dirs.args()).unwrap();
    assert_eq!(exit, 0);
    let datacheck = read(&dirs.root.join("logs/datacheck.log"));
    assert!(
        datacheck.contains("pa.i070;6;11;;LONG_SEGMENT;"),
        "{datacheck}"
    );
}

#[test]
fn test_nmp_detection_and_merge() {
    let dirs = TestDirs::new("nmp");
    write_base_dataset(&dirs);
    // nudge I-70's first point a hair away from I-76's point so the
    // pair becomes a near miss instead of a colocation
    dirs.write(
        "data/hwy_data/PA/usai/pa.i070.wpt",
        &format!(
            "2 {}\n6 {}\n11 {}\n",
            osm(40.1001, -75.4),
            osm(40.2, -75.3),
            osm(40.3, -75.4)
        ),
    );
    let mut args = dirs.args();
    let merge = dirs.root.join("merged");
    args.nmpmergepath = Some(merge.to_str().unwrap().to_string());
    let exit = pipeline::run(&args).unwrap();
    assert_eq!(exit, 0);

    let nmp_log = read(&dirs.root.join("logs/nearmisspoints.log"));
    assert!(nmp_log.contains("pa.i070 2"), "{nmp_log}");
    assert!(nmp_log.contains("NMP"), "{nmp_log}");
    let nmp = read(&dirs.root.join("logs/tm-master.nmp"));
    assert!(nmp.contains("pa.i070@2 40.1001 -75.4"), "{nmp}");
    assert!(nmp.contains("pa.i076@5 40.1 -75.4"), "{nmp}");

    // the merged wpt moves both points to (max lat, max lng) with https
    let merged = read(&merge.join("PA/usai/pa.i070.wpt"));
    assert!(
        merged.contains("2 https://www.openstreetmap.org/?lat=40.100100&lon=-75.400000"),
        "{merged}"
    );
    let merged76 = read(&merge.join("PA/usai/pa.i076.wpt"));
    assert!(
        merged76.contains("5 https://www.openstreetmap.org/?lat=40.100100&lon=-75.400000"),
        "{merged76}"
    );
    // untouched points keep their http urls
    assert!(merged76.contains("1 http://www.openstreetmap.org/?lat=40.000000&lon=-75.500000"));
}
