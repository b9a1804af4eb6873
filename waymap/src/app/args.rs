use clap::Parser;

/// Create SQL, stats, graphs, and log files from highway and user data
/// for the Travel Mapping project.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// path to the route data repository
    #[arg(short = 'w', long, default_value = "../../HighwayData")]
    pub datapath: String,

    /// file of highway systems to include
    #[arg(short = 's', long, default_value = "systems.csv")]
    pub systemsfile: String,

    /// path to the user list file data
    #[arg(short = 'u', long, default_value = "../../UserData/list_files")]
    pub userlistfilepath: String,

    /// file extension for user list files
    #[arg(short = 'x', long, default_value = ".list")]
    pub userlistext: String,

    /// database name for the .sql file name
    #[arg(short = 'd', long, default_value = "TravelMapping")]
    pub databasename: String,

    /// path to write log files, which should have a "users" subdirectory
    #[arg(short = 'l', long, default_value = ".")]
    pub logfilepath: String,

    /// path to write csv statistics files
    #[arg(short = 'c', long, default_value = ".")]
    pub csvstatfilepath: String,

    /// path to write graph format data files
    #[arg(short = 'g', long, default_value = ".")]
    pub graphfilepath: String,

    /// turn off generation of graph files
    #[arg(short = 'k', long)]
    pub skipgraphs: bool,

    /// path to write data with near-miss points merged (generated only
    /// if specified)
    #[arg(short = 'n', long)]
    pub nmpmergepath: Option<String>,

    /// development check for a region being split into subregions:
    /// log path, system suffix, and region code
    #[arg(short = 'p', long, num_args = 3, value_names = ["PATH", "SUFFIX", "REGION"])]
    pub splitregion: Option<Vec<String>>,

    /// restrict processing to these users' list files
    #[arg(short = 'U', long = "userlist")]
    pub userlist: Vec<String>,

    /// number of worker threads for parallel tasks
    #[arg(short = 't', long, default_value_t = 4)]
    pub numthreads: usize,

    /// run only the subset of the process needed to verify highway data
    /// changes; exits non-zero when fatal errors are found
    #[arg(short = 'e', long)]
    pub errorcheck: bool,

    /// decimal digits in elapsed-time console stamps
    #[arg(short = 'T', long, default_value_t = 1)]
    pub timeprecision: usize,

    /// report any location with at least this many colocated points
    /// (0 disables the report)
    #[arg(short = 'L', long, default_value_t = 0)]
    pub colocationlimit: usize,

    /// near-miss point tolerance in degrees
    #[arg(short = 'N', long = "nmp-threshold", default_value_t = 0.0005)]
    pub nmpthreshold: f64,
}

impl Args {
    /// the split-region triple, when configured.
    pub fn split_region(&self) -> Option<(&str, &str, &str)> {
        self.splitregion
            .as_ref()
            .map(|v| (v[0].as_str(), v[1].as_str(), v[2].as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["waymap"]);
        assert_eq!(args.numthreads, 4);
        assert_eq!(args.nmpthreshold, 0.0005);
        assert_eq!(args.userlistext, ".list");
        assert!(!args.errorcheck);
        assert!(args.split_region().is_none());
    }

    #[test]
    fn test_split_region_triple() {
        let args = Args::parse_from([
            "waymap",
            "--splitregion",
            "/tmp/split",
            "2023",
            "BEL",
        ]);
        assert_eq!(args.split_region(), Some(("/tmp/split", "2023", "BEL")));
    }
}
