pub mod graph_csv;
pub mod region_csv;
pub mod system_csv;
pub mod updates;
pub mod wpt;

use std::path::Path;

use itertools::Itertools;

use waymap_core::error::ErrorList;

/// open a `;`-delimited csv file and return its records with the header
/// line skipped. a missing file is a fatal error and yields no records.
pub(crate) fn read_semicolon_csv(path: &Path, el: &ErrorList) -> Vec<csv::StringRecord> {
    if !path.is_file() {
        el.add_error(format!("Could not open {}", path.display()));
        return vec![];
    }
    read_semicolon_csv_optional(path, el)
}

/// like [read_semicolon_csv], but a missing file is fine and yields no
/// records. used for graph descriptor and false-positive files.
pub(crate) fn read_semicolon_csv_optional(path: &Path, el: &ErrorList) -> Vec<csv::StringRecord> {
    let reader = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(_) => {
            return vec![];
        }
    };
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = vec![];
    for (i, record) in rdr.records().enumerate() {
        match record {
            Ok(r) => {
                if i == 0 {
                    continue; // header line
                }
                if r.iter().all(|f| f.trim().is_empty()) {
                    continue;
                }
                records.push(r);
            }
            Err(e) => el.add_error(format!(
                "Could not parse {} record: {e}",
                path.display()
            )),
        }
    }
    records
}

/// reassemble a record into its original `;`-joined line for error
/// messages.
pub(crate) fn record_line(record: &csv::StringRecord) -> String {
    record.iter().join(";")
}
