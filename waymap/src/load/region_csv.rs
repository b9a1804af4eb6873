//! continents.csv, countries.csv, and regions.csv readers.

use std::path::Path;

use serde::Deserialize;
use waymap_core::error::ErrorList;
use waymap_core::field;
use waymap_core::model::{CodedName, HighwayData, Region, RegionId};

use crate::load::{read_semicolon_csv, record_line};

#[derive(Debug, Deserialize)]
struct RegionRow {
    code: String,
    name: String,
    country: String,
    continent: String,
    region_type: String,
}

/// read a two-column code;name file, appending the synthetic `error`
/// entry used to resolve unrecognized codes elsewhere.
fn read_coded_csv(
    path: &Path,
    unit: &str,
    code_len: usize,
    name_len: usize,
    el: &ErrorList,
) -> Vec<CodedName> {
    let mut entries = vec![];
    for record in read_semicolon_csv(path, el) {
        if record.len() != 2 {
            el.add_error(format!(
                "Could not parse {} line: [{}], expected 2 fields, found {}",
                path.display(),
                record_line(&record),
                record.len()
            ));
            continue;
        }
        let code = String::from(&record[0]);
        let name = String::from(&record[1]);
        if code.len() > code_len {
            el.add_error(format!(
                "{unit} code > {code_len} bytes in {} line {}",
                path.display(),
                record_line(&record)
            ));
        }
        if name.len() > name_len {
            el.add_error(format!(
                "{unit} name > {name_len} bytes in {} line {}",
                path.display(),
                record_line(&record)
            ));
        }
        entries.push(CodedName { code, name });
    }
    entries.push(CodedName {
        code: String::from("error"),
        name: format!("unrecognized {unit} code"),
    });
    entries
}

/// read the region hierarchy. regions are sorted by code; every table
/// ends with an `error` entry catching unknown code references.
pub fn read_region_csvs(data: &mut HighwayData, datapath: &Path, el: &ErrorList) {
    data.continents = read_coded_csv(
        &datapath.join("continents.csv"),
        "Continent",
        field::CONTINENT_CODE,
        field::CONTINENT_NAME,
        el,
    );
    data.countries = read_coded_csv(
        &datapath.join("countries.csv"),
        "Country",
        field::COUNTRY_CODE,
        field::COUNTRY_NAME,
        el,
    );

    let path = datapath.join("regions.csv");
    let mut records = read_semicolon_csv(&path, el);
    records.sort_by(|a, b| a.get(0).unwrap_or("").cmp(b.get(0).unwrap_or("")));
    for record in records {
        if record.len() != 5 {
            el.add_error(format!(
                "Could not parse regions.csv line: [{}], expected 5 fields, found {}",
                record_line(&record),
                record.len()
            ));
            continue;
        }
        let row: RegionRow = match record.deserialize(None) {
            Ok(row) => row,
            Err(e) => {
                el.add_error(format!(
                    "Could not parse regions.csv line: [{}]: {e}",
                    record_line(&record)
                ));
                continue;
            }
        };
        if row.code.len() > field::REGION_CODE {
            el.add_error(format!(
                "Region code > {} bytes in regions.csv line {}",
                field::REGION_CODE,
                record_line(&record)
            ));
        }
        if row.name.len() > field::REGION_NAME {
            el.add_error(format!(
                "Region name > {} bytes in regions.csv line {}",
                field::REGION_NAME,
                record_line(&record)
            ));
        }
        if row.region_type.len() > field::REGION_TYPE {
            el.add_error(format!(
                "Region type > {} bytes in regions.csv line {}",
                field::REGION_TYPE,
                record_line(&record)
            ));
        }
        let country = match data.countries.iter().position(|c| c.code == row.country) {
            Some(i) => i,
            None => {
                el.add_error(format!(
                    "Could not find country matching regions.csv line: {}",
                    record_line(&record)
                ));
                data.countries.len() - 1
            }
        };
        let continent = match data.continents.iter().position(|c| c.code == row.continent) {
            Some(i) => i,
            None => {
                el.add_error(format!(
                    "Could not find continent matching regions.csv line: {}",
                    record_line(&record)
                ));
                data.continents.len() - 1
            }
        };
        let id = RegionId(data.regions.len() as u16);
        data.region_hash.insert(row.code.clone(), id);
        data.regions.push(Region::new(
            row.code,
            row.name,
            country,
            continent,
            row.region_type,
        ));
    }
    // a synthetic region catches unrecognized region codes in csv files
    let id = RegionId(data.regions.len() as u16);
    data.region_hash.insert(String::from("error"), id);
    data.regions.push(Region::new(
        String::from("error"),
        String::from("unrecognized region code"),
        data.countries.len() - 1,
        data.continents.len() - 1,
        String::from("unrecognized region code"),
    ));
}
