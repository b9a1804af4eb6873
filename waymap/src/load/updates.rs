//! updates.csv and systemupdates.csv readers, plus resolution of each
//! route's most recent update entry.

use std::path::Path;

use serde::Deserialize;
use waymap_core::error::ErrorList;
use waymap_core::model::{HighwayData, SystemUpdate, Update};

use crate::load::{read_semicolon_csv, record_line};

#[derive(Debug, Deserialize)]
struct UpdateRow {
    date: String,
    region: String,
    route: String,
    root: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct SystemUpdateRow {
    date: String,
    region: String,
    system_name: String,
    description: String,
    status_change: String,
}

pub fn read_updates(data: &mut HighwayData, datapath: &Path, el: &ErrorList) {
    let path = datapath.join("updates.csv");
    for record in read_semicolon_csv(&path, el) {
        if record.len() != 5 {
            el.add_error(format!(
                "Could not parse updates.csv line: [{}], expected 5 fields, found {}",
                record_line(&record),
                record.len()
            ));
            continue;
        }
        match record.deserialize::<UpdateRow>(None) {
            Ok(row) => data.updates.push(Update {
                date: row.date,
                region: row.region,
                route: row.route,
                root: row.root,
                description: row.description,
            }),
            Err(e) => el.add_error(format!(
                "Could not parse updates.csv line: [{}]: {e}",
                record_line(&record)
            )),
        }
    }

    let path = datapath.join("systemupdates.csv");
    for record in read_semicolon_csv(&path, el) {
        if record.len() != 5 {
            el.add_error(format!(
                "Could not parse systemupdates.csv line: [{}], expected 5 fields, found {}",
                record_line(&record),
                record.len()
            ));
            continue;
        }
        match record.deserialize::<SystemUpdateRow>(None) {
            Ok(row) => data.system_updates.push(SystemUpdate {
                date: row.date,
                region: row.region,
                system_name: row.system_name,
                description: row.description,
                status_change: row.status_change,
            }),
            Err(e) => el.add_error(format!(
                "Could not parse systemupdates.csv line: [{}]: {e}",
                record_line(&record)
            )),
        }
    }

    // attach each route's newest update for per-user notices
    for (i, update) in data.updates.iter().enumerate() {
        let Some(&route_id) = data.root_hash.get(&update.root.to_lowercase()) else {
            continue;
        };
        let newer = match data.routes[route_id.index()].last_update {
            None => true,
            Some(existing) => data.updates[existing].date < update.date,
        };
        if newer {
            data.routes[route_id.index()].last_update = Some(i);
        }
    }
}
