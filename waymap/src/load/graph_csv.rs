//! graph descriptor csv readers: area, system, multisystem, multiregion,
//! and fully-custom subgraph definitions.

use std::path::Path;

use serde::Deserialize;
use waymap_core::error::ErrorList;
use waymap_core::model::{HighwayData, RegionId, SystemId};
use waymap_graph::{GraphCategory, GraphListEntry, PlaceRadius};

use crate::load::{read_semicolon_csv_optional, record_line};

#[derive(Debug, Deserialize)]
struct AreaRow {
    place: String,
    base: String,
    lat: f64,
    lng: f64,
    radius: u32,
}

#[derive(Debug, Deserialize)]
struct MultiRow {
    descr: String,
    title: String,
    codes: String,
}

#[derive(Debug, Deserialize)]
struct FullCustomRow {
    descr: String,
    root: String,
    lat: String,
    lng: String,
    radius: String,
    region_list: String,
    system_list: String,
}

fn resolve_systems(data: &HighwayData, codes: &str) -> Vec<SystemId> {
    let mut out = vec![];
    for code in codes.split(',').filter(|c| !c.is_empty()) {
        match data.systems.iter().position(|h| h.systemname == code) {
            Some(i) => out.push(SystemId(i as u16)),
            None => log::warn!("unknown system code '{code}' in graph descriptor"),
        }
    }
    out
}

fn resolve_regions(data: &HighwayData, codes: &str) -> Vec<RegionId> {
    let mut out = vec![];
    for code in codes.split(',').filter(|c| !c.is_empty()) {
        match data.region_hash.get(code) {
            Some(&r) => out.push(r),
            None => log::warn!("unknown region code '{code}' in graph descriptor"),
        }
    }
    out
}

/// graphs/areagraphs.csv: one place-radius subgraph per row.
pub fn area_graphs(datapath: &Path, el: &ErrorList) -> Vec<GraphListEntry> {
    let mut entries = vec![];
    let path = datapath.join("graphs/areagraphs.csv");
    for record in read_semicolon_csv_optional(&path, el) {
        if record.len() != 5 {
            log::error!(
                "Could not parse areagraphs.csv line: {}",
                record_line(&record)
            );
            continue;
        }
        match record.deserialize::<AreaRow>(None) {
            Ok(row) => {
                let pr = PlaceRadius::new(row.place.clone(), row.base.clone(), row.lat, row.lng, row.radius);
                entries.extend(GraphListEntry::trio(
                    format!("{}{}-area", row.base, row.radius),
                    format!("{} ({} mi radius)", row.place, row.radius),
                    GraphCategory::Area,
                    None,
                    None,
                    Some(pr),
                ));
            }
            Err(e) => log::error!(
                "Could not parse areagraphs.csv line: {}: {e}",
                record_line(&record)
            ),
        }
    }
    entries
}

/// graphs/systemgraphs.csv: single-system subgraphs for a curated list.
pub fn system_graphs(data: &HighwayData, datapath: &Path, el: &ErrorList) -> Vec<GraphListEntry> {
    let mut entries = vec![];
    let path = datapath.join("graphs/systemgraphs.csv");
    for record in read_semicolon_csv_optional(&path, el) {
        let name = &record[0];
        let Some(i) = data.systems.iter().position(|h| h.systemname == name) else {
            log::warn!("unknown system '{name}' in systemgraphs.csv");
            continue;
        };
        let system = &data.systems[i];
        entries.extend(GraphListEntry::trio(
            format!("{}-system", system.systemname),
            format!("{} ({})", system.systemname, system.fullname),
            GraphCategory::System,
            None,
            Some(vec![SystemId(i as u16)]),
            None,
        ));
    }
    entries
}

/// graphs/multisystem.csv: subgraphs spanning a set of systems.
pub fn multisystem_graphs(
    data: &HighwayData,
    datapath: &Path,
    el: &ErrorList,
) -> Vec<GraphListEntry> {
    multi_graphs(data, datapath, el, "multisystem.csv", GraphCategory::Multisystem)
}

/// graphs/multiregion.csv: subgraphs spanning a set of regions.
pub fn multiregion_graphs(
    data: &HighwayData,
    datapath: &Path,
    el: &ErrorList,
) -> Vec<GraphListEntry> {
    multi_graphs(data, datapath, el, "multiregion.csv", GraphCategory::Multiregion)
}

fn multi_graphs(
    data: &HighwayData,
    datapath: &Path,
    el: &ErrorList,
    filename: &str,
    category: GraphCategory,
) -> Vec<GraphListEntry> {
    let mut entries = vec![];
    let path = datapath.join("graphs").join(filename);
    for record in read_semicolon_csv_optional(&path, el) {
        if record.len() != 3 {
            log::error!("Could not parse {filename} line: {}", record_line(&record));
            continue;
        }
        match record.deserialize::<MultiRow>(None) {
            Ok(row) => {
                let (regions, systems) = match category {
                    GraphCategory::Multiregion => (Some(resolve_regions(data, &row.codes)), None),
                    _ => (None, Some(resolve_systems(data, &row.codes))),
                };
                entries.extend(GraphListEntry::trio(
                    row.title,
                    row.descr,
                    category,
                    regions,
                    systems,
                    None,
                ));
            }
            Err(e) => log::error!(
                "Could not parse {filename} line: {}: {e}",
                record_line(&record)
            ),
        }
    }
    entries
}

/// graphs/fullcustom.csv: any combination of area, region, and system
/// restrictions. lat/lng/radius must be given together or not at all.
pub fn fullcustom_graphs(
    data: &HighwayData,
    datapath: &Path,
    el: &ErrorList,
) -> Vec<GraphListEntry> {
    let mut entries = vec![];
    let path = datapath.join("graphs/fullcustom.csv");
    for record in read_semicolon_csv_optional(&path, el) {
        if record.len() != 7 {
            log::error!(
                "Could not parse fullcustom.csv line: {}",
                record_line(&record)
            );
            continue;
        }
        let row: FullCustomRow = match record.deserialize(None) {
            Ok(row) => row,
            Err(e) => {
                log::error!(
                    "Could not parse fullcustom.csv line: {}: {e}",
                    record_line(&record)
                );
                continue;
            }
        };
        let pr_fields = [&row.lat, &row.lng, &row.radius];
        let given = pr_fields.iter().filter(|f| !f.is_empty()).count();
        let placeradius = match given {
            0 => None,
            3 => {
                match (
                    row.lat.parse::<f64>(),
                    row.lng.parse::<f64>(),
                    row.radius.parse::<u32>(),
                ) {
                    (Ok(lat), Ok(lng), Ok(radius)) => Some(PlaceRadius::new(
                        row.descr.clone(),
                        row.root.clone(),
                        lat,
                        lng,
                        radius,
                    )),
                    _ => {
                        log::error!(
                            "Could not parse fullcustom.csv area fields: {}",
                            record_line(&record)
                        );
                        continue;
                    }
                }
            }
            _ => {
                log::error!(
                    "fullcustom.csv lat/lng/radius must be given together: {}",
                    record_line(&record)
                );
                continue;
            }
        };
        let regions = if row.region_list.is_empty() {
            None
        } else {
            Some(resolve_regions(data, &row.region_list))
        };
        let systems = if row.system_list.is_empty() {
            None
        } else {
            Some(resolve_systems(data, &row.system_list))
        };
        entries.extend(GraphListEntry::trio(
            row.root,
            row.descr,
            GraphCategory::Fullcustom,
            regions,
            systems,
            placeradius,
        ));
    }
    entries
}
