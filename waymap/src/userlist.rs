//! traveler .list file processing: resolving each line to a run of
//! route segments and marking them clinched.
//!
//! files are read in parallel; semantic processing runs one traveler at
//! a time in name order, so segment and route bookkeeping needs no
//! locks and user logs come out identical run to run.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use rayon::prelude::*;
use waymap_core::error::{DataError, ErrorList};
use waymap_core::field;
use waymap_core::model::{HighwayData, RouteId, TravelerId, TravelerList};
use waymap_core::util::{canonical_label, sanitize_for_log};

use crate::logs::log_timestamp;

struct ListFile {
    name: String,
    contents: String,
    /// modification date of the .list file, YYYY-MM-DD
    file_date: Option<String>,
}

/// read and process all traveler list files. returns the number of
/// files processed.
pub fn process_traveler_lists(
    data: &mut HighwayData,
    userlistfilepath: &Path,
    userlistext: &str,
    only_users: &[String],
    logpath: &Path,
    el: &ErrorList,
) -> Result<usize, DataError> {
    let mut names: Vec<String> = if only_users.is_empty() {
        let Ok(entries) = std::fs::read_dir(userlistfilepath) else {
            el.add_error(format!("Could not open {}", userlistfilepath.display()));
            return Ok(0);
        };
        entries
            .flatten()
            .filter_map(|e| {
                let file_name = e.file_name().to_string_lossy().into_owned();
                file_name
                    .strip_suffix(userlistext)
                    .map(String::from)
            })
            .collect()
    } else {
        only_users.to_vec()
    };
    names.sort();
    names.dedup();

    let files: Vec<Option<ListFile>> = names
        .par_iter()
        .map(|name| {
            let path: PathBuf = userlistfilepath.join(format!("{name}{userlistext}"));
            let bytes = match std::fs::read(&path) {
                Ok(b) => b,
                Err(_) => {
                    el.add_error(format!("Could not open {}", path.display()));
                    return None;
                }
            };
            let file_date = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .ok()
                .map(|mtime| {
                    DateTime::<Local>::from(mtime).format("%Y-%m-%d").to_string()
                });
            Some(ListFile {
                name: name.clone(),
                contents: String::from_utf8_lossy(&bytes).into_owned(),
                file_date,
            })
        })
        .collect();

    let users_dir = logpath.join("users");
    std::fs::create_dir_all(&users_dir).map_err(|source| DataError::FileWrite {
        path: users_dir.display().to_string(),
        source,
    })?;

    let mut processed = 0;
    for file in files.into_iter().flatten() {
        if file.name.len() > field::TRAVELER {
            el.add_error(format!(
                "Traveler name {} > {} bytes",
                file.name,
                field::TRAVELER
            ));
        }
        let traveler_id = TravelerId(data.travelers.len() as u16);
        let mut traveler = TravelerList::new(file.name.clone(), file.file_date.clone());
        let mut log_lines = vec![];
        let entries = process_lines(
            data,
            &mut traveler,
            traveler_id,
            &file.contents,
            &mut log_lines,
        );
        log_lines.push(format!(
            "Processed {entries} good lines marking {} segments traveled.",
            traveler.clinched_segments.len()
        ));
        let log_path = users_dir.join(format!("{}.log", file.name));
        let write = || -> std::io::Result<()> {
            let mut out = std::io::BufWriter::new(std::fs::File::create(&log_path)?);
            writeln!(out, "Log file created at: {}", log_timestamp())?;
            for line in &log_lines {
                writeln!(out, "{line}")?;
            }
            Ok(())
        };
        write().map_err(|source| DataError::FileWrite {
            path: log_path.display().to_string(),
            source,
        })?;
        data.travelers.push(traveler);
        processed += 1;
    }
    Ok(processed)
}

fn process_lines(
    data: &mut HighwayData,
    traveler: &mut TravelerList,
    traveler_id: TravelerId,
    contents: &str,
    log: &mut Vec<String>,
) -> usize {
    let mut entries = 0;
    for raw_line in contents.split(['\r', '\n']) {
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if let Some(comment) = tokens.iter().position(|t| t.starts_with('#')) {
            tokens.truncate(comment);
        }
        match tokens.len() {
            4 => {
                if process_chopped_line(data, traveler, traveler_id, &tokens, trimmed, log) {
                    entries += 1;
                }
            }
            6 => {
                if process_connected_line(data, traveler, traveler_id, &tokens, trimmed, log) {
                    entries += 1;
                }
            }
            _ => {
                let (line, invalid) = sanitize_for_log(trimmed);
                log.push(format!(
                    "Incorrect format line: {line}{}",
                    invalid_note(invalid)
                ));
            }
        }
    }
    entries
}

fn invalid_note(invalid: bool) -> &'static str {
    if invalid {
        " [contains invalid character(s)]"
    } else {
        ""
    }
}

/// region route label label
fn process_chopped_line(
    data: &mut HighwayData,
    traveler: &mut TravelerList,
    traveler_id: TravelerId,
    tokens: &[&str],
    trimmed: &str,
    log: &mut Vec<String>,
) -> bool {
    let lookup = format!("{} {}", tokens[0], tokens[1]).to_uppercase();
    let route_id = match data.pri_list_hash.get(&lookup) {
        Some(&r) => r,
        None => match data.alt_list_hash.get(&lookup) {
            Some(&r) => {
                log.push(format!(
                    "Note: deprecated route name {} -> canonical name {} in line: {}",
                    tokens[1],
                    data.route(r).list_entry_name(),
                    trimmed
                ));
                r
            }
            None => {
                let (line, invalid) = sanitize_for_log(trimmed);
                log.push(format!(
                    "Unknown region/highway combo in line: {line}{}",
                    invalid_note(invalid)
                ));
                return false;
            }
        },
    };
    if data.route_system(route_id).devel() {
        log.push(format!(
            "Ignoring line matching highway in system in development: {trimmed}"
        ));
        return false;
    }
    let label1 = canonical_label(tokens[2]);
    let label2 = canonical_label(tokens[3]);
    let index1 = data.route(route_id).label_index(&label1);
    let index2 = data.route(route_id).label_index(&label2);
    let (Some(index1), Some(index2)) = (index1, index2) else {
        let (line, invalid) = sanitize_for_log(trimmed);
        let message = if index1.is_none() && index2.is_none() {
            format!("Waypoint labels {label1} and {label2} not found in line: {line}")
        } else {
            let missing = if index1.is_none() { &label1 } else { &label2 };
            format!("Waypoint label {missing} not found in line: {line}")
        };
        log.push(format!("{message}{}", invalid_note(invalid)));
        update_note(data, traveler, route_id, log);
        return false;
    };
    let mut duplicate = false;
    for label in [&label1, &label2] {
        if data.route(route_id).duplicate_labels.contains(label) {
            log.push(format!(
                "{}: duplicate label {label} in {}. Please report this error in the Travel Mapping forum. Unable to parse line: {trimmed}",
                data.region(data.route(route_id).region).code,
                data.route(route_id).root
            ));
            duplicate = true;
        }
    }
    if duplicate {
        return false;
    }
    if index1 == index2 {
        log.push(format!(
            "Equivalent waypoint labels mark zero distance traveled in line: {trimmed}"
        ));
        update_note(data, traveler, route_id, log);
        return false;
    }
    mark_routes_in_use(data, route_id, &lookup, None);
    mark_label_in_use(data, route_id, &label1);
    mark_label_in_use(data, route_id, &label2);
    let (beg, end) = if index1 <= index2 {
        (index1, index2)
    } else {
        (index2, index1)
    };
    store_traveled_segments(data, traveler, traveler_id, route_id, beg, end, log);
    true
}

/// region route label region route label
fn process_connected_line(
    data: &mut HighwayData,
    traveler: &mut TravelerList,
    traveler_id: TravelerId,
    tokens: &[&str],
    trimmed: &str,
    log: &mut Vec<String>,
) -> bool {
    let lookup1 = format!("{} {}", tokens[0], tokens[1]).to_uppercase();
    let lookup2 = format!("{} {}", tokens[3], tokens[4]).to_uppercase();
    let resolve = |lookup: &str, name_token: &str, log: &mut Vec<String>| {
        match data.pri_list_hash.get(lookup) {
            Some(&r) => Some(r),
            None => {
                let r = data.alt_list_hash.get(lookup).copied();
                if let Some(r) = r {
                    log.push(format!(
                        "Note: deprecated route name \"{name_token}\" -> canonical name \"{}\" in line: {trimmed}",
                        data.readable_name(r)
                    ));
                }
                r
            }
        }
    };
    let r1 = resolve(&lookup1, &format!("{} {}", tokens[0], tokens[1]), log);
    let r2 = resolve(&lookup2, &format!("{} {}", tokens[3], tokens[4]), log);
    let (Some(mut r1), Some(mut r2)) = (r1, r2) else {
        let (line, invalid) = sanitize_for_log(trimmed);
        let message = if r1.is_none() && r2.is_none() {
            format!("Unknown region/highway combos {lookup1} and {lookup2} in line: {line}")
        } else {
            let missing = if r1.is_none() { &lookup1 } else { &lookup2 };
            format!("Unknown region/highway combo {missing} in line: {line}")
        };
        log.push(format!("{message}{}", invalid_note(invalid)));
        return false;
    };
    if data.route(r1).con_route != data.route(r2).con_route
        || data.route(r1).con_route.is_none()
    {
        log.push(format!(
            "{lookup1} and {lookup2} not in same connected route in line: {trimmed}"
        ));
        for r in [r1, r2] {
            if let Some(con) = data.route(r).con_route {
                let roots = data.con_route(con).roots.clone();
                if let Some(&first) = roots.first() {
                    update_note(data, traveler, first, log);
                }
                if roots.len() > 1 {
                    update_note(data, traveler, *roots.last().unwrap(), log);
                }
            }
        }
        return false;
    }
    if data.route_system(r1).devel() {
        log.push(format!(
            "Ignoring line matching highway in system in development: {trimmed}"
        ));
        return false;
    }
    let mut label1 = canonical_label(tokens[2]);
    let mut label2 = canonical_label(tokens[5]);
    let index1 = data.route(r1).label_index(&label1);
    let index2 = data.route(r2).label_index(&label2);
    let (Some(mut index1), Some(mut index2)) = (index1, index2) else {
        let (line, invalid) = sanitize_for_log(trimmed);
        let message = if index1.is_none() && index2.is_none() {
            format!("Waypoint labels {label1} and {label2} not found in line: {line}")
        } else if index1.is_none() {
            format!("Waypoint {lookup1} {label1} not found in line: {line}")
        } else {
            format!("Waypoint {lookup2} {label2} not found in line: {line}")
        };
        log.push(format!("{message}{}", invalid_note(invalid)));
        if index1.is_none() && r1 != r2 {
            update_note(data, traveler, r1, log);
        }
        if index2.is_none() {
            update_note(data, traveler, r2, log);
        }
        return false;
    };
    let mut duplicate = false;
    for (r, label) in [(r1, &label1), (r2, &label2)] {
        if data.route(r).duplicate_labels.contains(label) {
            log.push(format!(
                "{}: duplicate label {label} in {}.",
                data.region(data.route(r).region).code,
                data.route(r).root
            ));
            duplicate = true;
        }
    }
    if duplicate {
        log.push(String::from("  Please report this error in the Travel Mapping forum."));
        log.push(format!("  Unable to parse line: {trimmed}"));
        mark_routes_in_use(data, r1, &lookup1, Some(&lookup2));
        mark_label_in_use(data, r1, &label1);
        mark_label_in_use(data, r2, &label2);
        return false;
    }
    if r1 == r2 {
        if index1 == index2 {
            log.push(format!(
                "Equivalent waypoint labels mark zero distance traveled in line: {trimmed}"
            ));
            update_note(data, traveler, r1, log);
            return false;
        }
        let (beg, end) = if index1 <= index2 {
            (index1, index2)
        } else {
            (index2, index1)
        };
        mark_routes_in_use(data, r1, &lookup1, Some(&lookup2));
        mark_label_in_use(data, r1, &label1);
        mark_label_in_use(data, r2, &label2);
        store_traveled_segments(data, traveler, traveler_id, r1, beg, end, log);
        return true;
    }
    // distinct chopped routes within one connected route
    let con = data.route(r1).con_route.unwrap();
    if data.con_route(con).disconnected {
        let mut regions: Vec<String> = data
            .con_route(con)
            .roots
            .iter()
            .filter(|&&r| data.route(r).disconnected)
            .map(|&r| data.region(data.route(r).region).code.clone())
            .collect();
        regions.sort();
        regions.dedup();
        log.push(format!(
            "{}: DISCONNECTED_ROUTE error in {}.",
            regions.join("/"),
            data.con_route(con).readable_name()
        ));
        log.push(String::from("  Please report this error in the Travel Mapping forum."));
        log.push(format!(
            "  Travels may potentially be shown incorrectly for line: {trimmed}"
        ));
    }
    if data.route(r1).root_order > data.route(r2).root_order {
        std::mem::swap(&mut r1, &mut r2);
        std::mem::swap(&mut index1, &mut index2);
        std::mem::swap(&mut label1, &mut label2);
    }
    mark_label_in_use(data, r1, &label1);
    mark_label_in_use(data, r2, &label2);
    mark_routes_in_use(data, r1, &lookup1, Some(&lookup2));
    // first chopped route from the start label to its connected end
    let r1_len = data.route(r1).segments.len();
    if data.route(r1).is_reversed {
        store_traveled_segments(data, traveler, traveler_id, r1, 0, index1, log);
    } else {
        store_traveled_segments(data, traveler, traveler_id, r1, index1, r1_len, log);
    }
    // last chopped route from its connected start to the end label
    let r2_len = data.route(r2).segments.len();
    if data.route(r2).is_reversed {
        store_traveled_segments(data, traveler, traveler_id, r2, index2, r2_len, log);
    } else {
        store_traveled_segments(data, traveler, traveler_id, r2, 0, index2, log);
    }
    // intermediate chopped routes in their entirety
    let roots = data.con_route(con).roots.clone();
    let from = data.route(r1).root_order as usize + 1;
    let to = data.route(r2).root_order as usize;
    for &mid in &roots[from..to] {
        let len = data.route(mid).segments.len();
        store_traveled_segments(data, traveler, traveler_id, mid, 0, len, log);
    }
    true
}

/// mark clinched segments both ways: the traveler keeps the segment,
/// the segment keeps the traveler's bit.
fn store_traveled_segments(
    data: &mut HighwayData,
    traveler: &mut TravelerList,
    traveler_id: TravelerId,
    route_id: RouteId,
    beg: usize,
    end: usize,
    log: &mut Vec<String>,
) {
    let segments = data.route(route_id).segments.clone();
    for pos in beg..end {
        let seg = segments[pos];
        if data.segment_mut(seg).clinched_by.insert(traveler_id.index()) {
            traveler.clinched_segments.insert(seg);
        }
    }
    update_note(data, traveler, route_id, log);
}

/// the first time a traveler lists a route, note whether its data was
/// updated after the .list file was last saved.
fn update_note(
    data: &HighwayData,
    traveler: &mut TravelerList,
    route_id: RouteId,
    log: &mut Vec<String>,
) {
    if !traveler.routes.insert(route_id) {
        return;
    }
    let (Some(update_index), Some(file_date)) =
        (data.route(route_id).last_update, traveler.file_date.as_ref())
    else {
        return;
    };
    let update = &data.updates[update_index];
    if update.date.as_str() >= file_date.as_str() {
        log.push(format!(
            "Route updated {}: {}",
            update.date,
            data.readable_name(route_id)
        ));
    }
}

fn mark_label_in_use(data: &mut HighwayData, route_id: RouteId, label: &str) {
    let route = data.route_mut(route_id);
    route.labels_in_use.insert(String::from(label));
    route.unused_alt_labels.remove(label);
}

fn mark_routes_in_use(
    data: &mut HighwayData,
    route_id: RouteId,
    lookup1: &str,
    lookup2: Option<&str>,
) {
    let system = data.route(route_id).system;
    let system = &mut data.systems[system.index()];
    system.list_names_in_use.insert(String::from(lookup1));
    system.unused_alt_route_names.remove(lookup1);
    if let Some(lookup2) = lookup2 {
        system.list_names_in_use.insert(String::from(lookup2));
        system.unused_alt_route_names.remove(lookup2);
    }
}
