//! canonical vertex naming: deterministic rewrites that compress the
//! labels of colocated waypoints into one meaningful graph vertex name.

use waymap_core::model::{HighwayData, WaypointId};

/// failsafe name: `route@label`, `&`-joined across active and preview
/// colocated points.
pub fn simple_waypoint_name(data: &HighwayData, w: WaypointId) -> String {
    let wp = data.waypoint(w);
    match data.colocation(w) {
        None => format!("{}@{}", data.route(wp.route).list_entry_name(), wp.label),
        Some(members) => {
            let mut out = String::new();
            for &m in members {
                if !data.waypoint_system(m).active_or_preview() {
                    continue;
                }
                if !out.is_empty() {
                    out.push('&');
                }
                let mw = data.waypoint(m);
                out.push_str(&data.route(mw.route).list_entry_name());
                out.push('@');
                out.push_str(&mw.label);
            }
            out
        }
    }
}

/// best name for a location, bringing in information from every active
/// or preview colocated point. each successful rewrite appends one line
/// to the naming log.
pub fn canonical_waypoint_name(
    data: &HighwayData,
    w: WaypointId,
    ap_coloc: &[WaypointId],
    log: &mut Vec<String>,
) -> String {
    let name = simple_waypoint_name(data, w);
    if data.colocation(w).is_none() || ap_coloc.len() < 2 {
        return name;
    }

    if let Some(new) = straightforward_concurrency(data, ap_coloc) {
        log.push(format!("Straightforward concurrency: {name} -> {new}"));
        return new;
    }
    if let Some(new) = straightforward_intersection(data, ap_coloc) {
        log.push(format!("Straightforward intersection: {name} -> {new}"));
        return new;
    }
    if let Some(new) = exit_intersection(data, ap_coloc) {
        log.push(format!("Exit/Intersection: {name} -> {new}"));
        return new;
    }
    if let Some(new) = three_plus_intersection(data, ap_coloc) {
        log.push(format!("3+ intersection: {name} -> {new}"));
        return new;
    }
    if let Some(new) = exit_number(data, ap_coloc) {
        log.push(format!("Exit number: {name} -> {new}"));
        return new;
    }
    if let Some(new) = reversed_border_labels(data, ap_coloc) {
        log.push(format!("Reversed border labels: {name} -> {new}"));
        return new;
    }
    log.push(format!("Keep failsafe: {name}"));
    name
}

fn list_name(data: &HighwayData, w: WaypointId) -> String {
    data.route(data.waypoint(w).route).list_entry_name()
}

fn no_abbrev(data: &HighwayData, w: WaypointId) -> String {
    data.route(data.waypoint(w).route).name_no_abbrev()
}

/// matching labels across a concurrency: route/route/route@label, hidden
/// labels matching anything.
fn straightforward_concurrency(data: &HighwayData, ap_coloc: &[WaypointId]) -> Option<String> {
    let mut routes = String::new();
    let mut pointname = String::new();
    let mut matches = 0;
    for &w in ap_coloc {
        let label = &data.waypoint(w).label;
        if routes.is_empty() {
            routes = list_name(data, w);
            pointname = label.clone();
            matches = 1;
        } else if *label == pointname || label.starts_with('+') {
            // avoids double route names at border crossings
            let entry = list_name(data, w);
            if routes != entry {
                routes.push('/');
                routes.push_str(&entry);
            }
            matches += 1;
        }
    }
    (matches == ap_coloc.len()).then(|| format!("{routes}@{pointname}"))
}

/// two-route intersections whose labels reference each other, possibly
/// with directional suffixes: NY30@US20&US20@NY30 -> NY30/US20.
fn straightforward_intersection(data: &HighwayData, ap_coloc: &[WaypointId]) -> Option<String> {
    if ap_coloc.len() != 2 {
        return None;
    }
    let w0_entry = list_name(data, ap_coloc[0]);
    let w1_entry = list_name(data, ap_coloc[1]);
    let w0_label = &data.waypoint(ap_coloc[0]).label;
    let w1_label = &data.waypoint(ap_coloc[1]).label;
    let refs = |entry: &str, label: &str| {
        label == entry || label.starts_with(&format!("{entry}_"))
    };
    (refs(&w0_entry, w1_label) && refs(&w1_entry, w0_label))
        .then(|| format!("{w1_label}/{w0_label}"))
}

/// one route's label is an exit that the others reference:
/// I-10@753B&US90@I-10(753B) -> I-10(753B)/US90.
fn exit_intersection(data: &HighwayData, ap_coloc: &[WaypointId]) -> Option<String> {
    for (match_index, &m) in ap_coloc.iter().enumerate() {
        let lookfor1 = list_name(data, m);
        let lookfor2 = format!("{lookfor1}({})", data.waypoint(m).label);
        let all_match = ap_coloc.iter().enumerate().all(|(i, &w)| {
            i == match_index || {
                let label = &data.waypoint(w).label;
                *label == lookfor1 || *label == lookfor2
            }
        });
        if all_match {
            let mut newname = if data
                .waypoint(m)
                .label
                .starts_with(|c: char| c.is_ascii_digit())
            {
                lookfor2
            } else {
                lookfor1
            };
            for (i, &w) in ap_coloc.iter().enumerate() {
                if i != match_index {
                    newname.push('/');
                    newname.push_str(&list_name(data, w));
                }
            }
            return Some(newname);
        }
    }
    None
}

/// 3+ routes whose labels each start with another route's name:
/// NY5@NY16/384&NY16@NY5/384&NY384@NY5/16 -> NY5/NY16/NY384.
fn three_plus_intersection(data: &HighwayData, ap_coloc: &[WaypointId]) -> Option<String> {
    if ap_coloc.len() <= 2 {
        return None;
    }
    let mut suffixes = vec![String::new(); ap_coloc.len()];
    for (check_index, &c) in ap_coloc.iter().enumerate() {
        let label = &data.waypoint(c).label;
        let mut this_match = false;
        for (other_index, &o) in ap_coloc.iter().enumerate() {
            if other_index == check_index {
                continue;
            }
            for other_name in [list_name(data, o), no_abbrev(data, o)] {
                if label.starts_with(&other_name) {
                    this_match = true;
                    if let Some(u) = label.find('_') {
                        let suffix = &label[u..];
                        if format!("{other_name}{suffix}") == *label {
                            suffixes[other_index] = String::from(suffix);
                        }
                    }
                    break;
                }
            }
        }
        if !this_match {
            return None;
        }
    }
    let mut newname = String::new();
    for (i, &w) in ap_coloc.iter().enumerate() {
        if i > 0 {
            newname.push('/');
        }
        newname.push_str(&list_name(data, w));
        newname.push_str(&suffixes[i]);
    }
    Some(newname)
}

/// exit-number simplification: I-90@47B(94)&I-94@47B -> I-90(47B)/I-94.
fn exit_number(data: &HighwayData, ap_coloc: &[WaypointId]) -> Option<String> {
    for (try_as_exit, &e) in ap_coloc.iter().enumerate() {
        let exit_label = &data.waypoint(e).label;
        if !exit_label.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        let exit_entry = list_name(data, e);
        let exit_no_abbrev = no_abbrev(data, e);
        // route number without any leading letters
        let route_number_only = match exit_no_abbrev.find(|c: char| c.is_ascii_digit()) {
            Some(i) => String::from(&exit_no_abbrev[i..]),
            None => exit_no_abbrev.clone(),
        };
        let all_match = ap_coloc.iter().enumerate().all(|(i, &w)| {
            i == try_as_exit || {
                let label = &data.waypoint(w).label;
                *label == exit_entry
                    || *label == exit_no_abbrev
                    || *label == format!("{exit_entry}({exit_label})")
                    || *label == format!("{exit_label}({route_number_only})")
                    || *label == format!("{exit_label}({exit_no_abbrev})")
                    || label.starts_with(&format!("{exit_no_abbrev}_"))
                    || label.starts_with(&format!("{exit_no_abbrev}/"))
                    || label == exit_label
            }
        });
        if all_match {
            let mut newname = String::new();
            for (i, &w) in ap_coloc.iter().enumerate() {
                if i > 0 {
                    newname.push('/');
                }
                if i == try_as_exit {
                    newname.push_str(&format!("{}({exit_label})", list_name(data, w)));
                } else {
                    newname.push_str(&list_name(data, w));
                }
            }
            return Some(newname);
        }
    }
    None
}

/// border points labeled with region pairs in either order:
/// DE491@DE/PA&PA491@PA/DE -> DE491/PA491@DE/PA.
fn reversed_border_labels(data: &HighwayData, ap_coloc: &[WaypointId]) -> Option<String> {
    let label = &data.waypoint(ap_coloc[0]).label;
    let slash = label.find('/')?;
    let reverse = format!("{}/{}", &label[slash + 1..], &label[..slash]);
    let all_match = ap_coloc[1..].iter().all(|&w| {
        let other = &data.waypoint(w).label;
        other == label || *other == reverse
    });
    if !all_match {
        return None;
    }
    let mut routes: Vec<String> = vec![];
    for &w in ap_coloc {
        let entry = list_name(data, w);
        if !routes.contains(&entry) {
            routes.push(entry);
        }
    }
    Some(format!("{}@{label}", routes.join("/")))
}
