//! waypoint label character validation and shape checks.

use crate::datacheck::DatacheckCode;
use crate::field;

/// result of scanning a label's characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharScan {
    Ok,
    /// contains characters outside the allowed set; flag LABEL_INVALID_CHAR
    InvalidChar,
    /// control byte or non-ASCII; fatal, no datacheck entry
    Fatal(String),
}

/// scan one label (primary or alternate) against the closed character
/// table. allowed: `(` `)` `-` `.` `/` digits A-Z `_` a-z, after an
/// optional leading mark of `+`, `*`, or `+*`.
pub fn scan_label(label: &str) -> CharScan {
    let bytes = label.as_bytes();
    // valid mark prefixes: +X..., *X..., +*X...; anything else with
    // leading marks is invalid
    let mut start = 0;
    if bytes.first() == Some(&b'+') || bytes.first() == Some(&b'*') {
        start = 1;
        if bytes[0] == b'+' && bytes.get(1) == Some(&b'*') {
            start = 2;
        }
        match bytes.get(start) {
            None | Some(b'+') | Some(b'*') => return CharScan::InvalidChar,
            _ => {}
        }
    }
    let mut invalid = false;
    for &b in &bytes[start..] {
        match b {
            b'(' | b')' | b'-' | b'.' | b'/' | b'_' => {}
            b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z' => {}
            0x20..=0x7E => invalid = true,
            _ => {
                return CharScan::Fatal(format!(
                    "invalid byte {b:#04X} in label [{}]",
                    label.escape_default()
                ))
            }
        }
    }
    if invalid {
        CharScan::InvalidChar
    } else {
        CharScan::Ok
    }
}

/// shape checks applied to visible labels at wpt load time. returns the
/// codes to flag with their info fields.
pub fn visible_label_checks(
    label: &str,
    route_name: &str,
    route_banner: &str,
) -> Vec<(DatacheckCode, String)> {
    let mut flags = vec![];
    let slash = label.find('/');

    if label.len() > field::LABEL {
        flags.push((DatacheckCode::LabelTooLong, String::new()));
    }
    if label_selfref(label, route_name, route_banner, slash) {
        flags.push((DatacheckCode::LabelSelfref, String::new()));
    }
    if let Some(s) = slash {
        if label[s + 1..].contains('/') {
            flags.push((DatacheckCode::LabelSlashes, String::new()));
        }
    }
    if let Some(u) = label.find('_') {
        if label[u + 1..].contains('_') {
            flags.push((DatacheckCode::LabelUnderscores, String::new()));
        }
        if label.len() > u + 5 {
            flags.push((DatacheckCode::LongUnderscore, String::new()));
        }
        if slash.is_some_and(|s| s > u) {
            flags.push((DatacheckCode::NonterminalUnderscore, String::new()));
        }
    }
    let parens: i32 = label
        .chars()
        .map(|c| match c {
            '(' => 1,
            ')' => -1,
            _ => 0,
        })
        .sum();
    if parens != 0 {
        flags.push((DatacheckCode::LabelParens, String::new()));
    }
    if bus_with_i(label) {
        flags.push((DatacheckCode::BusWithI, String::new()));
    }
    if interstate_no_hyphen(label) {
        flags.push((DatacheckCode::InterstateNoHyphen, String::new()));
    }
    if let Some(c) = us_letter(label) {
        flags.push((DatacheckCode::UsLetter, String::from(c)));
    }
    if looks_hidden(label) {
        flags.push((DatacheckCode::LabelLooksHidden, String::new()));
    }
    if lacks_generic(label) {
        flags.push((DatacheckCode::LacksGeneric, String::new()));
    }
    // first character after an optional '*' must be alphanumeric
    let body = label.strip_prefix('*').unwrap_or(label);
    if let Some(first) = body.chars().next() {
        if !first.is_ascii_alphanumeric() {
            flags.push((DatacheckCode::InvalidFirstChar, String::from(first)));
        }
    }
    if let Some(last) = label.chars().last() {
        if !last.is_ascii_alphanumeric() && last != ')' {
            flags.push((DatacheckCode::InvalidFinalChar, String::from(last)));
        }
    }
    flags
}

/// `I-xx` exits labeled with `Bus` instead of `BL`/`BS`.
fn bus_with_i(label: &str) -> bool {
    let Some(rest) = label.strip_prefix("I-") else {
        return false;
    };
    rest.trim_start_matches(|c: char| c.is_ascii_digit())
        .starts_with("Bus")
}

/// interstate references written `Ixx` or `toIxx` without the hyphen.
fn interstate_no_hyphen(label: &str) -> bool {
    let body = label.strip_prefix("to").unwrap_or(label);
    let Some(rest) = body.strip_prefix('I') else {
        return false;
    };
    rest.starts_with(|c: char| c.is_ascii_digit())
}

/// `USxxxA`-style labels where the trailing letter is not the start of a
/// recognized banner word. returns the offending letter.
fn us_letter(label: &str) -> Option<char> {
    const BANNERS: [&str; 9] = [
        "Alt", "Bus", "Byp", "Con", "Lp", "Opt", "Scn", "Spr", "Trk",
    ];
    let rest = label.strip_prefix("US")?;
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let tail = &rest[digits..];
    let first = tail.chars().next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    if BANNERS.iter().any(|b| tail.starts_with(b)) {
        return None;
    }
    Some(first)
}

/// visible labels shaped like hidden-point names: `X` plus six digits.
fn looks_hidden(label: &str) -> bool {
    label.len() == 7
        && label.starts_with('X')
        && label[1..].chars().all(|c| c.is_ascii_digit())
}

/// old-route labels such as `OldUS30` missing their `*` prefix marker.
fn lacks_generic(label: &str) -> bool {
    label
        .strip_prefix("Old")
        .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_alphanumeric()))
}

/// whether the label references its own route, either as a slash suffix
/// matching the route's number or as a route+banner prefix.
fn label_selfref(label: &str, route_name: &str, route_banner: &str, slash: Option<usize>) -> bool {
    // number match after a slash, when the route name ends in digits
    if let Some(s) = slash {
        if route_name.ends_with(|c: char| c.is_ascii_digit()) {
            let digit_start = route_name
                .rfind(|c: char| !c.is_ascii_digit())
                .map(|i| i + 1)
                .unwrap_or(0);
            let after = &label[s + 1..];
            let number = &route_name[digit_start..];
            if after == number || after == route_name {
                return true;
            }
            if let Some(u) = after.find('_') {
                let trimmed = &after[..u];
                if trimmed == number || trimmed == route_name {
                    return true;
                }
            }
        }
    }
    // route+banner prefix followed by end, '_' or '/'
    let rte_ban = format!("{route_name}{route_banner}");
    match label.strip_prefix(&rte_ban) {
        Some(rest) => rest.is_empty() || rest.starts_with('_') || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(label: &str, route: &str, banner: &str) -> Vec<DatacheckCode> {
        visible_label_checks(label, route, banner)
            .into_iter()
            .map(|(c, _)| c)
            .collect()
    }

    #[test]
    fn test_scan_label_allows_clean_labels() {
        assert_eq!(scan_label("I-80"), CharScan::Ok);
        assert_eq!(scan_label("+X123456"), CharScan::Ok);
        assert_eq!(scan_label("*OldUS30"), CharScan::Ok);
        assert_eq!(scan_label("US1/US9"), CharScan::Ok);
        assert_eq!(scan_label("+*AltOld"), CharScan::Ok);
    }

    #[test]
    fn test_scan_label_flags_bad_characters() {
        assert_eq!(scan_label("US 30"), CharScan::InvalidChar);
        assert_eq!(scan_label("A,B"), CharScan::InvalidChar);
        assert_eq!(scan_label("++X"), CharScan::InvalidChar);
        assert_eq!(scan_label("**X"), CharScan::InvalidChar);
        assert_eq!(scan_label("+"), CharScan::InvalidChar);
    }

    #[test]
    fn test_scan_label_fatal_on_control_or_non_ascii() {
        assert!(matches!(scan_label("A\tB"), CharScan::Fatal(_)));
        assert!(matches!(scan_label("caf\u{e9}"), CharScan::Fatal(_)));
    }

    #[test]
    fn test_selfref() {
        assert!(codes("NY5", "NY5", "").contains(&DatacheckCode::LabelSelfref));
        assert!(codes("NY5_N", "NY5", "").contains(&DatacheckCode::LabelSelfref));
        assert!(codes("US20/5", "NY5", "").contains(&DatacheckCode::LabelSelfref));
        // NY50 is a fine label on NY5
        assert!(!codes("NY50", "NY5", "").contains(&DatacheckCode::LabelSelfref));
    }

    #[test]
    fn test_underscore_shapes() {
        assert!(codes("A_B_C", "X", "").contains(&DatacheckCode::LabelUnderscores));
        assert!(codes("Exit_South", "X", "").contains(&DatacheckCode::LongUnderscore));
        assert!(codes("A_N/B", "X", "").contains(&DatacheckCode::NonterminalUnderscore));
        assert!(!codes("A_N", "X", "").contains(&DatacheckCode::LongUnderscore));
    }

    #[test]
    fn test_slashes_and_parens() {
        assert!(codes("A/B/C", "X", "").contains(&DatacheckCode::LabelSlashes));
        assert!(codes("A(B", "X", "").contains(&DatacheckCode::LabelParens));
        assert!(!codes("A(B)", "X", "").contains(&DatacheckCode::LabelParens));
    }

    #[test]
    fn test_interstate_shapes() {
        assert!(codes("I-80Bus", "X", "").contains(&DatacheckCode::BusWithI));
        assert!(codes("I80", "X", "").contains(&DatacheckCode::InterstateNoHyphen));
        assert!(codes("toI80", "X", "").contains(&DatacheckCode::InterstateNoHyphen));
        assert!(!codes("I-80BL", "X", "").contains(&DatacheckCode::BusWithI));
    }

    #[test]
    fn test_us_letter() {
        assert!(codes("US30A", "X", "").contains(&DatacheckCode::UsLetter));
        assert!(!codes("US30Alt", "X", "").contains(&DatacheckCode::UsLetter));
        assert!(!codes("US30Bus", "X", "").contains(&DatacheckCode::UsLetter));
    }

    #[test]
    fn test_looks_hidden_and_generics() {
        assert!(codes("X123456", "X", "").contains(&DatacheckCode::LabelLooksHidden));
        assert!(!codes("X12345", "X", "").contains(&DatacheckCode::LabelLooksHidden));
        assert!(codes("OldUS30", "X", "").contains(&DatacheckCode::LacksGeneric));
    }

    #[test]
    fn test_invalid_ends() {
        assert!(codes("-A", "X", "").contains(&DatacheckCode::InvalidFirstChar));
        assert!(codes("A-", "X", "").contains(&DatacheckCode::InvalidFinalChar));
        assert!(!codes("A(1)", "X", "").contains(&DatacheckCode::InvalidFinalChar));
        assert!(!codes("*OldNY5A", "NY5", "X").contains(&DatacheckCode::InvalidFirstChar));
    }
}
