//! shared string and number formatting helpers.
//!
//! number output matches C's `%.15g` so that graph files and the database
//! load script are byte-identical to what earlier generations of the
//! pipeline produced.

/// format a float with up to 15 significant digits, `%.15g` style:
/// fixed notation with trailing zeros removed while the decimal exponent
/// is in [-4, 15), scientific notation otherwise.
pub fn fmt_g(value: f64) -> String {
    if value == 0.0 {
        return String::from("0");
    }
    if !value.is_finite() {
        return value.to_string();
    }
    // take the decimal exponent from the value after rounding to 15
    // significant digits, so boundary cases like 0.9999999999999999
    // land in the right branch
    let sci = format!("{value:.14e}");
    let (mantissa, exp) = sci
        .split_once('e')
        .expect("{:e} formatting always contains an exponent");
    let exp: i32 = exp.parse().expect("{:e} exponent is an integer");
    if (-4..15).contains(&exp) {
        let decimals = (14 - exp).max(0) as usize;
        let mut out = format!("{value:.decimals$}");
        if out.contains('.') {
            while out.ends_with('0') {
                out.pop();
            }
            if out.ends_with('.') {
                out.pop();
            }
        }
        out
    } else {
        let mut m = String::from(mantissa);
        if m.contains('.') {
            while m.ends_with('0') {
                m.pop();
            }
            if m.ends_with('.') {
                m.pop();
            }
        }
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{m}e{sign}{:02}", exp.abs())
    }
}

/// `%.15g` with a single trailing `.0` appended to integer-valued output,
/// for textual compatibility with the project's earlier Python tooling.
pub fn fmt_g_dot0(value: f64) -> String {
    let mut out = fmt_g(value);
    if !out.contains('.') && !out.contains('e') {
        out.push_str(".0");
    }
    out
}

/// nicely-formatted clinched/total mileage with percentage.
pub fn format_clinched_mi(clinched: f64, total: f64) -> String {
    if total != 0.0 {
        format!(
            "{clinched:.2} of {total:.2} mi ({:.2}%)",
            100.0 * clinched / total
        )
    } else {
        format!("{clinched:.2} of {total:.2} mi -.--%")
    }
}

/// double up single quotes for SQL string literals.
pub fn double_quotes(text: &str) -> String {
    text.replace('\'', "''")
}

/// strip the leading `+`/`*` marks from a waypoint label.
pub fn strip_label_marks(label: &str) -> &str {
    label.trim_start_matches(['+', '*'])
}

/// canonical label form used by the lookup hashes: marks stripped,
/// ASCII-uppercased.
pub fn canonical_label(label: &str) -> String {
    strip_label_marks(label).to_ascii_uppercase()
}

/// replace control bytes with `?` for safe inclusion in log files.
/// returns the sanitized text and whether anything was replaced.
pub fn sanitize_for_log(text: &str) -> (String, bool) {
    let mut replaced = false;
    let out = text
        .chars()
        .map(|c| {
            if c.is_control() {
                replaced = true;
                '?'
            } else {
                c
            }
        })
        .collect();
    (out, replaced)
}

/// whether the text is a plain decimal number: optional leading minus,
/// at most one decimal point, digits elsewhere.
pub fn valid_num_str(text: &str) -> bool {
    let mut chars = text.chars().peekable();
    if chars.peek() == Some(&'-') {
        chars.next();
    }
    let mut digits = 0;
    let mut points = 0;
    for c in chars {
        match c {
            '0'..='9' => digits += 1,
            '.' => {
                points += 1;
                if points > 1 {
                    return false;
                }
            }
            _ => return false,
        }
    }
    digits > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_g_trims_trailing_zeros() {
        assert_eq!(fmt_g(40.5), "40.5");
        assert_eq!(fmt_g(-75.25), "-75.25");
        assert_eq!(fmt_g(40.0), "40");
        assert_eq!(fmt_g(0.0), "0");
    }

    #[test]
    fn test_fmt_g_fifteen_significant_digits() {
        assert_eq!(fmt_g(40.123456789012345), "40.1234567890123");
        assert_eq!(fmt_g(0.000123456), "0.000123456");
        assert_eq!(fmt_g(123456789012345.0), "123456789012345");
    }

    #[test]
    fn test_fmt_g_scientific_for_extremes() {
        assert_eq!(fmt_g(1e-7), "1e-07");
        assert_eq!(fmt_g(1.5e20), "1.5e+20");
    }

    #[test]
    fn test_fmt_g_dot0_marks_integers() {
        assert_eq!(fmt_g_dot0(40.0), "40.0");
        assert_eq!(fmt_g_dot0(40.5), "40.5");
    }

    #[test]
    fn test_format_clinched_mi() {
        assert_eq!(format_clinched_mi(5.0, 10.0), "5.00 of 10.00 mi (50.00%)");
        assert_eq!(format_clinched_mi(0.0, 0.0), "0.00 of 0.00 mi -.--%");
    }

    #[test]
    fn test_canonical_label() {
        assert_eq!(canonical_label("+X123"), "X123");
        assert_eq!(canonical_label("*OldUS30"), "OLDUS30");
        assert_eq!(strip_label_marks("plain"), "plain");
    }

    #[test]
    fn test_valid_num_str() {
        assert!(valid_num_str("40.123"));
        assert!(valid_num_str("-75"));
        assert!(!valid_num_str("40.1.2"));
        assert!(!valid_num_str("4-0"));
        assert!(!valid_num_str(""));
        assert!(!valid_num_str("."));
    }
}
