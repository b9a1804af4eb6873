//! data-quality check entries and false-positive reconciliation.

use crate::model::{HighwayData, RouteId};

/// the closed set of data-quality error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatacheckCode {
    AbbrevAsChopBanner,
    AbbrevAsConBanner,
    AbbrevNoCity,
    BadAngle,
    BusWithI,
    CombineConRoutes,
    ConBannerMismatch,
    ConRouteMismatch,
    DisconnectedRoute,
    DuplicateCoords,
    DuplicateLabel,
    HiddenJunction,
    HiddenTerminus,
    InterstateNoHyphen,
    InvalidFinalChar,
    InvalidFirstChar,
    LabelInvalidChar,
    LabelLooksHidden,
    LabelParens,
    LabelSelfref,
    LabelSlashes,
    LabelTooLong,
    LabelUnderscores,
    LacksGeneric,
    LongSegment,
    LongUnderscore,
    MalformedLat,
    MalformedLon,
    MalformedUrl,
    NonterminalUnderscore,
    OutOfBounds,
    SharpAngle,
    UsLetter,
    VisibleDistance,
    VisibleHiddenColoc,
}

impl DatacheckCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AbbrevAsChopBanner => "ABBREV_AS_CHOP_BANNER",
            Self::AbbrevAsConBanner => "ABBREV_AS_CON_BANNER",
            Self::AbbrevNoCity => "ABBREV_NO_CITY",
            Self::BadAngle => "BAD_ANGLE",
            Self::BusWithI => "BUS_WITH_I",
            Self::CombineConRoutes => "COMBINE_CON_ROUTES",
            Self::ConBannerMismatch => "CON_BANNER_MISMATCH",
            Self::ConRouteMismatch => "CON_ROUTE_MISMATCH",
            Self::DisconnectedRoute => "DISCONNECTED_ROUTE",
            Self::DuplicateCoords => "DUPLICATE_COORDS",
            Self::DuplicateLabel => "DUPLICATE_LABEL",
            Self::HiddenJunction => "HIDDEN_JUNCTION",
            Self::HiddenTerminus => "HIDDEN_TERMINUS",
            Self::InterstateNoHyphen => "INTERSTATE_NO_HYPHEN",
            Self::InvalidFinalChar => "INVALID_FINAL_CHAR",
            Self::InvalidFirstChar => "INVALID_FIRST_CHAR",
            Self::LabelInvalidChar => "LABEL_INVALID_CHAR",
            Self::LabelLooksHidden => "LABEL_LOOKS_HIDDEN",
            Self::LabelParens => "LABEL_PARENS",
            Self::LabelSelfref => "LABEL_SELFREF",
            Self::LabelSlashes => "LABEL_SLASHES",
            Self::LabelTooLong => "LABEL_TOO_LONG",
            Self::LabelUnderscores => "LABEL_UNDERSCORES",
            Self::LacksGeneric => "LACKS_GENERIC",
            Self::LongSegment => "LONG_SEGMENT",
            Self::LongUnderscore => "LONG_UNDERSCORE",
            Self::MalformedLat => "MALFORMED_LAT",
            Self::MalformedLon => "MALFORMED_LON",
            Self::MalformedUrl => "MALFORMED_URL",
            Self::NonterminalUnderscore => "NONTERMINAL_UNDERSCORE",
            Self::OutOfBounds => "OUT_OF_BOUNDS",
            Self::SharpAngle => "SHARP_ANGLE",
            Self::UsLetter => "US_LETTER",
            Self::VisibleDistance => "VISIBLE_DISTANCE",
            Self::VisibleHiddenColoc => "VISIBLE_HIDDEN_COLOC",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        Some(match text {
            "ABBREV_AS_CHOP_BANNER" => Self::AbbrevAsChopBanner,
            "ABBREV_AS_CON_BANNER" => Self::AbbrevAsConBanner,
            "ABBREV_NO_CITY" => Self::AbbrevNoCity,
            "BAD_ANGLE" => Self::BadAngle,
            "BUS_WITH_I" => Self::BusWithI,
            "COMBINE_CON_ROUTES" => Self::CombineConRoutes,
            "CON_BANNER_MISMATCH" => Self::ConBannerMismatch,
            "CON_ROUTE_MISMATCH" => Self::ConRouteMismatch,
            "DISCONNECTED_ROUTE" => Self::DisconnectedRoute,
            "DUPLICATE_COORDS" => Self::DuplicateCoords,
            "DUPLICATE_LABEL" => Self::DuplicateLabel,
            "HIDDEN_JUNCTION" => Self::HiddenJunction,
            "HIDDEN_TERMINUS" => Self::HiddenTerminus,
            "INTERSTATE_NO_HYPHEN" => Self::InterstateNoHyphen,
            "INVALID_FINAL_CHAR" => Self::InvalidFinalChar,
            "INVALID_FIRST_CHAR" => Self::InvalidFirstChar,
            "LABEL_INVALID_CHAR" => Self::LabelInvalidChar,
            "LABEL_LOOKS_HIDDEN" => Self::LabelLooksHidden,
            "LABEL_PARENS" => Self::LabelParens,
            "LABEL_SELFREF" => Self::LabelSelfref,
            "LABEL_SLASHES" => Self::LabelSlashes,
            "LABEL_TOO_LONG" => Self::LabelTooLong,
            "LABEL_UNDERSCORES" => Self::LabelUnderscores,
            "LACKS_GENERIC" => Self::LacksGeneric,
            "LONG_SEGMENT" => Self::LongSegment,
            "LONG_UNDERSCORE" => Self::LongUnderscore,
            "MALFORMED_LAT" => Self::MalformedLat,
            "MALFORMED_LON" => Self::MalformedLon,
            "MALFORMED_URL" => Self::MalformedUrl,
            "NONTERMINAL_UNDERSCORE" => Self::NonterminalUnderscore,
            "OUT_OF_BOUNDS" => Self::OutOfBounds,
            "SHARP_ANGLE" => Self::SharpAngle,
            "US_LETTER" => Self::UsLetter,
            "VISIBLE_DISTANCE" => Self::VisibleDistance,
            "VISIBLE_HIDDEN_COLOC" => Self::VisibleHiddenColoc,
            _ => return None,
        })
    }

    /// codes that always indicate real errors; false-positive entries
    /// for these are rejected at FP load time.
    pub fn always_error(&self) -> bool {
        matches!(
            self,
            Self::AbbrevAsChopBanner
                | Self::AbbrevAsConBanner
                | Self::BadAngle
                | Self::ConBannerMismatch
                | Self::ConRouteMismatch
                | Self::DisconnectedRoute
                | Self::DuplicateLabel
                | Self::HiddenTerminus
                | Self::InterstateNoHyphen
                | Self::InvalidFinalChar
                | Self::InvalidFirstChar
                | Self::LabelInvalidChar
                | Self::LabelParens
                | Self::LabelSlashes
                | Self::LabelTooLong
                | Self::LabelUnderscores
                | Self::LongUnderscore
                | Self::MalformedLat
                | Self::MalformedLon
                | Self::MalformedUrl
                | Self::NonterminalUnderscore
                | Self::UsLetter
        )
    }
}

/// one datacheck log entry: the route, up to three related labels, the
/// error code, and optional extra information.
#[derive(Debug, Clone)]
pub struct DatacheckEntry {
    pub route: RouteId,
    pub label1: String,
    pub label2: String,
    pub label3: String,
    pub code: DatacheckCode,
    pub info: String,
    pub fp: bool,
}

impl DatacheckEntry {
    /// csv-style line, ready to paste into the false-positive list.
    pub fn to_line(&self, data: &HighwayData) -> String {
        format!(
            "{};{};{};{};{};{}",
            data.route(self.route).root,
            self.label1,
            self.label2,
            self.label3,
            self.code.as_str(),
            self.info
        )
    }
}

/// one row of datacheckfps.csv: a previously-reviewed error approved for
/// suppression, matched against entries up to the info field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FpEntry {
    pub root: String,
    pub label1: String,
    pub label2: String,
    pub label3: String,
    pub code: String,
    pub info: String,
}

impl FpEntry {
    pub fn to_line(&self) -> String {
        format!(
            "{};{};{};{};{};{}",
            self.root, self.label1, self.label2, self.label3, self.code, self.info
        )
    }
}

/// the process-wide collection of datacheck entries.
#[derive(Debug, Default)]
pub struct DatacheckList {
    pub entries: Vec<DatacheckEntry>,
}

/// outcome of matching entries against the false-positive list.
#[derive(Debug, Default)]
pub struct FpMarkResult {
    pub matched: usize,
    /// FP_ENTRY/CHANGETO advisory pairs for fps whose info field changed
    pub near_match_lines: Vec<String>,
    /// fps that matched no current entry
    pub unmatched: Vec<FpEntry>,
}

impl DatacheckList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        route: RouteId,
        label1: &str,
        label2: &str,
        label3: &str,
        code: DatacheckCode,
        info: String,
    ) {
        self.entries.push(DatacheckEntry {
            route,
            label1: String::from(label1),
            label2: String::from(label2),
            label3: String::from(label3),
            code,
            info,
            fp: false,
        });
    }

    pub fn merge(&mut self, other: DatacheckList) {
        self.entries.extend(other.entries);
    }

    /// sort entries lexicographically by their full csv line, the order
    /// required for stable output across runs.
    pub fn sort(&mut self, data: &HighwayData) {
        self.entries.sort_by_cached_key(|e| e.to_line(data));
    }

    /// match each entry against the fp list: exact matches are marked
    /// suppressed and consume their fp row; fps matching all fields but
    /// info generate advisory near-match lines.
    pub fn mark_fps(&mut self, data: &HighwayData, mut fps: Vec<FpEntry>) -> FpMarkResult {
        let mut result = FpMarkResult::default();
        for entry in &mut self.entries {
            let root = &data.route(entry.route).root;
            let mut matched_at = None;
            for (i, fp) in fps.iter().enumerate() {
                if fp.root != *root
                    || fp.label1 != entry.label1
                    || fp.label2 != entry.label2
                    || fp.label3 != entry.label3
                    || fp.code != entry.code.as_str()
                {
                    continue;
                }
                if fp.info == entry.info {
                    matched_at = Some(i);
                    break;
                }
                result.near_match_lines.push(format!("FP_ENTRY: {}", fp.to_line()));
                result.near_match_lines.push(format!(
                    "CHANGETO: {};{};{};{};{};{}",
                    fp.root, fp.label1, fp.label2, fp.label3, fp.code, entry.info
                ));
            }
            if let Some(i) = matched_at {
                entry.fp = true;
                result.matched += 1;
                fps.remove(i);
            }
        }
        result.unmatched = fps;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_round_trip() {
        for code in [
            DatacheckCode::BadAngle,
            DatacheckCode::VisibleDistance,
            DatacheckCode::UsLetter,
        ] {
            assert_eq!(DatacheckCode::parse(code.as_str()), Some(code));
        }
        assert_eq!(DatacheckCode::parse("NOT_A_CODE"), None);
    }

    #[test]
    fn test_always_error_subset() {
        assert!(DatacheckCode::BadAngle.always_error());
        assert!(DatacheckCode::DisconnectedRoute.always_error());
        assert!(!DatacheckCode::VisibleDistance.always_error());
        assert!(!DatacheckCode::SharpAngle.always_error());
        assert!(!DatacheckCode::HiddenJunction.always_error());
    }
}
