use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::model::{ConnectedRouteId, RegionId, RouteId};

/// lifecycle stage of a highway system. devel systems are loaded and
/// indexed but excluded from stats, traveler credit, and graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemLevel {
    Active,
    Preview,
    Devel,
}

impl SystemLevel {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "active" => Some(Self::Active),
            "preview" => Some(Self::Preview),
            "devel" => Some(Self::Devel),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Preview => "preview",
            Self::Devel => "devel",
        }
    }
}

/// the collection of routes defined by one systems.csv line and its
/// per-system route csv files.
#[derive(Debug, Clone)]
pub struct HighwaySystem {
    pub systemname: String,
    /// index into the countries table
    pub country: usize,
    pub fullname: String,
    pub color: String,
    pub tier: u32,
    pub level: SystemLevel,

    pub routes: Vec<RouteId>,
    pub con_routes: Vec<ConnectedRouteId>,
    /// insertion order follows route csv order, keeping output deterministic
    pub mileage_by_region: IndexMap<RegionId, f64>,
    pub list_names_in_use: BTreeSet<String>,
    pub unused_alt_route_names: BTreeSet<String>,
}

impl HighwaySystem {
    pub fn active(&self) -> bool {
        self.level == SystemLevel::Active
    }

    pub fn preview(&self) -> bool {
        self.level == SystemLevel::Preview
    }

    pub fn active_or_preview(&self) -> bool {
        self.level != SystemLevel::Devel
    }

    pub fn devel(&self) -> bool {
        self.level == SystemLevel::Devel
    }

    pub fn total_mileage(&self) -> f64 {
        self.mileage_by_region.values().sum()
    }
}

/// a single designation spanning one or more chopped routes, from a
/// system's _con.csv file.
#[derive(Debug, Clone)]
pub struct ConnectedRoute {
    pub system: crate::model::SystemId,
    pub route: String,
    pub banner: String,
    pub groupname: String,
    pub roots: Vec<RouteId>,
    pub mileage: f64,
    /// set when DISCONNECTED_ROUTE errors are flagged between members
    pub disconnected: bool,
}

impl ConnectedRoute {
    /// human-readable connected route name.
    pub fn readable_name(&self) -> String {
        if self.groupname.is_empty() {
            format!("{}{}", self.route, self.banner)
        } else {
            format!("{}{} ({})", self.route, self.banner, self.groupname)
        }
    }
}
