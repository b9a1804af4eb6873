//! maximum byte widths for database text columns. input fields exceeding
//! these limits are fatal data errors, keeping the generated load script
//! within the schema the web frontend expects.

pub const ABBREV: usize = 3;
pub const BANNER: usize = 6;
pub const CITY: usize = 100;
pub const COLOR: usize = 16;
pub const CONTINENT_CODE: usize = 3;
pub const CONTINENT_NAME: usize = 15;
pub const COUNTRY_CODE: usize = 3;
pub const COUNTRY_NAME: usize = 32;
pub const DATE: usize = 10;
pub const DC_ERR_CODE: usize = 22;
pub const GRAPH_CATEGORY: usize = 12;
pub const GRAPH_DESCR: usize = 100;
pub const GRAPH_FILENAME: usize = 32;
pub const GRAPH_FORMAT: usize = 10;
pub const LABEL: usize = 26;
pub const LEVEL: usize = 10;
pub const REGION_CODE: usize = 8;
pub const REGION_NAME: usize = 48;
pub const REGION_TYPE: usize = 32;
pub const ROOT: usize = 32;
pub const ROUTE: usize = 16;
pub const ROUTE_LONG_NAME: usize = 80;
pub const STATUS_CHANGE: usize = 16;
pub const SYSTEM_FULL_NAME: usize = 60;
pub const SYSTEM_NAME: usize = 10;
pub const TRAVELER: usize = 48;
pub const UPDATE_TEXT: usize = 1024;

// sums of other constants
pub const COUNTRY_REGION: usize = COUNTRY_NAME + REGION_NAME + 3;
pub const DC_ERR_VALUE: usize = ROOT + LABEL + 1;
