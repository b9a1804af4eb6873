pub mod bitset;
pub mod datacheck;
pub mod error;
pub mod field;
pub mod geo;
pub mod label;
pub mod model;
pub mod quadtree;
pub mod util;
