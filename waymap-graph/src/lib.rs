mod edge;
mod error;
mod graph;
mod naming;
mod place_radius;
mod subgraph;
mod tmg;
mod vertex;

pub use edge::{EdgeId, HGEdge, COLLAPSED, SIMPLE, TRAVELED};
pub use error::GraphError;
pub use graph::HighwayGraph;
pub use place_radius::PlaceRadius;
pub use subgraph::{GraphCategory, GraphFormat, GraphListEntry, MatchedSubgraph};
pub use vertex::{HGVertex, VertexId};
