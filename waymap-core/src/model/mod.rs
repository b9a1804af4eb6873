mod data;
mod ids;
mod region;
mod route;
mod segment;
mod system;
mod traveler;
mod waypoint;

pub use data::{HighwayData, SystemUpdate, Update};
pub use ids::{
    ColocationId, ConnectedRouteId, ConcurrencyId, RegionId, RouteId, SegmentId, SystemId,
    TravelerId, WaypointId,
};
pub use region::{CodedName, Region};
pub use route::Route;
pub use segment::HighwaySegment;
pub use system::{ConnectedRoute, HighwaySystem, SystemLevel};
pub use traveler::TravelerList;
pub use waypoint::Waypoint;
