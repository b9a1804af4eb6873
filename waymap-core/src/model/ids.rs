//! typed arena indices. cross-references between model records are
//! non-owning ids into the arenas held by [super::HighwayData].

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaypointId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectedRouteId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TravelerId(pub u16);

/// index into the shared colocation-list arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColocationId(pub u32);

/// index into the shared concurrency-group arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConcurrencyId(pub u32);

impl WaypointId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl SegmentId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl RouteId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ConnectedRouteId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl SystemId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl RegionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TravelerId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ColocationId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ConcurrencyId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
