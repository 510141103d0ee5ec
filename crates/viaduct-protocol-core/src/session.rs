use crate::dimension::{DimensionRegistry, WorldData};
use crate::tracker::EntityTracker;

/// Counters for recovered translation problems.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub unknown_entity_types: u64,
    pub unmapped_metadata: u64,
    pub dropped_metadata: u64,
    pub untracked_metadata: u64,
    pub unsupported_packets: u64,
}

impl SessionStats {
    pub fn merge(&mut self, other: &SessionStats) {
        self.unknown_entity_types += other.unknown_entity_types;
        self.unmapped_metadata += other.unmapped_metadata;
        self.dropped_metadata += other.dropped_metadata;
        self.untracked_metadata += other.untracked_metadata;
        self.unsupported_packets += other.unsupported_packets;
    }
}

/// Per connection state of one protocol edge.
#[derive(Debug, Default)]
pub struct Session {
    pub tracker: EntityTracker,
    pub dimensions: DimensionRegistry,
    pub world: Option<WorldData>,
    pub stats: SessionStats,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.tracker.clear();
        self.dimensions = DimensionRegistry::default();
        self.world = None;
    }
}
