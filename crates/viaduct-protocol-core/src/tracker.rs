use crate::entity::EntityTypeId;
use std::collections::HashMap;

/// Live entities of one connection, as seen by one protocol edge.
#[derive(Debug, Default)]
pub struct EntityTracker {
    entities: HashMap<i32, EntityTypeId>,
    player: Option<i32>,
}

impl EntityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a spawn. A respawned id replaces the previous entry.
    pub fn on_spawn(&mut self, id: i32, ty: EntityTypeId) {
        self.entities.insert(id, ty);
    }

    pub fn on_remove(&mut self, ids: &[i32]) {
        for id in ids {
            self.entities.remove(id);
        }
    }

    pub fn lookup(&self, id: i32) -> Option<EntityTypeId> {
        self.entities.get(&id).copied()
    }

    /// The connection's own player entity, tracked as `ty`.
    pub fn set_player(&mut self, id: i32, ty: EntityTypeId) {
        if let Some(old) = self.player.replace(id) {
            self.entities.remove(&old);
        }
        self.entities.insert(id, ty);
    }

    pub fn player(&self) -> Option<i32> {
        self.player
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.player = None;
    }
}
