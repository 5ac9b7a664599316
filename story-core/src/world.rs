//! The story world context object.
//!
//! Everything the dialogue and objective machinery needs to read or mutate
//! lives here (inventory, progress, NPCs, and objective zones) and is
//! passed explicitly to the components that need it. There are no global
//! singletons and no scene-graph lookups; hosts hold ids.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::inventory::{Inventory, Item};
use crate::npc::Npc;
use crate::objective::ObjectiveZone;
use crate::progress::PlayerProgress;

/// Opaque reference to a host-owned asset (sprite, portrait, icon).
///
/// The core never interprets it; it only hands it back to the presentation
/// layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetHandle(String);

impl AssetHandle {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier for an NPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NpcId(Uuid);

impl NpcId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Identifier for an objective zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId(Uuid);

impl ZoneId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// The session-wide game state the core operates on.
#[derive(Debug, Clone, Default)]
pub struct StoryWorld {
    pub inventory: Inventory,
    pub progress: PlayerProgress,
    pub npcs: HashMap<NpcId, Npc>,
    pub zones: HashMap<ZoneId, ObjectiveZone>,
}

impl StoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an NPC and return its id.
    pub fn add_npc(&mut self, npc: Npc) -> NpcId {
        let id = npc.id();
        self.npcs.insert(id, npc);
        id
    }

    pub fn npc(&self, id: NpcId) -> Option<&Npc> {
        self.npcs.get(&id)
    }

    pub fn npc_mut(&mut self, id: NpcId) -> Option<&mut Npc> {
        self.npcs.get_mut(&id)
    }

    /// Register an objective zone and return its id.
    pub fn add_zone(&mut self, zone: ObjectiveZone) -> ZoneId {
        let id = zone.id();
        self.zones.insert(id, zone);
        id
    }

    pub fn zone(&self, id: ZoneId) -> Option<&ObjectiveZone> {
        self.zones.get(&id)
    }

    /// Set a zone's latch. Unknown ids degrade to a logged no-op.
    pub fn enter_zone(&mut self, id: ZoneId) {
        match self.zones.get_mut(&id) {
            Some(zone) => zone.player_entered(),
            None => tracing::warn!(?id, "enter_zone on unknown zone"),
        }
    }

    /// Add an item to the inventory, recording the collection in progress.
    pub fn pick_up(&mut self, item: Item) {
        self.inventory.add(item, &mut self.progress);
    }
}
