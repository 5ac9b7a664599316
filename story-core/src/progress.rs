//! Player progress tracking.
//!
//! Records which NPCs the player has talked to and which items they have
//! ever collected. Both records are permanent for the session: consuming an
//! item later does not un-collect it. Inventory membership ("currently
//! held") is a separate question answered by [`crate::inventory::Inventory`].

use serde::{Deserialize, Serialize};

/// Permanent per-session progress flags, keyed by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerProgress {
    talked_to_npcs: Vec<String>,
    collected_items: Vec<String>,
}

impl PlayerProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the player has talked to an NPC. Idempotent.
    pub fn talk_to_npc(&mut self, npc_name: &str) {
        if !self.talked_to_npcs.iter().any(|n| n == npc_name) {
            tracing::debug!(npc = npc_name, "recorded talk");
            self.talked_to_npcs.push(npc_name.to_string());
        }
    }

    pub fn has_talked_to(&self, npc_name: &str) -> bool {
        self.talked_to_npcs.iter().any(|n| n == npc_name)
    }

    /// Record that the player has collected an item. Idempotent.
    pub fn collect_item(&mut self, item_name: &str) {
        if !self.collected_items.iter().any(|n| n == item_name) {
            self.collected_items.push(item_name.to_string());
        }
    }

    /// Whether the item has ever been collected, held or not.
    pub fn has_item(&self, item_name: &str) -> bool {
        self.collected_items.iter().any(|n| n == item_name)
    }

    /// Names of NPCs talked to, in first-talk order.
    pub fn talked_to_npcs(&self) -> &[String] {
        &self.talked_to_npcs
    }

    /// Names of items collected, in first-collection order.
    pub fn collected_items(&self) -> &[String] {
        &self.collected_items
    }
}
