//! Inventory store.
//!
//! An ordered collection of collected items, tools, and clues. Insertion
//! order is display order. Stackable items with the same name merge into one
//! entry; non-stackable entries are unique by name (re-adding replaces the
//! old entry in place). Every addition is reported to the progress tracker
//! so "ever collected" survives later consumption.

use serde::{Deserialize, Serialize};

use crate::progress::PlayerProgress;
use crate::world::AssetHandle;

/// A collectable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub icon: Option<AssetHandle>,
    pub description: String,
    pub stack_amount: u32,
    pub stackable: bool,
    pub kind: ItemKind,
}

/// What flavor of item this is. Clues carry where they were found, tools
/// carry what they are used for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Generic,
    Clue { source: String },
    Tool { tool_type: String },
}

impl Item {
    /// Create a generic, non-stackable item.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: None,
            description: String::new(),
            stack_amount: 1,
            stackable: false,
            kind: ItemKind::Generic,
        }
    }

    /// Create a clue found at the given source.
    pub fn clue(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Clue {
                source: source.into(),
            },
            ..Self::new(name)
        }
    }

    /// Create a tool of the given type.
    pub fn tool(name: impl Into<String>, tool_type: impl Into<String>) -> Self {
        Self {
            kind: ItemKind::Tool {
                tool_type: tool_type.into(),
            },
            ..Self::new(name)
        }
    }

    pub fn with_icon(mut self, icon: AssetHandle) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the item stackable with the given starting amount.
    pub fn stackable(mut self, stack_amount: u32) -> Self {
        self.stackable = true;
        self.stack_amount = stack_amount;
        self
    }
}

/// The player's inventory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    items: Vec<Item>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item, merging stacks and reporting the collection to the
    /// progress tracker.
    pub fn add(&mut self, item: Item, progress: &mut PlayerProgress) {
        progress.collect_item(&item.name);

        if item.stackable {
            if let Some(existing) = self
                .items
                .iter_mut()
                .find(|i| i.name == item.name && i.stackable)
            {
                existing.stack_amount += item.stack_amount;
                tracing::debug!(
                    item = %item.name,
                    amount = existing.stack_amount,
                    "merged into existing stack"
                );
                return;
            }
        } else if let Some(pos) = self
            .items
            .iter()
            .position(|i| i.name == item.name && !i.stackable)
        {
            // Last write wins; keeps entries unique by name.
            tracing::debug!(item = %item.name, "replaced existing entry");
            self.items[pos] = item;
            return;
        }

        tracing::debug!(item = %item.name, "added to inventory");
        self.items.push(item);
    }

    /// Whether an item with this name is currently held.
    pub fn has(&self, name: &str) -> bool {
        self.items.iter().any(|i| i.name == name)
    }

    /// Remove the first entry with this name, if any. Absence is not an
    /// error.
    pub fn remove_by_name(&mut self, name: &str) {
        if let Some(pos) = self.items.iter().position(|i| i.name == name) {
            self.items.remove(pos);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.name == name)
    }

    /// Items in display order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
