//! Dialogue and objective core for a narrative adventure game.
//!
//! This crate provides:
//! - A branching dialogue sequencer with typewriter pacing and
//!   inventory-gated options
//! - An objective graph with condition-driven advancement and completion
//!   events
//! - Inventory and progress stores owned by an explicit world context
//! - AI-generated dialogue continuation with graceful fallback
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use story_core::{Dialogue, Npc, StoryGraph, StorySession, StoryWorld};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut world = StoryWorld::new();
//!     let marla = world.add_npc(Npc::new(
//!         "Marla",
//!         Arc::new(Dialogue::new("Marla").with_sentence("You're late.")),
//!     ));
//!
//!     let mut session = StorySession::from_env(world, StoryGraph::new())?;
//!
//!     session.npc_zone_entered(marla);
//!     session.interact(marla)?;
//!     loop {
//!         let events = session.tick();
//!         for command in session.drain_ui_commands() {
//!             // hand to the presentation layer
//!             let _ = command;
//!         }
//!         if !events.is_empty() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod continuation;
pub mod dialogue;
pub mod inventory;
pub mod npc;
pub mod objective;
pub mod progress;
pub mod sequencer;
pub mod session;
pub mod testing;
pub mod world;

// Primary public API
pub use continuation::{
    dialogue_from_reply, ContinuationAdapter, GeneratedReply, GeneratorError, TextGenerator,
};
pub use dialogue::{BustPair, Dialogue, DialogueOption, OptionTarget};
pub use inventory::{Inventory, Item, ItemKind};
pub use npc::Npc;
pub use objective::{
    Objective, ObjectiveCompleted, ObjectiveCondition, ObjectiveId, ObjectiveZone, StoryGraph,
};
pub use progress::PlayerProgress;
pub use sequencer::{DialogueSequencer, SequencerError, SequencerState, Selection, UiCommand};
pub use session::{SessionError, StoryConfig, StorySession};
pub use world::{AssetHandle, NpcId, StoryWorld, ZoneId};
