//! Testing utilities for the narrative core.
//!
//! This module provides tools for integration testing:
//! - `ScriptedGenerator` / `FailingGenerator` for deterministic testing
//!   without API calls
//! - `StoryHarness` for scripted game scenarios
//! - Assertion helpers for verifying progress and objective state

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::continuation::{GeneratorError, TextGenerator};
use crate::dialogue::Dialogue;
use crate::npc::Npc;
use crate::objective::StoryGraph;
use crate::sequencer::UiCommand;
use crate::session::{StoryConfig, StorySession};
use crate::world::{NpcId, StoryWorld};

/// A text generator that returns queued raw replies in order.
///
/// Clones share the same queues, so a handle kept outside the session can
/// keep feeding it. An empty queue yields an error, which the adapter turns
/// into its fallback message.
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    replies: Arc<Mutex<VecDeque<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw reply to return on a future generate call.
    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.replies
            .lock()
            .expect("reply queue poisoned")
            .push_back(reply.into());
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log poisoned").clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        self.prompts
            .lock()
            .expect("prompt log poisoned")
            .push(prompt.to_string());
        self.replies
            .lock()
            .expect("reply queue poisoned")
            .pop_front()
            .ok_or_else(|| GeneratorError("no scripted reply queued".to_string()))
    }
}

/// A text generator that always fails, for exercising fallback paths.
#[derive(Clone, Copy, Default)]
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GeneratorError> {
        Err(GeneratorError("scripted network failure".to_string()))
    }
}

/// Test harness for running story scenarios against a scripted generator.
pub struct StoryHarness {
    /// The session under test.
    pub session: StorySession<ScriptedGenerator>,
    /// Shared handle to the session's generator.
    pub generator: ScriptedGenerator,
}

impl StoryHarness {
    /// Create a harness with an empty world and no objectives.
    pub fn new() -> Self {
        Self::with_graph(StoryGraph::new())
    }

    /// Create a harness over an authored objective graph.
    pub fn with_graph(graph: StoryGraph) -> Self {
        let generator = ScriptedGenerator::new();
        let session = StorySession::with_config(
            generator.clone(),
            StoryWorld::new(),
            graph,
            StoryConfig::default(),
        );
        Self { session, generator }
    }

    /// Register an NPC speaking the given dialogue.
    pub fn add_npc(&mut self, npc: Npc) -> NpcId {
        self.session.world_mut().add_npc(npc)
    }

    /// Walk up to an NPC and press interact.
    pub fn talk_to(&mut self, npc: NpcId) -> bool {
        self.session.npc_zone_entered(npc);
        self.session.interact(npc).expect("interact should not fail")
    }

    /// Start a dialogue directly, without an owning NPC.
    pub fn start_dialogue(&mut self, dialogue: Dialogue) {
        self.session
            .start_dialogue(Arc::new(dialogue))
            .expect("start should not fail");
    }

    /// Press "next" the given number of times.
    pub fn advance_times(&mut self, times: usize) {
        for _ in 0..times {
            self.session.advance();
        }
    }

    /// Run the given number of game-loop ticks, collecting objective events.
    pub fn tick_times(&mut self, times: usize) -> Vec<crate::objective::ObjectiveCompleted> {
        let mut events = Vec::new();
        for _ in 0..times {
            events.extend(self.session.tick());
        }
        events
    }

    /// Drain accumulated UI commands.
    pub fn commands(&mut self) -> Vec<UiCommand> {
        self.session.drain_ui_commands()
    }

    /// The option texts most recently sent to the presentation layer, if
    /// any options command was emitted.
    pub fn last_shown_options(&mut self) -> Option<Vec<String>> {
        self.commands().into_iter().rev().find_map(|c| match c {
            UiCommand::SetOptionsVisible(texts) => Some(texts),
            _ => None,
        })
    }
}

impl Default for StoryHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the player has talked to the named NPC.
#[track_caller]
pub fn assert_talked_to(harness: &StoryHarness, name: &str) {
    assert!(
        harness.session.world().progress.has_talked_to(name),
        "Expected to have talked to '{name}'"
    );
}

/// Assert the player has NOT talked to the named NPC.
#[track_caller]
pub fn assert_not_talked_to(harness: &StoryHarness, name: &str) {
    assert!(
        !harness.session.world().progress.has_talked_to(name),
        "Expected to NOT have talked to '{name}'"
    );
}

/// Assert the named item is currently held.
#[track_caller]
pub fn assert_holding(harness: &StoryHarness, name: &str) {
    assert!(
        harness.session.world().inventory.has(name),
        "Expected to be holding '{name}'"
    );
}

/// Assert the named item is not currently held.
#[track_caller]
pub fn assert_not_holding(harness: &StoryHarness, name: &str) {
    assert!(
        !harness.session.world().inventory.has(name),
        "Expected to NOT be holding '{name}'"
    );
}

/// Assert the active objective has the given title.
#[track_caller]
pub fn assert_objective_active(harness: &StoryHarness, title: &str) {
    assert_eq!(
        harness.session.graph().active_title(),
        Some(title),
        "Expected objective '{title}' to be active"
    );
}
