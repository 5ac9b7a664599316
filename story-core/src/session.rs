//! StorySession is the primary public API for running the narrative core.
//!
//! Wraps the world, the objective graph, the dialogue sequencer, and the AI
//! continuation adapter into one host-facing object. The host drives it with
//! its input signals (interact presses, trigger-zone callbacks, the "next"
//! key) and one `tick()` per frame, renders from the drained UI commands,
//! and broadcasts the objective events `tick()` returns.

use std::sync::Arc;

use thiserror::Error;

use gemini::Gemini;

use crate::continuation::{
    dialogue_from_reply, ContinuationAdapter, TextGenerator, DEFAULT_FALLBACK_MESSAGE,
};
use crate::dialogue::Dialogue;
use crate::inventory::Item;
use crate::objective::{ObjectiveCompleted, StoryGraph};
use crate::sequencer::{DialogueSequencer, Selection, SequencerError, SequencerState, UiCommand};
use crate::world::{NpcId, StoryWorld, ZoneId};

/// Errors from StorySession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No API key configured - set GEMINI_API_KEY environment variable")]
    NoApiKey,

    #[error("Sequencer error: {0}")]
    Sequencer(#[from] SequencerError),
}

/// Configuration for a story session.
#[derive(Debug, Clone)]
pub struct StoryConfig {
    /// Persona prompt used for AI continuations when a dialogue carries no
    /// seed of its own.
    pub base_prompt: Option<String>,

    /// Message substituted when text generation fails.
    pub fallback_message: String,

    /// Model override for the Gemini-backed constructor.
    pub model: Option<String>,
}

impl StoryConfig {
    pub fn new() -> Self {
        Self {
            base_prompt: None,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            model: None,
        }
    }

    pub fn with_base_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.base_prompt = Some(prompt.into());
        self
    }

    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A running narrative session.
pub struct StorySession<G: TextGenerator> {
    world: StoryWorld,
    graph: StoryGraph,
    sequencer: DialogueSequencer,
    adapter: ContinuationAdapter<G>,
}

impl StorySession<Gemini> {
    /// Create a Gemini-backed session from the GEMINI_API_KEY environment
    /// variable.
    pub fn from_env(world: StoryWorld, graph: StoryGraph) -> Result<Self, SessionError> {
        Self::from_env_with(StoryConfig::default(), world, graph)
    }

    /// Create a Gemini-backed session with explicit configuration.
    pub fn from_env_with(
        config: StoryConfig,
        world: StoryWorld,
        graph: StoryGraph,
    ) -> Result<Self, SessionError> {
        let mut client = Gemini::from_env().map_err(|_| SessionError::NoApiKey)?;
        if let Some(ref model) = config.model {
            client = client.with_model(model.clone());
        }
        Ok(Self::with_config(client, world, graph, config))
    }
}

impl<G: TextGenerator> StorySession<G> {
    /// Create a session over any text generator.
    pub fn new(generator: G, world: StoryWorld, graph: StoryGraph) -> Self {
        Self::with_config(generator, world, graph, StoryConfig::default())
    }

    pub fn with_config(
        generator: G,
        world: StoryWorld,
        mut graph: StoryGraph,
        config: StoryConfig,
    ) -> Self {
        graph.start();

        let mut adapter =
            ContinuationAdapter::new(generator).with_fallback_message(config.fallback_message);
        if let Some(prompt) = config.base_prompt {
            adapter = adapter.with_base_prompt(prompt);
        }

        Self {
            world,
            graph,
            sequencer: DialogueSequencer::new(),
            adapter,
        }
    }

    /// One game-loop tick: advance the typewriter, NPC cooldowns, and the
    /// objective graph. Returns the objective events fired this tick.
    pub fn tick(&mut self) -> Vec<ObjectiveCompleted> {
        self.sequencer.tick();
        for npc in self.world.npcs.values_mut() {
            npc.tick();
        }
        self.graph.tick(&self.world).into_iter().collect()
    }

    /// Interact-press on an NPC. Starts its current dialogue if the NPC is
    /// interactable and no dialogue is already running; returns whether a
    /// dialogue started. Unknown ids degrade to a logged no-op.
    pub fn interact(&mut self, npc: NpcId) -> Result<bool, SessionError> {
        if self.sequencer.is_active() {
            return Ok(false);
        }
        let Some(n) = self.world.npcs.get(&npc) else {
            tracing::warn!(?npc, "interact with unknown NPC");
            return Ok(false);
        };
        if !n.can_interact() {
            return Ok(false);
        }
        let dialogue = n.current_dialogue();
        self.sequencer
            .start_dialogue(dialogue, Some(npc), &mut self.world)?;
        Ok(true)
    }

    /// Start a dialogue not owned by an NPC (doors, signs, notes).
    pub fn start_dialogue(&mut self, dialogue: Arc<Dialogue>) -> Result<(), SessionError> {
        self.sequencer.start_dialogue(dialogue, None, &mut self.world)?;
        Ok(())
    }

    /// The external "next" signal.
    pub fn advance(&mut self) {
        self.sequencer.advance(&mut self.world);
    }

    /// Select one of the currently shown dialogue options.
    ///
    /// For generated options this awaits the continuation adapter; the rest
    /// of the session is untouched while the request is in flight, and a
    /// reply that arrives after the session was torn down is discarded.
    pub async fn select_option(&mut self, index: usize) -> Result<(), SessionError> {
        match self.sequencer.select_option(index, &mut self.world)? {
            Selection::Started => Ok(()),
            Selection::NeedsContinuation {
                choice,
                speaker,
                prompt_seed,
                npc,
                epoch,
            } => {
                let reply = self
                    .adapter
                    .request_continuation(&choice, prompt_seed.as_deref())
                    .await;

                if self.sequencer.epoch() != epoch {
                    tracing::debug!("session ended while awaiting continuation; reply dropped");
                    return Ok(());
                }

                let dialogue = dialogue_from_reply(speaker, prompt_seed, reply);
                self.sequencer.start_dialogue(dialogue, npc, &mut self.world)?;
                Ok(())
            }
        }
    }

    /// The player entered an NPC's trigger zone.
    pub fn npc_zone_entered(&mut self, npc: NpcId) {
        match self.world.npcs.get_mut(&npc) {
            Some(n) => n.player_entered(),
            None => tracing::warn!(?npc, "zone enter for unknown NPC"),
        }
    }

    /// The player left an NPC's trigger zone. Ends any active dialogue;
    /// calling this again with no dialogue running is harmless.
    pub fn npc_zone_exited(&mut self, npc: NpcId) {
        match self.world.npcs.get_mut(&npc) {
            Some(n) => n.player_exited(),
            None => tracing::warn!(?npc, "zone exit for unknown NPC"),
        }
        self.sequencer.end_dialogue(&mut self.world);
    }

    /// The player entered an objective zone (one-way latch).
    pub fn objective_zone_entered(&mut self, zone: ZoneId) {
        self.world.enter_zone(zone);
    }

    /// Pick up an item into the inventory.
    pub fn pick_up(&mut self, item: Item) {
        self.world.pick_up(item);
    }

    /// End the active dialogue, if any.
    pub fn end_dialogue(&mut self) {
        self.sequencer.end_dialogue(&mut self.world);
    }

    /// Explicitly complete the active objective (for `Custom`/`None`
    /// conditions).
    pub fn complete_objective(&mut self) -> Option<ObjectiveCompleted> {
        self.graph.complete_active()
    }

    /// Take the accumulated presentation commands.
    pub fn drain_ui_commands(&mut self) -> Vec<UiCommand> {
        self.sequencer.drain_commands()
    }

    pub fn dialogue_state(&self) -> SequencerState {
        self.sequencer.state()
    }

    pub fn dialogue_active(&self) -> bool {
        self.sequencer.is_active()
    }

    pub fn world(&self) -> &StoryWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut StoryWorld {
        &mut self.world
    }

    pub fn graph(&self) -> &StoryGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut StoryGraph {
        &mut self.graph
    }

    pub fn sequencer(&self) -> &DialogueSequencer {
        &self.sequencer
    }
}
