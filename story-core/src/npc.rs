//! Per-NPC interaction state.
//!
//! Each NPC carries its authored default dialogue plus a mutable "current
//! dialogue" pointer that option selection may redirect (when the NPC allows
//! it), range and in-dialogue flags fed by the host's trigger callbacks, and
//! a short re-interact cooldown so a held interact key does not immediately
//! restart a conversation that just ended.

use std::sync::Arc;

use crate::dialogue::Dialogue;
use crate::world::NpcId;

/// Ticks before an NPC can be talked to again after a dialogue ends
/// (~0.2 s at a 60 Hz tick).
pub const REINTERACT_COOLDOWN_TICKS: u32 = 12;

/// An interactable character.
#[derive(Debug, Clone)]
pub struct Npc {
    id: NpcId,
    pub name: String,
    default_dialogue: Arc<Dialogue>,
    current_dialogue: Arc<Dialogue>,
    /// Whether options flagged `changes_future_dialogue` may redirect this
    /// NPC's current dialogue.
    pub allow_dialogue_changes: bool,
    has_interacted: bool,
    in_range: bool,
    in_dialogue: bool,
    reinteract_delay: u32,
    reinteract_cooldown: u32,
}

impl Npc {
    pub fn new(name: impl Into<String>, dialogue: Arc<Dialogue>) -> Self {
        Self {
            id: NpcId::new(),
            name: name.into(),
            default_dialogue: dialogue.clone(),
            current_dialogue: dialogue,
            allow_dialogue_changes: false,
            has_interacted: false,
            in_range: false,
            in_dialogue: false,
            reinteract_delay: REINTERACT_COOLDOWN_TICKS,
            reinteract_cooldown: 0,
        }
    }

    /// Permit options to redirect this NPC's future dialogue.
    pub fn with_dialogue_changes(mut self) -> Self {
        self.allow_dialogue_changes = true;
        self
    }

    /// Override the re-interact cooldown length in ticks.
    pub fn with_reinteract_delay(mut self, ticks: u32) -> Self {
        self.reinteract_delay = ticks;
        self
    }

    pub fn id(&self) -> NpcId {
        self.id
    }

    /// The dialogue this NPC will start on the next interaction.
    pub fn current_dialogue(&self) -> Arc<Dialogue> {
        self.current_dialogue.clone()
    }

    /// Redirect future interactions to a new dialogue.
    ///
    /// Ignored unless `allow_dialogue_changes` is set.
    pub fn update_dialogue(&mut self, new_dialogue: Arc<Dialogue>) {
        if self.allow_dialogue_changes {
            self.current_dialogue = new_dialogue;
            self.has_interacted = true;
        }
    }

    /// Restore the authored default dialogue.
    pub fn reset_dialogue(&mut self) {
        self.current_dialogue = self.default_dialogue.clone();
        self.has_interacted = false;
    }

    pub fn has_interacted(&self) -> bool {
        self.has_interacted
    }

    pub fn in_range(&self) -> bool {
        self.in_range
    }

    pub fn in_dialogue(&self) -> bool {
        self.in_dialogue
    }

    /// Whether an interact press should start a dialogue right now.
    pub fn can_interact(&self) -> bool {
        self.in_range && !self.in_dialogue && self.reinteract_cooldown == 0
    }

    /// The player entered this NPC's trigger zone.
    pub fn player_entered(&mut self) {
        self.in_range = true;
    }

    /// The player left this NPC's trigger zone. Clears dialogue state
    /// immediately; the session follows up by ending any active dialogue.
    pub fn player_exited(&mut self) {
        self.in_range = false;
        self.in_dialogue = false;
        self.reinteract_cooldown = 0;
    }

    /// A dialogue session owned by this NPC just started.
    pub fn on_dialogue_started(&mut self, dialogue: &Dialogue) {
        tracing::debug!(npc = %self.name, dialogue = %dialogue.name, "dialogue started");
        self.in_dialogue = true;
        self.reinteract_cooldown = 0;
    }

    /// A dialogue session owned by this NPC just ended. Starts the
    /// re-interact cooldown; `in_dialogue` clears once it elapses.
    pub fn on_dialogue_ended(&mut self, dialogue: Option<&Dialogue>) {
        tracing::debug!(
            npc = %self.name,
            dialogue = dialogue.map(|d| d.name.as_str()).unwrap_or("<none>"),
            "dialogue ended"
        );
        if self.in_dialogue {
            self.reinteract_cooldown = self.reinteract_delay.max(1);
        }
    }

    /// Advance the cooldown by one tick.
    pub fn tick(&mut self) {
        if self.reinteract_cooldown > 0 {
            self.reinteract_cooldown -= 1;
            if self.reinteract_cooldown == 0 {
                self.in_dialogue = false;
            }
        }
    }
}
