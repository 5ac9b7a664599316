//! The dialogue sequencer.
//!
//! A single-session state machine that advances a conversation sentence by
//! sentence: Idle → Typing → AwaitingAdvance, repeating per sentence, then
//! either Options (player choices resolved against the inventory) or Ending.
//! The sequencer talks to the presentation layer exclusively through a
//! drained [`UiCommand`] queue and never blocks: typing is paced one
//! character per tick, and AI continuations are handed back to the caller as
//! a [`Selection::NeedsContinuation`] request.
//!
//! Exactly one session can be active. Ending is re-entrancy guarded, and the
//! "talked to" progress report happens at most once per session no matter
//! how many paths try to end it.

use std::collections::VecDeque;
use std::sync::Arc;

use thiserror::Error;

use crate::dialogue::{BustPair, Dialogue, DialogueOption, OptionTarget};
use crate::world::{NpcId, StoryWorld};

/// Errors from sequencer operations.
#[derive(Debug, Error)]
pub enum SequencerError {
    #[error("a dialogue is still ending")]
    EndingInProgress,

    #[error("no dialogue session is active")]
    NoActiveDialogue,

    #[error("options are not currently shown")]
    OptionsNotShown,

    #[error("no option at index {0}")]
    InvalidOption(usize),
}

/// Commands for the presentation layer, drained by the host each frame.
///
/// The presentation layer is purely reactive; it owns no dialogue state.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    SetOpen(bool),
    SetSpeaker(String),
    SetText(String),
    /// The option texts to offer; empty hides the panel.
    SetOptionsVisible(Vec<String>),
    SetBusts(Option<BustPair>),
    SetMovementLocked(bool),
}

/// Observable sequencer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Typing,
    AwaitingAdvance,
    Options,
}

/// Result of selecting a dialogue option.
#[derive(Debug)]
pub enum Selection {
    /// The next authored dialogue has started.
    Started,
    /// The option's follow-up must be generated. The caller resolves it
    /// through the continuation adapter and, if `epoch` still matches,
    /// starts the generated dialogue.
    NeedsContinuation {
        choice: String,
        speaker: String,
        prompt_seed: Option<String>,
        npc: Option<NpcId>,
        epoch: u64,
    },
}

/// Character-per-tick sentence reveal. Superseded wholesale whenever the
/// next sentence starts.
#[derive(Debug, Clone)]
struct Typewriter {
    chars: Vec<char>,
    shown: usize,
}

impl Typewriter {
    fn new(sentence: &str) -> Self {
        Self {
            chars: sentence.chars().collect(),
            shown: 0,
        }
    }

    /// Reveal one more character; `None` once the sentence is fully shown.
    fn tick(&mut self) -> Option<String> {
        if self.shown < self.chars.len() {
            self.shown += 1;
            Some(self.chars[..self.shown].iter().collect())
        } else {
            None
        }
    }
}

#[derive(Debug)]
struct ActiveSession {
    dialogue: Arc<Dialogue>,
    npc: Option<NpcId>,
    queue: VecDeque<String>,
    typing: Option<Typewriter>,
    /// The availability-filtered options once shown.
    shown_options: Option<Vec<DialogueOption>>,
    show_options_at_end: bool,
    talk_reported: bool,
}

/// The conversation state machine.
#[derive(Debug, Default)]
pub struct DialogueSequencer {
    session: Option<ActiveSession>,
    /// Dialogue name remembered even after the session is cleared.
    last_dialogue_name: Option<String>,
    /// Speaker name currently on screen.
    displayed_speaker: Option<String>,
    ending: bool,
    epoch: u64,
    commands: Vec<UiCommand>,
}

impl DialogueSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersede token for in-flight continuations. Bumped on every session
    /// start and end; a continuation carrying a stale epoch is discarded.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn state(&self) -> SequencerState {
        match &self.session {
            None => SequencerState::Idle,
            Some(s) if s.typing.is_some() => SequencerState::Typing,
            Some(s) if s.shown_options.is_some() => SequencerState::Options,
            Some(_) => SequencerState::AwaitingAdvance,
        }
    }

    /// The dialogue the active session is playing, if any.
    pub fn current_dialogue(&self) -> Option<&Arc<Dialogue>> {
        self.session.as_ref().map(|s| &s.dialogue)
    }

    /// Take the accumulated presentation commands.
    pub fn drain_commands(&mut self) -> Vec<UiCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Begin a session on `dialogue`, optionally owned by an NPC.
    ///
    /// Rejected while a previous session is mid-teardown. Starting over an
    /// active (non-ending) session replaces it; that is the option-selection
    /// path, and the replaced dialogue's name is not reported.
    pub fn start_dialogue(
        &mut self,
        dialogue: Arc<Dialogue>,
        npc: Option<NpcId>,
        world: &mut StoryWorld,
    ) -> Result<(), SequencerError> {
        if self.ending {
            return Err(SequencerError::EndingInProgress);
        }
        self.epoch += 1;
        self.last_dialogue_name = Some(dialogue.name.clone());
        self.displayed_speaker = Some(dialogue.name.clone());

        if let Some(id) = npc {
            match world.npcs.get_mut(&id) {
                Some(n) => n.on_dialogue_started(&dialogue),
                None => tracing::warn!(?id, "dialogue started for unknown NPC"),
            }
        }

        self.commands.push(UiCommand::SetOpen(true));
        self.commands.push(UiCommand::SetSpeaker(dialogue.name.clone()));
        if dialogue.show_busts {
            self.commands.push(UiCommand::SetBusts(dialogue.busts.clone()));
        }
        self.commands
            .push(UiCommand::SetMovementLocked(dialogue.lock_player_movement));

        let queue: VecDeque<String> = dialogue.sentences.iter().cloned().collect();
        self.session = Some(ActiveSession {
            show_options_at_end: dialogue.has_options(),
            dialogue,
            npc,
            queue,
            typing: None,
            shown_options: None,
            talk_reported: false,
        });

        // Display the first sentence immediately.
        self.advance(world);
        Ok(())
    }

    /// The external "next" signal.
    ///
    /// Queue non-empty: start typing the next sentence, superseding any
    /// in-flight reveal. Queue empty: show options if the dialogue has any,
    /// otherwise end the session.
    pub fn advance(&mut self, world: &mut StoryWorld) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("advance requested with no active dialogue");
            return;
        };

        if let Some(sentence) = session.queue.pop_front() {
            session.typing = Some(Typewriter::new(&sentence));
            self.commands.push(UiCommand::SetText(String::new()));
            return;
        }

        if session.show_options_at_end {
            let available: Vec<DialogueOption> = session
                .dialogue
                .available_options(&world.inventory)
                .into_iter()
                .cloned()
                .collect();
            let texts: Vec<String> = available.iter().map(|o| o.text.clone()).collect();
            tracing::debug!(count = texts.len(), "showing dialogue options");
            session.shown_options = Some(available);
            self.commands.push(UiCommand::SetOptionsVisible(texts));
            return;
        }

        self.end_dialogue(world);
    }

    /// Advance the typewriter by one character.
    pub fn tick(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(typing) = session.typing.as_mut() {
            match typing.tick() {
                Some(partial) => self.commands.push(UiCommand::SetText(partial)),
                None => session.typing = None,
            }
        }
    }

    /// Select one of the currently shown options by index into the
    /// availability-filtered list.
    pub fn select_option(
        &mut self,
        index: usize,
        world: &mut StoryWorld,
    ) -> Result<Selection, SequencerError> {
        let (option, npc, speaker, prompt_seed) = {
            let session = self
                .session
                .as_ref()
                .ok_or(SequencerError::NoActiveDialogue)?;
            let options = session
                .shown_options
                .as_ref()
                .ok_or(SequencerError::OptionsNotShown)?;
            let option = options
                .get(index)
                .cloned()
                .ok_or(SequencerError::InvalidOption(index))?;
            (
                option,
                session.npc,
                session.dialogue.name.clone(),
                session.dialogue.prompt.clone(),
            )
        };

        self.commands.push(UiCommand::SetOptionsVisible(Vec::new()));

        if option.consume_required_item {
            if let Some(name) = option.required_item.as_deref().filter(|n| !n.is_empty()) {
                world.inventory.remove_by_name(name);
            }
        }
        if option.consume_required_clue {
            if let Some(name) = option.required_clue.as_deref().filter(|n| !n.is_empty()) {
                world.inventory.remove_by_name(name);
            }
        }

        if option.changes_future_dialogue {
            if let (Some(id), Some(subsequent)) = (npc, option.subsequent_dialogue.clone()) {
                match world.npcs.get_mut(&id) {
                    // update_dialogue itself enforces allow_dialogue_changes.
                    Some(n) => n.update_dialogue(subsequent),
                    None => tracing::warn!(?id, "future-dialogue change for unknown NPC"),
                }
            }
        }

        match option.target {
            OptionTarget::Authored(next) => {
                self.start_dialogue(next, npc, world)?;
                Ok(Selection::Started)
            }
            OptionTarget::Generated => Ok(Selection::NeedsContinuation {
                choice: option.text,
                speaker,
                prompt_seed,
                npc,
                epoch: self.epoch,
            }),
        }
    }

    /// End the active session.
    ///
    /// Safe to call from multiple paths (natural end, zone exit, host
    /// teardown): double invocation is silently ignored, and the progress
    /// report fires at most once per session. The name reported is resolved
    /// by priority: ended-dialogue name, last-known dialogue name, displayed
    /// speaker, owning NPC's name.
    pub fn end_dialogue(&mut self, world: &mut StoryWorld) {
        if self.ending {
            return;
        }
        self.ending = true;

        let session = self.session.take();
        let npc_id = session.as_ref().and_then(|s| s.npc);
        let already_reported = session.as_ref().map(|s| s.talk_reported).unwrap_or(true);

        let name_to_report = session
            .as_ref()
            .map(|s| s.dialogue.name.clone())
            .filter(|n| !n.is_empty())
            .or_else(|| self.last_dialogue_name.clone().filter(|n| !n.is_empty()))
            .or_else(|| self.displayed_speaker.clone().filter(|n| !n.is_empty()))
            .or_else(|| {
                npc_id
                    .and_then(|id| world.npcs.get(&id))
                    .map(|n| n.name.clone())
            });

        if !already_reported {
            match name_to_report {
                Some(name) => world.progress.talk_to_npc(&name),
                None => {
                    tracing::warn!("could not determine dialogue or NPC name; skipping talk record")
                }
            }
        }

        self.commands.push(UiCommand::SetOpen(false));
        self.commands.push(UiCommand::SetOptionsVisible(Vec::new()));
        self.commands.push(UiCommand::SetMovementLocked(false));
        self.commands.push(UiCommand::SetBusts(None));

        if let Some(id) = npc_id {
            if let Some(npc) = world.npcs.get_mut(&id) {
                npc.on_dialogue_ended(session.as_ref().map(|s| s.dialogue.as_ref()));
            }
        }

        self.last_dialogue_name = None;
        self.epoch += 1;
        self.ending = false;
    }
}
