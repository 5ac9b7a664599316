//! Authored dialogue data.
//!
//! A [`Dialogue`] is an immutable branching script node: a speaker name, a
//! run of sentences, and optionally a set of player choices. Dialogues are
//! shared via `Arc` so several options and NPCs can point at the same node.
//! AI continuation builds transient dialogues at runtime from the same type;
//! those are never authored and never persisted.

use std::sync::Arc;

use crate::inventory::Inventory;
use crate::world::AssetHandle;

/// A pair of character portraits shown during a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BustPair {
    pub player: AssetHandle,
    pub speaker: AssetHandle,
}

/// One dialogue node.
///
/// `name` doubles as the NPC-session key and the quest-completion key: it is
/// the name reported to the progress tracker when the conversation ends.
#[derive(Debug, Clone)]
pub struct Dialogue {
    pub name: String,
    pub sentences: Vec<String>,
    pub lock_player_movement: bool,
    pub options: Vec<DialogueOption>,
    pub show_busts: bool,
    pub busts: Option<BustPair>,
    /// Seed prompt for AI continuation. Carried into generated follow-ups.
    pub prompt: Option<String>,
}

impl Dialogue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sentences: Vec::new(),
            lock_player_movement: false,
            options: Vec::new(),
            show_busts: false,
            busts: None,
            prompt: None,
        }
    }

    pub fn with_sentence(mut self, sentence: impl Into<String>) -> Self {
        self.sentences.push(sentence.into());
        self
    }

    pub fn with_sentences<I, S>(mut self, sentences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sentences.extend(sentences.into_iter().map(Into::into));
        self
    }

    /// Lock player movement for the duration of this dialogue.
    pub fn lock_movement(mut self) -> Self {
        self.lock_player_movement = true;
        self
    }

    pub fn with_option(mut self, option: DialogueOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_busts(mut self, player: AssetHandle, speaker: AssetHandle) -> Self {
        self.show_busts = true;
        self.busts = Some(BustPair { player, speaker });
        self
    }

    /// Set the AI continuation seed prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    /// Options available given the current inventory, in authored order.
    ///
    /// Deterministic for a given inventory snapshot.
    pub fn available_options<'a>(&'a self, inventory: &Inventory) -> Vec<&'a DialogueOption> {
        self.options
            .iter()
            .filter(|o| o.is_available(inventory))
            .collect()
    }
}

/// Where selecting an option leads.
///
/// Dynamic AI continuation is an explicit opt-in: an option either points at
/// an authored dialogue or declares that its follow-up is generated. A
/// missing target is unrepresentable, so "author forgot to wire the next
/// dialogue" cannot be confused with "this branch is AI-driven".
#[derive(Debug, Clone)]
pub enum OptionTarget {
    Authored(Arc<Dialogue>),
    Generated,
}

/// A selectable player choice within a dialogue.
#[derive(Debug, Clone)]
pub struct DialogueOption {
    pub text: String,
    pub target: OptionTarget,
    /// Item that must currently be held for this option to appear.
    pub required_item: Option<String>,
    /// Clue that must currently be held for this option to appear.
    pub required_clue: Option<String>,
    pub consume_required_item: bool,
    pub consume_required_clue: bool,
    /// If set (and the NPC permits it), selecting this option changes the
    /// NPC's dialogue for future interactions to `subsequent_dialogue`.
    pub changes_future_dialogue: bool,
    pub subsequent_dialogue: Option<Arc<Dialogue>>,
}

impl DialogueOption {
    /// An option leading to an authored dialogue.
    pub fn to(text: impl Into<String>, next: Arc<Dialogue>) -> Self {
        Self {
            text: text.into(),
            target: OptionTarget::Authored(next),
            required_item: None,
            required_clue: None,
            consume_required_item: false,
            consume_required_clue: false,
            changes_future_dialogue: false,
            subsequent_dialogue: None,
        }
    }

    /// An option whose follow-up is AI generated.
    pub fn generated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            target: OptionTarget::Generated,
            required_item: None,
            required_clue: None,
            consume_required_item: false,
            consume_required_clue: false,
            changes_future_dialogue: false,
            subsequent_dialogue: None,
        }
    }

    pub fn requires_item(mut self, name: impl Into<String>) -> Self {
        self.required_item = Some(name.into());
        self
    }

    pub fn requires_clue(mut self, name: impl Into<String>) -> Self {
        self.required_clue = Some(name.into());
        self
    }

    /// Consume the required item when this option is selected.
    pub fn consuming_item(mut self) -> Self {
        self.consume_required_item = true;
        self
    }

    /// Consume the required clue when this option is selected.
    pub fn consuming_clue(mut self) -> Self {
        self.consume_required_clue = true;
        self
    }

    /// After this option is chosen, the NPC's stored dialogue becomes
    /// `subsequent` for future interactions (if the NPC allows changes).
    pub fn changing_future_dialogue(mut self, subsequent: Arc<Dialogue>) -> Self {
        self.changes_future_dialogue = true;
        self.subsequent_dialogue = Some(subsequent);
        self
    }

    /// Availability against the current inventory: each requirement is
    /// either absent (blank) or currently held.
    pub fn is_available(&self, inventory: &Inventory) -> bool {
        let has_item = self
            .required_item
            .as_deref()
            .map_or(true, |name| name.is_empty() || inventory.has(name));
        let has_clue = self
            .required_clue
            .as_deref()
            .map_or(true, |name| name.is_empty() || inventory.has(name));
        has_item && has_clue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::Item;
    use crate::progress::PlayerProgress;

    fn end_node() -> Arc<Dialogue> {
        Arc::new(Dialogue::new("Goodbye").with_sentence("See you around."))
    }

    #[test]
    fn test_builder_shape() {
        let d = Dialogue::new("Marla")
            .with_sentence("You again?")
            .with_sentence("Make it quick.")
            .lock_movement()
            .with_prompt("You are Marla, a tired dockworker.");

        assert_eq!(d.name, "Marla");
        assert_eq!(d.sentences.len(), 2);
        assert!(d.lock_player_movement);
        assert!(d.prompt.is_some());
        assert!(!d.has_options());
    }

    #[test]
    fn test_option_without_requirements_is_available() {
        let option = DialogueOption::to("Hello", end_node());
        assert!(option.is_available(&Inventory::new()));
    }

    #[test]
    fn test_option_requires_held_item() {
        let mut inventory = Inventory::new();
        let mut progress = PlayerProgress::new();
        let option = DialogueOption::to("Unlock it", end_node()).requires_item("Brass Key");

        assert!(!option.is_available(&inventory));

        inventory.add(Item::new("Brass Key"), &mut progress);
        assert!(option.is_available(&inventory));

        // Consumption semantics read the inventory, not the progress log.
        inventory.remove_by_name("Brass Key");
        assert!(!option.is_available(&inventory));
    }

    #[test]
    fn test_blank_requirement_means_none() {
        let option = DialogueOption::to("Hello", end_node()).requires_item("");
        assert!(option.is_available(&Inventory::new()));
    }

    #[test]
    fn test_available_options_filter_is_deterministic() {
        let mut inventory = Inventory::new();
        let mut progress = PlayerProgress::new();
        inventory.add(Item::clue("Torn Note", "the alley"), &mut progress);

        let dialogue = Dialogue::new("Marla")
            .with_sentence("Well?")
            .with_option(DialogueOption::to("Just passing by", end_node()))
            .with_option(
                DialogueOption::to("About this note...", end_node()).requires_clue("Torn Note"),
            )
            .with_option(
                DialogueOption::to("Open the safe", end_node()).requires_item("Safe Key"),
            );

        let available = dialogue.available_options(&inventory);
        let texts: Vec<_> = available.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts, ["Just passing by", "About this note..."]);

        // Same snapshot, same answer.
        let again: Vec<_> = dialogue
            .available_options(&inventory)
            .iter()
            .map(|o| o.text.as_str())
            .collect();
        assert_eq!(again, texts);
    }

    #[test]
    fn test_generated_option_target() {
        let option = DialogueOption::generated("Answer the call");
        assert!(matches!(option.target, OptionTarget::Generated));
    }
}
