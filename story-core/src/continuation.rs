//! AI dialogue continuation.
//!
//! Translates an external text-generation call into dialogue-shaped data.
//! The adapter is infallible from the sequencer's point of view: transport
//! errors, timeouts, and malformed responses all resolve to a fallback
//! message, so a conversation can always proceed to its end.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::dialogue::{Dialogue, DialogueOption};

/// Default persona prompt used when a dialogue carries no seed.
const DEFAULT_BASE_PROMPT: &str = "Converse with the player as if you're John Pork. \
John Pork is friendly until the player declines his call and then he becomes hostile. \
John Pork will ask the player whether they will answer or decline his call.";

/// Response-format instructions appended to every continuation prompt.
const PROMPT_RESTRICTIONS: &str = " Don't make the sentences too long and don't add any \
line breaks. Along with the response, also return three one word options for the player \
to choose from. in this JSON format: \
{ \"options\": [ { \"optionText\": \"...\" }, { \"optionText\": \"...\" }, { \"optionText\": \"...\" } ] }";

/// Message shown when generation fails outright.
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Failed to get a response.";

lazy_static::lazy_static! {
    /// Greedy match from the first `{` to the last `}`.
    static ref JSON_BLOCK: Regex = Regex::new(r"\{[\s\S]*\}").expect("valid regex");
}

/// Error from a text generator backend.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct GeneratorError(pub String);

/// A text-generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}

#[async_trait]
impl TextGenerator for gemini::Gemini {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        gemini::Gemini::generate(self, prompt)
            .await
            .map_err(|e| GeneratorError(e.to_string()))
    }
}

/// A parsed continuation: the NPC's line plus follow-up choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedReply {
    pub main_message: String,
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OptionsEnvelope {
    #[serde(default)]
    options: Vec<OptionEntry>,
}

#[derive(Debug, Deserialize)]
struct OptionEntry {
    #[serde(rename = "optionText")]
    option_text: String,
}

impl GeneratedReply {
    /// Extract `{ mainMessage, options[] }` from a raw model response.
    ///
    /// The options arrive as a JSON block (possibly inside a markdown code
    /// fence) embedded in free text; the block is located, stripped, and
    /// parsed, and the remaining text is the main message. Any parse
    /// failure degrades to "the whole raw text is the message, no options".
    pub fn parse(raw: &str) -> Self {
        let text = strip_code_fences(raw);

        let Some(found) = JSON_BLOCK.find(text) else {
            return Self {
                main_message: text.trim().to_string(),
                options: Vec::new(),
            };
        };

        match serde_json::from_str::<OptionsEnvelope>(found.as_str()) {
            Ok(envelope) => {
                let main_message = format!(
                    "{}{}",
                    &text[..found.start()],
                    &text[found.end()..]
                )
                .trim()
                .to_string();
                Self {
                    main_message,
                    options: envelope.options.into_iter().map(|o| o.option_text).collect(),
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "continuation JSON did not parse; using raw text");
                Self {
                    main_message: raw.trim().to_string(),
                    options: Vec::new(),
                }
            }
        }
    }
}

/// Strip a surrounding markdown code fence, if present.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "text", ...) on the opening fence line.
    match body.split_once('\n') {
        Some((_, after)) => after.trim(),
        None => body.trim(),
    }
}

/// The boundary component between the sequencer and a text generator.
pub struct ContinuationAdapter<G> {
    generator: G,
    base_prompt: Option<String>,
    fallback_message: String,
}

impl<G: TextGenerator> ContinuationAdapter<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            base_prompt: None,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }

    /// Replace the built-in persona prompt used when a dialogue has no seed.
    pub fn with_base_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.base_prompt = Some(prompt.into());
        self
    }

    /// Replace the message substituted when generation fails.
    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Request the NPC's next line after the player chose `prior_choice`.
    ///
    /// Never fails: transport and parse errors resolve to the fallback
    /// message with no options, so the caller's await always completes with
    /// something to show.
    pub async fn request_continuation(
        &self,
        prior_choice: &str,
        prompt_seed: Option<&str>,
    ) -> GeneratedReply {
        let seed = prompt_seed
            .filter(|s| !s.is_empty())
            .or(self.base_prompt.as_deref());
        let prompt = build_prompt(prior_choice, seed);

        match self.generator.generate(&prompt).await {
            Ok(raw) => GeneratedReply::parse(&raw),
            Err(e) => {
                tracing::warn!(error = %e, "text generation failed; using fallback message");
                GeneratedReply {
                    main_message: self.fallback_message.clone(),
                    options: Vec::new(),
                }
            }
        }
    }
}

fn build_prompt(prior_choice: &str, seed: Option<&str>) -> String {
    let base = seed.unwrap_or(DEFAULT_BASE_PROMPT);
    format!("{base}{PROMPT_RESTRICTIONS} The player chose: \"{prior_choice}\". Respond accordingly.")
}

/// Wrap a generated reply in a fresh, non-authored dialogue.
///
/// The reply's message becomes the single sentence; each reply option
/// becomes a generated-target option, so picking one triggers another
/// adapter call. The prompt seed is carried forward to keep the persona
/// stable across turns. A reply with no options yields an options-less
/// dialogue, which ends naturally on the next advance.
pub fn dialogue_from_reply(
    speaker: impl Into<String>,
    prompt_seed: Option<String>,
    reply: GeneratedReply,
) -> Arc<Dialogue> {
    let mut dialogue = Dialogue::new(speaker).with_sentence(reply.main_message);
    dialogue.prompt = prompt_seed;
    for text in reply.options {
        dialogue = dialogue.with_option(DialogueOption::generated(text));
    }
    Arc::new(dialogue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingGenerator, ScriptedGenerator};

    #[test]
    fn test_parse_message_with_options_block() {
        let raw = r#"John Pork taps the receiver impatiently. { "options": [ { "optionText": "Answer" }, { "optionText": "Decline" }, { "optionText": "Wait" } ] }"#;
        let reply = GeneratedReply::parse(raw);

        assert_eq!(reply.main_message, "John Pork taps the receiver impatiently.");
        assert_eq!(reply.options, ["Answer", "Decline", "Wait"]);
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\nThe line crackles. { \"options\": [ { \"optionText\": \"Hang up\" } ] }\n```";
        let reply = GeneratedReply::parse(raw);

        assert_eq!(reply.main_message, "The line crackles.");
        assert_eq!(reply.options, ["Hang up"]);
    }

    #[test]
    fn test_parse_malformed_json_degrades_to_raw_text() {
        let raw = "Something went sideways { not json at all";
        let reply = GeneratedReply::parse(raw);

        assert_eq!(reply.main_message, raw);
        assert!(reply.options.is_empty());
    }

    #[test]
    fn test_parse_plain_text_has_no_options() {
        let reply = GeneratedReply::parse("Just a line of dialogue.");
        assert_eq!(reply.main_message, "Just a line of dialogue.");
        assert!(reply.options.is_empty());
    }

    #[test]
    fn test_parse_broken_braces_degrades() {
        // A brace pair that is not the options envelope.
        let reply = GeneratedReply::parse("He mutters {unintelligibly} and waits.");
        assert_eq!(reply.main_message, "He mutters {unintelligibly} and waits.");
        assert!(reply.options.is_empty());
    }

    #[test]
    fn test_build_prompt_includes_choice_and_seed() {
        let prompt = build_prompt("Decline", Some("You are a lighthouse keeper."));
        assert!(prompt.starts_with("You are a lighthouse keeper."));
        assert!(prompt.contains("The player chose: \"Decline\""));
        assert!(prompt.contains("optionText"));
    }

    #[test]
    fn test_build_prompt_defaults_to_persona() {
        let prompt = build_prompt("Answer", None);
        assert!(prompt.contains("John Pork"));
    }

    #[tokio::test]
    async fn test_adapter_parses_scripted_reply() {
        let generator = ScriptedGenerator::new();
        generator.queue_reply(
            r#"Fine. { "options": [ { "optionText": "Leave" } ] }"#,
        );
        let adapter = ContinuationAdapter::new(generator);

        let reply = adapter.request_continuation("Answer", None).await;
        assert_eq!(reply.main_message, "Fine.");
        assert_eq!(reply.options, ["Leave"]);
    }

    #[tokio::test]
    async fn test_adapter_falls_back_on_error() {
        let adapter = ContinuationAdapter::new(FailingGenerator)
            .with_fallback_message("The line goes dead.");

        let reply = adapter.request_continuation("Answer", None).await;
        assert_eq!(reply.main_message, "The line goes dead.");
        assert!(reply.options.is_empty());
    }

    #[tokio::test]
    async fn test_adapter_prefers_dialogue_seed() {
        let generator = ScriptedGenerator::new();
        generator.queue_reply("Hm.");
        let adapter = ContinuationAdapter::new(generator.clone())
            .with_base_prompt("Session-level persona.");

        adapter
            .request_continuation("Hello", Some("Dialogue-level persona."))
            .await;
        let prompts = generator.prompts();
        assert!(prompts[0].starts_with("Dialogue-level persona."));
    }

    #[test]
    fn test_dialogue_from_reply() {
        let reply = GeneratedReply {
            main_message: "Who is this?".to_string(),
            options: vec!["Me".to_string(), "Nobody".to_string()],
        };
        let dialogue = dialogue_from_reply("John Pork", Some("seed".to_string()), reply);

        assert_eq!(dialogue.name, "John Pork");
        assert_eq!(dialogue.sentences, ["Who is this?"]);
        assert_eq!(dialogue.options.len(), 2);
        assert_eq!(dialogue.prompt.as_deref(), Some("seed"));
    }
}
