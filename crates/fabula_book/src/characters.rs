//! Character roster handling and inference.

use crate::{PromptLibrary, extract_json, parse_json, render_template};
use fabula_core::{GenerateRequest, Message, Output, Role};
use fabula_error::{BookError, BookErrorKind, FabulaResult};
use fabula_interface::TextDriver;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// One character: a name and a visual description for the illustrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Character name as it appears in scene descriptions
    pub name: String,
    /// Visual description (appearance, clothing, notable features)
    pub description: String,
}

/// An ordered character roster.
///
/// Order is preserved so prompts list characters the way the author entered
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharacterSet(Vec<Character>);

impl CharacterSet {
    /// Empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from (name, description) pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(name, description)| Character {
                    name: name.into(),
                    description: description.into(),
                })
                .collect(),
        )
    }

    /// Parse a roster from a JSON object mapping names to descriptions.
    ///
    /// # Errors
    ///
    /// Returns an error when the value is not an object or any value is not
    /// a string.
    pub fn from_json_object(value: &serde_json::Value) -> FabulaResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            BookError::new(BookErrorKind::CharacterShape(
                "expected a JSON object mapping names to descriptions".to_string(),
            ))
        })?;

        let mut characters = Vec::with_capacity(object.len());
        for (name, description) in object {
            let description = description.as_str().ok_or_else(|| {
                BookError::new(BookErrorKind::CharacterShape(format!(
                    "description for '{name}' is not a string"
                )))
            })?;
            characters.push(Character {
                name: name.clone(),
                description: description.to_string(),
            });
        }
        Ok(Self(characters))
    }

    /// Add a character.
    pub fn push(&mut self, name: impl Into<String>, description: impl Into<String>) {
        self.0.push(Character {
            name: name.into(),
            description: description.into(),
        });
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of characters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate the roster in order.
    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.0.iter()
    }

    /// Characters whose names occur (case-insensitively) in the scene text.
    pub fn mentioned_in(&self, scene: &str) -> CharacterSet {
        let scene_lower = scene.to_lowercase();
        Self(
            self.0
                .iter()
                .filter(|c| scene_lower.contains(&c.name.to_lowercase()))
                .cloned()
                .collect(),
        )
    }

    /// `- Name: description` lines for image prompts.
    pub fn details_block(&self) -> String {
        self.0
            .iter()
            .map(|c| format!("- {}: {}", c.name, c.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `- Name` lines for consistency-mode prompts, where the edited image
    /// already carries appearance.
    pub fn names_block(&self) -> String {
        self.0
            .iter()
            .map(|c| format!("- {}", c.name))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Pretty-printed JSON object form for Stage-1 prompts.
    pub fn to_pretty_json(&self) -> String {
        let mut map = serde_json::Map::new();
        for c in &self.0 {
            map.insert(
                c.name.clone(),
                serde_json::Value::String(c.description.clone()),
            );
        }
        serde_json::to_string_pretty(&serde_json::Value::Object(map))
            .unwrap_or_else(|_| "{}".to_string())
    }
}

/// Infer 2-4 characters with visual descriptions from a story outline.
///
/// Used in quick mode, where the caller supplies only a concept and the
/// roster comes from a Chat Completions call.
///
/// # Errors
///
/// Returns an error if the call fails, the response is not a JSON object of
/// string descriptions, or no characters come back.
#[tracing::instrument(skip(driver, prompts, outline), fields(outline_len = outline.len()))]
pub async fn infer_characters<T: TextDriver>(
    driver: &T,
    prompts: &PromptLibrary,
    outline: &str,
    max_tokens: u32,
) -> FabulaResult<CharacterSet> {
    let pair = prompts.character_inference();
    let vars = HashMap::from([("story_concept", outline)]);
    let user_prompt = render_template("character_inference", pair.user_template(), &vars)?;

    let request = GenerateRequest::builder()
        .messages(vec![
            Message::text(Role::System, pair.system_message().clone()),
            Message::text(Role::User, user_prompt),
        ])
        .max_tokens(Some(max_tokens))
        .json(true)
        .build()
        .map_err(|e| {
            BookError::new(BookErrorKind::CharacterShape(format!(
                "Failed to build request: {e}"
            )))
        })?;

    debug!("Requesting character inference");
    let response = driver.generate(&request).await?;
    let text = first_text(&response.outputs)?;

    let json = extract_json(&text)?;
    let value: serde_json::Value = parse_json(&json)?;
    let characters = CharacterSet::from_json_object(&value)?;

    if characters.is_empty() {
        warn!("Character inference returned an empty roster");
        return Err(BookError::new(BookErrorKind::NoCharactersInferred).into());
    }

    info!(count = characters.len(), "Inferred characters");
    Ok(characters)
}

/// First text output of a response.
pub(crate) fn first_text(outputs: &[Output]) -> FabulaResult<String> {
    outputs
        .iter()
        .find_map(|output| match output {
            Output::Text(text) => Some(text.clone()),
            _ => None,
        })
        .ok_or_else(|| {
            fabula_error::BackendError::new("response contained no text output").into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roster() -> CharacterSet {
        CharacterSet::from_pairs([
            ("Leo", "A curious little lion cub with a small brown mane."),
            ("Maya", "A swift swallow with ink-blue wings."),
        ])
    }

    #[test]
    fn details_block_lists_name_and_description() {
        let block = roster().details_block();
        assert_eq!(
            block,
            "- Leo: A curious little lion cub with a small brown mane.\n- Maya: A swift swallow with ink-blue wings."
        );
    }

    #[test]
    fn names_block_omits_descriptions() {
        assert_eq!(roster().names_block(), "- Leo\n- Maya");
    }

    #[test]
    fn mentioned_in_matches_case_insensitively() {
        let mentioned = roster().mentioned_in("LEO naps under a baobab tree.");
        assert_eq!(mentioned.len(), 1);
        assert_eq!(mentioned.iter().next().unwrap().name, "Leo");
    }

    #[test]
    fn mentioned_in_can_be_empty() {
        assert!(roster().mentioned_in("An empty meadow.").is_empty());
    }

    #[test]
    fn from_json_object_accepts_string_map() {
        let value = json!({"Leo": "a lion cub", "Maya": "a swallow"});
        let set = CharacterSet::from_json_object(&value).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn from_json_object_rejects_non_string_values() {
        let value = json!({"Leo": {"age": 3}});
        assert!(CharacterSet::from_json_object(&value).is_err());
    }

    #[test]
    fn from_json_object_rejects_non_objects() {
        assert!(CharacterSet::from_json_object(&json!(["Leo"])).is_err());
    }

    #[test]
    fn pretty_json_is_an_object_of_strings() {
        let json = roster().to_pretty_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.is_object());
        assert_eq!(value["Leo"], "A curious little lion cub with a small brown mane.");
    }
}
