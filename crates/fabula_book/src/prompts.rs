//! Prompt library: templates and the style catalog.
//!
//! Prompts live in TOML so a deployment can reword everything without
//! recompiling. A bundled default library ships with the crate; a user file
//! replaces it wholesale. Templates use `{name}` placeholders; rendering
//! with an unbound placeholder is an error, braces that do not form a
//! placeholder pass through untouched (so JSON examples inside prompts are
//! fine).

use fabula_error::{BookError, BookErrorKind, FabulaResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").unwrap());

/// Which Stage-1 prompt a style uses, and which text field pages carry.
///
/// Children's styles produce `page_text` (story prose on the page);
/// narrative styles produce `script_text` (narration and dialogue).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StyleKind {
    /// Picture-book prose pages
    Childrens,
    /// Script-style narrative pages
    Narrative,
}

impl StyleKind {
    /// Name of the text field Stage-1 output must carry for this kind.
    pub fn text_field(&self) -> &'static str {
        match self {
            StyleKind::Childrens => "page_text",
            StyleKind::Narrative => "script_text",
        }
    }
}

/// A system message plus a user prompt template.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, derive_getters::Getters)]
pub struct PromptPair {
    /// System message establishing the model's role
    system_message: String,
    /// User prompt template with `{name}` placeholders
    user_template: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
struct CoverPrompt {
    template: String,
}

/// One entry of the style catalog.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, derive_getters::Getters)]
pub struct StyleConfig {
    /// Human-readable description, also fed to the cover prompt
    description: String,
    /// Which Stage-1 prompt and text field this style uses
    kind: StyleKind,
    /// Stage-2 generation template
    template: String,
    /// Stage-2 edit template for consistency mode; the generation template
    /// is used when absent
    edit_template: Option<String>,
}

/// The full prompt library.
///
/// # Examples
///
/// ```
/// use fabula_book::PromptLibrary;
///
/// let library = PromptLibrary::bundled().unwrap();
/// assert!(library.style("childrens_dreamy").is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PromptLibrary {
    stage1: HashMap<StyleKind, PromptPair>,
    cover: CoverPrompt,
    character_inference: PromptPair,
    styles: BTreeMap<String, StyleConfig>,
}

impl PromptLibrary {
    /// Load the prompt library bundled with the crate.
    pub fn bundled() -> FabulaResult<Self> {
        const DEFAULT_PROMPTS: &str = include_str!("../resources/prompts.toml");
        DEFAULT_PROMPTS.parse()
    }

    /// Load a prompt library from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is invalid, or
    /// validation fails.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file<P: AsRef<Path>>(path: P) -> FabulaResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| BookError::new(BookErrorKind::PromptsRead(e.to_string())))?;
        content.parse()
    }

    /// Validates the library.
    ///
    /// Ensures:
    /// - The style catalog is not empty
    /// - Every template is non-empty
    /// - A Stage-1 prompt exists for every kind the catalog uses
    pub fn validate(&self) -> FabulaResult<()> {
        if self.styles.is_empty() {
            return Err(BookError::new(BookErrorKind::EmptyStyleCatalog).into());
        }

        if self.cover.template.trim().is_empty() {
            return Err(BookError::new(BookErrorKind::EmptyTemplate("cover".to_string())).into());
        }

        for (key, style) in &self.styles {
            if style.template.trim().is_empty() {
                return Err(BookError::new(BookErrorKind::EmptyTemplate(key.clone())).into());
            }
            if let Some(edit) = &style.edit_template
                && edit.trim().is_empty()
            {
                return Err(BookError::new(BookErrorKind::EmptyTemplate(format!(
                    "{key} (edit)"
                )))
                .into());
            }
            if !self.stage1.contains_key(&style.kind) {
                return Err(BookError::new(BookErrorKind::MissingPagePrompt(
                    style.kind.to_string(),
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Look up a style by catalog key.
    pub fn style(&self, key: &str) -> FabulaResult<&StyleConfig> {
        self.styles
            .get(key)
            .ok_or_else(|| BookError::new(BookErrorKind::UnknownStyle(key.to_string())).into())
    }

    /// Iterate the style catalog in key order.
    pub fn styles(&self) -> impl Iterator<Item = (&str, &StyleConfig)> {
        self.styles.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The Stage-1 prompt pair for a style kind.
    pub fn stage1(&self, kind: StyleKind) -> FabulaResult<&PromptPair> {
        self.stage1
            .get(&kind)
            .ok_or_else(|| BookError::new(BookErrorKind::MissingPagePrompt(kind.to_string())).into())
    }

    /// The cover image template.
    pub fn cover_template(&self) -> &str {
        &self.cover.template
    }

    /// The character-inference prompt pair.
    pub fn character_inference(&self) -> &PromptPair {
        &self.character_inference
    }
}

impl FromStr for PromptLibrary {
    type Err = fabula_error::FabulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let library: Self = toml::from_str(s)
            .map_err(|e| BookError::new(BookErrorKind::PromptsParse(e.to_string())))?;
        library.validate()?;
        Ok(library)
    }
}

/// Render a template, substituting every `{name}` placeholder.
///
/// # Errors
///
/// Returns an error naming the first placeholder with no bound value.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use fabula_book::render_template;
///
/// let vars = HashMap::from([("title", "The Harbor")]);
/// let out = render_template("cover", "Cover for \"{title}\"", &vars).unwrap();
/// assert_eq!(out, "Cover for \"The Harbor\"");
/// ```
pub fn render_template(
    name: &str,
    template: &str,
    vars: &HashMap<&str, &str>,
) -> FabulaResult<String> {
    let mut unbound: Option<String> = None;

    let rendered = PLACEHOLDER.replace_all(template, |caps: &regex::Captures<'_>| {
        let key = &caps[1];
        match vars.get(key) {
            Some(value) => (*value).to_string(),
            None => {
                if unbound.is_none() {
                    unbound = Some(key.to_string());
                }
                caps[0].to_string()
            }
        }
    });

    if let Some(placeholder) = unbound {
        return Err(BookError::new(BookErrorKind::UnboundPlaceholder {
            template: name.to_string(),
            placeholder,
        })
        .into());
    }

    Ok(rendered.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_all_placeholders() {
        let vars = HashMap::from([("scene_description", "a meadow"), ("page_text", "Hello.")]);
        let out = render_template("t", "Scene: {scene_description}\nText: {page_text}", &vars)
            .unwrap();
        assert_eq!(out, "Scene: a meadow\nText: Hello.");
    }

    #[test]
    fn render_errors_on_unbound_placeholder() {
        let vars = HashMap::new();
        let err = render_template("t", "Scene: {scene_description}", &vars).unwrap_err();
        assert!(format!("{}", err).contains("scene_description"));
    }

    #[test]
    fn non_placeholder_braces_pass_through() {
        let vars = HashMap::from([("page_text", "Hi")]);
        let out = render_template(
            "t",
            "Example: {\"page_number\": 1}. Text: {page_text}",
            &vars,
        )
        .unwrap();
        assert!(out.contains("{\"page_number\": 1}"));
        assert!(out.contains("Text: Hi"));
    }
}
