//! Request body for book generation.

use fabula_book::{BookSpec, CharacterSet};
use fabula_error::{FabulaResult, ServerError, ServerErrorKind};
use serde::{Deserialize, Serialize};

/// Parameters for one book generation run.
///
/// Field names are camelCase on the wire to match the web front end. In
/// full mode `characterDescriptions` carries a JSON object string mapping
/// character names to visual descriptions; quick mode infers the roster
/// from the outline instead.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookGenerationRequest {
    /// Book title
    pub book_title: String,
    /// Style catalog key
    pub selected_style: String,
    /// Total number of pages
    pub number_of_pages: u32,
    /// Infer characters from the outline
    pub quick_mode: bool,
    /// JSON object string of name -> description (full mode only)
    #[serde(default)]
    pub character_descriptions: Option<String>,
    /// Story outline or concept
    pub story_outline: String,
    /// Produce each page by editing the previous page's image
    pub use_experimental_consistency: bool,
}

impl BookGenerationRequest {
    /// Convert the wire request into a validated [`BookSpec`].
    ///
    /// # Errors
    ///
    /// Returns an error when full mode lacks character descriptions, the
    /// descriptions are not a JSON object of strings, or the resulting spec
    /// fails validation.
    pub fn to_spec(&self) -> FabulaResult<BookSpec> {
        let characters = if self.quick_mode {
            CharacterSet::new()
        } else {
            let raw = self.character_descriptions.as_deref().ok_or_else(|| {
                ServerError::new(ServerErrorKind::InvalidRequest(
                    "characterDescriptions is required in full mode".to_string(),
                ))
            })?;
            let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| {
                ServerError::new(ServerErrorKind::InvalidRequest(format!(
                    "characterDescriptions is not valid JSON: {e}"
                )))
            })?;
            CharacterSet::from_json_object(&value).map_err(|e| {
                ServerError::new(ServerErrorKind::InvalidRequest(format!(
                    "characterDescriptions has the wrong shape: {e}"
                )))
            })?
        };

        let spec = BookSpec::builder()
            .title(self.book_title.clone())
            .style(self.selected_style.clone())
            .pages(self.number_of_pages)
            .outline(self.story_outline.clone())
            .characters(characters)
            .quick_mode(self.quick_mode)
            .consistency(self.use_experimental_consistency)
            .build()
            .map_err(|e| {
                ServerError::new(ServerErrorKind::InvalidRequest(e.to_string()))
            })?;

        spec.validate()?;
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> BookGenerationRequest {
        serde_json::from_value(serde_json::json!({
            "bookTitle": "Leo Finds a Friend",
            "selectedStyle": "childrens_dreamy",
            "numberOfPages": 3,
            "quickMode": false,
            "characterDescriptions": "{\"Leo\": \"a lion cub\"}",
            "storyOutline": "Leo explores the jungle.",
            "useExperimentalConsistency": true
        }))
        .unwrap()
    }

    #[test]
    fn camel_case_wire_names_deserialize() {
        let req = request();
        assert_eq!(req.book_title, "Leo Finds a Friend");
        assert_eq!(req.number_of_pages, 3);
        assert!(req.use_experimental_consistency);
    }

    #[test]
    fn full_mode_parses_character_descriptions() {
        let spec = request().to_spec().unwrap();
        assert_eq!(spec.characters().len(), 1);
        assert!(*spec.consistency());
    }

    #[test]
    fn full_mode_without_characters_is_rejected() {
        let mut req = request();
        req.character_descriptions = None;
        let err = req.to_spec().unwrap_err();
        assert!(format!("{}", err).contains("characterDescriptions"));
    }

    #[test]
    fn malformed_character_json_is_rejected() {
        let mut req = request();
        req.character_descriptions = Some("not json".to_string());
        assert!(req.to_spec().is_err());
    }

    #[test]
    fn quick_mode_needs_no_characters() {
        let mut req = request();
        req.quick_mode = true;
        req.character_descriptions = None;
        let spec = req.to_spec().unwrap();
        assert!(spec.characters().is_empty());
        assert!(*spec.quick_mode());
    }
}
