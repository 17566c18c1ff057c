//! Stage-1 page structures.

use crate::{StyleKind, extract_json, parse_json};
use fabula_error::{BookError, BookErrorKind, FabulaResult};
use serde::{Deserialize, Serialize};

/// One page's structure as produced by Stage 1.
///
/// Children's styles fill `page_text`; narrative styles fill `script_text`.
/// [`PageContent::parse`] enforces the field for the style in play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// Page number the model claims to describe (1-based)
    pub page_number: u32,
    /// Visual description of the scene for the illustrator
    pub scene_description: String,
    /// Story prose for children's styles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_text: Option<String>,
    /// Narration/dialogue script for narrative styles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_text: Option<String>,
}

impl PageContent {
    /// Parse and validate a Stage-1 response for the given page and style.
    ///
    /// The response may wrap its JSON in markdown fences or prose; it is
    /// extracted before parsing.
    ///
    /// # Errors
    ///
    /// Returns an error when no JSON is found, the JSON does not parse, the
    /// page number disagrees with the request, or the style's text field is
    /// missing.
    pub fn parse(response: &str, expected_page: u32, kind: StyleKind) -> FabulaResult<Self> {
        let json = extract_json(response)?;
        let content: Self = parse_json(&json)?;
        content.validate(expected_page, kind)?;
        Ok(content)
    }

    /// Validate shape against the requested page and style kind.
    pub fn validate(&self, expected_page: u32, kind: StyleKind) -> FabulaResult<()> {
        if self.page_number != expected_page {
            return Err(BookError::new(BookErrorKind::PageNumberMismatch {
                expected: expected_page,
                actual: self.page_number,
            })
            .into());
        }

        if self.scene_description.trim().is_empty() {
            return Err(BookError::new(BookErrorKind::PageShape {
                page: expected_page,
                message: "scene_description is empty".to_string(),
            })
            .into());
        }

        let field = kind.text_field();
        let present = match kind {
            StyleKind::Childrens => self.page_text.is_some(),
            StyleKind::Narrative => self.script_text.is_some(),
        };
        if !present {
            return Err(BookError::new(BookErrorKind::PageShape {
                page: expected_page,
                message: format!("missing '{field}'"),
            })
            .into());
        }

        Ok(())
    }

    /// The text for this page under the given style kind.
    pub fn text(&self, kind: StyleKind) -> &str {
        match kind {
            StyleKind::Childrens => self.page_text.as_deref().unwrap_or(""),
            StyleKind::Narrative => self.script_text.as_deref().unwrap_or(""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHILDRENS_PAGE: &str = r#"{
        "page_number": 2,
        "scene_description": "Leo peeks out from tall golden grass.",
        "page_text": "Leo crept through the grass, whiskers twitching."
    }"#;

    #[test]
    fn parses_a_childrens_page() {
        let page = PageContent::parse(CHILDRENS_PAGE, 2, StyleKind::Childrens).unwrap();
        assert_eq!(page.page_number, 2);
        assert!(page.text(StyleKind::Childrens).contains("whiskers"));
    }

    #[test]
    fn parses_from_fenced_response() {
        let response = format!("Here you go!\n```json\n{CHILDRENS_PAGE}\n```");
        let page = PageContent::parse(&response, 2, StyleKind::Childrens).unwrap();
        assert_eq!(page.page_number, 2);
    }

    #[test]
    fn rejects_page_number_mismatch() {
        let err = PageContent::parse(CHILDRENS_PAGE, 3, StyleKind::Childrens).unwrap_err();
        assert!(format!("{}", err).contains("page 3"));
    }

    #[test]
    fn childrens_style_requires_page_text() {
        let response = r#"{
            "page_number": 1,
            "scene_description": "A harbor at dawn.",
            "script_text": "NARRATOR: The harbor wakes."
        }"#;
        let err = PageContent::parse(response, 1, StyleKind::Childrens).unwrap_err();
        assert!(format!("{}", err).contains("page_text"));
    }

    #[test]
    fn narrative_style_requires_script_text() {
        let response = r#"{
            "page_number": 1,
            "scene_description": "A harbor at dawn.",
            "page_text": "The harbor woke slowly."
        }"#;
        assert!(PageContent::parse(response, 1, StyleKind::Narrative).is_err());
    }

    #[test]
    fn empty_scene_description_is_rejected() {
        let response = r#"{
            "page_number": 1,
            "scene_description": "  ",
            "page_text": "Text."
        }"#;
        assert!(PageContent::parse(response, 1, StyleKind::Childrens).is_err());
    }

    #[test]
    fn empty_text_is_allowed_but_present() {
        let response = r#"{
            "page_number": 1,
            "scene_description": "A harbor at dawn.",
            "page_text": ""
        }"#;
        let page = PageContent::parse(response, 1, StyleKind::Childrens).unwrap();
        assert_eq!(page.text(StyleKind::Childrens), "");
    }
}
