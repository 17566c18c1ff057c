//! Book specification.

use crate::CharacterSet;
use fabula_error::{BookError, BookErrorKind, FabulaResult};
use serde::{Deserialize, Serialize};

/// Everything needed to generate one book.
///
/// # Examples
///
/// ```
/// use fabula_book::{BookSpec, CharacterSet};
///
/// let spec = BookSpec::builder()
///     .title("Leo Finds a Friend".to_string())
///     .style("childrens_dreamy".to_string())
///     .pages(10u32)
///     .outline("Leo the lion cub explores the jungle and makes a new friend.".to_string())
///     .characters(CharacterSet::from_pairs([(
///         "Leo",
///         "A curious little lion cub with a small brown mane.",
///     )]))
///     .build()
///     .unwrap();
///
/// assert!(spec.validate().is_ok());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_builder::Builder,
    derive_getters::Getters,
)]
#[builder(setter(into))]
pub struct BookSpec {
    /// Book title (also names the output directory)
    title: String,
    /// Style catalog key
    style: String,
    /// Total number of pages
    pages: u32,
    /// Story outline or concept
    outline: String,
    /// Character roster; may be empty in quick mode
    #[builder(default)]
    characters: CharacterSet,
    /// Infer the roster from the outline instead of requiring one
    #[builder(default)]
    quick_mode: bool,
    /// Produce each page by editing the previous page's image
    #[builder(default)]
    consistency: bool,
}

impl BookSpec {
    /// Create a builder for a book specification.
    pub fn builder() -> BookSpecBuilder {
        BookSpecBuilder::default()
    }

    /// Validate the specification.
    ///
    /// # Errors
    ///
    /// Returns an error when the title or outline is empty, the page count
    /// is zero, or full mode has no characters.
    pub fn validate(&self) -> FabulaResult<()> {
        if self.title.trim().is_empty() {
            return Err(invalid("title cannot be empty"));
        }
        if self.outline.trim().is_empty() {
            return Err(invalid("outline cannot be empty"));
        }
        if self.pages == 0 {
            return Err(invalid("page count must be at least 1"));
        }
        if !self.quick_mode && self.characters.is_empty() {
            return Err(invalid(
                "full mode requires at least one character (or set quick_mode to infer them)",
            ));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> fabula_error::FabulaError {
    BookError::new(BookErrorKind::InvalidSpec(message.to_string())).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BookSpecBuilder {
        let mut builder = BookSpec::builder();
        builder
            .title("A Title")
            .style("childrens_dreamy")
            .pages(3u32)
            .outline("An outline.");
        builder
    }

    #[test]
    fn full_mode_requires_characters() {
        let spec = base().build().unwrap();
        assert!(spec.validate().is_err());

        let spec = base()
            .characters(CharacterSet::from_pairs([("Leo", "a cub")]))
            .build()
            .unwrap();
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn quick_mode_allows_empty_roster() {
        let spec = base().quick_mode(true).build().unwrap();
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn zero_pages_is_invalid() {
        let spec = base().pages(0u32).quick_mode(true).build().unwrap();
        assert!(spec.validate().is_err());
    }

    #[test]
    fn blank_outline_is_invalid() {
        let spec = base().outline("  ").quick_mode(true).build().unwrap();
        assert!(spec.validate().is_err());
    }
}
