//! File-name sanitization for book titles and prompts.

use fabula_error::{FabulaResult, StorageError, StorageErrorKind};
use regex::Regex;
use std::sync::LazyLock;

static INVALID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s.,;!]+").unwrap());

/// Turn a title or prompt into a directory/file-safe name.
///
/// Characters invalid in file names are dropped, runs of whitespace and
/// sentence punctuation collapse to a single underscore, and the result is
/// capped at 100 characters.
///
/// # Errors
///
/// Returns an error when nothing usable remains after sanitization.
///
/// # Examples
///
/// ```
/// use fabula_storage::sanitize_name;
///
/// let name = sanitize_name("A Test Book, featuring Two Friends").unwrap();
/// assert_eq!(name, "A_Test_Book_featuring_Two_Friends");
/// ```
pub fn sanitize_name(name: &str) -> FabulaResult<String> {
    let stripped = INVALID.replace_all(name, "");
    let joined = SEPARATORS.replace_all(&stripped, "_");
    let capped: String = joined.chars().take(100).collect();
    let trimmed = capped.trim_matches('_').to_string();

    if trimmed.is_empty() {
        return Err(
            StorageError::new(StorageErrorKind::UnusableName(name.to_string())).into(),
        );
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_invalid_characters() {
        assert_eq!(sanitize_name("a<b>c:d").unwrap(), "abcd");
    }

    #[test]
    fn collapses_separator_runs() {
        assert_eq!(sanitize_name("one,  two.. three!").unwrap(), "one_two_three");
    }

    #[test]
    fn caps_length_at_100() {
        let long = "x".repeat(300);
        assert_eq!(sanitize_name(&long).unwrap().len(), 100);
    }

    #[test]
    fn rejects_names_with_nothing_left() {
        assert!(sanitize_name("???***").is_err());
        assert!(sanitize_name("   ").is_err());
    }
}
