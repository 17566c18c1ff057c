//! Response bodies.

use fabula_interface::BookExecution;
use serde::{Deserialize, Serialize};

/// Summary returned after a generation run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookGenerationResponse {
    /// Human-readable outcome line
    pub message: String,
    /// Directory the book was written to
    pub book_dir: String,
    /// Pages whose image was generated and written
    pub pages_completed: usize,
    /// Pages that recorded at least one error
    pub pages_with_errors: usize,
    /// Whether a cover was written
    pub cover_generated: bool,
    /// Whether every page completed cleanly
    pub all_successful: bool,
}

impl From<&BookExecution> for BookGenerationResponse {
    fn from(execution: &BookExecution) -> Self {
        let message = if execution.all_successful {
            format!("Book '{}' generated successfully.", execution.title)
        } else {
            format!(
                "Book '{}' generated with errors; see the book directory and logs.",
                execution.title
            )
        };
        Self {
            message,
            book_dir: execution.book_dir.display().to_string(),
            pages_completed: execution.pages_completed(),
            pages_with_errors: execution.pages_with_errors(),
            cover_generated: execution.cover_path.is_some(),
            all_successful: execution.all_successful,
        }
    }
}

/// Error body for failed requests.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ErrorResponse {
    /// What went wrong
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabula_interface::{PageRecord, PageStatus};
    use std::path::PathBuf;

    #[test]
    fn summary_counts_completed_pages() {
        let execution = BookExecution {
            title: "T".to_string(),
            style: "childrens_dreamy".to_string(),
            book_dir: PathBuf::from("/tmp/books/T"),
            cover_path: Some(PathBuf::from("/tmp/books/T/cover.png")),
            pages: vec![
                PageRecord {
                    page_number: 1,
                    status: PageStatus::Complete,
                    scene_description: Some("scene".to_string()),
                    text: Some("text".to_string()),
                    image_path: Some(PathBuf::from("/tmp/books/T/page_01.png")),
                    edited_from_previous: false,
                    errors: vec![],
                },
                PageRecord::not_attempted(2),
            ],
            all_successful: false,
        };

        let response = BookGenerationResponse::from(&execution);
        assert_eq!(response.pages_completed, 1);
        assert!(response.cover_generated);
        assert!(!response.all_successful);
        assert!(response.message.contains("errors"));
    }
}
