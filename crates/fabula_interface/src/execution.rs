//! Book execution types.
//!
//! This module defines the data structures for book generation runs that are
//! shared between the pipeline (in fabula_book) and the front ends (CLI and
//! HTTP server).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a single page fared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    /// Both stages succeeded and the image was written
    Complete,
    /// Stage 1 produced content but the image was skipped or failed
    TextOnly,
    /// Stage 1 failed; the page has no content
    Failed,
    /// Generation was aborted before reaching this page
    NotAttempted,
}

/// Execution record for a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Page number (1-based).
    pub page_number: u32,

    /// Outcome for this page.
    pub status: PageStatus,

    /// Scene description from Stage 1, when it succeeded.
    pub scene_description: Option<String>,

    /// Narrative or script text from Stage 1, when it succeeded.
    pub text: Option<String>,

    /// Where the illustration was written, when Stage 2 succeeded.
    pub image_path: Option<PathBuf>,

    /// Whether the illustration came from an image-edit of the previous
    /// page rather than independent generation.
    pub edited_from_previous: bool,

    /// Errors recorded along the way (Stage 1 or Stage 2).
    pub errors: Vec<String>,
}

impl PageRecord {
    /// Create a record for a page that was never attempted.
    pub fn not_attempted(page_number: u32) -> Self {
        Self {
            page_number,
            status: PageStatus::NotAttempted,
            scene_description: None,
            text: None,
            image_path: None,
            edited_from_previous: false,
            errors: Vec::new(),
        }
    }
}

/// Complete execution record for a book generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookExecution {
    /// The book title.
    pub title: String,

    /// The style key the book was generated with.
    pub style: String,

    /// Directory the book was written to.
    pub book_dir: PathBuf,

    /// Where the cover was written, when cover generation succeeded.
    pub cover_path: Option<PathBuf>,

    /// Ordered per-page records.
    pub pages: Vec<PageRecord>,

    /// True when the cover and every page completed without errors.
    pub all_successful: bool,
}

impl BookExecution {
    /// Number of pages whose image was generated and written.
    pub fn pages_completed(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| p.status == PageStatus::Complete)
            .count()
    }

    /// Number of pages that recorded at least one error.
    pub fn pages_with_errors(&self) -> usize {
        self.pages.iter().filter(|p| !p.errors.is_empty()).count()
    }
}
