//! Stage-2 failure recovery.
//!
//! When an image call fails, the pipeline consults a [`RecoveryHandler`]
//! rather than deciding by itself: a front end may skip the page's image,
//! supply replacement prompt text and retry, or abort the remaining pages.
//! Non-interactive front ends use [`SkipOnFailure`].

use fabula_error::FabulaError;

/// What to do after a failed image call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// Skip this image and keep going
    Skip,
    /// Retry with replacement prompt text
    Retry(String),
    /// Stop generating the remaining pages
    Abort,
}

/// Decides how the pipeline reacts to Stage-2 failures.
///
/// The failed prompt is passed along so an interactive implementation can
/// show it and collect a revision.
pub trait RecoveryHandler: Send + Sync {
    /// A cover generation attempt failed.
    fn on_cover_failure(&self, failed_prompt: &str, error: &FabulaError) -> Recovery {
        let _ = (failed_prompt, error);
        Recovery::Skip
    }

    /// A page image attempt failed (after any edit-to-generate fallback).
    fn on_page_image_failure(
        &self,
        page_number: u32,
        failed_prompt: &str,
        error: &FabulaError,
    ) -> Recovery {
        let _ = (page_number, failed_prompt, error);
        Recovery::Skip
    }
}

/// Default handler: log-and-skip on every failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipOnFailure;

impl RecoveryHandler for SkipOnFailure {}
