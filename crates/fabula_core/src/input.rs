//! Input types for text-generation requests.

use crate::MediaSource;
use serde::{Deserialize, Serialize};

/// Supported input types for generation requests.
///
/// Stage-1 page requests are plain text; image inputs carry the previous
/// page's illustration when a request references an existing image.
///
/// # Examples
///
/// ```
/// use fabula_core::{Input, MediaSource};
///
/// let text = Input::Text("Once upon a time".to_string());
///
/// let image = Input::Image {
///     mime: Some("image/png".to_string()),
///     source: MediaSource::Binary(vec![0x89, 0x50, 0x4E, 0x47]),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Input {
    /// Plain text input.
    Text(String),

    /// Image input (PNG, JPEG, WebP, etc.).
    Image {
        /// MIME type, e.g., "image/png" or "image/jpeg"
        mime: Option<String>,
        /// Media source (URL, base64, or raw bytes)
        source: MediaSource,
    },
}
