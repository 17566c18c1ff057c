//! Request and artifact types for image generation.

use serde::{Deserialize, Serialize};

/// Image dimensions accepted by the image providers.
///
/// Book pages and covers use the wide format; single-image mode defaults
/// to square.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum ImageSize {
    /// 1024x1024 square
    #[default]
    #[serde(rename = "1024x1024")]
    #[strum(serialize = "1024x1024")]
    Square,
    /// 1536x1024 wide
    #[serde(rename = "1536x1024")]
    #[strum(serialize = "1536x1024")]
    Wide,
    /// 1024x1536 tall
    #[serde(rename = "1024x1536")]
    #[strum(serialize = "1024x1536")]
    Tall,
    /// Let the provider pick
    #[serde(rename = "auto")]
    #[strum(serialize = "auto")]
    Auto,
}

/// Image quality accepted by the image providers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImageQuality {
    /// Low quality, fastest and cheapest
    Low,
    /// Medium quality
    Medium,
    /// High quality
    #[default]
    High,
    /// Let the provider pick
    Auto,
}

/// A request for one generated (or edited) illustration.
///
/// # Examples
///
/// ```
/// use fabula_core::{ImageQuality, ImageRequest, ImageSize};
///
/// let request = ImageRequest::builder()
///     .prompt("A lion cub under a baobab tree".to_string())
///     .size(ImageSize::Wide)
///     .quality(ImageQuality::High)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.size(), &ImageSize::Wide);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Default,
    derive_builder::Builder,
    derive_getters::Getters,
)]
#[builder(default)]
pub struct ImageRequest {
    /// The full illustration prompt
    prompt: String,
    /// Requested dimensions
    size: ImageSize,
    /// Requested quality
    quality: ImageQuality,
    /// Requested output format (e.g., "png"); provider default when absent
    output_format: Option<String>,
}

impl ImageRequest {
    /// Create a builder for an image request.
    pub fn builder() -> ImageRequestBuilder {
        ImageRequestBuilder::default()
    }

    /// Replace the prompt, keeping size/quality/format.
    ///
    /// Used when a recovery handler supplies revised prompt text.
    pub fn with_prompt(&self, prompt: impl Into<String>) -> Self {
        let mut req = self.clone();
        req.prompt = prompt.into();
        req
    }
}

/// A generated illustration: raw bytes plus the MIME type they decode as.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct ImageArtifact {
    bytes: Vec<u8>,
    mime: String,
}

impl ImageArtifact {
    /// Create an artifact from raw bytes.
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    /// Consume the artifact, returning the raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Size of the image payload in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn size_round_trips_through_strings() {
        assert_eq!(ImageSize::Wide.to_string(), "1536x1024");
        assert_eq!(ImageSize::from_str("1024x1536").unwrap(), ImageSize::Tall);
        assert!(ImageSize::from_str("512x512").is_err());
    }

    #[test]
    fn quality_serializes_lowercase() {
        let json = serde_json::to_string(&ImageQuality::High).unwrap();
        assert_eq!(json, "\"high\"");
    }

    #[test]
    fn with_prompt_preserves_settings() {
        let req = ImageRequest::builder()
            .prompt("original".to_string())
            .size(ImageSize::Wide)
            .build()
            .unwrap();
        let revised = req.with_prompt("revised");
        assert_eq!(revised.prompt(), "revised");
        assert_eq!(revised.size(), &ImageSize::Wide);
    }
}
