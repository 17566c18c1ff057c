//! Trait definitions for provider backends.

use async_trait::async_trait;
use fabula_core::{GenerateRequest, GenerateResponse, ImageArtifact, ImageRequest};
use fabula_error::FabulaResult;

/// Core trait for text-generation backends (Stage 1).
///
/// This provides the minimal interface for conversational text generation.
#[async_trait]
pub trait TextDriver: Send + Sync {
    /// Generate model output given a conversational request.
    async fn generate(&self, req: &GenerateRequest) -> FabulaResult<GenerateResponse>;

    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &'static str;

    /// Model identifier (e.g., "gpt-4o").
    fn model_name(&self) -> &str;
}

/// Core trait for image-generation backends (Stage 2).
#[async_trait]
pub trait ImageDriver: Send + Sync {
    /// Generate an illustration from a prompt.
    async fn generate_image(&self, req: &ImageRequest) -> FabulaResult<ImageArtifact>;

    /// Provider name (e.g., "openai", "replicate").
    fn provider_name(&self) -> &'static str;

    /// Model identifier (e.g., "gpt-image-1").
    fn model_name(&self) -> &str;
}

/// Trait for image backends that can edit an existing image.
///
/// Consistency mode produces each page by editing the previous page's
/// illustration, so visual style carries from page to page.
#[async_trait]
pub trait ImageEditing: ImageDriver {
    /// Produce a new illustration by editing `base` according to the prompt.
    async fn edit_image(
        &self,
        base: &ImageArtifact,
        req: &ImageRequest,
    ) -> FabulaResult<ImageArtifact>;
}
