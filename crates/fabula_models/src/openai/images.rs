use crate::retry::{backoff, is_retryable, permanent, transient};
use crate::{ProviderConfig, RetryConfig};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use fabula_core::{ImageArtifact, ImageRequest};
use fabula_error::{ModelsError, OpenAiErrorKind};
use fabula_interface::{ImageDriver, ImageEditing};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, error, info, instrument};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI Images API client.
///
/// Standard generation goes through `/images/generations` as JSON; edits
/// (consistency mode) go through `/images/edits` as multipart with the
/// previous illustration attached.
#[derive(Debug, Clone)]
pub struct OpenAiImageClient {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
    retry: RetryConfig,
}

/// Wire format for an image generation request.
#[derive(Debug, Clone, Serialize)]
struct ImagesRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: String,
    quality: String,
    // Keeps benign storybook prompts from tripping the strictest filter tier.
    moderation: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_format: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImageDatum>,
    #[serde(default)]
    usage: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    b64_json: Option<String>,
}

impl OpenAiImageClient {
    /// Creates a new image client against the default API base.
    ///
    /// # Arguments
    ///
    /// * `api_key` - OpenAI API key
    /// * `model` - Image model identifier (e.g., "gpt-image-1")
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        debug!("Creating new OpenAI image client");
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            retry: RetryConfig::default(),
        }
    }

    /// Creates an image client from loaded provider configuration.
    pub fn from_config(api_key: impl Into<String>, config: &ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: config.openai.image_model.clone(),
            api_base: config.openai.api_base.clone(),
            retry: config.retry,
        }
    }

    /// Map a non-success Images API status to an error kind.
    ///
    /// 400s from the image endpoints frequently mean the safety system
    /// declined the prompt, so they get their own kind with a hint.
    fn status_error(status: reqwest::StatusCode, body: String) -> ModelsError {
        let kind = if status == reqwest::StatusCode::BAD_REQUEST {
            OpenAiErrorKind::ImageRejected {
                status: status.as_u16(),
                message: body,
            }
        } else {
            OpenAiErrorKind::Api {
                status: status.as_u16(),
                message: body,
            }
        };
        ModelsError::new(kind.into())
    }

    /// Decode the first b64_json payload of an images response.
    fn decode_response(&self, response: ImagesResponse) -> Result<ImageArtifact, ModelsError> {
        if let Some(usage) = &response.usage {
            info!(usage = %usage, "Images API usage");
        }

        let b64 = response
            .data
            .into_iter()
            .next()
            .and_then(|datum| datum.b64_json)
            .ok_or_else(|| ModelsError::new(OpenAiErrorKind::MissingImageData.into()))?;

        let bytes = BASE64.decode(b64).map_err(|e| {
            ModelsError::new(OpenAiErrorKind::ImageDecode(e.to_string()).into())
        })?;

        Ok(ImageArtifact::new(bytes, "image/png"))
    }

    async fn handle_response(
        response: reqwest::Response,
    ) -> Result<ImagesResponse, RetryError<ModelsError>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Images API returned error");
            let err = Self::status_error(status, body);
            return if is_retryable(status) {
                Err(transient(err))
            } else {
                Err(permanent(err))
            };
        }

        response.json::<ImagesResponse>().await.map_err(|e| {
            error!(error = ?e, "Failed to parse images response");
            permanent(ModelsError::new(
                OpenAiErrorKind::Parse(e.to_string()).into(),
            ))
        })
    }
}

#[async_trait]
impl ImageDriver for OpenAiImageClient {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, req), fields(model = %self.model, size = %req.size()))]
    async fn generate_image(
        &self,
        req: &ImageRequest,
    ) -> Result<ImageArtifact, fabula_error::FabulaError> {
        let url = format!("{}/images/generations", self.api_base);
        let wire = ImagesRequest {
            model: &self.model,
            prompt: req.prompt(),
            n: 1,
            size: req.size().to_string(),
            quality: req.quality().to_string(),
            moderation: "low",
            output_format: req.output_format().as_deref(),
        };

        debug!("Sending request to Images API");
        let response = Retry::spawn(backoff(&self.retry), || async {
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&wire)
                .send()
                .await
                .map_err(|e| {
                    error!(error = ?e, "Failed to send image request");
                    transient(ModelsError::new(
                        OpenAiErrorKind::Http(e.to_string()).into(),
                    ))
                })?;
            Self::handle_response(response).await
        })
        .await?;

        Ok(self.decode_response(response)?)
    }
}

#[async_trait]
impl ImageEditing for OpenAiImageClient {
    #[instrument(skip(self, base, req), fields(model = %self.model, base_len = base.len()))]
    async fn edit_image(
        &self,
        base: &ImageArtifact,
        req: &ImageRequest,
    ) -> Result<ImageArtifact, fabula_error::FabulaError> {
        let url = format!("{}/images/edits", self.api_base);

        debug!("Sending request to Images edits API");
        let response = Retry::spawn(backoff(&self.retry), || async {
            // Multipart forms are single-use, so rebuild per attempt.
            let part = Part::bytes(base.bytes().clone())
                .file_name("previous.png")
                .mime_str(base.mime())
                .map_err(|e| {
                    permanent(ModelsError::new(
                        OpenAiErrorKind::Conversion(e.to_string()).into(),
                    ))
                })?;

            let form = Form::new()
                .text("model", self.model.clone())
                .text("prompt", req.prompt().clone())
                .text("n", "1")
                .text("size", req.size().to_string())
                .text("quality", req.quality().to_string())
                .text("moderation", "low")
                .part("image[]", part);

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .multipart(form)
                .send()
                .await
                .map_err(|e| {
                    error!(error = ?e, "Failed to send image edit request");
                    transient(ModelsError::new(
                        OpenAiErrorKind::Http(e.to_string()).into(),
                    ))
                })?;
            Self::handle_response(response).await
        })
        .await?;

        Ok(self.decode_response(response)?)
    }
}
