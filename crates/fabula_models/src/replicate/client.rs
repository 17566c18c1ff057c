use crate::retry::{backoff, is_retryable, permanent, transient};
use crate::{ProviderConfig, RetryConfig};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use fabula_core::{ImageArtifact, ImageRequest};
use fabula_error::{FabulaResult, ModelsError, ReplicateErrorKind};
use fabula_interface::{ImageDriver, ImageEditing};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, error, instrument, warn};

const DEFAULT_API_BASE: &str = "https://api.replicate.com/v1";
const DEFAULT_MODEL: &str = "black-forest-labs/flux-kontext-max";

// Replicate's 0-6 scale; image-to-image runs are clamped harder upstream.
const SAFETY_TOLERANCE_WITH_INPUT: u8 = 2;
const SAFETY_TOLERANCE_TEXT_ONLY: u8 = 6;

/// Replicate prediction client.
///
/// Predictions are asynchronous on the Replicate side: create, then poll
/// until the prediction settles, then download the output image.
#[derive(Debug, Clone)]
pub struct ReplicateImageClient {
    client: Client,
    token: String,
    model: String,
    api_base: String,
    poll_interval: Duration,
    max_polls: u32,
    retry: RetryConfig,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl Prediction {
    fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "failed" | "canceled")
    }
}

impl ReplicateImageClient {
    /// Creates a new client for the default flux-kontext model.
    pub fn new(token: impl Into<String>) -> Self {
        debug!("Creating new Replicate client");
        Self {
            client: Client::new(),
            token: token.into(),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            poll_interval: Duration::from_secs(2),
            max_polls: 150,
            retry: RetryConfig::default(),
        }
    }

    /// Creates a client from loaded provider configuration.
    pub fn from_config(token: impl Into<String>, config: &ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            model: config.replicate.model.clone(),
            api_base: config.replicate.api_base.clone(),
            poll_interval: Duration::from_secs(config.replicate.poll_interval_secs),
            max_polls: config.replicate.max_polls,
            retry: config.retry,
        }
    }

    /// Build the prediction input block.
    ///
    /// With an input image the aspect ratio follows that image; text-only
    /// runs default to square.
    fn prediction_input(&self, req: &ImageRequest, input_image: Option<&ImageArtifact>) -> Value {
        match input_image {
            Some(image) => json!({
                "prompt": req.prompt(),
                "output_format": "jpg",
                "input_image": format!(
                    "data:{};base64,{}",
                    image.mime(),
                    BASE64.encode(image.bytes())
                ),
                "aspect_ratio": "match_input_image",
                "safety_tolerance": SAFETY_TOLERANCE_WITH_INPUT,
            }),
            None => json!({
                "prompt": req.prompt(),
                "output_format": "jpg",
                "aspect_ratio": "1:1",
                "safety_tolerance": SAFETY_TOLERANCE_TEXT_ONLY,
            }),
        }
    }

    async fn parse_prediction(
        response: reqwest::Response,
    ) -> Result<Prediction, RetryError<ModelsError>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Replicate API returned error");
            let err = ModelsError::new(
                ReplicateErrorKind::Api {
                    status: status.as_u16(),
                    message: body,
                }
                .into(),
            );
            return if is_retryable(status) {
                Err(transient(err))
            } else {
                Err(permanent(err))
            };
        }

        response.json::<Prediction>().await.map_err(|e| {
            permanent(ModelsError::new(
                ReplicateErrorKind::Parse(e.to_string()).into(),
            ))
        })
    }

    /// Create a prediction for the configured model.
    #[instrument(skip(self, input), fields(model = %self.model))]
    async fn create_prediction(&self, input: &Value) -> Result<Prediction, ModelsError> {
        let url = format!("{}/models/{}/predictions", self.api_base, self.model);
        let body = json!({ "input": input });

        Retry::spawn(backoff(&self.retry), || async {
            debug!("Creating Replicate prediction");
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.token)
                .json(&body)
                .send()
                .await
                .map_err(|e| {
                    transient(ModelsError::new(
                        ReplicateErrorKind::Http(e.to_string()).into(),
                    ))
                })?;
            Self::parse_prediction(response).await
        })
        .await
    }

    /// Poll a prediction until it settles or the poll budget runs out.
    #[instrument(skip(self, prediction), fields(id = %prediction.id))]
    async fn wait_for_prediction(&self, mut prediction: Prediction) -> Result<Prediction, ModelsError> {
        let url = format!("{}/predictions/{}", self.api_base, prediction.id);
        let mut polls = 0u32;

        while !prediction.is_terminal() {
            if polls >= self.max_polls {
                return Err(ModelsError::new(
                    ReplicateErrorKind::PollBudgetExhausted(polls).into(),
                ));
            }
            polls += 1;
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await
                .map_err(|e| {
                    ModelsError::new(ReplicateErrorKind::Http(e.to_string()).into())
                })?;

            prediction = match Self::parse_prediction(response).await {
                Ok(prediction) => prediction,
                Err(RetryError::Transient { err, .. }) => {
                    // A flaky poll is not fatal; the next tick re-reads state.
                    warn!(error = %err, "Prediction poll failed, will re-poll");
                    continue;
                }
                Err(RetryError::Permanent(err)) => return Err(err),
            };
        }

        Ok(prediction)
    }

    /// Extract the output URL and download the image bytes.
    async fn download_output(&self, prediction: Prediction) -> Result<ImageArtifact, ModelsError> {
        if prediction.status != "succeeded" {
            let message = prediction
                .error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no error detail".to_string());
            return Err(ModelsError::new(
                ReplicateErrorKind::PredictionFailed {
                    status: prediction.status,
                    message,
                }
                .into(),
            ));
        }

        let url = match prediction.output {
            Some(Value::String(url)) => url,
            Some(Value::Array(items)) => items
                .into_iter()
                .find_map(|item| match item {
                    Value::String(url) => Some(url),
                    _ => None,
                })
                .ok_or_else(|| {
                    ModelsError::new(ReplicateErrorKind::MissingOutput.into())
                })?,
            _ => return Err(ModelsError::new(ReplicateErrorKind::MissingOutput.into())),
        };

        debug!(url = %url, "Downloading prediction output");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ModelsError::new(ReplicateErrorKind::Http(e.to_string()).into()))?;

        if !response.status().is_success() {
            return Err(ModelsError::new(
                ReplicateErrorKind::Api {
                    status: response.status().as_u16(),
                    message: format!("fetching output {url}"),
                }
                .into(),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ModelsError::new(ReplicateErrorKind::Http(e.to_string()).into()))?;

        Ok(ImageArtifact::new(bytes.to_vec(), "image/jpeg"))
    }

    async fn run(
        &self,
        req: &ImageRequest,
        input_image: Option<&ImageArtifact>,
    ) -> FabulaResult<ImageArtifact> {
        let input = self.prediction_input(req, input_image);
        let prediction = self.create_prediction(&input).await?;
        let prediction = self.wait_for_prediction(prediction).await?;
        Ok(self.download_output(prediction).await?)
    }
}

#[async_trait]
impl ImageDriver for ReplicateImageClient {
    fn provider_name(&self) -> &'static str {
        "replicate"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, req), fields(model = %self.model))]
    async fn generate_image(&self, req: &ImageRequest) -> FabulaResult<ImageArtifact> {
        self.run(req, None).await
    }
}

#[async_trait]
impl ImageEditing for ReplicateImageClient {
    #[instrument(skip(self, base, req), fields(model = %self.model, base_len = base.len()))]
    async fn edit_image(
        &self,
        base: &ImageArtifact,
        req: &ImageRequest,
    ) -> FabulaResult<ImageArtifact> {
        self.run(req, Some(base)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabula_core::ImageSize;

    fn client() -> ReplicateImageClient {
        ReplicateImageClient::new("test-token")
    }

    fn request() -> ImageRequest {
        ImageRequest::builder()
            .prompt("A harbor at dawn".to_string())
            .size(ImageSize::Square)
            .build()
            .unwrap()
    }

    #[test]
    fn text_only_input_defaults_to_square_and_loose_tolerance() {
        let input = client().prediction_input(&request(), None);
        assert_eq!(input["aspect_ratio"], "1:1");
        assert_eq!(input["safety_tolerance"], 6);
        assert!(input.get("input_image").is_none());
    }

    #[test]
    fn image_input_matches_aspect_and_tightens_tolerance() {
        let base = ImageArtifact::new(vec![1, 2, 3], "image/png");
        let input = client().prediction_input(&request(), Some(&base));
        assert_eq!(input["aspect_ratio"], "match_input_image");
        assert_eq!(input["safety_tolerance"], 2);
        let data_url = input["input_image"].as_str().unwrap();
        assert!(data_url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn terminal_statuses_are_recognized() {
        for status in ["succeeded", "failed", "canceled"] {
            let prediction = Prediction {
                id: "p1".to_string(),
                status: status.to_string(),
                output: None,
                error: None,
            };
            assert!(prediction.is_terminal());
        }
        let pending = Prediction {
            id: "p2".to_string(),
            status: "processing".to_string(),
            output: None,
            error: None,
        };
        assert!(!pending.is_terminal());
    }

    #[tokio::test]
    async fn failed_prediction_surfaces_error_detail() {
        let prediction = Prediction {
            id: "p3".to_string(),
            status: "failed".to_string(),
            output: None,
            error: Some(Value::String("NSFW content detected".to_string())),
        };
        let err = client().download_output(prediction).await.unwrap_err();
        assert!(format!("{}", err).contains("failed"));
    }

    #[tokio::test]
    async fn succeeded_prediction_without_output_is_an_error() {
        let prediction = Prediction {
            id: "p4".to_string(),
            status: "succeeded".to_string(),
            output: None,
            error: None,
        };
        assert!(client().download_output(prediction).await.is_err());
    }
}
