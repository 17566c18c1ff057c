//! Request and response types for text generation.

use crate::{Message, Output};
use serde::{Deserialize, Serialize};

/// Generation request carrying the full conversation so far.
///
/// When `json` is set, the provider asks the model for a JSON-object
/// response (the Chat Completions `response_format` knob); Stage-1 page
/// requests always set it.
///
/// # Examples
///
/// ```
/// use fabula_core::{GenerateRequest, Message, Role};
///
/// let request = GenerateRequest::builder()
///     .messages(vec![Message::text(Role::User, "Hello!")])
///     .max_tokens(Some(100))
///     .json(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.messages.len(), 1);
/// assert!(request.json);
/// ```
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Default, derive_builder::Builder,
)]
#[builder(default)]
pub struct GenerateRequest {
    /// The conversation messages to send
    pub messages: Vec<Message>,
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 to 1.0)
    pub temperature: Option<f32>,
    /// Model identifier to use
    pub model: Option<String>,
    /// Request a JSON-object response from the model
    #[serde(default)]
    pub json: bool,
}

impl GenerateRequest {
    /// Create a builder for a generation request.
    pub fn builder() -> GenerateRequestBuilder {
        GenerateRequestBuilder::default()
    }
}

/// The unified response object.
///
/// # Examples
///
/// ```
/// use fabula_core::{GenerateResponse, Output};
///
/// let response = GenerateResponse {
///     outputs: vec![Output::Text("Hello! How can I help?".to_string())],
/// };
///
/// assert_eq!(response.outputs.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The generated outputs from the model
    pub outputs: Vec<Output>,
}
