use crate::retry::{backoff, is_retryable, permanent, transient};
use crate::{ProviderConfig, RetryConfig};
use async_trait::async_trait;
use fabula_core::{GenerateRequest, GenerateResponse, Input, Output, Role};
use fabula_error::{ModelsError, OpenAiErrorKind};
use fabula_interface::TextDriver;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_retry2::Retry;
use tracing::{debug, error, instrument};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI Chat Completions client.
#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
    retry: RetryConfig,
}

/// Wire format for a chat completion request.
#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiChatClient {
    /// Creates a new chat client against the default API base.
    ///
    /// # Arguments
    ///
    /// * `api_key` - OpenAI API key
    /// * `model` - Model identifier (e.g., "gpt-4o")
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        debug!("Creating new OpenAI chat client");
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            retry: RetryConfig::default(),
        }
    }

    /// Creates a chat client from loaded provider configuration.
    pub fn from_config(api_key: impl Into<String>, config: &ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: config.openai.chat_model.clone(),
            api_base: config.openai.api_base.clone(),
            retry: config.retry,
        }
    }

    /// Sends a request to the Chat Completions endpoint, retrying
    /// transient failures.
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatResponse, ModelsError> {
        let url = format!("{}/chat/completions", self.api_base);

        Retry::spawn(backoff(&self.retry), || async {
            debug!("Sending request to Chat Completions");

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(request)
                .send()
                .await
                .map_err(|e| {
                    error!(error = ?e, "Failed to send chat request");
                    transient(ModelsError::new(
                        OpenAiErrorKind::Http(e.to_string()).into(),
                    ))
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                error!(status = %status, body = %body, "Chat Completions returned error");
                let err = ModelsError::new(
                    OpenAiErrorKind::Api {
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

            response.json::<ChatResponse>().await.map_err(|e| {
                error!(error = ?e, "Failed to parse chat response");
                permanent(ModelsError::new(
                    OpenAiErrorKind::Parse(e.to_string()).into(),
                ))
            })
        })
        .await
    }

    /// Converts a Fabula GenerateRequest to the chat wire format.
    fn convert_request(&self, request: &GenerateRequest) -> Result<ChatRequest, ModelsError> {
        let messages: Result<Vec<ChatMessage>, ModelsError> = request
            .messages
            .iter()
            .map(|msg| {
                let text: Vec<&str> = msg
                    .content
                    .iter()
                    .filter_map(|input| match input {
                        Input::Text(text) => Some(text.as_str()),
                        _ => {
                            debug!("Skipping non-text input (chat endpoint is text-only)");
                            None
                        }
                    })
                    .collect();

                if text.is_empty() {
                    return Err(ModelsError::new(
                        OpenAiErrorKind::Conversion(
                            "Message must have at least one text content block".to_string(),
                        )
                        .into(),
                    ));
                }

                let role = match msg.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };

                Ok(ChatMessage {
                    role,
                    content: text.join("\n\n"),
                })
            })
            .collect();

        Ok(ChatRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            messages: messages?,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.json.then_some(ResponseFormat {
                kind: "json_object",
            }),
        })
    }

    /// Converts a chat response to a Fabula GenerateResponse.
    fn convert_response(response: ChatResponse) -> Result<GenerateResponse, ModelsError> {
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ModelsError::new(OpenAiErrorKind::EmptyResponse.into()))?;

        Ok(GenerateResponse {
            outputs: vec![Output::Text(content)],
        })
    }
}

#[async_trait]
impl TextDriver for OpenAiChatClient {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, request), fields(messages = request.messages.len()))]
    async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, fabula_error::FabulaError> {
        debug!("Generating response with OpenAI chat");

        let chat_request = self.convert_request(request)?;
        let chat_response = self.send_chat(&chat_request).await?;
        let response = Self::convert_response(chat_response)?;

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabula_core::Message;

    fn client() -> OpenAiChatClient {
        OpenAiChatClient::new("test-key", "gpt-4o")
    }

    #[test]
    fn convert_request_maps_roles_and_json_flag() {
        let request = GenerateRequest::builder()
            .messages(vec![
                Message::text(Role::System, "You are a storyteller."),
                Message::text(Role::User, "Page 1, please."),
            ])
            .max_tokens(Some(1000))
            .json(true)
            .build()
            .unwrap();

        let wire = client().convert_request(&request).unwrap();
        assert_eq!(wire.model, "gpt-4o");
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.messages[1].role, "user");
        assert_eq!(wire.max_tokens, Some(1000));
        assert!(wire.response_format.is_some());

        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[test]
    fn convert_request_rejects_empty_message() {
        let request = GenerateRequest::builder()
            .messages(vec![fabula_core::Message {
                role: Role::User,
                content: vec![],
            }])
            .build()
            .unwrap();

        assert!(client().convert_request(&request).is_err());
    }

    #[test]
    fn request_model_overrides_client_model() {
        let request = GenerateRequest::builder()
            .messages(vec![Message::text(Role::User, "hi")])
            .model(Some("gpt-4o-mini".to_string()))
            .build()
            .unwrap();

        let wire = client().convert_request(&request).unwrap();
        assert_eq!(wire.model, "gpt-4o-mini");
    }

    #[test]
    fn convert_response_takes_first_choice() {
        let response = ChatResponse {
            choices: vec![ChatChoice {
                message: ChoiceMessage {
                    content: Some("{\"page_number\": 1}".to_string()),
                },
            }],
        };
        let converted = OpenAiChatClient::convert_response(response).unwrap();
        assert_eq!(
            converted.outputs,
            vec![Output::Text("{\"page_number\": 1}".to_string())]
        );
    }

    #[test]
    fn convert_response_rejects_empty_choices() {
        let response = ChatResponse { choices: vec![] };
        assert!(OpenAiChatClient::convert_response(response).is_err());
    }
}
