//! Provider client error types.

/// Specific error conditions for the OpenAI chat and image clients.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum OpenAiErrorKind {
    /// Request could not be sent
    #[display("Request failed: {}", _0)]
    Http(String),
    /// API returned a non-success status
    #[display("API error {}: {}", status, message)]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },
    /// The Images API rejected the request; 400s here are often safety blocks
    #[display("Image request rejected (status {}, possible moderation block): {}", status, message)]
    ImageRejected {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },
    /// Response body could not be parsed
    #[display("Failed to parse response: {}", _0)]
    Parse(String),
    /// Request could not be converted to the wire format
    #[display("Conversion error: {}", _0)]
    Conversion(String),
    /// Response carried no generated choices
    #[display("Response contained no choices")]
    EmptyResponse,
    /// Image response carried neither b64_json nor a URL
    #[display("Image response missing b64_json data")]
    MissingImageData,
    /// Base64 image payload could not be decoded
    #[display("Failed to decode image payload: {}", _0)]
    ImageDecode(String),
}

/// Specific error conditions for the Replicate prediction client.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ReplicateErrorKind {
    /// Request could not be sent
    #[display("Request failed: {}", _0)]
    Http(String),
    /// API returned a non-success status
    #[display("API error {}: {}", status, message)]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },
    /// The prediction reached a terminal failure state
    #[display("Prediction {}: {}", status, message)]
    PredictionFailed {
        /// Terminal status ("failed" or "canceled")
        status: String,
        /// Error detail reported by the API
        message: String,
    },
    /// A succeeded prediction carried no usable output URL
    #[display("Succeeded prediction returned no output URL")]
    MissingOutput,
    /// The poll budget ran out before the prediction settled
    #[display("Prediction still pending after {} polls", _0)]
    PollBudgetExhausted(u32),
    /// Response body could not be parsed
    #[display("Failed to parse response: {}", _0)]
    Parse(String),
}

/// Provider error discriminated by backend.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::From)]
pub enum ModelsErrorKind {
    /// OpenAI chat or image client error
    #[from(OpenAiErrorKind)]
    OpenAi(OpenAiErrorKind),
    /// Replicate client error
    #[from(ReplicateErrorKind)]
    Replicate(ReplicateErrorKind),
}

/// Error type for provider client operations.
///
/// # Examples
///
/// ```
/// use fabula_error::{ModelsError, OpenAiErrorKind};
///
/// let err = ModelsError::new(OpenAiErrorKind::EmptyResponse.into());
/// assert!(format!("{}", err).contains("no choices"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Models Error: {} at line {} in {}", kind, line, file)]
pub struct ModelsError {
    /// The specific error condition
    pub kind: ModelsErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ModelsError {
    /// Create a new ModelsError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ModelsErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
