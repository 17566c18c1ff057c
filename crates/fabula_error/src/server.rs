//! HTTP server error types.

/// Specific error conditions for the HTTP front end.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ServerErrorKind {
    /// Could not bind the listen address
    #[display("Failed to bind {}: {}", addr, message)]
    BindFailed {
        /// Requested listen address
        addr: String,
        /// Underlying error message
        message: String,
    },
    /// The request body failed validation
    #[display("Invalid request: {}", _0)]
    InvalidRequest(String),
    /// Serving the router failed
    #[display("Server failed: {}", _0)]
    Serve(String),
}

/// Error type for HTTP front-end operations.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Server Error: {} at line {} in {}", kind, line, file)]
pub struct ServerError {
    /// The specific error condition
    pub kind: ServerErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ServerError {
    /// Create a new ServerError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ServerErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
