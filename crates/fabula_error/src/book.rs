//! Book pipeline error types.

/// Specific error conditions for book specification and pipeline operations.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum BookErrorKind {
    /// Failed to read the prompt library file
    #[display("Failed to read prompt library: {}", _0)]
    PromptsRead(String),
    /// Failed to parse the prompt library TOML
    #[display("Failed to parse prompt library TOML: {}", _0)]
    PromptsParse(String),
    /// The style catalog is empty
    #[display("Style catalog cannot be empty")]
    EmptyStyleCatalog,
    /// A requested style does not exist in the catalog
    #[display("Style '{}' not found in catalog", _0)]
    UnknownStyle(String),
    /// A template is empty or whitespace-only
    #[display("Template '{}' is empty", _0)]
    EmptyTemplate(String),
    /// No Stage-1 prompt is configured for a style kind
    #[display("No page prompt configured for style kind '{}'", _0)]
    MissingPagePrompt(String),
    /// A template referenced a placeholder with no bound value
    #[display("Template '{}' references unbound placeholder '{{{}}}'", template, placeholder)]
    UnboundPlaceholder {
        /// Template name
        template: String,
        /// Placeholder name
        placeholder: String,
    },
    /// Book specification failed validation
    #[display("Invalid book specification: {}", _0)]
    InvalidSpec(String),
    /// Stage-1 output had the wrong shape for the page
    #[display("Page {} structure invalid: {}", page, message)]
    PageShape {
        /// Page number requested
        page: u32,
        /// What was wrong
        message: String,
    },
    /// Stage-1 output answered for a different page than requested
    #[display("Requested page {} but response described page {}", expected, actual)]
    PageNumberMismatch {
        /// Page number requested
        expected: u32,
        /// Page number in the response
        actual: u32,
    },
    /// Character inference produced no usable characters
    #[display("No characters could be inferred from the outline")]
    NoCharactersInferred,
    /// Character inference output was not a map of names to descriptions
    #[display("Character inference output invalid: {}", _0)]
    CharacterShape(String),
}

/// Error type for book pipeline operations.
///
/// # Examples
///
/// ```
/// use fabula_error::{BookError, BookErrorKind};
///
/// let err = BookError::new(BookErrorKind::UnknownStyle("noir".to_string()));
/// assert!(format!("{}", err).contains("noir"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Book Error: {} at line {} in {}", kind, line, file)]
pub struct BookError {
    /// The specific error condition
    pub kind: BookErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl BookError {
    /// Create a new BookError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: BookErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
