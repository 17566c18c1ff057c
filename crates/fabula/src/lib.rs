//! Fabula: an illustrated storybook generator.
//!
//! This facade crate re-exports the public API of the workspace: the book
//! pipeline, provider clients, storage, and the HTTP front end. The
//! `fabula` binary lives here too.

#![forbid(unsafe_code)]

pub use fabula_book::{
    BookPipeline, BookSpec, BookSpecBuilder, Character, CharacterSet, PageContent,
    PromptLibrary, PromptPair, Recovery, RecoveryHandler, SkipOnFailure, StyleConfig,
    StyleKind, extract_json, infer_characters, parse_json, render_template,
};
pub use fabula_core::{
    GenerateRequest, GenerateResponse, ImageArtifact, ImageQuality, ImageRequest, ImageSize,
    Input, MediaSource, Message, Output, Role,
};
pub use fabula_error::{FabulaError, FabulaErrorKind, FabulaResult};
pub use fabula_interface::{
    BookExecution, ImageDriver, ImageEditing, PageRecord, PageStatus, TextDriver,
};
pub use fabula_models::{
    OpenAiChatClient, OpenAiImageClient, ProviderConfig, ReplicateImageClient,
    openai_api_key, replicate_api_token,
};
pub use fabula_server::{AppState, BookGenerationRequest, ServerConfig};
pub use fabula_storage::{BookManifest, BookStorage, sanitize_name, save_unique};
