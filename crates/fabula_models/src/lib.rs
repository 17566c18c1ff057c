//! Provider clients for the Fabula storybook generator.
//!
//! Two backends cover the pipeline's needs:
//! - OpenAI: Chat Completions for Stage 1, the Images API (generation and
//!   edits) for Stage 2.
//! - Replicate: flux-kontext predictions as an alternative Stage-2 backend,
//!   with native image-to-image support for consistency mode.
//!
//! All clients share the transient-failure retry policy in [`retry`] and the
//! layered configuration in [`ProviderConfig`].

#![forbid(unsafe_code)]

mod config;
pub mod openai;
pub mod replicate;
pub mod retry;

pub use config::{
    OpenAiConfig, ProviderConfig, ReplicateConfig, RetryConfig, openai_api_key,
    replicate_api_token,
};
pub use openai::{OpenAiChatClient, OpenAiImageClient};
pub use replicate::ReplicateImageClient;
