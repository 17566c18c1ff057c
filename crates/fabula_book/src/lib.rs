//! Two-stage storybook pipeline.
//!
//! This crate turns a [`BookSpec`] into a directory of illustrations:
//! Stage 1 asks the text model for one page's scene description and
//! narrative text (threading the running conversation so the story stays
//! coherent), Stage 2 turns that structure into an illustration, either by
//! independent generation or, in consistency mode, by editing the previous
//! page's image.

#![forbid(unsafe_code)]

mod characters;
mod extraction;
mod page;
mod pipeline;
mod prompts;
mod recovery;
mod spec;

pub use characters::{Character, CharacterSet, infer_characters};
pub use extraction::{extract_json, parse_json};
pub use page::PageContent;
pub use pipeline::BookPipeline;
pub use prompts::{PromptLibrary, PromptPair, StyleConfig, StyleKind, render_template};
pub use recovery::{Recovery, RecoveryHandler, SkipOnFailure};
pub use spec::{BookSpec, BookSpecBuilder};
