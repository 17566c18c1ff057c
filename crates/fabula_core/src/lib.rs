//! Core data types for the Fabula storybook generator.
//!
//! This crate provides the foundation data types shared by the provider
//! clients, the book pipeline, and the front ends.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod image;
mod input;
mod media;
mod message;
mod output;
mod request;
mod role;

pub use image::{
    ImageArtifact, ImageQuality, ImageRequest, ImageRequestBuilder, ImageSize,
};
pub use input::Input;
pub use media::MediaSource;
pub use message::{Message, MessageBuilder};
pub use output::Output;
pub use request::{GenerateRequest, GenerateRequestBuilder, GenerateResponse};
pub use role::Role;
