//! Replicate provider client.
//!
//! Runs flux-kontext predictions as an alternative Stage-2 backend. The
//! model is natively image-to-image, so consistency mode passes the previous
//! illustration as `input_image` instead of going through a separate edits
//! endpoint.

mod client;

pub use client::ReplicateImageClient;
