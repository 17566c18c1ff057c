//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the
//! fabula binary.

mod book;
mod commands;
mod image;
mod serve;
mod styles;

pub use book::run_create;
pub use commands::{Cli, Commands, CreateArgs, ImageArgs, ImageProvider};
pub use image::run_image;
pub use serve::run_serve;
pub use styles::show_styles;
