//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for the HTTP front end.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind_addr: String,
    /// Root directory for generated books
    pub output_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            output_dir: PathBuf::from("output_books"),
        }
    }
}
