//! HTTP front end for the Fabula storybook generator.
//!
//! Exposes the book pipeline over two routes:
//! - `POST /generate-book` — run a full generation from a JSON request
//! - `GET /health` — liveness probe
//!
//! The request shape (camelCase field names) matches the original web
//! front end this service replaces.

#![forbid(unsafe_code)]

mod config;
mod request;
mod response;
mod routes;

pub use config::ServerConfig;
pub use request::BookGenerationRequest;
pub use response::{BookGenerationResponse, ErrorResponse};
pub use routes::{AppState, router, serve};
