//! HTTP front-end command handler.

use fabula_book::PromptLibrary;
use fabula_error::FabulaResult;
use fabula_models::ProviderConfig;
use fabula_server::{AppState, ServerConfig};
use std::path::PathBuf;

/// Run the book generation API server.
pub async fn run_serve(bind: String, output_dir: PathBuf) -> FabulaResult<()> {
    let state = AppState {
        config: ServerConfig {
            bind_addr: bind,
            output_dir,
        },
        providers: ProviderConfig::load()?,
        prompts: PromptLibrary::bundled()?,
    };

    fabula_server::serve(state).await
}
