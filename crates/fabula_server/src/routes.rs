//! Router and handlers.

use crate::{BookGenerationRequest, BookGenerationResponse, ErrorResponse, ServerConfig};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use fabula_book::{BookPipeline, PromptLibrary};
use fabula_error::{
    FabulaError, FabulaErrorKind, FabulaResult, ServerError, ServerErrorKind,
};
use fabula_models::{
    OpenAiChatClient, OpenAiImageClient, ProviderConfig, openai_api_key,
};
use fabula_storage::BookStorage;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Shared state for the handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server settings
    pub config: ServerConfig,
    /// Provider settings
    pub providers: ProviderConfig,
    /// Prompt library
    pub prompts: PromptLibrary,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate-book", post(generate_book))
        .with_state(state)
}

/// Bind and serve until shutdown.
///
/// # Errors
///
/// Returns an error when the listen address cannot be bound or the server
/// fails while running.
pub async fn serve(state: AppState) -> FabulaResult<()> {
    let bind_addr = state.config.bind_addr.clone();
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| {
            ServerError::new(ServerErrorKind::BindFailed {
                addr: bind_addr.clone(),
                message: e.to_string(),
            })
        })?;

    info!(addr = %bind_addr, "Serving book generation API");
    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::new(ServerErrorKind::Serve(e.to_string())).into())
}

async fn health() -> &'static str {
    "ok"
}

#[instrument(skip(state, request), fields(title = %request.book_title, pages = request.number_of_pages))]
async fn generate_book(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BookGenerationRequest>,
) -> Result<Json<BookGenerationResponse>, (StatusCode, Json<ErrorResponse>)> {
    info!("Received book generation request");

    let spec = request.to_spec().map_err(reject)?;

    let api_key = openai_api_key().map_err(reject)?;
    let text = OpenAiChatClient::from_config(api_key.clone(), &state.providers);
    let image = OpenAiImageClient::from_config(api_key, &state.providers);

    let storage = BookStorage::new(state.config.output_dir.clone()).map_err(reject)?;
    let pipeline = BookPipeline::new(text, image, state.prompts.clone()).with_token_limits(
        state.providers.openai.max_tokens,
        state.providers.openai.inference_max_tokens,
    );

    let execution = pipeline.generate(&spec, &storage).await.map_err(reject)?;

    info!(
        completed = execution.pages_completed(),
        all_successful = execution.all_successful,
        "Book generation request finished"
    );
    Ok(Json(BookGenerationResponse::from(&execution)))
}

/// Map pipeline errors onto HTTP statuses: caller mistakes get 400,
/// everything else 500.
fn reject(error: FabulaError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match error.kind() {
        FabulaErrorKind::Server(e) if matches!(e.kind, ServerErrorKind::InvalidRequest(_)) => {
            StatusCode::BAD_REQUEST
        }
        FabulaErrorKind::Book(e) => match &e.kind {
            fabula_error::BookErrorKind::InvalidSpec(_)
            | fabula_error::BookErrorKind::UnknownStyle(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    error!(status = %status, error = %error, "Request failed");
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fabula_error_for(kind: ServerErrorKind) -> FabulaError {
        ServerError::new(kind).into()
    }

    #[test]
    fn invalid_request_maps_to_400() {
        let (status, _) = reject(fabula_error_for(ServerErrorKind::InvalidRequest(
            "bad".to_string(),
        )));
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_style_maps_to_400() {
        let err: FabulaError = fabula_error::BookError::new(
            fabula_error::BookErrorKind::UnknownStyle("noir".to_string()),
        )
        .into();
        let (status, body) = reject(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.contains("noir"));
    }

    #[test]
    fn backend_errors_map_to_500() {
        let err: FabulaError = fabula_error::BackendError::new("boom").into();
        let (status, _) = reject(err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
