pub mod attempts;
pub mod error;
pub mod quizzes;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tracing::error;

use palquiz_engine::QuizEngine;

use crate::error::ApiError;

pub type AppState = Arc<QuizEngine>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/quizzes", post(quizzes::create_quiz))
        .route("/quizzes/{quiz_id}", get(quizzes::get_quiz))
        .route("/quizzes/{quiz_id}/answers", post(quizzes::submit_answer))
        .route("/quizzes/{quiz_id}/skip", post(quizzes::skip_question))
        .route("/quizzes/{quiz_id}/results", get(quizzes::get_results))
        .route("/share/{public_id}", get(attempts::get_share_info))
        .route("/share/{public_id}/attempts", post(attempts::create_attempt))
        .route("/attempts/{attempt_id}", get(attempts::get_attempt))
        .route("/attempts/{attempt_id}/answers", post(attempts::submit_answer))
        .route("/attempts/{attempt_id}/skip", post(attempts::skip_question))
        .route("/attempts/{attempt_id}/score", get(attempts::get_score))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Run engine work (SQLite calls) off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&QuizEngine) -> palquiz_engine::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let engine = state.clone();
    tokio::task::spawn_blocking(move || f(&engine))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}
