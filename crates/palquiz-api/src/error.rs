use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use palquiz_db::DbError;
use palquiz_engine::EngineError;
use palquiz_types::api::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Engine(err) => match err {
                EngineError::Db(DbError::NotFound { .. }) => StatusCode::NOT_FOUND,
                // The user stays on the question and may retry
                EngineError::Db(DbError::DuplicateAnswer { .. }) => StatusCode::CONFLICT,
                EngineError::Db(DbError::AnswerLimit { .. }) | EngineError::Finished => {
                    StatusCode::CONFLICT
                }
                EngineError::Answer(_)
                | EngineError::InvalidName
                | EngineError::QuizNotReady(_)
                | EngineError::QuestionNotInQuiz(_) => StatusCode::BAD_REQUEST,
                EngineError::Db(_) | EngineError::Inconsistent(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            match &self {
                Self::Engine(EngineError::Db(db)) => {
                    error!(code = ?db.code(), "Database error: {}", db)
                }
                other => error!("Request failed: {}", other),
            }
            "internal server error".to_string()
        } else {
            debug!("Rejected request ({}): {}", status, self);
            self.to_string()
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
