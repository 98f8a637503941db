use palquiz_db::DbError;
use palquiz_types::{AnswerError, QUIZ_LENGTH};

use crate::lifecycle::MAX_NAME_LEN;

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Answer(#[from] AnswerError),

    #[error("name must be between 1 and {} characters", MAX_NAME_LEN)]
    InvalidName,

    #[error("quiz {0} is not ready")]
    QuizNotReady(String),

    #[error("all {} questions have already been answered", QUIZ_LENGTH)]
    Finished,

    #[error("question {0} is not part of this quiz")]
    QuestionNotInQuiz(u32),

    /// Stored answers contradict each other. Never caused by user input.
    #[error("inconsistent answer data: {0}")]
    Inconsistent(String),
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Db(DbError::NotFound { .. }))
    }

    pub fn is_duplicate_answer(&self) -> bool {
        matches!(self, Self::Db(DbError::DuplicateAnswer { .. }))
    }
}
