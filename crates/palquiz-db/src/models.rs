//! Database row types. These map directly to SQLite rows.
//! Integer-sequence columns are already decoded.

use palquiz_types::AnswerSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRow {
    pub id: String,
    pub public_id: String,
    pub creator_name: String,
    /// Permutation of the bank indices, fixed at creation.
    pub shuffled_question_indices: Vec<u32>,
    /// Offset into `shuffled_question_indices`.
    pub current_question_index: u32,
    /// Unix seconds.
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedQuizRow {
    pub id: String,
    pub friend_name: String,
    pub current_question_index: u32,
    pub quiz_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedQuizSummary {
    pub id: String,
    pub friend_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRow {
    /// Bank index, not a position in the permutation.
    pub question_index: u32,
    pub answer_indices: AnswerSet,
}

/// Whose answers a query is about: the creator's quiz or one friend's attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner<'a> {
    Quiz(&'a str),
    CompletedQuiz(&'a str),
}

impl<'a> Owner<'a> {
    pub fn id(&self) -> &'a str {
        match self {
            Self::Quiz(id) | Self::CompletedQuiz(id) => id,
        }
    }

    pub fn entity(&self) -> &'static str {
        match self {
            Self::Quiz(_) => "quiz",
            Self::CompletedQuiz(_) => "completed quiz",
        }
    }

    pub(crate) fn table(&self) -> &'static str {
        match self {
            Self::Quiz(_) => "Quiz",
            Self::CompletedQuiz(_) => "CompletedQuiz",
        }
    }

    pub(crate) fn join_table(&self) -> &'static str {
        match self {
            Self::Quiz(_) => "QuizQuestionAnswer",
            Self::CompletedQuiz(_) => "CompletedQuizQuestionAnswer",
        }
    }

    pub(crate) fn join_column(&self) -> &'static str {
        match self {
            Self::Quiz(_) => "QuizId",
            Self::CompletedQuiz(_) => "CompletedQuizId",
        }
    }
}
