use serde::{Deserialize, Serialize};

use crate::question::Question;

// -- Quizzes --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateQuizRequest {
    pub creator_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateQuizResponse {
    pub quiz_id: String,
    pub public_id: String,
}

/// Authoring progress of a quiz, as seen by its creator.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuizStatus {
    pub quiz_id: String,
    pub public_id: String,
    pub creator_name: String,
    pub answered: usize,
    pub total: usize,
    /// `None` once the quiz is complete.
    pub current: Option<QuestionView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AttemptResult {
    pub attempt_id: String,
    pub friend_name: String,
    pub score: u32,
}

// -- Sharing --

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareInfo {
    pub creator_name: String,
    pub ready: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAttemptRequest {
    pub friend_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAttemptResponse {
    pub attempt_id: String,
}

// -- Attempts --

#[derive(Debug, Serialize, Deserialize)]
pub struct AttemptStatus {
    pub attempt_id: String,
    pub friend_name: String,
    pub creator_name: String,
    pub answered: usize,
    pub total: usize,
    pub current: Option<QuestionView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub friend_name: String,
    pub creator_name: String,
    pub score: u32,
}

// -- Answers --

/// A form submission: the bank index of the question and the texts of the
/// options that were ticked.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitAnswerRequest {
    pub question_index: usize,
    pub answers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub question_index: usize,
    pub text: String,
    pub single_choice: bool,
    pub answers: Vec<String>,
}

impl QuestionView {
    /// Creators see the question text, friends see the test phrasing.
    pub fn new(question_index: usize, question: &Question, for_friend: bool) -> Self {
        let text = if for_friend && !question.test_text.is_empty() {
            question.test_text.clone()
        } else {
            question.text.clone()
        };

        Self {
            question_index,
            text,
            single_choice: question.single_choice,
            answers: question.answers.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
