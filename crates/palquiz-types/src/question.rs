use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::answer::{AnswerError, AnswerSet};

/// Number of answered questions that makes a quiz (or a friend's attempt) complete.
pub const QUIZ_LENGTH: usize = 20;

/// One entry of the question bank document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    /// Phrasing shown to friends taking the quiz.
    #[serde(rename = "question_test", default)]
    pub test_text: String,
    #[serde(rename = "single_type")]
    pub single_choice: bool,
    pub answers: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("could not read question bank: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse question bank: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("question {index} has no answer options")]
    NoAnswers { index: usize },
}

/// Immutable, ordered list of questions. The position of a question in the
/// bank is its permanent identity ("bank index").
///
/// Cloning is cheap: every clone shares the same allocation.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Arc<[Question]>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Result<Self, LoadError> {
        if let Some(index) = questions.iter().position(|q| q.answers.is_empty()) {
            return Err(LoadError::NoAnswers { index });
        }

        Ok(Self {
            questions: questions.into(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        Self::new(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let bank = Self::from_reader(BufReader::new(File::open(path)?))?;
        info!("Loaded {} questions from {}", bank.len(), path.display());
        Ok(bank)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Translate the option texts picked in a form into answer indices.
    pub fn answer_indices<S: AsRef<str>>(
        &self,
        question_index: usize,
        selected: &[S],
    ) -> Result<AnswerSet, AnswerError> {
        let question = self
            .get(question_index)
            .ok_or(AnswerError::UnknownQuestion(question_index))?;

        let answers = selected
            .iter()
            .map(|text| {
                let text = text.as_ref();
                question
                    .answers
                    .iter()
                    .position(|option| option == text)
                    .map(|i| i as u32)
                    .ok_or_else(|| AnswerError::UnknownOption {
                        question: question_index,
                        option: text.to_string(),
                    })
            })
            .collect::<Result<AnswerSet, _>>()?;

        self.validate_answer(question_index, &answers)?;
        Ok(answers)
    }

    /// Check that an answer set can be recorded against the given question.
    pub fn validate_answer(
        &self,
        question_index: usize,
        answers: &AnswerSet,
    ) -> Result<(), AnswerError> {
        let question = self
            .get(question_index)
            .ok_or(AnswerError::UnknownQuestion(question_index))?;

        if answers.is_empty() {
            return Err(AnswerError::Empty);
        }
        if question.single_choice && answers.len() > 1 {
            return Err(AnswerError::SingleChoice(question_index));
        }
        if let Some(option) = answers.iter().find(|&i| i as usize >= question.answers.len()) {
            return Err(AnswerError::OptionOutOfRange {
                question: question_index,
                option,
            });
        }

        Ok(())
    }
}
