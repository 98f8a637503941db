pub mod error;
pub mod lifecycle;
pub mod retention;
pub mod scoring;
pub mod sequence;

pub use error::{EngineError, Result};
pub use lifecycle::{CompletedQuizOverview, NewQuiz, QuizOverview};
pub use palquiz_db::Owner;
pub use scoring::QuizResult;

use palquiz_db::Database;
use palquiz_types::QuestionBank;

/// Quiz authoring, friend attempts and scoring over one database and one
/// question bank.
pub struct QuizEngine {
    db: Database,
    bank: QuestionBank,
}

impl QuizEngine {
    pub fn new(db: Database, bank: QuestionBank) -> Self {
        Self { db, bank }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use palquiz_db::Database;
    use palquiz_types::{AnswerSet, Question, QuestionBank};

    use crate::{Owner, QuizEngine};

    /// Even indices are single-choice with three options, odd indices are
    /// multi-choice with four.
    pub fn bank(size: usize) -> QuestionBank {
        let questions = (0..size)
            .map(|i| {
                let single = i % 2 == 0;
                let options = if single { 3 } else { 4 };
                Question {
                    text: format!("Question {i}"),
                    test_text: format!("Their question {i}"),
                    single_choice: single,
                    answers: (0..options).map(|o| format!("Option {o}")).collect(),
                }
            })
            .collect();
        QuestionBank::new(questions).unwrap()
    }

    pub fn engine(bank_size: usize) -> QuizEngine {
        QuizEngine::new(Database::open_in_memory().unwrap(), bank(bank_size))
    }

    /// Answer every question `owner` is shown, picking answers with `pick`.
    pub fn answer_all(
        engine: &QuizEngine,
        owner: Owner<'_>,
        mut pick: impl FnMut(usize) -> AnswerSet,
    ) {
        while let Some(question) = engine.current_question(owner).unwrap() {
            engine.record_answer(owner, question, &pick(question)).unwrap();
            engine.advance(owner).unwrap();
        }
    }
}
