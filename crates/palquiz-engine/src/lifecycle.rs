use std::collections::HashSet;

use chrono::Utc;
use palquiz_db::{CompletedQuizRow, DbError, Owner, QuizRow};
use palquiz_types::{AnswerSet, QUIZ_LENGTH};
use rand::seq::SliceRandom;
use tracing::{debug, info};
use uuid::Uuid;

use crate::sequence::next_position;
use crate::{EngineError, QuizEngine, Result};

pub const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuiz {
    pub id: String,
    pub public_id: String,
}

#[derive(Debug, Clone)]
pub struct QuizOverview {
    pub id: String,
    pub public_id: String,
    pub creator_name: String,
    pub answered: usize,
    /// Bank index of the question to show next.
    pub current_question: Option<usize>,
}

impl QuizOverview {
    pub fn is_ready(&self) -> bool {
        self.answered >= QUIZ_LENGTH
    }
}

#[derive(Debug, Clone)]
pub struct CompletedQuizOverview {
    pub id: String,
    pub quiz_id: String,
    pub friend_name: String,
    pub creator_name: String,
    pub answered: usize,
    pub current_question: Option<usize>,
}

impl CompletedQuizOverview {
    pub fn is_finished(&self) -> bool {
        self.answered >= QUIZ_LENGTH
    }
}

/// Where an owner stands in its question order.
struct Progress {
    /// Bank indices in the order they are presented.
    order: Vec<u32>,
    /// Offset into `order`.
    current: usize,
    answered: HashSet<u32>,
}

impl Progress {
    fn current_question(&self) -> Option<u32> {
        if self.answered.len() >= QUIZ_LENGTH {
            return None;
        }

        let position = match self.order.get(self.current) {
            Some(question) if !self.answered.contains(question) => self.current,
            _ => next_position(&self.order, self.current, &self.answered)?,
        };
        Some(self.order[position])
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Trim a creator or friend name and check its length.
pub fn validate_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(EngineError::InvalidName);
    }
    Ok(name)
}

impl QuizEngine {
    // -- Creation --

    pub fn create_quiz(&self, creator_name: &str) -> Result<NewQuiz> {
        let creator_name = validate_name(creator_name)?;

        let mut order: Vec<u32> = (0..self.bank.len() as u32).collect();
        order.shuffle(&mut rand::rng());

        let quiz = QuizRow {
            id: new_id(),
            public_id: new_id(),
            creator_name: creator_name.to_string(),
            shuffled_question_indices: order,
            current_question_index: 0,
            created_at: Utc::now().timestamp(),
        };
        self.db.create_quiz(&quiz)?;

        info!(quiz_id = %quiz.id, "Created quiz for {}", quiz.creator_name);
        Ok(NewQuiz {
            id: quiz.id,
            public_id: quiz.public_id,
        })
    }

    /// Start a friend's attempt. The quiz must have all of its questions answered.
    pub fn create_completed_quiz(&self, friend_name: &str, quiz_id: &str) -> Result<String> {
        let friend_name = validate_name(friend_name)?;

        self.db.get_quiz(quiz_id)?;
        if self.db.answer_count(Owner::Quiz(quiz_id))? < QUIZ_LENGTH {
            return Err(EngineError::QuizNotReady(quiz_id.to_string()));
        }

        let completed = CompletedQuizRow {
            id: new_id(),
            friend_name: friend_name.to_string(),
            current_question_index: 0,
            quiz_id: quiz_id.to_string(),
        };
        self.db.create_completed_quiz(&completed)?;

        info!(quiz_id, completed_quiz_id = %completed.id, "{} started a quiz", completed.friend_name);
        Ok(completed.id)
    }

    pub fn resolve_public_id(&self, public_id: &str) -> Result<String> {
        Ok(self.db.quiz_id_by_public_id(public_id)?)
    }

    // -- Answering --

    /// Record an answer to the question at bank index `question_index`.
    pub fn record_answer(
        &self,
        owner: Owner<'_>,
        question_index: usize,
        answers: &AnswerSet,
    ) -> Result<()> {
        self.bank.validate_answer(question_index, answers)?;

        let progress = self.progress(owner)?;
        if progress.answered.len() >= QUIZ_LENGTH {
            return Err(EngineError::Finished);
        }

        let question_index = question_index as u32;
        if matches!(owner, Owner::CompletedQuiz(_)) && !progress.order.contains(&question_index) {
            return Err(EngineError::QuestionNotInQuiz(question_index));
        }

        self.db
            .insert_answer_within(owner, question_index, answers, QUIZ_LENGTH)
            .map_err(|e| match e {
                DbError::AnswerLimit { .. } => EngineError::Finished,
                other => other.into(),
            })

    }

    /// Translate a form submission, record it and move on to the next question.
    pub fn submit_answer<S: AsRef<str>>(
        &self,
        owner: Owner<'_>,
        question_index: usize,
        selected: &[S],
    ) -> Result<()> {
        let answers = self.bank.answer_indices(question_index, selected)?;
        self.record_answer(owner, question_index, &answers)?;
        self.advance(owner)
    }

    /// Move the owner's pointer to the next unanswered question. Used both
    /// after answering and to skip a question.
    pub fn advance(&self, owner: Owner<'_>) -> Result<()> {
        let progress = self.progress(owner)?;
        if progress.answered.len() >= QUIZ_LENGTH {
            return Ok(());
        }

        match next_position(&progress.order, progress.current, &progress.answered) {
            Some(position) if position != progress.current => {
                self.db
                    .set_current_question_index(owner, position as u32)?;
                debug!(owner = owner.id(), position, "Advanced {}", owner.entity());
            }
            Some(_) => {}
            None => debug!(owner = owner.id(), "No unanswered question left"),
        }

        Ok(())
    }

    // -- Progress --

    /// Bank index of the question the owner should answer next, or `None`
    /// when there is nothing left to answer.
    pub fn current_question(&self, owner: Owner<'_>) -> Result<Option<usize>> {
        Ok(self
            .progress(owner)?
            .current_question()
            .map(|i| i as usize))
    }

    pub fn quiz_overview(&self, quiz_id: &str) -> Result<QuizOverview> {
        let quiz = self.db.get_quiz(quiz_id)?;
        let owner = Owner::Quiz(quiz_id);

        Ok(QuizOverview {
            answered: self.db.answer_count(owner)?,
            current_question: self.current_question(owner)?,
            id: quiz.id,
            public_id: quiz.public_id,
            creator_name: quiz.creator_name,
        })
    }

    pub fn completed_quiz_overview(&self, completed_quiz_id: &str) -> Result<CompletedQuizOverview> {
        let completed = self.db.get_completed_quiz(completed_quiz_id)?;
        let quiz = self.db.get_quiz(&completed.quiz_id)?;
        let owner = Owner::CompletedQuiz(completed_quiz_id);

        Ok(CompletedQuizOverview {
            answered: self.db.answer_count(owner)?,
            current_question: self.current_question(owner)?,
            id: completed.id,
            quiz_id: completed.quiz_id,
            friend_name: completed.friend_name,
            creator_name: quiz.creator_name,
        })
    }

    fn progress(&self, owner: Owner<'_>) -> Result<Progress> {
        let (order, current) = match owner {
            Owner::Quiz(id) => {
                let quiz = self.db.get_quiz(id)?;
                let mut order = quiz.shuffled_question_indices;
                order.truncate(self.bank.len());
                (order, quiz.current_question_index)
            }
            Owner::CompletedQuiz(id) => {
                let completed = self.db.get_completed_quiz(id)?;
                let mut order = self.attempt_order(&completed.quiz_id)?;
                order.truncate(QUIZ_LENGTH);
                (order, completed.current_question_index)
            }
        };
        Ok(Progress {
            order,
            current: current as usize,
            answered: self
                .db
                .answered_question_indices(owner)?
                .into_iter()
                .collect(),
        })
    }

    /// A friend walks the questions the creator answered, in the quiz's
    /// permutation order.
    fn attempt_order(&self, quiz_id: &str) -> Result<Vec<u32>> {
        let quiz = self.db.get_quiz(quiz_id)?;
        let answered: HashSet<u32> = self
            .db
            .answered_question_indices(Owner::Quiz(quiz_id))?
            .into_iter()
            .collect();

        Ok(quiz
            .shuffled_question_indices
            .into_iter()
            .filter(|i| answered.contains(i))
            .collect())
    }
}
