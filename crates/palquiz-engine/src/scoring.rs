use palquiz_db::{AnswerRow, CompletedQuizSummary, Owner};
use palquiz_types::{AnswerSet, Question, QuestionBank, QUIZ_LENGTH};

use crate::{EngineError, QuizEngine, Result};

/// A finished attempt with its score truncated to a whole percentage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    pub completed_quiz_id: String,
    pub friend_name: String,
    pub score: u32,
}

fn question(bank: &QuestionBank, question_index: u32) -> Result<&Question> {
    bank.get(question_index as usize).ok_or_else(|| {
        EngineError::Inconsistent(format!("question {question_index} is not in the bank"))
    })
}

/// Highest reachable score: one point per single-choice question, one point
/// per option the creator ticked on multi-choice questions.
pub fn max_score(bank: &QuestionBank, creator: &[AnswerRow]) -> Result<u32> {
    creator.iter().try_fold(0, |total, answer| {
        let question = question(bank, answer.question_index)?;
        Ok(total
            + if question.single_choice {
                1
            } else {
                answer.answer_indices.len() as u32
            })
    })
}

/// Points a friend earns on one question.
///
/// Multi-choice questions give a point for every option both picked and take
/// one away for every option only one of them picked, never going below zero.
pub fn question_score(question: &Question, creator: &AnswerSet, friend: &AnswerSet) -> u32 {
    if question.single_choice {
        return u32::from(creator.first().is_some() && creator.first() == friend.first());
    }

    let mut score: i64 = 0;
    for option in 0..question.answers.len() as u32 {
        match (creator.contains(option), friend.contains(option)) {
            (true, true) => score += 1,
            (false, false) => {}
            _ => score -= 1,
        }
    }
    score.max(0) as u32
}

/// Percentage of `max_score` the friend reached, in `[0, 100]`.
pub fn score_answers(bank: &QuestionBank, creator: &[AnswerRow], friend: &[AnswerRow]) -> Result<f64> {
    let max = max_score(bank, creator)?;

    let mut total = 0;
    for answer in friend {
        let expected = creator
            .iter()
            .find(|c| c.question_index == answer.question_index)
            .ok_or_else(|| {
                EngineError::Inconsistent(format!(
                    "question {} was answered by a friend but not by the creator",
                    answer.question_index
                ))
            })?;

        total += question_score(
            question(bank, answer.question_index)?,
            &expected.answer_indices,
            &answer.answer_indices,
        );
    }

    debug_assert!(total <= max, "score {total} exceeds maximum {max}");
    if total > max {
        return Err(EngineError::Inconsistent(format!(
            "score {total} exceeds maximum {max}"
        )));
    }
    if max == 0 {
        return Err(EngineError::Inconsistent(
            "quiz has no answers to score against".to_string(),
        ));
    }

    Ok(100.0 * f64::from(total) / f64::from(max))
}

impl QuizEngine {
    pub fn score(&self, completed_quiz_id: &str) -> Result<f64> {
        let completed = self.db.get_completed_quiz(completed_quiz_id)?;

        let creator = self.db.answers(Owner::Quiz(&completed.quiz_id))?;
        let friend = self.db.answers(Owner::CompletedQuiz(completed_quiz_id))?;

        score_answers(&self.bank, &creator, &friend)
    }

    /// Attempts that answered every question, by friend name.
    pub fn list_completed_attempts(&self, quiz_id: &str) -> Result<Vec<CompletedQuizSummary>> {
        self.db.get_quiz(quiz_id)?;
        Ok(self.db.finished_completed_quizzes(quiz_id, QUIZ_LENGTH)?)
    }

    pub fn quiz_results(&self, quiz_id: &str) -> Result<Vec<QuizResult>> {
        self.list_completed_attempts(quiz_id)?
            .into_iter()
            .map(|completed| {
                let score = self.score(&completed.id)?;
                Ok(QuizResult {
                    completed_quiz_id: completed.id,
                    friend_name: completed.friend_name,
                    score: score as u32,
                })
            })
            .collect()
    }
}
