use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The answer options selected for one question, by index into
/// `Question::answers`.
///
/// Serializes as a JSON array in ascending order with no duplicates, which is
/// also how it is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeSet<u32>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, index: u32) -> bool {
        self.0.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowest selected index; the sole selection for single-choice questions.
    pub fn first(&self) -> Option<u32> {
        self.0.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u32> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("no question with index {0}")]
    UnknownQuestion(usize),

    #[error("question {question} has no option {option:?}")]
    UnknownOption { question: usize, option: String },

    #[error("question {question} has no option with index {option}")]
    OptionOutOfRange { question: usize, option: u32 },

    #[error("you must either submit an answer or skip the question")]
    Empty,

    #[error("question {0} takes a single answer")]
    SingleChoice(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_is_sorted_and_deduplicated() {
        let answers: AnswerSet = [3, 1, 3, 0].into_iter().collect();
        assert_eq!(serde_json::to_string(&answers).unwrap(), "[0,1,3]");
        assert_eq!(answers.first(), Some(0));
    }

    #[test]
    fn test_decoding_ignores_stored_order() {
        let a: AnswerSet = serde_json::from_str("[2,0]").unwrap();
        let b: AnswerSet = serde_json::from_str("[0,2]").unwrap();
        assert_eq!(a, b);
        assert!(a.contains(2));
        assert!(!a.contains(1));
    }
}
