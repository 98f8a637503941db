pub mod answer;
pub mod api;
pub mod question;

pub use answer::{AnswerError, AnswerSet};
pub use question::{LoadError, Question, QuestionBank, QUIZ_LENGTH};
