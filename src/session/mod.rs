pub mod answer;
pub mod quiz;
pub mod result;
pub mod shuffle;

pub use quiz::{AnswerFeedback, CardTally, Phase, PromptMode, PromptSide, QuizSession};
