use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::quiz::QuizSession;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuizResult {
    pub topic: String,
    pub page: usize,
    pub page_size: usize,
    pub correct: usize,
    pub answered: usize,
    pub cards: usize,
    /// NaN never reaches disk: an unanswered round records 0.
    pub percentage: f64,
    pub prompt_mode: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub card_tallies: Vec<CardResult>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CardResult {
    pub id: u32,
    pub label: String,
    pub correct: u32,
    pub wrong: u32,
}

impl QuizResult {
    pub fn from_session(session: &QuizSession, topic: &str) -> Self {
        let percentage = session.percentage();
        let card_tallies = session
            .page_cards()
            .iter()
            .map(|card| {
                let tally = session
                    .tallies()
                    .get(&card.id)
                    .copied()
                    .unwrap_or_default();
                CardResult {
                    id: card.id,
                    label: card.label(),
                    correct: tally.correct,
                    wrong: tally.wrong,
                }
            })
            .collect();

        Self {
            topic: topic.to_string(),
            page: session.page(),
            page_size: session.page_size(),
            correct: session.correct_count(),
            answered: session.total_answered(),
            cards: session.page_cards().len(),
            percentage: if percentage.is_nan() { 0.0 } else { percentage },
            prompt_mode: session.prompt_mode().as_str().to_string(),
            timestamp: Utc::now(),
            card_tallies,
        }
    }

    pub fn skipped(&self) -> usize {
        self.cards.saturating_sub(self.answered)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::deck::FlashcardRecord;
    use crate::session::quiz::PromptMode;

    #[test]
    fn test_result_from_finished_round() {
        let mut session = QuizSession::new(3, PromptMode::Native, SmallRng::seed_from_u64(1));
        session
            .load_pool(vec![
                FlashcardRecord::new(1, &["chó"], &["dog"]),
                FlashcardRecord::new(2, &["mèo"], &["cat"]),
                FlashcardRecord::new(3, &["gà"], &["chicken"]),
            ])
            .unwrap();

        session.advance();
        let right = session.expected_answers().unwrap()[0].clone();
        session.submit_answer(&right);
        session.advance();
        session.submit_answer("nope");
        session.advance();
        session.advance();
        assert!(session.is_finished());

        let result = QuizResult::from_session(&session, "Animals");
        assert_eq!(result.topic, "Animals");
        assert_eq!(result.correct, 1);
        assert_eq!(result.answered, 2);
        assert_eq!(result.cards, 3);
        assert_eq!(result.skipped(), 1);
        assert!((result.percentage - 50.0).abs() < 1e-9);
        assert_eq!(result.card_tallies.len(), 3);
        assert_eq!(result.card_tallies.iter().map(|c| c.correct).sum::<u32>(), 1);
        assert_eq!(result.card_tallies.iter().map(|c| c.wrong).sum::<u32>(), 1);
    }

    #[test]
    fn test_unanswered_round_records_zero() {
        let mut session = QuizSession::new(2, PromptMode::Native, SmallRng::seed_from_u64(1));
        session
            .load_pool(vec![FlashcardRecord::new(1, &["chó"], &["dog"])])
            .unwrap();
        let result = QuizResult::from_session(&session, "x");
        assert_eq!(result.percentage, 0.0);
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("NaN"));
    }
}
