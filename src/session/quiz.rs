use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::deck::card::{FlashcardRecord, parse_deck};
use crate::error::{DeckError, QuizError};
use crate::session::answer;
use crate::session::shuffle::{sample, shuffle};

/// Which side of a card is asked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Show Vietnamese, answer in English.
    Native,
    /// Show English, answer in Vietnamese.
    Foreign,
    /// Flip a coin for every card.
    #[default]
    Random,
}

impl PromptMode {
    pub const ALL: [PromptMode; 3] = [PromptMode::Native, PromptMode::Foreign, PromptMode::Random];

    pub fn as_str(self) -> &'static str {
        match self {
            PromptMode::Native => "native",
            PromptMode::Foreign => "foreign",
            PromptMode::Random => "random",
        }
    }

    pub fn next(self) -> Self {
        match self {
            PromptMode::Native => PromptMode::Foreign,
            PromptMode::Foreign => PromptMode::Random,
            PromptMode::Random => PromptMode::Native,
        }
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "vi" => Ok(PromptMode::Native),
            "foreign" | "en" => Ok(PromptMode::Foreign),
            "random" => Ok(PromptMode::Random),
            other => Err(format!("unknown prompt mode '{other}'")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptSide {
    Native,
    Foreign,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    Completed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    /// False when the card had already been answered and nothing was scored.
    pub counted: bool,
    pub expected: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardTally {
    pub correct: u32,
    pub wrong: u32,
}

/// Quiz state machine over a pool of cards split into pages.
///
/// Each page is one round: its cards are drawn in shuffled order from
/// `remaining`, every card scores at most once, and the round is complete
/// once the last card has been drawn. Callers drive it only through the
/// transition methods.
pub struct QuizSession {
    pool: Vec<FlashcardRecord>,
    page: usize,
    page_size: usize,
    remaining: VecDeque<usize>,
    current: Option<usize>,
    answered: HashMap<usize, bool>,
    correct: usize,
    total_answered: usize,
    completed: bool,
    prompt_mode: PromptMode,
    side: PromptSide,
    error: Option<String>,
    tallies: HashMap<u32, CardTally>,
    rng: SmallRng,
}

impl QuizSession {
    pub fn new(page_size: usize, prompt_mode: PromptMode, rng: SmallRng) -> Self {
        let mut session = Self {
            pool: Vec::new(),
            page: 1,
            page_size: page_size.max(1),
            remaining: VecDeque::new(),
            current: None,
            answered: HashMap::new(),
            correct: 0,
            total_answered: 0,
            completed: false,
            prompt_mode,
            side: PromptSide::Native,
            error: None,
            tallies: HashMap::new(),
            rng,
        };
        session.roll_side();
        session
    }

    /// Validates and loads raw deck JSON. On failure the current pool is
    /// kept and the error is recorded for display.
    pub fn load_json(&mut self, raw: &str) -> Result<(), DeckError> {
        match parse_deck(raw) {
            Ok(cards) => self.load_pool(cards),
            Err(e) => {
                tracing::warn!(error = %e, "rejected deck");
                self.error = Some(format!("Invalid deck: {e}"));
                Err(e)
            }
        }
    }

    pub fn load_pool(&mut self, cards: Vec<FlashcardRecord>) -> Result<(), DeckError> {
        if cards.is_empty() {
            self.error = Some(format!("Invalid deck: {}", DeckError::Empty));
            return Err(DeckError::Empty);
        }

        self.pool = sample(&cards, &mut self.rng);
        self.page = 1;
        self.tallies.clear();
        self.error = None;
        self.reset_page();
        tracing::info!(
            cards = self.pool.len(),
            page_size = self.page_size,
            "loaded deck"
        );
        Ok(())
    }

    pub fn change_page(&mut self, page: usize) -> Result<(), QuizError> {
        if self.pool.is_empty() {
            return Err(QuizError::NoDeck);
        }
        let max = self.page_count();
        if page < 1 || page > max {
            return Err(QuizError::PageOutOfRange { page, max });
        }
        self.page = page;
        self.reset_page();
        tracing::debug!(page, "changed page");
        Ok(())
    }

    pub fn change_page_size(&mut self, size: usize) -> Result<(), QuizError> {
        if size == 0 {
            return Err(QuizError::InvalidPageSize);
        }
        self.page_size = size;
        self.page = 1;
        if !self.pool.is_empty() {
            self.reset_page();
        }
        tracing::debug!(size, "changed page size");
        Ok(())
    }

    /// Scores the first answer given for the current card. Repeat
    /// submissions echo the recorded outcome without scoring again.
    pub fn submit_answer(&mut self, candidate: &str) -> Option<AnswerFeedback> {
        let idx = self.current?;
        let expected = self.expected_answers()?.to_vec();

        if let Some(&correct) = self.answered.get(&idx) {
            return Some(AnswerFeedback {
                correct,
                counted: false,
                expected,
            });
        }

        let correct = answer::is_correct(candidate, &expected);
        self.answered.insert(idx, correct);
        self.total_answered += 1;
        if correct {
            self.correct += 1;
        }

        let id = self.page_cards()[idx].id;
        let tally = self.tallies.entry(id).or_default();
        if correct {
            tally.correct += 1;
        } else {
            tally.wrong += 1;
        }
        tracing::debug!(card = id, correct, "answer submitted");

        Some(AnswerFeedback {
            correct,
            counted: true,
            expected,
        })
    }

    /// Draws the next card. Drawing the last card marks the round complete;
    /// advancing past it clears the current card.
    pub fn advance(&mut self) -> Option<&FlashcardRecord> {
        if self.pool.is_empty() {
            return None;
        }
        match self.remaining.pop_front() {
            Some(idx) => {
                self.current = Some(idx);
                if self.prompt_mode == PromptMode::Random {
                    self.roll_side();
                }
                if self.remaining.is_empty() {
                    self.completed = true;
                }
            }
            None => {
                self.current = None;
                self.completed = true;
            }
        }
        self.current_card()
    }

    /// Replays the current page with a fresh order and a fresh score.
    pub fn retake(&mut self) {
        if self.pool.is_empty() {
            return;
        }
        self.reset_page();
        tracing::debug!(page = self.page, "retake");
    }

    pub fn set_prompt_mode(&mut self, mode: PromptMode) {
        self.prompt_mode = mode;
        self.roll_side();
    }

    pub fn report_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn reset_page(&mut self) {
        let len = self.page_cards().len();
        self.remaining = shuffle(len, &mut self.rng).into();
        self.current = None;
        self.answered.clear();
        self.correct = 0;
        self.total_answered = 0;
        self.completed = false;
        self.roll_side();
    }

    fn roll_side(&mut self) {
        self.side = match self.prompt_mode {
            PromptMode::Native => PromptSide::Native,
            PromptMode::Foreign => PromptSide::Foreign,
            PromptMode::Random => {
                if self.rng.gen_bool(0.5) {
                    PromptSide::Native
                } else {
                    PromptSide::Foreign
                }
            }
        };
    }

    pub fn phase(&self) -> Phase {
        if self.pool.is_empty() {
            Phase::Idle
        } else if self.completed {
            Phase::Completed
        } else {
            Phase::Active
        }
    }

    /// Complete and moved past the last card: time for results.
    pub fn is_finished(&self) -> bool {
        self.completed && self.current.is_none()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn pool(&self) -> &[FlashcardRecord] {
        &self.pool
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.pool.len().div_ceil(self.page_size)
    }

    pub fn page_cards(&self) -> &[FlashcardRecord] {
        let start = ((self.page - 1) * self.page_size).min(self.pool.len());
        let end = (start + self.page_size).min(self.pool.len());
        &self.pool[start..end]
    }

    pub fn remaining_len(&self) -> usize {
        self.remaining.len()
    }

    pub fn remaining_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.remaining.iter().copied()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_card(&self) -> Option<&FlashcardRecord> {
        self.page_cards().get(self.current?)
    }

    /// Outcome already recorded for the current card, if any.
    pub fn current_outcome(&self) -> Option<bool> {
        self.answered.get(&self.current?).copied()
    }

    pub fn prompt_side(&self) -> PromptSide {
        self.side
    }

    pub fn prompt_mode(&self) -> PromptMode {
        self.prompt_mode
    }

    /// Primary variant of the asked side.
    pub fn prompt(&self) -> Option<&str> {
        let card = self.current_card()?;
        let side = match self.side {
            PromptSide::Native => &card.native,
            PromptSide::Foreign => &card.foreign,
        };
        side.first().map(String::as_str)
    }

    pub fn expected_answers(&self) -> Option<&[String]> {
        let card = self.current_card()?;
        Some(match self.side {
            PromptSide::Native => &card.foreign,
            PromptSide::Foreign => &card.native,
        })
    }

    pub fn correct_count(&self) -> usize {
        self.correct
    }

    pub fn total_answered(&self) -> usize {
        self.total_answered
    }

    /// Share of answered cards that were right, NaN before any answer.
    pub fn percentage(&self) -> f64 {
        crate::engine::scoring::percentage(self.correct, self.total_answered)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn tallies(&self) -> &HashMap<u32, CardTally> {
        &self.tallies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn make_session(page_size: usize, mode: PromptMode) -> QuizSession {
        QuizSession::new(page_size, mode, SmallRng::seed_from_u64(3))
    }

    fn make_pool(n: u32) -> Vec<FlashcardRecord> {
        (1..=n)
            .map(|i| {
                let native = format!("từ {i}");
                let foreign = format!("word {i}");
                FlashcardRecord::new(i, &[&native], &[&foreign])
            })
            .collect()
    }

    fn pets() -> Vec<FlashcardRecord> {
        vec![
            FlashcardRecord::new(1, &["chó"], &["dog"]),
            FlashcardRecord::new(2, &["mèo"], &["cat"]),
        ]
    }

    #[test]
    fn test_new_session_is_idle() {
        let mut session = make_session(10, PromptMode::Random);
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.advance().is_none());
        assert!(session.submit_answer("dog").is_none());
        assert_eq!(session.page_count(), 0);
    }

    #[test]
    fn test_load_sizes_order_to_page() {
        let mut session = make_session(4, PromptMode::Native);
        session.load_pool(make_pool(10)).unwrap();
        assert_eq!(session.remaining_len(), 4);
        assert!(!session.is_completed());
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(session.current_index(), None);
        assert_eq!(session.page_count(), 3);

        let mut small = make_session(10, PromptMode::Native);
        small.load_pool(make_pool(3)).unwrap();
        assert_eq!(small.remaining_len(), 3);
    }

    #[test]
    fn test_load_keeps_every_card() {
        let mut session = make_session(5, PromptMode::Native);
        session.load_pool(make_pool(12)).unwrap();
        let mut ids: Vec<u32> = session.pool().iter().map(|c| c.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn test_remaining_order_is_page_permutation() {
        let mut session = make_session(6, PromptMode::Native);
        session.load_pool(make_pool(6)).unwrap();
        let mut order: Vec<usize> = session.remaining_order().collect();
        order.sort_unstable();
        assert_eq!(order, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn test_two_cards_two_advances_completes() {
        let mut session = make_session(2, PromptMode::Native);
        session.load_pool(pets()).unwrap();

        session.advance();
        assert!(!session.is_completed());
        session.advance();
        assert!(session.is_completed());
        assert_eq!(session.phase(), Phase::Completed);
        // Last card is still on screen and answerable
        assert!(session.current_card().is_some());
        assert!(!session.is_finished());

        session.advance();
        assert!(session.current_card().is_none());
        assert!(session.is_finished());
    }

    #[test]
    fn test_native_prompt_expects_foreign_answer() {
        let mut session = make_session(2, PromptMode::Native);
        session.load_pool(pets()).unwrap();
        loop {
            session.advance();
            if session.prompt() == Some("chó") {
                break;
            }
        }
        let feedback = session.submit_answer("dog").unwrap();
        assert!(feedback.correct);
        assert!(feedback.counted);
        assert_eq!(session.correct_count(), 1);
    }

    #[test]
    fn test_foreign_prompt_expects_native_answer() {
        let mut session = make_session(2, PromptMode::Foreign);
        session.load_pool(pets()).unwrap();
        session.advance();
        let expected = session.expected_answers().unwrap().to_vec();
        let prompt = session.prompt().unwrap().to_string();
        assert!(prompt == "dog" || prompt == "cat");
        assert!(expected == vec!["chó"] || expected == vec!["mèo"]);
        assert!(session.submit_answer(&expected[0]).unwrap().correct);
    }

    #[test]
    fn test_second_submission_is_not_counted() {
        let mut session = make_session(2, PromptMode::Native);
        session.load_pool(pets()).unwrap();
        session.advance();

        let first = session.submit_answer("wrong").unwrap();
        assert!(!first.correct);
        assert!(first.counted);
        let expected = first.expected[0].clone();
        let second = session.submit_answer(&expected).unwrap();
        assert!(!second.counted);
        assert!(!second.correct);

        assert_eq!(session.total_answered(), 1);
        assert_eq!(session.correct_count(), 0);
        assert_eq!(session.current_outcome(), Some(false));
    }

    #[test]
    fn test_total_answered_never_exceeds_page_size() {
        let mut session = make_session(3, PromptMode::Random);
        session.load_pool(make_pool(7)).unwrap();
        for _ in 0..10 {
            session.advance();
            session.submit_answer("x");
            session.submit_answer("y");
        }
        assert_eq!(session.total_answered(), 3);
        assert!(session.total_answered() <= session.page_size());
    }

    #[test]
    fn test_percentage() {
        let mut session = make_session(2, PromptMode::Native);
        session.load_pool(pets()).unwrap();
        assert!(session.percentage().is_nan());

        session.advance();
        let right = session.expected_answers().unwrap()[0].clone();
        session.submit_answer(&right);
        session.advance();
        session.submit_answer("nope");
        assert!((session.percentage() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_json_keeps_pool_and_sets_error() {
        let mut session = make_session(2, PromptMode::Native);
        session.load_pool(pets()).unwrap();
        let before: Vec<u32> = session.pool().iter().map(|c| c.id).collect();

        let result = session.load_json(r#"[{"id":1,"vi":"x"}]"#);
        assert!(result.is_err());
        let after: Vec<u32> = session.pool().iter().map(|c| c.id).collect();
        assert_eq!(before, after);
        assert!(session.error().unwrap().contains("en"));
    }

    #[test]
    fn test_mixed_deck_with_clashing_ids_is_rejected() {
        let mut session = make_session(2, PromptMode::Native);
        session.load_pool(pets()).unwrap();

        let raw = r#"[{"word":"nhà","meaning":"house"},{"id":1,"word":"cây","meaning":"tree"}]"#;
        assert!(matches!(
            session.load_json(raw),
            Err(DeckError::DuplicateId { id: 1, .. })
        ));
        assert_eq!(session.pool(), pets().as_slice());
        assert!(session.error().unwrap().contains("reuses id 1"));
    }

    #[test]
    fn test_malformed_json_on_idle_session_stays_idle() {
        let mut session = make_session(2, PromptMode::Native);
        assert!(session.load_json("{}").is_err());
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.error().is_some());
    }

    #[test]
    fn test_good_load_clears_error() {
        let mut session = make_session(2, PromptMode::Native);
        let _ = session.load_json("nope");
        session
            .load_json(r#"[{"id":1,"vi":"chó","en":"dog"}]"#)
            .unwrap();
        assert!(session.error().is_none());
        assert_eq!(session.pool().len(), 1);
    }

    #[test]
    fn test_change_page_sizes_order_to_short_last_page() {
        let mut session = make_session(4, PromptMode::Native);
        session.load_pool(make_pool(10)).unwrap();
        session.advance();
        session.submit_answer("x");

        session.change_page(3).unwrap();
        assert_eq!(session.page(), 3);
        assert_eq!(session.page_cards().len(), 2);
        assert_eq!(session.remaining_len(), 2);
        assert_eq!(session.total_answered(), 0);
        assert!(!session.is_completed());
        assert!(session.current_card().is_none());
    }

    #[test]
    fn test_change_page_out_of_range() {
        let mut session = make_session(4, PromptMode::Native);
        assert_eq!(session.change_page(1), Err(QuizError::NoDeck));
        session.load_pool(make_pool(10)).unwrap();
        assert_eq!(
            session.change_page(4),
            Err(QuizError::PageOutOfRange { page: 4, max: 3 })
        );
        assert_eq!(
            session.change_page(0),
            Err(QuizError::PageOutOfRange { page: 0, max: 3 })
        );
        assert_eq!(session.page(), 1);
    }

    #[test]
    fn test_change_page_size_resets_to_first_page() {
        let mut session = make_session(4, PromptMode::Native);
        session.load_pool(make_pool(10)).unwrap();
        session.change_page(2).unwrap();

        session.change_page_size(6).unwrap();
        assert_eq!(session.page(), 1);
        assert_eq!(session.remaining_len(), 6);
        assert_eq!(session.page_count(), 2);
        assert_eq!(session.change_page_size(0), Err(QuizError::InvalidPageSize));
        assert_eq!(session.page_size(), 6);
    }

    #[test]
    fn test_retake_resets_score_but_keeps_tallies() {
        let mut session = make_session(2, PromptMode::Native);
        session.load_pool(pets()).unwrap();
        while !session.is_finished() {
            session.advance();
            session.submit_answer("wrong");
        }
        assert_eq!(session.total_answered(), 2);

        session.retake();
        assert!(!session.is_completed());
        assert_eq!(session.total_answered(), 0);
        assert_eq!(session.correct_count(), 0);
        assert_eq!(session.remaining_len(), 2);
        assert_eq!(session.tallies().values().map(|t| t.wrong).sum::<u32>(), 2);

        // Cards can be scored again after a retake
        session.advance();
        assert!(session.submit_answer("wrong").unwrap().counted);
    }

    #[test]
    fn test_random_mode_uses_both_sides() {
        let mut session = make_session(40, PromptMode::Random);
        session.load_pool(make_pool(40)).unwrap();
        let mut native = 0;
        let mut foreign = 0;
        while session.advance().is_some() {
            match session.prompt_side() {
                PromptSide::Native => native += 1,
                PromptSide::Foreign => foreign += 1,
            }
        }
        assert!(native > 0 && foreign > 0);
    }

    #[test]
    fn test_prompt_mode_parse() {
        assert_eq!("Native".parse::<PromptMode>(), Ok(PromptMode::Native));
        assert_eq!("en".parse::<PromptMode>(), Ok(PromptMode::Foreign));
        assert!("sideways".parse::<PromptMode>().is_err());
        assert_eq!(PromptMode::Random.next(), PromptMode::Native);
    }
}
