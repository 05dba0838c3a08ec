use serde::{Deserialize, Serialize};

use crate::session::result::QuizResult;

pub const SCHEMA_VERSION: u32 = 1;
pub const MAX_HISTORY: usize = 500;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuizHistoryData {
    pub schema_version: u32,
    pub results: Vec<QuizResult>,
}

impl Default for QuizHistoryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            results: Vec::new(),
        }
    }
}

impl QuizHistoryData {
    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }

    /// Appends a result, dropping the oldest past the cap.
    pub fn push(&mut self, result: QuizResult) {
        self.results.push(result);
        if self.results.len() > MAX_HISTORY {
            let excess = self.results.len() - MAX_HISTORY;
            self.results.drain(..excess);
        }
    }

    /// Best percentage recorded for a topic.
    pub fn best_for(&self, topic: &str) -> Option<f64> {
        self.results
            .iter()
            .filter(|r| r.topic == topic && r.answered > 0)
            .map(|r| r.percentage)
            .reduce(f64::max)
    }
}
