use serde::{Deserialize, Serialize};

use crate::error::DeckError;

/// Manifest entry pointing at a topic's deck.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: u32,
    pub name: String,
    pub url: String,
}

pub fn parse_manifest(raw: &str) -> Result<Vec<Topic>, DeckError> {
    let topics: Vec<Topic> = serde_json::from_str(raw)?;
    for (index, topic) in topics.iter().enumerate() {
        if topic.url.trim().is_empty() {
            return Err(DeckError::MissingField { index, field: "url" });
        }
    }
    Ok(topics)
}
