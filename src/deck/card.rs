use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DeckError;

/// One vocabulary pair. `native` holds the Vietnamese variants (`vi`),
/// `foreign` the English ones (`en`). Any variant on the answer side counts
/// as correct.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardRecord {
    pub id: u32,
    pub native: Vec<String>,
    pub foreign: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl FlashcardRecord {
    pub fn new(id: u32, native: &[&str], foreign: &[&str]) -> Self {
        Self {
            id,
            native: native.iter().map(|s| s.to_string()).collect(),
            foreign: foreign.iter().map(|s| s.to_string()).collect(),
            category: None,
            note: None,
        }
    }

    /// "chó / con chó - dog"
    pub fn label(&self) -> String {
        format!("{} - {}", self.native.join(" / "), self.foreign.join(" / "))
    }
}

/// Parses deck JSON in either of the accepted shapes:
/// `{id, vi, en, desc?, type?}` with string or string-array sides, or
/// `{word, meaning, id?}`. One bad element rejects the whole deck, and ids
/// must be unique across the deck, including the positional ones.
pub fn parse_deck(raw: &str) -> Result<Vec<FlashcardRecord>, DeckError> {
    let root: Value = serde_json::from_str(raw)?;
    let items = root.as_array().ok_or(DeckError::NotAnArray)?;
    if items.is_empty() {
        return Err(DeckError::Empty);
    }

    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let card = parse_card(index, item)?;
            if !seen.insert(card.id) {
                return Err(DeckError::DuplicateId { index, id: card.id });
            }
            Ok(card)
        })
        .collect()
}

fn parse_card(index: usize, item: &Value) -> Result<FlashcardRecord, DeckError> {
    let obj = item
        .as_object()
        .ok_or(DeckError::InvalidField { index, field: "card" })?;

    let category = optional_text(obj.get("type"));
    let note = optional_text(obj.get("desc"));

    if obj.contains_key("word") || obj.contains_key("meaning") {
        let native = variants(index, obj.get("word"), "word")?;
        let foreign = variants(index, obj.get("meaning"), "meaning")?;
        let id = match obj.get("id") {
            Some(v) if is_truthy(v) => card_id(index, v)?,
            _ => index as u32 + 1,
        };
        return Ok(FlashcardRecord {
            id,
            native,
            foreign,
            category,
            note,
        });
    }

    let id = match obj.get("id") {
        Some(v) if is_truthy(v) => card_id(index, v)?,
        _ => return Err(DeckError::MissingField { index, field: "id" }),
    };
    let native = variants(index, obj.get("vi"), "vi")?;
    let foreign = variants(index, obj.get("en"), "en")?;

    Ok(FlashcardRecord {
        id,
        native,
        foreign,
        category,
        note,
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn card_id(index: usize, value: &Value) -> Result<u32, DeckError> {
    let invalid = DeckError::InvalidField { index, field: "id" };
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or(invalid),
        Value::String(s) => s.trim().parse().map_err(|_| invalid),
        _ => Err(invalid),
    }
}

fn variants(
    index: usize,
    value: Option<&Value>,
    field: &'static str,
) -> Result<Vec<String>, DeckError> {
    let value = match value {
        Some(v) if is_truthy(v) => v,
        _ => return Err(DeckError::MissingField { index, field }),
    };

    let list: Vec<String> = match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or(DeckError::InvalidField { index, field })
            })
            .collect::<Result<_, _>>()?,
        _ => return Err(DeckError::InvalidField { index, field }),
    };

    let list: Vec<String> = list
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if list.is_empty() {
        return Err(DeckError::MissingField { index, field });
    }
    Ok(list)
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_topic_shape_with_lists() {
        let raw = r#"[
            {"id": 1, "vi": ["chó", "con chó"], "en": ["dog"], "desc": "pet", "type": "noun"},
            {"id": 2, "vi": ["mèo"], "en": ["cat", "kitty"], "type": "noun"}
        ]"#;
        let cards = parse_deck(raw).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].native, vec!["chó", "con chó"]);
        assert_eq!(cards[0].note.as_deref(), Some("pet"));
        assert_eq!(cards[1].foreign, vec!["cat", "kitty"]);
        assert_eq!(cards[1].category.as_deref(), Some("noun"));
    }

    #[test]
    fn test_parse_upload_shape_with_strings() {
        let raw = r#"[{ "id": 1, "en": "dog", "vi": "con chó" }]"#;
        let cards = parse_deck(raw).unwrap();
        assert_eq!(cards[0], FlashcardRecord::new(1, &["con chó"], &["dog"]));
    }

    #[test]
    fn test_parse_word_meaning_shape_assigns_ids() {
        let raw = r#"[{"word": "nhà", "meaning": "house"}, {"word": "cây", "meaning": "tree"}]"#;
        let cards = parse_deck(raw).unwrap();
        assert_eq!(cards[0].id, 1);
        assert_eq!(cards[1].id, 2);
        assert_eq!(cards[1].foreign, vec!["tree"]);
    }

    #[test]
    fn test_explicit_id_colliding_with_positional_id_is_rejected() {
        let raw = r#"[{"word":"chó","meaning":"dog"},{"id":1,"word":"mèo","meaning":"cat"}]"#;
        let err = parse_deck(raw).unwrap_err();
        assert!(matches!(err, DeckError::DuplicateId { index: 1, id: 1 }));
    }

    #[test]
    fn test_repeated_explicit_id_is_rejected() {
        let raw = r#"[{"id":4,"vi":"chó","en":"dog"},{"id":"4","vi":"mèo","en":"cat"}]"#;
        assert!(matches!(
            parse_deck(raw).unwrap_err(),
            DeckError::DuplicateId { index: 1, id: 4 }
        ));
    }

    #[test]
    fn test_missing_en_rejects_whole_deck() {
        let err = parse_deck(r#"[{"id":1,"vi":"x"}]"#).unwrap_err();
        assert!(matches!(err, DeckError::MissingField { index: 0, field: "en" }));
    }

    #[test]
    fn test_one_bad_card_rejects_everything() {
        let raw = r#"[{"id":1,"vi":"chó","en":"dog"},{"id":2,"vi":"","en":"cat"}]"#;
        let err = parse_deck(raw).unwrap_err();
        assert!(matches!(err, DeckError::MissingField { index: 1, field: "vi" }));
    }

    #[test]
    fn test_zero_id_is_falsy() {
        let err = parse_deck(r#"[{"id":0,"vi":"chó","en":"dog"}]"#).unwrap_err();
        assert!(matches!(err, DeckError::MissingField { field: "id", .. }));
    }

    #[test]
    fn test_not_an_array() {
        assert!(matches!(
            parse_deck(r#"{"id":1}"#).unwrap_err(),
            DeckError::NotAnArray
        ));
    }

    #[test]
    fn test_empty_deck_rejected() {
        assert!(matches!(parse_deck("[]").unwrap_err(), DeckError::Empty));
    }

    #[test]
    fn test_garbage_is_json_error() {
        assert!(matches!(
            parse_deck("not json").unwrap_err(),
            DeckError::Json(_)
        ));
    }

    #[test]
    fn test_non_string_variant_is_invalid() {
        let err = parse_deck(r#"[{"id":1,"vi":[1,2],"en":"dog"}]"#).unwrap_err();
        assert!(matches!(err, DeckError::InvalidField { field: "vi", .. }));
    }

    #[test]
    fn test_label() {
        let card = FlashcardRecord::new(1, &["chó", "con chó"], &["dog"]);
        assert_eq!(card.label(), "chó / con chó - dog");
    }
}
