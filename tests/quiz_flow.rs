use std::cell::Cell;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tempfile::TempDir;

use vocabr::app::{App, AppScreen};
use vocabr::config::Config;
use vocabr::deck::FlashcardRecord;
use vocabr::deck::cache::{ExpiringCache, ManualClock};
use vocabr::deck::loader::{self, deck_key};
use vocabr::engine::encouragement;
use vocabr::error::FetchError;
use vocabr::session::quiz::{Phase, PromptMode, QuizSession};
use vocabr::session::shuffle::{sample, shuffle};
use vocabr::store::json_store::JsonStore;
use vocabr::store::{KvStore, MemoryStore};

const T0: i64 = 1_700_000_000_000;

fn two_card_session() -> QuizSession {
    let mut session = QuizSession::new(2, PromptMode::Native, SmallRng::seed_from_u64(3));
    session
        .load_json(r#"[{"id":1,"vi":"chó","en":"dog"},{"id":2,"vi":"mèo","en":"cat"}]"#)
        .unwrap();
    session
}

proptest! {
    #[test]
    fn shuffle_is_a_permutation(n in 0usize..300, seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut order = shuffle(n, &mut rng);
        order.sort_unstable();
        prop_assert_eq!(order, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn sample_keeps_every_card(ids in proptest::collection::vec(any::<u32>(), 0..100), seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut sampled = sample(&ids, &mut rng);
        let mut expected = ids.clone();
        sampled.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(sampled, expected);
    }

    #[test]
    fn remaining_after_load_is_min_of_page_and_pool(pool in 1u32..40, page_size in 1usize..25) {
        let cards: Vec<FlashcardRecord> = (1..=pool)
            .map(|i| FlashcardRecord::new(i, &["a"], &["b"]))
            .collect();
        let mut session = QuizSession::new(page_size, PromptMode::Random, SmallRng::seed_from_u64(1));
        session.load_pool(cards).unwrap();
        prop_assert_eq!(session.remaining_len(), page_size.min(pool as usize));
        prop_assert!(!session.is_completed());
    }
}

#[test]
fn cache_refetches_only_after_ttl() {
    let clock = Arc::new(ManualClock::new(T0));
    let cache = ExpiringCache::with_clock(Arc::new(MemoryStore::new()), clock.clone());
    let ttl = Duration::from_millis(1_000);
    let calls = Cell::new(0);
    let fetch = || {
        calls.set(calls.get() + 1);
        Ok::<_, FetchError>(vec![calls.get()])
    };

    assert_eq!(cache.get("topics", ttl, fetch).unwrap(), vec![1]);
    clock.set(T0 + 999);
    assert_eq!(cache.get("topics", ttl, fetch).unwrap(), vec![1]);
    assert_eq!(calls.get(), 1);

    clock.set(T0 + 1_001);
    assert_eq!(cache.get("topics", ttl, fetch).unwrap(), vec![2]);
    assert_eq!(calls.get(), 2);
}

#[test]
fn two_advances_complete_a_two_card_page() {
    let mut session = two_card_session();
    assert_eq!(session.phase(), Phase::Active);

    let mut saw_dog_card = false;
    for _ in 0..2 {
        session.advance();
        if session.prompt() == Some("chó") {
            saw_dog_card = true;
            assert!(session.submit_answer("dog").unwrap().correct);
        }
    }
    assert!(saw_dog_card);
    assert!(session.is_completed());
    assert_eq!(session.phase(), Phase::Completed);
}

#[test]
fn second_submission_does_not_count() {
    let mut session = two_card_session();
    session.advance();
    session.submit_answer("wrong");
    let again = session.submit_answer("dog").unwrap();
    assert!(!again.counted);
    assert_eq!(session.total_answered(), 1);
}

#[test]
fn malformed_upload_is_rejected_without_touching_pool() {
    let mut session = two_card_session();
    let before: Vec<u32> = session.pool().iter().map(|c| c.id).collect();

    assert!(session.load_json(r#"[{"id":1,"vi":"x"}]"#).is_err());
    let after: Vec<u32> = session.pool().iter().map(|c| c.id).collect();
    assert_eq!(before, after);
    assert!(session.error().is_some());
}

#[test]
fn perfect_score_picks_from_top_bucket() {
    let top = encouragement::bucket_messages(100).unwrap();
    let mut rng = SmallRng::seed_from_u64(11);
    for _ in 0..50 {
        assert!(top.contains(&encouragement::select(100.0, &mut rng)));
    }
}

#[test]
fn stale_deck_survives_a_failed_refresh_on_disk() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn KvStore> = Arc::new(JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap());
    let clock = Arc::new(ManualClock::new(T0));
    let cache = ExpiringCache::with_clock(store, clock.clone());

    let deck_path = dir.path().join("verbs.json");
    fs::write(&deck_path, r#"[{"word":"ăn","meaning":"eat"}]"#).unwrap();
    let url = deck_path.display().to_string();

    let first = loader::load_topic_cards(&cache, &url, Duration::from_secs(60)).unwrap();
    assert_eq!(first.value[0].foreign, vec!["eat".to_string()]);
    assert!(first.warning.is_none());

    fs::remove_file(&deck_path).unwrap();
    clock.advance(Duration::from_secs(61));
    let second = loader::load_topic_cards(&cache, &url, Duration::from_secs(60)).unwrap();
    assert_eq!(second.value[0].native, vec!["ăn".to_string()]);
    assert!(second.warning.is_some());
    assert!(cache.store().get(&deck_key(&url)).is_some());
}

#[test]
fn app_plays_a_bundled_topic_end_to_end() {
    let cache = ExpiringCache::with_clock(Arc::new(MemoryStore::new()), Arc::new(ManualClock::new(T0)));
    let config = Config {
        page_size: 3,
        prompt_mode: PromptMode::Foreign,
        ..Config::default()
    };
    let mut app = App::with_cache(config, cache, SmallRng::seed_from_u64(5));

    app.request_topics();
    let index = app.topics.iter().position(|t| t.name == "Colors").unwrap();
    app.topic_selected = index;
    app.load_selected_topic();
    assert_eq!(app.screen, AppScreen::Quiz);
    assert_eq!(app.active_topic.as_deref(), Some("Colors"));

    // Skip every card without answering.
    while app.screen == AppScreen::Quiz {
        app.next_card();
    }
    assert_eq!(app.screen, AppScreen::Result);
    let result = app.last_result.as_ref().unwrap();
    assert_eq!(result.answered, 0);
    assert_eq!(result.skipped(), 3);
    assert_eq!(result.percentage, 0.0);
    assert_eq!(app.encouragement, encouragement::INTRO_MESSAGE);

    app.next_page();
    assert_eq!(app.session.page(), 2);
    assert_eq!(app.screen, AppScreen::Quiz);
}
