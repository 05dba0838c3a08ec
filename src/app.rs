use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::{Config, MAX_PAGE_SIZE, MIN_PAGE_SIZE};
use crate::deck::cache::ExpiringCache;
use crate::deck::loader::{self, Loaded, UPLOADED_DECK_KEY};
use crate::deck::source;
use crate::deck::{FlashcardRecord, Topic};
use crate::engine::encouragement::{self, INTRO_MESSAGE};
use crate::error::FetchError;
use crate::event::AppEvent;
use crate::session::quiz::{AnswerFeedback, QuizSession};
use crate::session::result::QuizResult;
use crate::store::json_store::JsonStore;
use crate::store::schema::QuizHistoryData;
use crate::store::{KvStore, MemoryStore};
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

pub const UPLOADED_TOPIC: &str = "Uploaded deck";

/// The config as read from disk. Edits made in the app are mirrored here
/// and written back on quit, so one-run CLI overrides never reach the file.
struct SavedConfig {
    config: Config,
    path: PathBuf,
    dirty: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    TopicSelect,
    Quiz,
    Result,
    DeckPath,
}

pub struct App {
    pub screen: AppScreen,
    pub theme: &'static Theme,
    pub config: Config,
    pub session: QuizSession,
    pub topics: Vec<Topic>,
    pub topic_selected: usize,
    pub topics_loading: bool,
    /// Topic whose deck is being fetched.
    pub pending_topic: Option<Topic>,
    /// Name the current pool is recorded under in history.
    pub active_topic: Option<String>,
    pub answer_input: LineInput,
    pub path_input: LineInput,
    pub last_feedback: Option<AnswerFeedback>,
    pub last_result: Option<QuizResult>,
    pub encouragement: &'static str,
    pub history: QuizHistoryData,
    /// Non-fatal notice, e.g. stale data served after a failed refresh.
    pub notice: Option<String>,
    pub should_quit: bool,
    store: Option<Arc<JsonStore>>,
    saved_config: Option<SavedConfig>,
    cache: ExpiringCache,
    generation: u64,
    events: Option<Sender<AppEvent>>,
    rng: SmallRng,
}

impl App {
    pub fn new(config: Config, persist: bool) -> Self {
        let store = if persist {
            match JsonStore::new() {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    tracing::warn!(error = %e, "data directory unavailable, running in memory");
                    None
                }
            }
        } else {
            None
        };
        let kv: Arc<dyn KvStore> = match &store {
            Some(s) => Arc::clone(s) as Arc<dyn KvStore>,
            None => Arc::new(MemoryStore::new()),
        };
        let history = store.as_ref().map(|s| s.load_history()).unwrap_or_default();

        Self::assemble(config, store, ExpiringCache::new(kv), history, SmallRng::from_entropy())
    }

    /// App over an injected cache and no history file.
    pub fn with_cache(config: Config, cache: ExpiringCache, rng: SmallRng) -> Self {
        Self::assemble(config, None, cache, QuizHistoryData::default(), rng)
    }

    fn assemble(
        config: Config,
        store: Option<Arc<JsonStore>>,
        cache: ExpiringCache,
        history: QuizHistoryData,
        mut rng: SmallRng,
    ) -> Self {
        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));
        let session_rng = SmallRng::from_rng(&mut rng).unwrap_or_else(|_| SmallRng::seed_from_u64(0));
        let session = QuizSession::new(config.page_size, config.prompt_mode, session_rng);

        Self {
            screen: AppScreen::TopicSelect,
            theme,
            config,
            session,
            topics: Vec::new(),
            topic_selected: 0,
            topics_loading: false,
            pending_topic: None,
            active_topic: None,
            answer_input: LineInput::new(""),
            path_input: LineInput::for_paths(""),
            last_feedback: None,
            last_result: None,
            encouragement: INTRO_MESSAGE,
            history,
            notice: None,
            should_quit: false,
            store,
            saved_config: None,
            cache,
            generation: 0,
            events: None,
            rng,
        }
    }

    /// Loads run on worker threads and report back through `events`. Without
    /// a sender they run inline.
    pub fn attach_events(&mut self, events: Sender<AppEvent>) {
        self.events = Some(events);
    }

    /// Enables saving page size and prompt mode edits back to `path`.
    /// `on_disk` must be the config exactly as loaded, before CLI overrides.
    /// Without this call nothing is ever saved.
    pub fn persist_config_to(&mut self, on_disk: Config, path: PathBuf) {
        self.saved_config = Some(SavedConfig {
            config: on_disk,
            path,
            dirty: false,
        });
    }

    fn edit_saved_config(&mut self, edit: impl FnOnce(&mut Config)) {
        if let Some(saved) = &mut self.saved_config {
            edit(&mut saved.config);
            saved.dirty = true;
        }
    }

    pub fn cache(&self) -> &ExpiringCache {
        &self.cache
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.config.theme = theme.name.clone();
        self.theme = Box::leak(Box::new(theme));
    }

    // --- topics ---

    pub fn request_topics(&mut self) {
        self.topics_loading = true;
        let cache = self.cache.clone();
        let url = self.config.topics_url.clone();
        let ttl = self.config.cache_ttl();

        match &self.events {
            Some(tx) => {
                let tx = tx.clone();
                thread::spawn(move || {
                    let result = loader::load_topics(&cache, &url, ttl);
                    let _ = tx.send(AppEvent::TopicsLoaded(result));
                });
            }
            None => {
                let result = loader::load_topics(&cache, &url, ttl);
                self.apply_topics_loaded(result);
            }
        }
    }

    pub fn apply_topics_loaded(&mut self, result: Result<Loaded<Vec<Topic>>, FetchError>) {
        self.topics_loading = false;
        match result {
            Ok(loaded) => {
                tracing::info!(count = loaded.value.len(), "topics ready");
                self.topics = loaded.value;
                self.topic_selected = self.topic_selected.min(self.topics.len().saturating_sub(1));
                self.notice = loaded.warning;
            }
            Err(e) => self.session.report_error(format!("Failed to fetch topics: {e}")),
        }
    }

    pub fn topic_next(&mut self) {
        if !self.topics.is_empty() {
            self.topic_selected = (self.topic_selected + 1) % self.topics.len();
        }
    }

    pub fn topic_prev(&mut self) {
        if !self.topics.is_empty() {
            self.topic_selected = self
                .topic_selected
                .checked_sub(1)
                .unwrap_or(self.topics.len() - 1);
        }
    }

    pub fn load_selected_topic(&mut self) {
        if let Some(topic) = self.topics.get(self.topic_selected).cloned() {
            self.load_topic(topic);
        }
    }

    /// Fetches a topic's deck. Only the newest request may replace the pool.
    pub fn load_topic(&mut self, topic: Topic) {
        let generation = self.next_generation();
        tracing::info!(topic = %topic.name, generation, "loading topic");
        self.pending_topic = Some(topic.clone());
        self.session.clear_error();

        let cache = self.cache.clone();
        let ttl = self.config.cache_ttl();

        match &self.events {
            Some(tx) => {
                let tx = tx.clone();
                thread::spawn(move || {
                    let result = loader::load_topic_cards(&cache, &topic.url, ttl);
                    let _ = tx.send(AppEvent::DeckLoaded {
                        generation,
                        topic,
                        result,
                    });
                });
            }
            None => {
                let result = loader::load_topic_cards(&cache, &topic.url, ttl);
                self.apply_deck_loaded(generation, topic, result);
            }
        }
    }

    /// Returns whether the response was applied.
    pub fn apply_deck_loaded(
        &mut self,
        generation: u64,
        topic: Topic,
        result: Result<Loaded<Vec<FlashcardRecord>>, FetchError>,
    ) -> bool {
        if generation != self.generation {
            tracing::debug!(
                topic = %topic.name,
                generation,
                latest = self.generation,
                "dropping stale deck response"
            );
            return false;
        }
        self.pending_topic = None;

        match result {
            Ok(loaded) => {
                if self.session.load_pool(loaded.value).is_ok() {
                    self.active_topic = Some(topic.name);
                    self.notice = loaded.warning;
                    self.start_round();
                }
            }
            Err(e) => self
                .session
                .report_error(format!("Failed to load {}: {e}", topic.name)),
        }
        true
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    // --- uploaded decks ---

    pub fn open_deck_path(&mut self) {
        self.path_input.clear();
        self.session.clear_error();
        self.screen = AppScreen::DeckPath;
    }

    /// Validates and loads a deck file, remembering it for the next start.
    /// A bad file leaves the current pool alone.
    pub fn upload_deck(&mut self, path: &Path) -> bool {
        let raw = match source::read_file(path) {
            Ok(raw) => raw,
            Err(e) => {
                self.session.report_error(format!("Failed to read deck: {e}"));
                return false;
            }
        };
        if self.session.load_json(&raw).is_err() {
            return false;
        }

        // A topic fetch still in flight must not replace the upload.
        self.next_generation();
        self.pending_topic = None;
        if let Err(e) = self.cache.store().set(UPLOADED_DECK_KEY, &raw) {
            tracing::warn!(error = %e, "could not remember uploaded deck");
        }
        tracing::info!(path = %path.display(), "deck uploaded");
        self.active_topic = Some(UPLOADED_TOPIC.to_string());
        self.notice = None;
        self.start_round();
        true
    }

    pub fn restore_uploaded_deck(&mut self) -> bool {
        let Some(raw) = self.cache.store().get(UPLOADED_DECK_KEY) else {
            return false;
        };
        if self.session.load_json(&raw).is_err() {
            tracing::warn!("stored deck no longer valid, ignoring");
            self.session.clear_error();
            return false;
        }
        self.active_topic = Some(UPLOADED_TOPIC.to_string());
        self.start_round();
        true
    }

    // --- quiz ---

    fn start_round(&mut self) {
        self.answer_input.clear();
        self.last_feedback = None;
        self.last_result = None;
        self.session.advance();
        self.screen = AppScreen::Quiz;
    }

    /// Enter in the quiz: score the typed answer, or move on once the
    /// current card already has an outcome.
    pub fn submit_or_advance(&mut self) {
        if self.session.current_outcome().is_some() {
            self.next_card();
        } else {
            self.submit_answer();
        }
    }

    pub fn submit_answer(&mut self) {
        let answer = self.answer_input.value().to_string();
        if answer.trim().is_empty() {
            return;
        }
        self.last_feedback = self.session.submit_answer(&answer);
    }

    pub fn next_card(&mut self) {
        self.answer_input.clear();
        self.last_feedback = None;
        self.session.advance();
        if self.session.is_finished() {
            self.finish_round();
        }
    }

    fn finish_round(&mut self) {
        let topic = self
            .active_topic
            .clone()
            .unwrap_or_else(|| UPLOADED_TOPIC.to_string());
        let result = QuizResult::from_session(&self.session, &topic);
        self.encouragement = encouragement::select(self.session.percentage(), &mut self.rng);
        tracing::info!(
            topic = %topic,
            page = result.page,
            correct = result.correct,
            answered = result.answered,
            "round finished"
        );

        self.history.push(result.clone());
        if let Some(store) = &self.store {
            if let Err(e) = store.save_history(&self.history) {
                tracing::warn!(error = %e, "failed to save history");
            }
        }
        self.last_result = Some(result);
        self.screen = AppScreen::Result;
    }

    pub fn retake(&mut self) {
        self.session.retake();
        self.start_round();
    }

    /// Wraps to the first page after the last.
    pub fn next_page(&mut self) {
        let count = self.session.page_count();
        if count == 0 {
            return;
        }
        let page = if self.session.page() >= count { 1 } else { self.session.page() + 1 };
        self.change_page(page);
    }

    pub fn prev_page(&mut self) {
        let count = self.session.page_count();
        if count == 0 {
            return;
        }
        let page = if self.session.page() <= 1 { count } else { self.session.page() - 1 };
        self.change_page(page);
    }

    pub fn change_page(&mut self, page: usize) {
        match self.session.change_page(page) {
            Ok(()) => self.start_round(),
            Err(e) => self.session.report_error(e.to_string()),
        }
    }

    pub fn adjust_page_size(&mut self, delta: isize) {
        let size = self
            .session
            .page_size()
            .saturating_add_signed(delta)
            .clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);
        if size == self.session.page_size() {
            return;
        }
        if self.session.change_page_size(size).is_ok() {
            self.config.page_size = size;
            self.edit_saved_config(|c| c.page_size = size);
            if !self.session.pool().is_empty() {
                self.start_round();
            }
        }
    }

    pub fn cycle_prompt_mode(&mut self) {
        let mode = self.session.prompt_mode().next();
        self.session.set_prompt_mode(mode);
        self.config.prompt_mode = mode;
        self.edit_saved_config(|c| c.prompt_mode = mode);
    }

    // --- navigation ---

    pub fn go_to_topics(&mut self) {
        self.screen = AppScreen::TopicSelect;
        if self.topics.is_empty() && !self.topics_loading {
            self.request_topics();
        }
    }

    pub fn best_for_active(&self) -> Option<f64> {
        self.active_topic
            .as_deref()
            .and_then(|t| self.history.best_for(t))
    }

    pub fn quit(&mut self) {
        if let Some(saved) = self.saved_config.as_ref().filter(|s| s.dirty) {
            match saved.config.save_to(&saved.path) {
                Ok(()) => tracing::debug!(path = %saved.path.display(), "config saved"),
                Err(e) => tracing::warn!(error = %e, "failed to save config"),
            }
        }
        self.should_quit = true;
    }
}
