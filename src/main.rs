use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph};

use vocabr::app::{App, AppScreen};
use vocabr::config::Config;
use vocabr::deck::loader::TOPICS_KEY;
use vocabr::event::{AppEvent, EventHandler};
use vocabr::feedback::{self, FeedbackForm};
use vocabr::error::FeedbackError;
use vocabr::logging::{self, LogConfig};
use vocabr::session::quiz::PromptMode;
use vocabr::ui::components::dashboard::Dashboard;
use vocabr::ui::components::flashcard::{FlashcardView, PageSidebar};
use vocabr::ui::components::menu::TopicMenu;
use vocabr::ui::components::progress_bar::ProgressBar;
use vocabr::ui::layout::{AppLayout, centered_rect, pack_hint_lines};
use vocabr::ui::line_input::InputResult;
use vocabr::ui::theme::Theme;

#[derive(Parser)]
#[command(name = "vocabr", version, about = "Terminal vocabulary flashcard quiz")]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short = 's', long, help = "Cards per page")]
    page_size: Option<usize>,

    #[arg(short, long, help = "Side to ask: native, foreign, or random")]
    prompt: Option<PromptMode>,

    #[arg(short, long, help = "Open a deck file on start")]
    deck: Option<PathBuf>,

    #[arg(long, help = "Topic manifest URL or path")]
    topics: Option<String>,

    #[arg(long, help = "Keep cache and history in memory only")]
    no_persist: bool,

    #[arg(short, long, action = clap::ArgAction::Count, help = "More log detail (repeatable)")]
    verbose: u8,

    #[arg(long, help = "Log file (default: vocabr.log in the data directory)")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Send a message to the maintainers
    Feedback {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
        #[arg(long, help = "Override the configured feedback endpoint")]
        endpoint: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = Config::config_path();
    let (mut config, config_error) = match Config::load_from(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    // An unreadable file is never overwritten.
    let on_disk = config_error.is_none().then(|| config.clone());
    config.validate(&Theme::available_themes());

    if let Some(Command::Feedback {
        name,
        email,
        message,
        endpoint,
    }) = &cli.command
    {
        logging::init_logging(&LogConfig::from_settings(&config.log_level, cli.verbose))?;
        if let Some(e) = config_error {
            tracing::warn!(error = %e, "config unreadable, using defaults");
        }
        return run_feedback(&config, endpoint.as_deref(), name, email, message);
    }

    let log_file = cli.log_file.clone().unwrap_or_else(LogConfig::default_log_file);
    let log_config = LogConfig::from_settings(&config.log_level, cli.verbose).with_log_file(Some(log_file));
    if let Err(e) = logging::init_logging(&log_config) {
        eprintln!("vocabr: logging disabled: {e}");
    }
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "config unreadable, using defaults");
    }

    if let Some(size) = cli.page_size {
        config.page_size = size;
    }
    if let Some(mode) = cli.prompt {
        config.prompt_mode = mode;
    }
    if let Some(url) = cli.topics.clone() {
        config.topics_url = url;
    }
    config.validate(&Theme::available_themes());

    let mut app = App::new(config, !cli.no_persist);
    if let Some(on_disk) = on_disk {
        app.persist_config_to(on_disk, config_path);
    }
    if let Some(theme_name) = &cli.theme {
        match Theme::load(theme_name) {
            Some(theme) => app.set_theme(theme),
            None => tracing::warn!(theme = %theme_name, "unknown theme"),
        }
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(250));
    app.attach_events(events.sender());
    app.request_topics();
    match &cli.deck {
        Some(path) => {
            app.upload_deck(path);
        }
        None => {
            app.restore_uploaded_deck();
        }
    }

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(error = %err, "exiting on error");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_feedback(
    config: &Config,
    endpoint: Option<&str>,
    name: &str,
    email: &str,
    message: &str,
) -> Result<()> {
    let endpoint = endpoint
        .or(config.feedback_endpoint.as_deref())
        .ok_or(FeedbackError::NoEndpoint)?;
    let form = FeedbackForm::new(name, email, message);
    match feedback::send(endpoint, &form) {
        Ok(receipt) => {
            println!("{}", receipt.message);
            Ok(())
        }
        Err(e) => bail!("feedback not sent: {e}"),
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next().context("event channel closed")? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
            AppEvent::TopicsLoaded(result) => app.apply_topics_loaded(result),
            AppEvent::DeckLoaded {
                generation,
                topic,
                result,
            } => {
                app.apply_deck_loaded(generation, topic, result);
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit();
        return;
    }

    match app.screen {
        AppScreen::TopicSelect => handle_topics_key(app, key),
        AppScreen::Quiz => handle_quiz_key(app, key),
        AppScreen::Result => handle_result_key(app, key),
        AppScreen::DeckPath => handle_deck_path_key(app, key),
    }
}

fn handle_topics_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Up | KeyCode::Char('k') => app.topic_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.topic_next(),
        KeyCode::Enter => app.load_selected_topic(),
        KeyCode::Char('u') => app.open_deck_path(),
        KeyCode::Char('p') => app.cycle_prompt_mode(),
        KeyCode::Char('r') => {
            app.cache().invalidate(TOPICS_KEY);
            app.request_topics();
        }
        _ => {}
    }
}

fn handle_quiz_key(app: &mut App, key: KeyEvent) {
    let answered = app.session.current_outcome().is_some();
    // Page commands only fire on an empty answer line so they stay typeable.
    let idle = answered || app.answer_input.is_empty();

    match key.code {
        KeyCode::Esc => app.go_to_topics(),
        KeyCode::Enter => app.submit_or_advance(),
        KeyCode::Right if answered => app.next_card(),
        KeyCode::Tab => app.cycle_prompt_mode(),
        KeyCode::Char('[') if idle => app.prev_page(),
        KeyCode::Char(']') if idle => app.next_page(),
        KeyCode::Char('-') if idle => app.adjust_page_size(-1),
        KeyCode::Char('+') | KeyCode::Char('=') if idle => app.adjust_page_size(1),
        _ if !answered => {
            app.answer_input.handle(key);
        }
        _ => {}
    }
}

fn handle_result_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => app.retake(),
        KeyCode::Char('n') => app.next_page(),
        KeyCode::Char('t') | KeyCode::Esc => app.go_to_topics(),
        KeyCode::Char('q') => app.quit(),
        _ => {}
    }
}

fn handle_deck_path_key(app: &mut App, key: KeyEvent) {
    match app.path_input.handle(key) {
        InputResult::Submit => {
            let path = expand_home(app.path_input.value().trim());
            if !app.upload_deck(&path) {
                tracing::debug!(path = %path.display(), "deck rejected");
            }
        }
        InputResult::Cancel => app.screen = AppScreen::TopicSelect,
        InputResult::Continue => {}
    }
}

fn expand_home(raw: &str) -> PathBuf {
    match (raw.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => Path::new(raw).to_path_buf(),
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::TopicSelect => render_topics(frame, app),
        AppScreen::Quiz => render_quiz(frame, app),
        AppScreen::Result => render_result(frame, app),
        AppScreen::DeckPath => {
            render_topics(frame, app);
            render_deck_path(frame, app);
        }
    }
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;
    let topic = app.active_topic.as_deref().unwrap_or("no deck");
    let info = format!(
        " {topic} | ask: {} | {} cards/page",
        app.session.prompt_mode(),
        app.session.page_size()
    );
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " vocabr ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(info, Style::default().fg(colors.muted()).bg(colors.header_bg())),
    ]))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, area);
}

/// Errors win over notices, notices over key hints. Hints wrap onto as many
/// lines as `width` needs.
fn footer_lines(app: &App, width: u16, hints: &[&str]) -> Vec<Line<'static>> {
    let colors = &app.theme.colors;
    if let Some(error) = app.session.error() {
        vec![Line::from(Span::styled(format!(" {error}"), Style::default().fg(colors.error())))]
    } else if let Some(notice) = &app.notice {
        vec![Line::from(Span::styled(format!(" {notice}"), Style::default().fg(colors.warning())))]
    } else {
        pack_hint_lines(hints, width as usize)
            .into_iter()
            .map(|hint| Line::from(Span::styled(hint, Style::default().fg(colors.muted()))))
            .collect()
    }
}

fn footer_height(lines: &[Line]) -> u16 {
    u16::try_from(lines.len()).unwrap_or(u16::MAX).max(1)
}

fn render_topics(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let footer = footer_lines(
        app,
        area.width,
        &["[↑↓] Select", "[Enter] Start", "[u] Open deck", "[p] Ask side", "[r] Refresh", "[q] Quit"],
    );
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(footer_height(&footer)),
        ])
        .split(area);

    render_header(frame, app, layout[0]);

    let menu = TopicMenu::new(&app.topics, &app.history, app.theme)
        .selected(app.topic_selected)
        .loading(
            app.topics_loading,
            app.pending_topic.as_ref().map(|t| t.name.as_str()),
        );
    frame.render_widget(menu, centered_rect(50, 80, layout[1]));

    frame.render_widget(Paragraph::new(footer), layout[2]);
}

fn render_quiz(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let hints: &[&str] = if app.session.current_outcome().is_some() {
        &["[Enter/→] Next", "[Tab] Ask side", "[[/]] Page", "[-/+] Size", "[Esc] Topics"]
    } else {
        &["[Enter] Check", "[Tab] Ask side", "[[/]] Page", "[-/+] Size", "[Esc] Topics"]
    };
    let footer = footer_lines(app, area.width, hints);
    let app_layout = AppLayout::new(area, footer_height(&footer));

    render_header(frame, app, app_layout.header);

    let show_progress = app_layout.tier.show_progress_bar(area.height);
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints(if show_progress {
            vec![Constraint::Length(3), Constraint::Min(6)]
        } else {
            vec![Constraint::Length(0), Constraint::Min(6)]
        })
        .split(app_layout.main);

    if show_progress {
        frame.render_widget(ProgressBar::for_page(&app.session, app.theme), main[0]);
    }
    frame.render_widget(
        FlashcardView::new(
            &app.session,
            &app.answer_input,
            app.last_feedback.as_ref(),
            app.theme,
        ),
        main[1],
    );
    if let Some(sidebar) = app_layout.sidebar {
        frame.render_widget(PageSidebar::new(&app.session, app.theme), sidebar);
    }

    frame.render_widget(Paragraph::new(footer), app_layout.footer);
}

fn render_result(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let footer = footer_lines(app, area.width, &[]);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(footer_height(&footer)),
        ])
        .split(area);

    render_header(frame, app, layout[0]);
    if let Some(result) = &app.last_result {
        let dashboard = Dashboard::new(result, app.encouragement, app.best_for_active(), app.theme);
        frame.render_widget(dashboard, centered_rect(60, 80, layout[1]));
    }
    frame.render_widget(Paragraph::new(footer), layout[2]);
}

fn render_deck_path(frame: &mut ratatui::Frame, app: &App) {
    let colors = &app.theme.colors;
    let area = centered_rect(60, 20, frame.area());
    let area = Rect::new(area.x, area.y, area.width, area.height.min(6));
    frame.render_widget(Clear, area);

    let block = Block::bordered()
        .title(" Open deck file ")
        .border_style(Style::default().fg(colors.border_focused()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (before, at, after) = app.path_input.render_parts();
    let cursor = Style::default().fg(colors.cursor_fg()).bg(colors.cursor_bg());
    let mut spans = vec![Span::styled(before, Style::default().fg(colors.fg()))];
    match at {
        Some(ch) => {
            spans.push(Span::styled(ch.to_string(), cursor));
            spans.push(Span::styled(after, Style::default().fg(colors.fg())));
        }
        None => spans.push(Span::styled(" ", cursor)),
    }

    let mut lines = vec![Line::from(spans), Line::from("")];
    lines.push(match app.session.error() {
        Some(error) => Line::from(Span::styled(error, Style::default().fg(colors.error()))),
        None => Line::from(Span::styled(
            "[Tab] Complete  [Enter] Load  [Esc] Cancel",
            Style::default().fg(colors.muted()),
        )),
    });
    frame.render_widget(Paragraph::new(lines), inner);
}
