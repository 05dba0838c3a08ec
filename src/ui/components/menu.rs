use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::deck::Topic;
use crate::store::schema::QuizHistoryData;
use crate::ui::theme::Theme;

pub struct TopicMenu<'a> {
    pub topics: &'a [Topic],
    pub selected: usize,
    pub loading: bool,
    /// Topic whose deck is being fetched, shown next to its entry.
    pub pending: Option<&'a str>,
    pub history: &'a QuizHistoryData,
    pub theme: &'a Theme,
}

impl<'a> TopicMenu<'a> {
    pub fn new(topics: &'a [Topic], history: &'a QuizHistoryData, theme: &'a Theme) -> Self {
        Self {
            topics,
            selected: 0,
            loading: false,
            pending: None,
            history,
            theme,
        }
    }

    pub fn selected(mut self, selected: usize) -> Self {
        self.selected = selected;
        self
    }

    pub fn loading(mut self, loading: bool, pending: Option<&'a str>) -> Self {
        self.loading = loading;
        self.pending = pending;
        self
    }

    fn describe(&self, topic: &Topic) -> String {
        if self.pending == Some(topic.name.as_str()) {
            return "loading…".to_string();
        }
        match self.history.best_for(&topic.name) {
            Some(best) => format!("best {best:.0}%"),
            None => "not tried yet".to_string(),
        }
    }
}

impl Widget for TopicMenu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Topics ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0)])
            .split(inner);

        let title_lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "vocabr",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Vietnamese ⇄ English flashcards",
                Style::default().fg(colors.fg()),
            )),
        ];
        Paragraph::new(title_lines)
            .alignment(Alignment::Center)
            .render(layout[0], buf);

        if self.topics.is_empty() {
            let text = if self.loading {
                "Fetching topics…"
            } else {
                "No topics. Press [u] to open a deck file."
            };
            Paragraph::new(Line::from(Span::styled(
                text,
                Style::default().fg(colors.muted()),
            )))
            .alignment(Alignment::Center)
            .render(layout[1], buf);
            return;
        }

        // Keep the selection on screen when the list is taller than the area.
        let rows = (layout[1].height / 2).max(1) as usize;
        let first = self.selected.saturating_sub(rows.saturating_sub(1));

        let mut lines = Vec::new();
        for (i, topic) in self.topics.iter().enumerate().skip(first).take(rows) {
            let is_selected = i == self.selected;
            let indicator = if is_selected { ">" } else { " " };
            let label_style = Style::default()
                .fg(if is_selected { colors.accent() } else { colors.fg() })
                .add_modifier(if is_selected {
                    Modifier::BOLD
                } else {
                    Modifier::empty()
                });
            lines.push(Line::from(Span::styled(
                format!(" {indicator} {}", topic.name),
                label_style,
            )));
            lines.push(Line::from(Span::styled(
                format!("     {}", self.describe(topic)),
                Style::default().fg(colors.muted()),
            )));
        }
        Paragraph::new(lines).render(layout[1], buf);
    }
}
