use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::session::quiz::{AnswerFeedback, PromptSide, QuizSession};
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

/// The card being asked, the answer line, and the verdict once answered.
pub struct FlashcardView<'a> {
    session: &'a QuizSession,
    input: &'a LineInput,
    feedback: Option<&'a AnswerFeedback>,
    theme: &'a Theme,
}

impl<'a> FlashcardView<'a> {
    pub fn new(
        session: &'a QuizSession,
        input: &'a LineInput,
        feedback: Option<&'a AnswerFeedback>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            session,
            input,
            feedback,
            theme,
        }
    }

    fn direction_label(&self) -> &'static str {
        match self.session.prompt_side() {
            PromptSide::Native => "Vietnamese → English",
            PromptSide::Foreign => "English → Vietnamese",
        }
    }
}

impl Widget for FlashcardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let position = self.session.page_cards().len() - self.session.remaining_len();
        let block = Block::bordered()
            .title(format!(
                " Card {position}/{} ",
                self.session.page_cards().len()
            ))
            .title_bottom(Line::from(format!(" {} ", self.direction_label())).right_aligned())
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(prompt) = self.session.prompt() else {
            Paragraph::new(Line::from(Span::styled(
                "No card. Pick a topic or open a deck.",
                Style::default().fg(colors.muted()),
            )))
            .alignment(Alignment::Center)
            .render(inner, buf);
            return;
        };

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Min(0),
            ])
            .split(inner);

        let mut prompt_lines = vec![Line::from(Span::styled(
            prompt,
            Style::default()
                .fg(colors.prompt())
                .add_modifier(Modifier::BOLD),
        ))];
        if let Some(card) = self.session.current_card() {
            if let Some(category) = &card.category {
                prompt_lines.push(Line::from(Span::styled(
                    format!("({category})"),
                    Style::default().fg(colors.muted()),
                )));
            }
        }
        Paragraph::new(prompt_lines)
            .alignment(Alignment::Center)
            .render(layout[1], buf);

        let (before, at, after) = self.input.render_parts();
        let cursor_style = Style::default().fg(colors.cursor_fg()).bg(colors.cursor_bg());
        let mut input_spans = vec![
            Span::styled("  › ", Style::default().fg(colors.accent())),
            Span::styled(before, Style::default().fg(colors.fg())),
        ];
        match at {
            Some(ch) => {
                input_spans.push(Span::styled(ch.to_string(), cursor_style));
                input_spans.push(Span::styled(after, Style::default().fg(colors.fg())));
            }
            None if self.feedback.is_none() => input_spans.push(Span::styled(" ", cursor_style)),
            None => {}
        }
        Paragraph::new(Line::from(input_spans)).render(layout[3], buf);

        if let Some(feedback) = self.feedback {
            let mut lines = Vec::new();
            let (verdict, color) = if feedback.correct {
                ("Correct!", colors.success())
            } else {
                ("Not quite.", colors.error())
            };
            let mut verdict_spans = vec![Span::styled(
                format!("  {verdict}"),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )];
            if !feedback.counted {
                verdict_spans.push(Span::styled(
                    "  (already scored)",
                    Style::default().fg(colors.muted()),
                ));
            }
            lines.push(Line::from(verdict_spans));
            lines.push(Line::from(vec![
                Span::styled("  Answer: ", Style::default().fg(colors.muted())),
                Span::styled(feedback.expected.join(" / "), Style::default().fg(colors.fg())),
            ]));
            if let Some(note) = self.session.current_card().and_then(|c| c.note.as_deref()) {
                lines.push(Line::from(Span::styled(
                    format!("  {note}"),
                    Style::default().fg(colors.muted()),
                )));
            }
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .render(layout[4], buf);
        }
    }
}

/// Cards of the current page with their running tallies.
pub struct PageSidebar<'a> {
    session: &'a QuizSession,
    theme: &'a Theme,
}

impl<'a> PageSidebar<'a> {
    pub fn new(session: &'a QuizSession, theme: &'a Theme) -> Self {
        Self { session, theme }
    }
}

impl Widget for PageSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .title(format!(
                " Page {}/{} ",
                self.session.page(),
                self.session.page_count().max(1)
            ))
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let current = self.session.current_card().map(|c| c.id);
        let lines: Vec<Line> = self
            .session
            .page_cards()
            .iter()
            .map(|card| {
                let tally = self.session.tallies().get(&card.id).copied().unwrap_or_default();
                let marker = if Some(card.id) == current { "›" } else { " " };
                Line::from(vec![
                    Span::styled(format!("{marker} #{:<4}", card.id), Style::default().fg(colors.muted())),
                    Span::styled(format!("{:>3}", tally.correct), Style::default().fg(colors.success())),
                    Span::styled(format!("{:>3}", tally.wrong), Style::default().fg(colors.error())),
                ])
            })
            .collect();
        Paragraph::new(lines).render(inner, buf);
    }
}
