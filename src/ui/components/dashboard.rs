use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::engine::scoring::{self, Grade};
use crate::session::result::QuizResult;
use crate::ui::theme::Theme;

pub struct Dashboard<'a> {
    pub result: &'a QuizResult,
    pub encouragement: &'a str,
    pub best: Option<f64>,
    pub theme: &'a Theme,
}

impl<'a> Dashboard<'a> {
    pub fn new(
        result: &'a QuizResult,
        encouragement: &'a str,
        best: Option<f64>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            result,
            encouragement,
            best,
            theme,
        }
    }
}

impl Widget for Dashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" {} · page {} ", self.result.topic, self.result.page))
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        let score_color = match scoring::grade(self.result.percentage) {
            Grade::Good => colors.success(),
            Grade::Fair => colors.warning(),
            Grade::Poor => colors.error(),
        };
        let score_text = format!("{:.0}%", self.result.percentage);
        let detail = format!(
            "  ({}/{} correct, {} skipped)",
            self.result.correct,
            self.result.answered,
            self.result.skipped()
        );
        let score_line = Line::from(vec![
            Span::styled("  Score: ", Style::default().fg(colors.fg())),
            Span::styled(
                &*score_text,
                Style::default().fg(score_color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(&*detail, Style::default().fg(colors.muted())),
        ]);
        Paragraph::new(score_line).render(layout[0], buf);

        let best_text = match self.best {
            Some(best) => format!("  Best on this topic: {best:.0}%"),
            None => String::new(),
        };
        Paragraph::new(Line::from(Span::styled(
            best_text,
            Style::default().fg(colors.muted()),
        )))
        .render(layout[1], buf);

        Paragraph::new(Line::from(Span::styled(
            self.encouragement,
            Style::default()
                .fg(colors.prompt())
                .add_modifier(Modifier::ITALIC),
        )))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(layout[2], buf);

        let mut lines = vec![Line::from(Span::styled(
            "  Card                          ✓    ✗",
            Style::default().fg(colors.muted()),
        ))];
        for card in &self.result.card_tallies {
            let label: String = card.label.chars().take(28).collect();
            let label_color = if card.wrong > card.correct {
                colors.error()
            } else {
                colors.fg()
            };
            lines.push(Line::from(vec![
                Span::styled(format!("  {label:<28}"), Style::default().fg(label_color)),
                Span::styled(format!("{:>3}", card.correct), Style::default().fg(colors.success())),
                Span::styled(format!("{:>5}", card.wrong), Style::default().fg(colors.error())),
            ]));
        }
        Paragraph::new(lines).render(layout[3], buf);

        Paragraph::new(Line::from(vec![
            Span::styled("  [r] Retake  ", Style::default().fg(colors.accent())),
            Span::styled("[n] Next page  ", Style::default().fg(colors.accent())),
            Span::styled("[t] Topics  ", Style::default().fg(colors.accent())),
            Span::styled("[q] Quit", Style::default().fg(colors.accent())),
        ]))
        .render(layout[4], buf);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::session::result::CardResult;

    #[test]
    fn test_renders_score_and_tallies() {
        let result = QuizResult {
            topic: "Animals".to_string(),
            page: 2,
            page_size: 2,
            correct: 1,
            answered: 2,
            cards: 3,
            percentage: 50.0,
            prompt_mode: "random".to_string(),
            timestamp: Utc::now(),
            card_tallies: vec![CardResult {
                id: 4,
                label: "chó / dog".to_string(),
                correct: 1,
                wrong: 2,
            }],
        };
        let theme = Theme::default();
        let area = Rect::new(0, 0, 70, 16);
        let mut buf = Buffer::empty(area);
        Dashboard::new(&result, "Halfway there.", Some(75.0), &theme).render(area, &mut buf);

        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Animals · page 2"));
        assert!(text.contains("50%"));
        assert!(text.contains("1 skipped"));
        assert!(text.contains("Best on this topic: 75%"));
        assert!(text.contains("Halfway there."));
        assert!(text.contains("chó / dog"));
    }
}
