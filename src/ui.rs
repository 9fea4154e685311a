use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine},
        Block, Borders, Paragraph, Widget,
    },
};

use crate::app::{App, GameState};
use crate::bands::Band;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
// cells of bar per 100%
const BAR_WIDTH: usize = 25;

/// Colour for a band's level bar
pub fn band_color(band: Band) -> Color {
    match band {
        Band::Delta => Color::Rgb(255, 0, 0),
        Band::Theta => Color::Rgb(255, 140, 0),
        Band::Alpha => Color::Rgb(255, 255, 0),
        Band::Beta => Color::Rgb(0, 255, 0),
        Band::Concentration => Color::Rgb(255, 255, 255),
        Band::Anxiety => Color::Rgb(0, 0, 255),
    }
}

/// Horizontal bar for a score; out-of-range scores are drawn clipped
pub fn level_bar(score: i64, width: usize) -> String {
    let filled = (score.clamp(0, 100) as usize * width) / 100;
    format!("{}{}", "█".repeat(filled), "·".repeat(width - filled))
}

/// Ring radius on a unit canvas: wide when alpha is low, tight when high
pub fn focus_radius(alpha_average: f64) -> f64 {
    let max_radius = 1.0;
    (max_radius - max_radius * 0.95 * alpha_average).max(0.0)
}

fn state_color(state: GameState) -> Color {
    match state {
        GameState::Starting => Color::Gray,
        GameState::Paused => Color::Yellow,
        GameState::Running => Color::Green,
        GameState::Finished => Color::Cyan,
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Min(8),    // levels + focus ring
                Constraint::Length(1), // totals
                Constraint::Length(1), // time left
                Constraint::Length(1), // history
                Constraint::Length(1), // legend
            ])
            .split(area);

        let header = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);

        Paragraph::new(Span::styled(
            format!("neurofeed · {}", self.source_name),
            dim_style,
        ))
        .render(header[0], buf);

        Paragraph::new(Span::styled(
            format!("State: {}", self.state),
            Style::default()
                .patch(bold_style)
                .fg(state_color(self.state)),
        ))
        .alignment(Alignment::Right)
        .render(header[1], buf);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(48), Constraint::Min(10)])
            .split(rows[1]);

        let scores = self.session.scores();
        let levels: Vec<Line> = Band::ALL
            .iter()
            .map(|band| {
                let score = *scores.get(*band);
                Line::from(vec![
                    Span::styled(format!("{:>13}: ", band.to_string()), bold_style),
                    Span::styled(
                        level_bar(score, BAR_WIDTH),
                        Style::default().fg(band_color(*band)),
                    ),
                    Span::raw(format!(" {score}")),
                ])
            })
            .collect();

        Paragraph::new(levels)
            .block(Block::default().borders(Borders::ALL).title("Waves"))
            .render(body[0], buf);

        let radius = focus_radius(self.alpha_average());
        let ring_color = if self.alpha_cue() {
            Color::LightGreen
        } else {
            Color::White
        };
        Canvas::default()
            .block(Block::default().borders(Borders::ALL).title("Focus"))
            .marker(Marker::Braille)
            .x_bounds([-1.0, 1.0])
            .y_bounds([-1.0, 1.0])
            .paint(|ctx| {
                ctx.draw(&Circle {
                    x: 0.0,
                    y: 0.0,
                    radius,
                    color: ring_color,
                });
                ctx.draw(&CanvasLine {
                    x1: -0.1,
                    y1: 0.0,
                    x2: 0.1,
                    y2: 0.0,
                    color: Color::Green,
                });
                ctx.draw(&CanvasLine {
                    x1: 0.0,
                    y1: -0.1,
                    x2: 0.0,
                    y2: 0.1,
                    color: Color::Green,
                });
            })
            .render(body[1], buf);

        let totals = self.session.totals();
        let totals_text = Band::ALL
            .iter()
            .map(|band| format!("{} {}", band, totals.get(*band)))
            .collect::<Vec<_>>()
            .join("  ");
        Paragraph::new(Span::styled(format!("Totals: {totals_text}"), bold_style))
            .alignment(Alignment::Center)
            .render(rows[2], buf);

        let mut time_spans = vec![Span::styled(
            format!("Time Left: {}", self.session.time_left()),
            bold_style,
        )];
        if !self.is_running() {
            time_spans.push(Span::styled(
                format!("  (length {}s)", self.session_secs()),
                dim_style,
            ));
        }
        Paragraph::new(Line::from(time_spans))
            .alignment(Alignment::Center)
            .render(rows[3], buf);

        let history_text = match self.stats.best_totals() {
            Some(best) => format!(
                "{} sessions saved · best alpha {} · best beta {}",
                self.stats.len(),
                best.alpha,
                best.beta
            ),
            None => String::from("no saved sessions yet"),
        };
        Paragraph::new(Span::styled(history_text, dim_style))
            .alignment(Alignment::Center)
            .render(rows[4], buf);

        let legend = if self.is_running() {
            format!("{} / (s)ave / (esc)ape", self.action_label())
        } else {
            format!("{} / (↑↓) length / (s)ave / (esc)ape", self.action_label())
        };
        Paragraph::new(Span::styled(legend, italic_style)).render(rows[5], buf);
    }
}
