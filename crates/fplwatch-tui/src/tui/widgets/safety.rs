// Safety score widget: points needed to avoid a down arrow this gameweek.
//
// Up arrow = green, down arrow = red. The headline number is the points
// still needed, 0 once the team is clear of the safety line.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use fplwatch_app::protocol::MetricKind;
use fplwatch_core::metrics::{ArrowDirection, DerivedSafetyScore};
use fplwatch_core::summary::format_rank;

use super::{error_line, placeholder};
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let paragraph = Paragraph::new(build_safety_lines(state))
        .block(Block::default().borders(Borders::ALL).title("Safety Score"))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

pub fn arrow_glyph(direction: ArrowDirection) -> (&'static str, Color) {
    match direction {
        ArrowDirection::Up => ("▲", Color::Green),
        ArrowDirection::Down => ("▼", Color::Red),
    }
}

pub fn build_safety_lines(state: &ViewState) -> Vec<Line<'static>> {
    if !state.session.is_connected() {
        return vec![placeholder("No team connected")];
    }

    let mut lines = Vec::new();
    if let Some(message) = state.errors.get(&MetricKind::Safety) {
        lines.push(error_line(message));
    }
    match state.safety.as_ref() {
        Some(score) => lines.extend(score_lines(score)),
        None if lines.is_empty() => lines.push(placeholder("Calculating...")),
        None => {}
    }
    lines
}

fn score_lines(score: &DerivedSafetyScore) -> Vec<Line<'static>> {
    let (arrow, colour) = arrow_glyph(score.arrow_direction);
    let gray = Style::default().fg(Color::Gray);
    let white = Style::default().fg(Color::White);

    vec![
        Line::from(vec![
            Span::styled(format!(" {arrow} "), Style::default().fg(colour)),
            Span::styled(
                format!("{} pts needed", score.safety_score),
                Style::default().fg(colour).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled(" GW pts: ", gray),
            Span::styled(score.current_gw_points.to_string(), white),
            Span::styled("  Avg: ", gray),
            Span::styled(score.average_score.to_string(), white),
        ]),
        Line::from(vec![
            Span::styled(" Rank:   ", gray),
            Span::styled(format_rank(Some(score.current_rank)), white),
            Span::styled(format!("  (top {:.1}%)", score.rank_percentile * 100.0), gray),
        ]),
        Line::from(Span::styled(format!(" {}", score.status_message), white)),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
