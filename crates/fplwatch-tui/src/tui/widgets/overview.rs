// Team overview widget: value, bank, rank, official and live points.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use fplwatch_app::protocol::MetricKind;
use fplwatch_core::summary::{format_currency, format_rank};

use super::{error_line, placeholder};
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let paragraph = Paragraph::new(build_overview_lines(state))
        .block(Block::default().borders(Borders::ALL).title("My Team"));
    frame.render_widget(paragraph, area);
}

fn label(text: &'static str) -> Span<'static> {
    Span::styled(text, Style::default().fg(Color::Gray))
}

fn value(text: String) -> Span<'static> {
    Span::styled(text, Style::default().fg(Color::White))
}

pub fn build_overview_lines(state: &ViewState) -> Vec<Line<'static>> {
    if !state.session.is_connected() {
        return vec![placeholder("Press c to connect your FPL team")];
    }

    let mut lines = Vec::new();
    if let Some(message) = state.errors.get(&MetricKind::Team) {
        lines.push(error_line(message));
    }

    let Some(team) = state.team.as_ref() else {
        if lines.is_empty() {
            lines.push(placeholder("Loading team..."));
        }
        return lines;
    };
    let info = &team.team_info;

    lines.push(Line::from(vec![
        label(" Value:  "),
        value(format_currency(info.team_value)),
        label("  Bank: "),
        value(format_currency(info.bank)),
        label("  Total: "),
        value(format_currency(info.total_value)),
    ]));
    lines.push(Line::from(vec![
        label(" Rank:   "),
        Span::styled(
            format_rank(info.overall_rank),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
    ]));
    lines.push(Line::from(vec![
        label(" GW pts: "),
        value(format_points(info.gameweek_points)),
        label("  Season: "),
        value(format_points(info.total_points)),
    ]));

    let mut live = vec![label(" Live:   ")];
    match state.live.as_ref() {
        Some(breakdown) => {
            live.push(Span::styled(
                breakdown.live_points.to_string(),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ));
            if breakdown.is_live() {
                live.push(Span::styled(
                    "  Live updating during matches",
                    Style::default().fg(Color::Yellow),
                ));
            }
        }
        None => live.push(value("--".to_string())),
    }
    lines.push(Line::from(live));

    if let Some(message) = state.errors.get(&MetricKind::LivePoints) {
        lines.push(error_line(message));
    }
    lines
}

fn format_points(points: Option<i64>) -> String {
    points.map_or_else(|| "--".to_string(), |p| p.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
