// Status bar widget: connected team, gameweek, tab indicator, last update.

use chrono::{DateTime, Local, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::{TabId, ViewState};

/// Layout: [connection dot] [team] | [gameweek] | [tab bar] [updated at]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let paragraph = Paragraph::new(status_line(state)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

pub fn status_line(state: &ViewState) -> Line<'static> {
    let mut spans = Vec::new();

    let (dot, dot_color) = connection_indicator(state.session.is_connected());
    spans.push(Span::styled(format!(" {dot} "), Style::default().fg(dot_color)));

    let team = match state.session.entry_id {
        Some(id) => format!("Team {id}"),
        None => "No team".to_string(),
    };
    spans.push(Span::styled(team, Style::default().fg(Color::White)));
    spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));

    let gameweek = match state.current_gameweek() {
        Some(gw) => format!("GW {gw}"),
        None => "GW --".to_string(),
    };
    spans.push(Span::styled(gameweek, Style::default().fg(Color::White)));
    spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));

    spans.extend(tab_spans(state.active_tab));

    if let Some(updated) = state.last_update {
        spans.push(Span::styled(
            format!("Updated {}", format_clock(updated)),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

pub fn connection_indicator(connected: bool) -> (&'static str, Color) {
    if connected {
        ("●", Color::Green)
    } else {
        ("●", Color::Red)
    }
}

/// "[1:Dashboard] [2:Fixtures] [3:Leagues]" with the active tab highlighted.
pub fn tab_spans(active: TabId) -> Vec<Span<'static>> {
    let tabs = [
        (TabId::Dashboard, "1:Dashboard"),
        (TabId::Fixtures, "2:Fixtures"),
        (TabId::Leagues, "3:Leagues"),
    ];

    let mut spans = Vec::new();
    for (tab_id, label) in tabs {
        let style = if tab_id == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("[{label}]"), style));
        spans.push(Span::raw(" "));
    }
    spans
}

fn format_clock(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
