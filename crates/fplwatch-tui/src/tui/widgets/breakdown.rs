// Live breakdown widget: each pick's live points and contribution to the
// gameweek total. Bench picks and players without live stats are dimmed.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;

use fplwatch_app::protocol::MetricKind;
use fplwatch_core::metrics::PickContribution;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let header = Row::new(vec![
        Cell::from("Player"),
        Cell::from("Role"),
        Cell::from("Mins"),
        Cell::from("Pts"),
        Cell::from("Total"),
    ])
    .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = match (state.live.as_ref(), state.errors.get(&MetricKind::LivePoints)) {
        (_, Some(message)) if state.live.is_none() => {
            vec![Row::new(vec![Cell::from(format!("  {message}"))]).style(Style::default().fg(Color::Red))]
        }
        (None, _) => vec![Row::new(vec![Cell::from("  No live data")])],
        (Some(live), _) => live.picks.iter().map(pick_row).collect(),
    };

    let widths = [
        Constraint::Min(16),
        Constraint::Length(6),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(6),
    ];

    let title = match state.live.as_ref() {
        Some(live) => format!("GW {} Live: {} pts", live.gameweek, live.live_points),
        None => "Live Points".to_string(),
    };
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, area);
}

fn pick_row(pick: &PickContribution) -> Row<'static> {
    let style = if pick.multiplier == 0 || !pick.has_stat {
        Style::default().fg(Color::DarkGray)
    } else if pick.multiplier > 1 {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };
    let minutes = if pick.has_stat {
        pick.minutes.to_string()
    } else {
        "-".to_string()
    };
    Row::new(vec![
        Cell::from(pick.name.clone()),
        Cell::from(multiplier_label(pick.multiplier)),
        Cell::from(minutes),
        Cell::from(pick.live_points.to_string()),
        Cell::from(pick.contribution.to_string()),
    ])
    .style(style)
}

/// Short role tag for a pick multiplier.
pub fn multiplier_label(multiplier: i64) -> String {
    match multiplier {
        0 => "Bench".to_string(),
        1 => String::new(),
        2 => "C".to_string(),
        3 => "TC".to_string(),
        other => format!("x{other}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
