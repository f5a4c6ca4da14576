// League table widget: one page of a classic league's standings, opened
// from the Leagues tab. The connected team's row is highlighted.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;

use fplwatch_app::protocol::MetricKind;
use fplwatch_core::models::StandingRow;
use fplwatch_core::summary::format_rank;

use crate::tui::{StandingsView, ViewState};

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState, view: &StandingsView) {
    let header = Row::new(vec![
        Cell::from("Rank"),
        Cell::from(""),
        Cell::from("Team"),
        Cell::from("Manager"),
        Cell::from("GW"),
        Cell::from("Total"),
    ])
    .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = match (view.data.as_ref(), state.errors.get(&MetricKind::Standings)) {
        (None, Some(message)) => {
            vec![Row::new(vec![Cell::from(format!("  {message}"))]).style(Style::default().fg(Color::Red))]
        }
        (None, None) => vec![Row::new(vec![Cell::from("  Loading league...")])],
        (Some(data), _) if data.standings.results.is_empty() => {
            vec![Row::new(vec![Cell::from("  No entries on this page")])]
        }
        (Some(data), _) => data
            .standings
            .results
            .iter()
            .map(|row| standing_row(row, state.session.entry_id))
            .collect(),
    };

    let widths = [
        Constraint::Length(10),
        Constraint::Length(2),
        Constraint::Min(18),
        Constraint::Min(14),
        Constraint::Length(5),
        Constraint::Length(7),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title(view)));
    frame.render_widget(table, area);
}

/// "Overall: page 2 (more)" while upstream has further pages.
pub fn title(view: &StandingsView) -> String {
    let more = if view.has_next() { " (more)" } else { "" };
    format!("{}: page {}{more}", view.league_name, view.page)
}

fn standing_row(row: &StandingRow, connected: Option<u64>) -> Row<'static> {
    let style = if connected == Some(row.entry) {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let (arrow, colour) = rank_change(row);
    Row::new(vec![
        Cell::from(format_rank(Some(row.rank))),
        Cell::from(arrow).style(Style::default().fg(colour)),
        Cell::from(row.entry_name.clone()),
        Cell::from(row.player_name.clone()),
        Cell::from(row.event_total.to_string()),
        Cell::from(row.total.to_string()),
    ])
    .style(style)
}

/// Movement since the last gameweek. A zero last rank means the entry is new
/// to the table.
pub fn rank_change(row: &StandingRow) -> (&'static str, Color) {
    match row.last_rank {
        0 => (" ", Color::Gray),
        last if row.rank < last => ("▲", Color::Green),
        last if row.rank > last => ("▼", Color::Red),
        _ => ("=", Color::Gray),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use fplwatch_core::models::{LeagueStandings, StandingsPage};
    use fplwatch_core::session::Session;

    fn entry(entry: u64, name: &str, rank: u64, last_rank: u64) -> StandingRow {
        StandingRow {
            entry,
            entry_name: name.to_string(),
            player_name: format!("{name} Manager"),
            rank,
            last_rank,
            total: 1000 - rank as i64,
            event_total: 60,
        }
    }

    fn loaded(has_next: bool) -> StandingsView {
        StandingsView {
            league_id: 314,
            league_name: "Office".to_string(),
            page: 2,
            data: Some(LeagueStandings {
                standings: StandingsPage {
                    has_next,
                    page: 2,
                    results: vec![entry(7, "Pep Roulette", 51, 60), entry(8, "Klopp Dogs", 52, 40)],
                },
                ..Default::default()
            }),
        }
    }

    fn screen(state: &ViewState, view: &StandingsView) -> String {
        let backend = ratatui::backend::TestBackend::new(80, 8);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, frame.area(), state, view)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn title_shows_page_and_more() {
        assert_eq!(title(&loaded(true)), "Office: page 2 (more)");
        assert_eq!(title(&loaded(false)), "Office: page 2");
        assert_eq!(title(&StandingsView::new(1, "Work")), "Work: page 1");
    }

    #[test]
    fn rank_change_glyphs() {
        assert_eq!(rank_change(&entry(1, "a", 5, 9)).0, "▲");
        assert_eq!(rank_change(&entry(1, "a", 9, 5)).0, "▼");
        assert_eq!(rank_change(&entry(1, "a", 5, 5)).0, "=");
        assert_eq!(rank_change(&entry(1, "a", 5, 0)).0, " ");
    }

    #[test]
    fn connected_team_row_is_highlighted() {
        let connected = standing_row(&entry(7, "Pep Roulette", 51, 60), Some(7));
        let other = standing_row(&entry(8, "Klopp Dogs", 52, 40), Some(7));
        assert_eq!(
            connected,
            standing_row(&entry(7, "Pep Roulette", 51, 60), None)
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        );
        assert_eq!(
            other,
            standing_row(&entry(8, "Klopp Dogs", 52, 40), None).style(Style::default().fg(Color::White))
        );
    }

    #[test]
    fn renders_rows_loading_and_errors() {
        let state = ViewState {
            session: Session {
                entry_id: Some(7),
                favorite_leagues: vec![],
            },
            ..Default::default()
        };
        let text = screen(&state, &loaded(true));
        assert!(text.contains("Pep Roulette"));
        assert!(text.contains("Klopp Dogs Manager"));

        let pending = StandingsView::new(314, "Office");
        assert!(screen(&state, &pending).contains("Loading league..."));

        let mut failing = state.clone();
        failing.errors.insert(MetricKind::Standings, "league 314 not found".into());
        assert!(screen(&failing, &pending).contains("league 314 not found"));
    }
}
