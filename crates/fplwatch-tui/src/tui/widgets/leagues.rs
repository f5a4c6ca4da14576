// Leagues widget: classic leagues with favourites pinned to the top, then
// the team's head-to-head leagues.
//
// "★" marks a favourite; the movement arrow compares the team's league rank
// now against the previous gameweek. Only classic leagues are selectable.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use fplwatch_app::protocol::MetricKind;
use fplwatch_core::leagues::{LeagueRow, RankMovement};
use fplwatch_core::models::LeagueMembership;
use fplwatch_core::summary::format_rank;

use super::{error_line, placeholder};
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Leagues (j/k select, f favourite, Enter table)");

    let rows = state.league_rows();
    let h2h = state.h2h_leagues();
    if rows.is_empty() && h2h.is_empty() {
        let line = if let Some(message) = state.errors.get(&MetricKind::Leagues) {
            error_line(message)
        } else if state.session.is_connected() {
            placeholder("Loading leagues...")
        } else {
            placeholder("Connect a team to see its leagues")
        };
        frame.render_widget(Paragraph::new(line).block(block), area);
        return;
    }

    // Classic rows come first so the selection index lines up with them.
    let mut items: Vec<ListItem> = rows.iter().map(|row| ListItem::new(league_line(row))).collect();
    if rows.is_empty() {
        items.push(ListItem::new(placeholder("No classic leagues")));
    }
    items.push(ListItem::new(Line::raw("")));
    items.push(ListItem::new(section_header("Head-to-head")));
    if h2h.is_empty() {
        items.push(ListItem::new(placeholder("No head-to-head leagues")));
    }
    items.extend(h2h.iter().map(|league| ListItem::new(h2h_line(league))));

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
    let selected = (!rows.is_empty()).then_some(state.selected_league);
    let mut list_state = ListState::default().with_selected(selected);
    frame.render_stateful_widget(list, area, &mut list_state);
}

pub fn league_line(row: &LeagueRow) -> Line<'static> {
    let star = if row.favorite { "★ " } else { "  " };
    let (arrow, colour) = movement_glyph(row.movement);
    Line::from(vec![
        Span::styled(star, Style::default().fg(Color::Yellow)),
        Span::styled(format!("{:<32}", row.name), Style::default().fg(Color::White)),
        Span::styled(
            format!("{:>12} ", format_rank(row.rank)),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(arrow, Style::default().fg(colour)),
    ])
}

fn section_header(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {title}"),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
}

/// Head-to-head leagues are listed for reference, without favourites.
pub fn h2h_line(league: &LeagueMembership) -> Line<'static> {
    let (arrow, colour) =
        movement_glyph(RankMovement::between(league.entry_last_rank, league.entry_rank));
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{:<32}", league.name), Style::default().fg(Color::White)),
        Span::styled(
            format!("{:>12} ", format_rank(league.entry_rank)),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(arrow, Style::default().fg(colour)),
    ])
}

pub fn movement_glyph(movement: RankMovement) -> (&'static str, Color) {
    match movement {
        RankMovement::Up => ("▲", Color::Green),
        RankMovement::Down => ("▼", Color::Red),
        RankMovement::Same => ("=", Color::Gray),
        RankMovement::Unknown => (" ", Color::Gray),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use fplwatch_app::protocol::DashboardUpdate;
    use fplwatch_core::leagues::TeamLeagues;
    use fplwatch_core::models::LeagueMembership;

    use fplwatch_core::session::Session;

    use crate::tui::apply_update;
    use crate::tui::widgets::line_text;

    fn row(favorite: bool, movement: RankMovement) -> LeagueRow {
        LeagueRow {
            id: 314,
            name: "Overall".to_string(),
            rank: Some(12_345),
            movement,
            favorite,
        }
    }

    #[test]
    fn favourite_rows_carry_a_star() {
        let text = line_text(&league_line(&row(true, RankMovement::Up)));
        assert!(text.starts_with("★ Overall"));
        assert!(text.contains("12,345"));
        assert!(text.ends_with('▲'));

        let text = line_text(&league_line(&row(false, RankMovement::Down)));
        assert!(text.starts_with("  Overall"));
        assert!(text.ends_with('▼'));
    }

    #[test]
    fn h2h_rows_have_no_star() {
        let league = LeagueMembership {
            id: 77,
            name: "Cup Rivals".into(),
            entry_rank: Some(3),
            entry_last_rank: Some(3),
            ..Default::default()
        };
        let text = line_text(&h2h_line(&league));
        assert!(text.starts_with("  Cup Rivals"));
        assert!(text.ends_with('='));
    }

    #[test]
    fn movement_glyphs() {
        assert_eq!(movement_glyph(RankMovement::Same).0, "=");
        assert_eq!(movement_glyph(RankMovement::Unknown).0, " ");
    }

    #[test]
    fn render_does_not_panic_empty_or_populated() {
        let backend = ratatui::backend::TestBackend::new(70, 10);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let mut state = ViewState::default();
        terminal.draw(|frame| render(frame, frame.area(), &state)).unwrap();

        state.session = Session {
            entry_id: Some(5),
            favorite_leagues: vec![],
        };
        apply_update(
            &mut state,
            DashboardUpdate::Leagues {
                entry_id: 5,
                leagues: TeamLeagues {
                    classic: vec![
                        LeagueMembership {
                            id: 1,
                            name: "Overall".into(),
                            entry_rank: Some(10),
                            entry_last_rank: Some(20),
                            ..Default::default()
                        },
                        LeagueMembership {
                            id: 2,
                            name: "Work".into(),
                            ..Default::default()
                        },
                    ],
                    h2h: vec![LeagueMembership {
                        id: 3,
                        name: "Rivals".into(),
                        ..Default::default()
                    }],
                    ..Default::default()
                },
            },
        );
        state.selected_league = 1;
        terminal.draw(|frame| render(frame, frame.area(), &state)).unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Overall"));
        assert!(text.contains("Work"));
        assert!(text.contains("Head-to-head"));
        assert!(text.contains("Rivals"));
    }
}
