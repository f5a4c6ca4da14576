// Fixtures widgets: the full schedule tab and the next-gameweek preview on
// the dashboard.
//
// A fixture line reads "ARS 2-1 CHE  FT", "ARS v CHE  Sat 14:00" or
// "ARS 1-0 CHE  55'" depending on its state. Difficulty (1-5) colours the
// club short names in the preview.

use chrono::{DateTime, Local};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use fplwatch_app::protocol::MetricKind;
use fplwatch_core::fixtures::{FixtureLine, FixtureSchedule};

use super::{error_line, placeholder};
use crate::tui::ViewState;

/// Fixtures tab.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut lines = Vec::new();
    if let Some(message) = state.errors.get(&MetricKind::Fixtures) {
        lines.push(error_line(message));
    }
    match state.fixtures.as_ref() {
        Some(snapshot) => lines.extend(schedule_lines(&snapshot.schedule)),
        None if lines.is_empty() => lines.push(placeholder("Loading fixtures...")),
        None => {}
    }

    let visible_rows = (area.height as usize).saturating_sub(2);
    let max_offset = lines.len().saturating_sub(visible_rows);
    let scroll = (state.fixture_scroll as usize).min(max_offset) as u16;

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Fixtures"))
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

/// Dashboard panel: the first few fixtures of the next gameweek.
pub fn render_preview(frame: &mut Frame, area: Rect, state: &ViewState) {
    let lines = match state.fixtures.as_ref() {
        Some(snapshot) if snapshot.preview.is_empty() => vec![placeholder("No upcoming fixtures")],
        Some(snapshot) => snapshot.preview.iter().map(preview_line).collect(),
        None => vec![placeholder("Loading...")],
    };
    let title = preview_title(state);
    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

/// Named after the gameweek the preview rows belong to.
pub fn preview_title(state: &ViewState) -> String {
    state
        .fixtures
        .as_ref()
        .and_then(|snapshot| snapshot.preview.first())
        .map(|fixture| format!("GW {} Preview", fixture.gameweek))
        .unwrap_or_else(|| "Next GW".to_string())
}

pub fn schedule_lines(schedule: &FixtureSchedule) -> Vec<Line<'static>> {
    if schedule.gameweeks.is_empty() {
        return vec![placeholder("No fixtures")];
    }

    let mut lines = Vec::new();
    for gameweek in &schedule.gameweeks {
        let marker = if gameweek.gameweek == schedule.current_gameweek {
            " (current)"
        } else {
            ""
        };
        lines.push(Line::from(Span::styled(
            format!(" Gameweek {}{marker}", gameweek.gameweek),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )));
        for fixture in &gameweek.fixtures {
            lines.push(Line::from(vec![
                Span::raw("   "),
                Span::styled(format_matchup(fixture), Style::default().fg(Color::White)),
                Span::styled(
                    format!("  {}", format_status(fixture)),
                    Style::default().fg(Color::Gray),
                ),
            ]));
        }
    }
    lines
}

fn preview_line(fixture: &FixtureLine) -> Line<'static> {
    Line::from(vec![
        Span::raw(" "),
        Span::styled(
            fixture.home.short_name.clone(),
            Style::default().fg(difficulty_color(fixture.home.difficulty)),
        ),
        Span::styled(" v ", Style::default().fg(Color::Gray)),
        Span::styled(
            fixture.away.short_name.clone(),
            Style::default().fg(difficulty_color(fixture.away.difficulty)),
        ),
        Span::styled(
            format!("  {}", format_kickoff(fixture.kickoff_time.as_deref())),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

/// "ARS 2-1 CHE" once scores exist, "ARS v CHE" before kickoff.
pub fn format_matchup(fixture: &FixtureLine) -> String {
    match (fixture.home.score, fixture.away.score) {
        (Some(home), Some(away)) => format!(
            "{} {home}-{away} {}",
            fixture.home.short_name, fixture.away.short_name
        ),
        _ => format!("{} v {}", fixture.home.short_name, fixture.away.short_name),
    }
}

/// "FT", the minute while in play, or the local kickoff time.
pub fn format_status(fixture: &FixtureLine) -> String {
    if fixture.finished {
        "FT".to_string()
    } else if fixture.minutes > 0 {
        format!("{}'", fixture.minutes)
    } else {
        format_kickoff(fixture.kickoff_time.as_deref())
    }
}

pub fn format_kickoff(kickoff: Option<&str>) -> String {
    kickoff
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|at| at.with_timezone(&Local).format("%a %d %b %H:%M").to_string())
        .unwrap_or_else(|| "TBC".to_string())
}

/// FPL difficulty rating colour, 1 easiest to 5 hardest.
pub fn difficulty_color(difficulty: u8) -> Color {
    match difficulty {
        0 | 1 | 2 => Color::Green,
        3 => Color::Gray,
        4 => Color::LightRed,
        _ => Color::Red,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use fplwatch_app::service::FixturesSnapshot;
    use fplwatch_core::fixtures::{FixtureSide, GameweekFixtures};

    use crate::tui::widgets::line_text;

    fn side(short: &str, score: Option<u32>, difficulty: u8) -> FixtureSide {
        FixtureSide {
            club_id: 1,
            name: short.to_string(),
            short_name: short.to_string(),
            score,
            difficulty,
        }
    }

    fn fixture(gameweek: u32, scores: Option<(u32, u32)>, finished: bool, minutes: u32) -> FixtureLine {
        FixtureLine {
            id: 1,
            gameweek,
            kickoff_time: None,
            finished,
            minutes,
            home: side("ARS", scores.map(|s| s.0), 2),
            away: side("CHE", scores.map(|s| s.1), 4),
        }
    }

    fn snapshot() -> FixturesSnapshot {
        FixturesSnapshot {
            schedule: FixtureSchedule {
                view: "all".to_string(),
                current_gameweek: 10,
                gameweeks: vec![
                    GameweekFixtures {
                        gameweek: 10,
                        fixtures: vec![fixture(10, Some((2, 1)), true, 90)],
                    },
                    GameweekFixtures {
                        gameweek: 11,
                        fixtures: vec![fixture(11, None, false, 0)],
                    },
                ],
            },
            preview: vec![fixture(11, None, false, 0)],
        }
    }

    #[test]
    fn matchup_and_status_formats() {
        let done = fixture(10, Some((2, 1)), true, 90);
        assert_eq!(format_matchup(&done), "ARS 2-1 CHE");
        assert_eq!(format_status(&done), "FT");

        let playing = fixture(10, Some((1, 0)), false, 55);
        assert_eq!(format_status(&playing), "55'");

        let upcoming = fixture(11, None, false, 0);
        assert_eq!(format_matchup(&upcoming), "ARS v CHE");
        assert_eq!(format_status(&upcoming), "TBC");
    }

    #[test]
    fn kickoff_parses_rfc3339() {
        assert_eq!(format_kickoff(None), "TBC");
        assert_eq!(format_kickoff(Some("not a date")), "TBC");
        assert_ne!(format_kickoff(Some("2024-08-16T19:00:00Z")), "TBC");
    }

    #[test]
    fn difficulty_colours() {
        assert_eq!(difficulty_color(2), Color::Green);
        assert_eq!(difficulty_color(3), Color::Gray);
        assert_eq!(difficulty_color(5), Color::Red);
    }

    #[test]
    fn schedule_groups_by_gameweek() {
        let lines: Vec<String> = schedule_lines(&snapshot().schedule).iter().map(line_text).collect();
        assert_eq!(lines[0], " Gameweek 10 (current)");
        assert!(lines[1].contains("ARS 2-1 CHE  FT"));
        assert_eq!(lines[2], " Gameweek 11");
        assert!(lines[3].contains("ARS v CHE"));
    }

    #[test]
    fn preview_title_follows_preview_rows() {
        let mut state = ViewState::default();
        assert_eq!(preview_title(&state), "Next GW");

        // Before the season: no current gameweek, the next one is GW 1.
        let mut pre_season = snapshot();
        pre_season.schedule.current_gameweek = 1;
        pre_season.preview = vec![fixture(1, None, false, 0)];
        state.fixtures = Some(pre_season);
        assert_eq!(preview_title(&state), "GW 1 Preview");

        state.fixtures = Some(snapshot());
        assert_eq!(preview_title(&state), "GW 11 Preview");

        state.fixtures.as_mut().unwrap().preview.clear();
        assert_eq!(preview_title(&state), "Next GW");
    }

    #[test]
    fn render_both_panels_does_not_panic() {
        let backend = ratatui::backend::TestBackend::new(60, 12);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let mut state = ViewState::default();
        terminal
            .draw(|frame| {
                render(frame, frame.area(), &state);
            })
            .unwrap();

        state.fixtures = Some(snapshot());
        state.fixture_scroll = 100;
        terminal
            .draw(|frame| {
                let area = frame.area();
                render(frame, area, &state);
                render_preview(frame, area, &state);
            })
            .unwrap();
    }
}
