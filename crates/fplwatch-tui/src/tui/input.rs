// Keyboard input handling.
//
// Translates crossterm key events into UserCommand messages for the command
// task, or into local ViewState mutations (tab switching, selection, the
// team id prompt). On the Leagues tab, Enter opens the selected league's
// table; n/p page through it and Esc goes back to the list.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use fplwatch_app::protocol::MetricKind;
use fplwatch_core::session::parse_team_id;

use super::{StandingsView, TabId, UserCommand, ViewState};

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press needs the session or the
/// poller, `None` when it only changed `ViewState`.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Windows reports Press and Release for each keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c') {
        return Some(UserCommand::Quit);
    }

    if view_state.entry_mode {
        return handle_entry_mode(key_event, view_state);
    }

    match key_event.code {
        KeyCode::Char('1') => {
            view_state.active_tab = TabId::Dashboard;
            None
        }
        KeyCode::Char('2') => {
            view_state.active_tab = TabId::Fixtures;
            None
        }
        KeyCode::Char('3') => {
            view_state.active_tab = TabId::Leagues;
            None
        }

        KeyCode::Up | KeyCode::Char('k') => {
            move_selection(view_state, -1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            move_selection(view_state, 1);
            None
        }

        KeyCode::Char('c') => {
            view_state.entry_mode = true;
            view_state.entry_input.clear();
            view_state.entry_error = None;
            None
        }
        KeyCode::Char('x') => view_state
            .session
            .is_connected()
            .then_some(UserCommand::Disconnect),
        KeyCode::Char('r') => Some(UserCommand::Refresh),
        KeyCode::Char('f') if showing_league_list(view_state) => view_state
            .selected_league_id()
            .map(UserCommand::ToggleFavorite),

        KeyCode::Enter if showing_league_list(view_state) => open_standings(view_state),
        KeyCode::Char('n') if showing_standings(view_state) => turn_page(view_state, true),
        KeyCode::Char('p') if showing_standings(view_state) => turn_page(view_state, false),
        KeyCode::Esc if showing_standings(view_state) => {
            view_state.standings = None;
            view_state.errors.remove(&MetricKind::Standings);
            Some(UserCommand::CloseStandings)
        }

        KeyCode::Char('q') => Some(UserCommand::Quit),
        _ => None,
    }
}

/// Team id prompt: digits and editing keys, Enter validates, Esc cancels.
fn handle_entry_mode(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc => {
            view_state.entry_mode = false;
            view_state.entry_input.clear();
            view_state.entry_error = None;
            None
        }
        KeyCode::Enter => match parse_team_id(&view_state.entry_input) {
            Ok(entry_id) => {
                view_state.entry_mode = false;
                view_state.entry_input.clear();
                view_state.entry_error = None;
                Some(UserCommand::Connect(entry_id))
            }
            Err(e) => {
                view_state.entry_error = Some(e.to_string());
                None
            }
        },
        KeyCode::Backspace => {
            view_state.entry_input.pop();
            view_state.entry_error = None;
            None
        }
        KeyCode::Char(ch) => {
            view_state.entry_input.push(ch);
            view_state.entry_error = None;
            None
        }
        _ => None,
    }
}

fn showing_league_list(view_state: &ViewState) -> bool {
    view_state.active_tab == TabId::Leagues && view_state.standings.is_none()
}

fn showing_standings(view_state: &ViewState) -> bool {
    view_state.active_tab == TabId::Leagues && view_state.standings.is_some()
}

fn open_standings(view_state: &mut ViewState) -> Option<UserCommand> {
    let row = view_state.league_rows().into_iter().nth(view_state.selected_league)?;
    let league_id = row.id;
    view_state.standings = Some(StandingsView::new(league_id, row.name));
    view_state.errors.remove(&MetricKind::Standings);
    Some(UserCommand::OpenStandings { league_id, page: 1 })
}

/// Next page only while upstream reports more; previous stops at page 1.
fn turn_page(view_state: &mut ViewState, forward: bool) -> Option<UserCommand> {
    let view = view_state.standings.as_mut()?;
    let page = if forward {
        view.has_next().then_some(view.page + 1)?
    } else {
        (view.page > 1).then(|| view.page - 1)?
    };
    view.page = page;
    view.data = None;
    let league_id = view.league_id;
    view_state.errors.remove(&MetricKind::Standings);
    Some(UserCommand::OpenStandings { league_id, page })
}

fn move_selection(view_state: &mut ViewState, delta: i32) {
    match view_state.active_tab {
        TabId::Leagues => {
            let len = view_state.league_rows().len();
            if len == 0 {
                return;
            }
            let next = view_state.selected_league as i64 + i64::from(delta);
            view_state.selected_league = next.clamp(0, len as i64 - 1) as usize;
        }
        TabId::Fixtures => {
            view_state.fixture_scroll = if delta < 0 {
                view_state.fixture_scroll.saturating_sub(1)
            } else {
                view_state.fixture_scroll.saturating_add(1)
            };
        }
        TabId::Dashboard => {}
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use fplwatch_app::protocol::DashboardUpdate;
    use fplwatch_core::leagues::TeamLeagues;
    use fplwatch_core::models::{LeagueMembership, LeagueStandings, StandingsPage};
    use fplwatch_core::session::Session;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(state: &mut ViewState, text: &str) {
        for ch in text.chars() {
            assert_eq!(handle_key(press(KeyCode::Char(ch)), state), None);
        }
    }

    fn with_leagues(ids: &[u64]) -> ViewState {
        let mut state = ViewState {
            session: Session {
                entry_id: Some(1),
                favorite_leagues: vec![],
            },
            ..Default::default()
        };
        super::super::apply_update(
            &mut state,
            DashboardUpdate::Leagues {
                entry_id: 1,
                leagues: TeamLeagues {
                    classic: ids
                        .iter()
                        .map(|id| LeagueMembership {
                            id: *id,
                            name: format!("League {id}"),
                            ..Default::default()
                        })
                        .collect(),
                    ..Default::default()
                },
            },
        );
        state.active_tab = TabId::Leagues;
        state
    }

    fn page_arrives(state: &mut ViewState, has_next: bool) {
        let view = state.standings.as_ref().unwrap();
        let (league_id, page) = (view.league_id, view.page);
        super::super::apply_update(
            state,
            DashboardUpdate::Standings {
                league_id,
                page,
                standings: LeagueStandings {
                    standings: StandingsPage {
                        has_next,
                        page,
                        results: vec![],
                    },
                    ..Default::default()
                },
            },
        );
    }

    #[test]
    fn release_events_are_ignored() {
        let mut state = ViewState::default();
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(handle_key(release, &mut state), None);
    }

    #[test]
    fn ctrl_c_quits_even_in_entry_mode() {
        let mut state = ViewState {
            entry_mode: true,
            ..Default::default()
        };
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(key, &mut state), Some(UserCommand::Quit));
    }

    #[test]
    fn number_keys_switch_tabs() {
        let mut state = ViewState::default();
        handle_key(press(KeyCode::Char('2')), &mut state);
        assert_eq!(state.active_tab, TabId::Fixtures);
        handle_key(press(KeyCode::Char('3')), &mut state);
        assert_eq!(state.active_tab, TabId::Leagues);
        handle_key(press(KeyCode::Char('1')), &mut state);
        assert_eq!(state.active_tab, TabId::Dashboard);
    }

    #[test]
    fn entering_a_team_id_connects() {
        let mut state = ViewState::default();
        handle_key(press(KeyCode::Char('c')), &mut state);
        assert!(state.entry_mode);

        type_text(&mut state, "12345x");
        handle_key(press(KeyCode::Backspace), &mut state);
        assert_eq!(state.entry_input, "12345");

        let cmd = handle_key(press(KeyCode::Enter), &mut state);
        assert_eq!(cmd, Some(UserCommand::Connect(12345)));
        assert!(!state.entry_mode);
        assert!(state.entry_input.is_empty());
    }

    #[test]
    fn empty_team_id_shows_prompt_error() {
        let mut state = ViewState::default();
        handle_key(press(KeyCode::Char('c')), &mut state);
        assert_eq!(handle_key(press(KeyCode::Enter), &mut state), None);
        assert!(state.entry_mode);
        assert_eq!(state.entry_error.as_deref(), Some("Please enter your FPL Team ID"));

        type_text(&mut state, "1");
        assert_eq!(state.entry_error, None);
    }

    #[test]
    fn non_numeric_team_id_is_rejected() {
        let mut state = ViewState::default();
        handle_key(press(KeyCode::Char('c')), &mut state);
        type_text(&mut state, "abc");
        assert_eq!(handle_key(press(KeyCode::Enter), &mut state), None);
        assert!(state.entry_error.is_some());
    }

    #[test]
    fn escape_cancels_entry() {
        let mut state = ViewState::default();
        handle_key(press(KeyCode::Char('c')), &mut state);
        type_text(&mut state, "99");
        handle_key(press(KeyCode::Esc), &mut state);
        assert!(!state.entry_mode);
        assert!(state.entry_input.is_empty());
        // 'q' quits again once the prompt is closed.
        assert_eq!(handle_key(press(KeyCode::Char('q')), &mut state), Some(UserCommand::Quit));
    }

    #[test]
    fn disconnect_only_when_connected() {
        let mut state = ViewState::default();
        assert_eq!(handle_key(press(KeyCode::Char('x')), &mut state), None);
        state.session = Session {
            entry_id: Some(7),
            favorite_leagues: vec![],
        };
        assert_eq!(handle_key(press(KeyCode::Char('x')), &mut state), Some(UserCommand::Disconnect));
    }

    #[test]
    fn refresh_key() {
        let mut state = ViewState::default();
        assert_eq!(handle_key(press(KeyCode::Char('r')), &mut state), Some(UserCommand::Refresh));
    }

    #[test]
    fn league_selection_is_clamped() {
        let mut state = with_leagues(&[10, 20, 30]);
        handle_key(press(KeyCode::Up), &mut state);
        assert_eq!(state.selected_league, 0);
        for _ in 0..5 {
            handle_key(press(KeyCode::Char('j')), &mut state);
        }
        assert_eq!(state.selected_league, 2);
        handle_key(press(KeyCode::Char('k')), &mut state);
        assert_eq!(state.selected_league_id(), Some(20));
    }

    #[test]
    fn favourite_toggles_selected_league_on_leagues_tab_only() {
        let mut state = with_leagues(&[10, 20]);
        handle_key(press(KeyCode::Down), &mut state);
        assert_eq!(
            handle_key(press(KeyCode::Char('f')), &mut state),
            Some(UserCommand::ToggleFavorite(20))
        );

        state.active_tab = TabId::Dashboard;
        assert_eq!(handle_key(press(KeyCode::Char('f')), &mut state), None);
    }

    #[test]
    fn fixtures_scroll_saturates_at_top() {
        let mut state = ViewState {
            active_tab: TabId::Fixtures,
            ..Default::default()
        };
        handle_key(press(KeyCode::Up), &mut state);
        assert_eq!(state.fixture_scroll, 0);
        handle_key(press(KeyCode::Down), &mut state);
        handle_key(press(KeyCode::Down), &mut state);
        assert_eq!(state.fixture_scroll, 2);
    }

    #[test]
    fn enter_opens_the_selected_league_table() {
        let mut state = with_leagues(&[10, 20]);
        handle_key(press(KeyCode::Down), &mut state);
        assert_eq!(
            handle_key(press(KeyCode::Enter), &mut state),
            Some(UserCommand::OpenStandings { league_id: 20, page: 1 })
        );
        let view = state.standings.as_ref().unwrap();
        assert_eq!(view.league_name, "League 20");
        assert_eq!(view.page, 1);

        // Favouriting is for the list, not the table.
        assert_eq!(handle_key(press(KeyCode::Char('f')), &mut state), None);
    }

    #[test]
    fn enter_without_leagues_does_nothing() {
        let mut state = ViewState {
            active_tab: TabId::Leagues,
            ..Default::default()
        };
        assert_eq!(handle_key(press(KeyCode::Enter), &mut state), None);
        assert!(state.standings.is_none());
    }

    #[test]
    fn paging_follows_has_next_and_stops_at_first_page() {
        let mut state = with_leagues(&[10]);
        handle_key(press(KeyCode::Enter), &mut state);

        // Nothing loaded yet, so no next page.
        assert_eq!(handle_key(press(KeyCode::Char('n')), &mut state), None);
        assert_eq!(handle_key(press(KeyCode::Char('p')), &mut state), None);

        page_arrives(&mut state, true);
        assert_eq!(
            handle_key(press(KeyCode::Char('n')), &mut state),
            Some(UserCommand::OpenStandings { league_id: 10, page: 2 })
        );
        assert!(state.standings.as_ref().unwrap().data.is_none());

        page_arrives(&mut state, false);
        assert_eq!(handle_key(press(KeyCode::Char('n')), &mut state), None);
        assert_eq!(
            handle_key(press(KeyCode::Char('p')), &mut state),
            Some(UserCommand::OpenStandings { league_id: 10, page: 1 })
        );
    }

    #[test]
    fn escape_closes_the_table() {
        let mut state = with_leagues(&[10]);
        handle_key(press(KeyCode::Enter), &mut state);
        state.errors.insert(MetricKind::Standings, "down".into());

        assert_eq!(handle_key(press(KeyCode::Esc), &mut state), Some(UserCommand::CloseStandings));
        assert!(state.standings.is_none());
        assert!(state.errors.is_empty());
        assert_eq!(handle_key(press(KeyCode::Esc), &mut state), None);
    }
}
