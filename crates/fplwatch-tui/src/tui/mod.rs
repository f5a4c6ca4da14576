// Terminal dashboard: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` built from the poller's `DashboardUpdate`
// broadcasts and the session watch channel. Key presses that change the
// session or ask for a refresh become `UserCommand`s for the command task;
// everything else only mutates `ViewState`. Frames render at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use fplwatch_app::protocol::{DashboardUpdate, MetricKind};
use fplwatch_app::service::{FixturesSnapshot, LiveBreakdown, TeamOverview};
use fplwatch_core::leagues::{favorites_first, LeagueRow, TeamLeagues};
use fplwatch_core::metrics::DerivedSafetyScore;
use fplwatch_core::models::{LeagueMembership, LeagueStandings};
use fplwatch_core::session::Session;

use layout::{build_layout, dashboard_layout, AppLayout};

// ---------------------------------------------------------------------------
// Tabs and commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TabId {
    #[default]
    Dashboard,
    Fixtures,
    Leagues,
}

/// Requests from the TUI that the command task carries out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    Connect(u64),
    Disconnect,
    Refresh,
    ToggleFavorite(u64),
    OpenStandings { league_id: u64, page: u32 },
    CloseStandings,
    Quit,
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// The league table opened from the Leagues tab.
#[derive(Debug, Clone, PartialEq)]
pub struct StandingsView {
    pub league_id: u64,
    pub league_name: String,
    pub page: u32,
    /// `None` until the requested page arrives.
    pub data: Option<LeagueStandings>,
}

impl StandingsView {
    pub fn new(league_id: u64, league_name: impl Into<String>) -> Self {
        Self {
            league_id,
            league_name: league_name.into(),
            page: 1,
            data: None,
        }
    }

    pub fn has_next(&self) -> bool {
        self.data.as_ref().is_some_and(|d| d.standings.has_next)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub active_tab: TabId,
    pub session: Session,

    pub team: Option<TeamOverview>,
    pub live: Option<LiveBreakdown>,
    pub safety: Option<DerivedSafetyScore>,
    pub leagues: Option<TeamLeagues>,
    pub fixtures: Option<FixturesSnapshot>,
    /// Latest failure per metric, cleared by the next success.
    pub errors: HashMap<MetricKind, String>,
    pub last_update: Option<DateTime<Utc>>,

    /// Team id entry mode (`c`).
    pub entry_mode: bool,
    pub entry_input: String,
    pub entry_error: Option<String>,

    pub selected_league: usize,
    pub standings: Option<StandingsView>,
    pub fixture_scroll: u16,
}

impl ViewState {
    /// Classic leagues with favourites first, as listed on the Leagues tab.
    pub fn league_rows(&self) -> Vec<LeagueRow> {
        let classic = self
            .leagues
            .as_ref()
            .map(|l| l.classic.as_slice())
            .unwrap_or_default();
        favorites_first(classic, &self.session.favorite_leagues)
    }

    pub fn selected_league_id(&self) -> Option<u64> {
        self.league_rows().get(self.selected_league).map(|r| r.id)
    }

    pub fn h2h_leagues(&self) -> &[LeagueMembership] {
        self.leagues.as_ref().map(|l| l.h2h.as_slice()).unwrap_or_default()
    }

    pub fn current_gameweek(&self) -> Option<u32> {
        self.team
            .as_ref()
            .map(|t| t.team_info.current_gameweek)
            .or_else(|| self.live.as_ref().map(|l| l.gameweek))
            .or_else(|| self.fixtures.as_ref().map(|f| f.schedule.current_gameweek))
    }

    fn clear_team_data(&mut self) {
        self.team = None;
        self.live = None;
        self.safety = None;
        self.leagues = None;
        self.errors.retain(|metric, _| !metric.needs_entry());
        self.selected_league = 0;
    }
}

/// Apply one poller update to the view. Updates computed for a team other
/// than the connected one, and league pages nobody is looking at, are
/// dropped.
pub fn apply_update(state: &mut ViewState, update: DashboardUpdate) {
    if let Some(entry_id) = update.entry_id() {
        if state.session.entry_id != Some(entry_id) {
            debug!(entry_id, "dropping update for a team that is no longer connected");
            return;
        }
    }
    if let DashboardUpdate::Standings { league_id, page, .. } = &update {
        let wanted = state
            .standings
            .as_ref()
            .is_some_and(|view| view.league_id == *league_id && view.page == *page);
        if !wanted {
            debug!(league_id, page, "dropping league page that is not open");
            return;
        }
    }

    if let Some(metric) = update.metric() {
        if !matches!(update, DashboardUpdate::Failed { .. }) {
            state.errors.remove(&metric);
        }
    }

    match update {
        DashboardUpdate::Team { team, .. } => state.team = Some(team),
        DashboardUpdate::LivePoints(live) => state.live = Some(live),
        DashboardUpdate::Safety(safety) => state.safety = Some(safety),
        DashboardUpdate::Leagues { leagues, .. } => {
            state.leagues = Some(leagues);
            clamp_league_selection(state);
        }
        DashboardUpdate::Fixtures(fixtures) => state.fixtures = Some(fixtures),
        DashboardUpdate::Standings { standings, .. } => {
            if let Some(view) = state.standings.as_mut() {
                view.data = Some(standings);
            }
        }
        DashboardUpdate::Failed { metric, message, .. } => {
            state.errors.insert(metric, message);
        }
        DashboardUpdate::Disconnected => state.clear_team_data(),
    }
    state.last_update = Some(Utc::now());
}

/// Apply a session change. Leaving a team drops its data; data that
/// arrived for a newly connected team is kept.
pub fn apply_session(state: &mut ViewState, session: Session) {
    if state.session.entry_id.is_some() && session.entry_id != state.session.entry_id {
        state.clear_team_data();
    }
    state.session = session;
    clamp_league_selection(state);
}

/// Apply the latest session if it changed since it was last seen. Called
/// before each update so an update for a newly connected team is not taken
/// for a stale one.
pub fn sync_session(state: &mut ViewState, session: &mut watch::Receiver<Session>) {
    if session.has_changed().unwrap_or(false) {
        let current = session.borrow_and_update().clone();
        apply_session(state, current);
    }
}

fn clamp_league_selection(state: &mut ViewState) {
    let len = state.league_rows().len();
    if state.selected_league >= len {
        state.selected_league = len.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    render_main_panel(frame, &layout, state);
    render_help_bar(frame, &layout, state);
}

fn render_main_panel(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    match state.active_tab {
        TabId::Dashboard => {
            let dash = dashboard_layout(layout.main_panel);
            widgets::overview::render(frame, dash.overview, state);
            widgets::safety::render(frame, dash.safety, state);
            widgets::breakdown::render(frame, dash.breakdown, state);
            widgets::fixtures::render_preview(frame, dash.preview, state);
        }
        TabId::Fixtures => widgets::fixtures::render(frame, layout.main_panel, state),
        TabId::Leagues => match state.standings.as_ref() {
            Some(view) => widgets::standings::render(frame, layout.main_panel, state, view),
            None => widgets::leagues::render(frame, layout.main_panel, state),
        },
    }
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let line = if state.entry_mode {
        let mut spans = vec![
            Span::styled(" FPL Team ID: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                format!("{}_", state.entry_input),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  Enter:Connect  Esc:Cancel", Style::default().fg(Color::Gray)),
        ];
        if let Some(ref err) = state.entry_error {
            spans.push(Span::styled(format!("  {err}"), Style::default().fg(Color::Red)));
        }
        Line::from(spans)
    } else {
        let hints = match (state.active_tab, state.standings.is_some()) {
            (TabId::Leagues, true) => " q:Quit | 1-3:Tabs | n:Next page | p:Previous page | Esc:Back | r:Refresh",
            (TabId::Leagues, false) => {
                " q:Quit | 1-3:Tabs | c:Connect | x:Disconnect | r:Refresh | j/k:Select | f:Favourite | Enter:Standings"
            }
            _ => " q:Quit | 1-3:Tabs | c:Connect | x:Disconnect | r:Refresh | j/k:Scroll",
        };
        Line::from(Span::styled(
            hints,
            Style::default().fg(Color::White).add_modifier(Modifier::DIM),
        ))
    };
    let paragraph = Paragraph::new(line).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop until the user quits or the update channel closes.
pub async fn run(
    mut updates: broadcast::Receiver<DashboardUpdate>,
    mut session: watch::Receiver<Session>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    // 1. Initialize terminal
    let mut terminal = ratatui::init();

    // 2. Restore the terminal before the default panic output.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    // 3. Seed the view from the current session
    let mut view_state = ViewState::default();
    apply_session(&mut view_state, session.borrow_and_update().clone());

    let mut event_stream = EventStream::new();
    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut session_open = true;

    // 4. Main loop
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => {
                    sync_session(&mut view_state, &mut session);
                    apply_update(&mut view_state, update);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("TUI lagged, skipped {skipped} updates");
                }
                Err(RecvError::Closed) => break,
            },

            changed = session.changed(), if session_open => {
                if changed.is_err() {
                    session_open = false;
                } else {
                    let current = session.borrow_and_update().clone();
                    apply_session(&mut view_state, current);
                }
            }

            maybe_event = event_stream.next() => match maybe_event {
                Some(Ok(Event::Key(key_event))) => {
                    if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                        let quit = cmd == UserCommand::Quit;
                        debug!(?cmd, "user command");
                        let _ = cmd_tx.send(cmd).await;
                        if quit {
                            break;
                        }
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(_)) | None => break,
            },

            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    // 5. Restore terminal
    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
