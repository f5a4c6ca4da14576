// Messages published by the poller and the commands it accepts.

use std::fmt;

use serde::{Deserialize, Serialize};

use fplwatch_core::leagues::TeamLeagues;
use fplwatch_core::metrics::{DerivedLivePoints, DerivedSafetyScore};
use fplwatch_core::models::LeagueStandings;

use crate::service::{FixturesSnapshot, LiveBreakdown, TeamOverview};

/// The independently polled dashboard metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Team,
    LivePoints,
    Safety,
    Leagues,
    Fixtures,
    /// One page of a classic league table, only polled while it is open.
    Standings,
}

impl MetricKind {
    /// The metrics polled on a schedule.
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Team,
        MetricKind::LivePoints,
        MetricKind::Safety,
        MetricKind::Leagues,
        MetricKind::Fixtures,
    ];

    /// Whether polling this metric needs a connected team.
    pub fn needs_entry(self) -> bool {
        !matches!(self, MetricKind::Fixtures | MetricKind::Standings)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::Team => "team",
            MetricKind::LivePoints => "live points",
            MetricKind::Safety => "safety score",
            MetricKind::Leagues => "leagues",
            MetricKind::Fixtures => "fixtures",
            MetricKind::Standings => "league standings",
        };
        f.write_str(name)
    }
}

/// One poll result, pushed to the terminal UI and WebSocket clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardUpdate {
    Team { entry_id: u64, team: TeamOverview },
    /// Live points together with the per-pick breakdown they were summed
    /// from.
    LivePoints(LiveBreakdown),
    Safety(DerivedSafetyScore),
    Leagues { entry_id: u64, leagues: TeamLeagues },
    Fixtures(FixturesSnapshot),
    Standings {
        league_id: u64,
        page: u32,
        standings: LeagueStandings,
    },
    /// A poll failed; nothing from it was published. `entry_id` is the team
    /// it was polled for, if any.
    Failed {
        metric: MetricKind,
        entry_id: Option<u64>,
        message: String,
    },
    /// The session no longer has a connected team.
    Disconnected,
}

impl DashboardUpdate {
    pub fn metric(&self) -> Option<MetricKind> {
        match self {
            DashboardUpdate::Team { .. } => Some(MetricKind::Team),
            DashboardUpdate::LivePoints(_) => Some(MetricKind::LivePoints),
            DashboardUpdate::Safety(_) => Some(MetricKind::Safety),
            DashboardUpdate::Leagues { .. } => Some(MetricKind::Leagues),
            DashboardUpdate::Fixtures(_) => Some(MetricKind::Fixtures),
            DashboardUpdate::Standings { .. } => Some(MetricKind::Standings),
            DashboardUpdate::Failed { metric, .. } => Some(*metric),
            DashboardUpdate::Disconnected => None,
        }
    }

    /// The team this update was computed for. `None` for updates that do not
    /// depend on the connected team.
    pub fn entry_id(&self) -> Option<u64> {
        match self {
            DashboardUpdate::Team { entry_id, .. } | DashboardUpdate::Leagues { entry_id, .. } => {
                Some(*entry_id)
            }
            DashboardUpdate::LivePoints(breakdown) => Some(breakdown.entry_id),
            DashboardUpdate::Safety(score) => Some(score.entry_id),
            DashboardUpdate::Failed { entry_id, .. } => *entry_id,
            DashboardUpdate::Fixtures(_)
            | DashboardUpdate::Standings { .. }
            | DashboardUpdate::Disconnected => None,
        }
    }

    /// The headline live points figure, if this update carries one.
    pub fn live_points(&self) -> Option<DerivedLivePoints> {
        match self {
            DashboardUpdate::LivePoints(breakdown) => Some(breakdown.summary()),
            _ => None,
        }
    }
}

/// Commands sent to the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollCommand {
    /// Poll every metric now instead of waiting for the next tick.
    RefreshNow,
    /// Fetch a page of a classic league table and keep it polled with the
    /// leagues until closed.
    OpenStandings { league_id: u64, page: u32 },
    CloseStandings,
    Shutdown,
}
