// Dashboard service: resolves the current gameweek, fetches what a metric
// needs concurrently, and runs the core computations over it.
//
// Every operation is all-or-nothing. A failed fetch fails the whole
// operation; nothing is computed from partial inputs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use fplwatch_core::config::SafetyConfig;
use fplwatch_core::fixtures::{build_schedule, next_gameweek_preview, FixtureLine, FixtureSchedule, FixtureView};
use fplwatch_core::leagues::TeamLeagues;
use fplwatch_core::metrics::{
    estimate_safety, live_breakdown, DerivedLivePoints, DerivedSafetyScore, PickContribution,
    SafetyInputs, SafetyPolicy,
};
use fplwatch_core::models::{EntryHistory, EntryPicks, LeagueStandings};
use fplwatch_core::summary::TeamInfo;
use fplwatch_core::FplError;

use crate::client::{paths, FplSource};

// ---------------------------------------------------------------------------
// Result shapes
// ---------------------------------------------------------------------------

/// The team page: raw current-gameweek picks, season history and the
/// headline figures derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamOverview {
    pub current: EntryPicks,
    pub history: EntryHistory,
    pub team_info: TeamInfo,
}

/// Live points with the per-pick contributions behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBreakdown {
    pub entry_id: u64,
    pub gameweek: u32,
    pub live_points: i64,
    /// Official gameweek points from the picks payload, when present.
    pub gameweek_points: Option<i64>,
    pub picks: Vec<PickContribution>,
    pub last_updated: DateTime<Utc>,
}

impl LiveBreakdown {
    pub fn summary(&self) -> DerivedLivePoints {
        DerivedLivePoints {
            entry_id: self.entry_id,
            gameweek: self.gameweek,
            live_points: self.live_points,
            last_updated: self.last_updated,
        }
    }

    /// True while the live total has moved away from the official figure,
    /// i.e. matches are being played.
    pub fn is_live(&self) -> bool {
        self.gameweek_points.is_some_and(|official| official != self.live_points)
    }
}

/// Everything the fixtures tab and the dashboard preview show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixturesSnapshot {
    pub schedule: FixtureSchedule,
    pub preview: Vec<FixtureLine>,
}

// ---------------------------------------------------------------------------
// DashboardService
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct DashboardService {
    source: Arc<dyn FplSource>,
    policy: SafetyPolicy,
    fallback_total_players: u64,
}

impl DashboardService {
    pub fn new(source: Arc<dyn FplSource>, safety: &SafetyConfig) -> Self {
        Self {
            source,
            policy: safety.policy.clone(),
            fallback_total_players: safety.fallback_total_players,
        }
    }

    pub fn source(&self) -> &Arc<dyn FplSource> {
        &self.source
    }

    pub async fn current_gameweek(&self) -> Result<u32, FplError> {
        Ok(self.source.bootstrap().await?.current_gameweek())
    }

    pub async fn live_points(&self, entry_id: u64) -> Result<DerivedLivePoints, FplError> {
        let gameweek = self.current_gameweek().await?;
        let (picks, live) = tokio::try_join!(
            self.source.entry_picks(entry_id, gameweek),
            self.source.event_live(gameweek),
        )?;
        Ok(DerivedLivePoints::compute(
            entry_id,
            gameweek,
            &picks.picks,
            &live.stats_by_player(),
            Utc::now(),
        ))
    }

    /// Live points plus per-pick contributions, with player names resolved
    /// from the bootstrap fetched to find the gameweek.
    pub async fn live_breakdown(&self, entry_id: u64) -> Result<LiveBreakdown, FplError> {
        let bootstrap = self.source.bootstrap().await?;
        let gameweek = bootstrap.current_gameweek();
        let (picks, live) = tokio::try_join!(
            self.source.entry_picks(entry_id, gameweek),
            self.source.event_live(gameweek),
        )?;

        let stats = live.stats_by_player();
        let contributions = live_breakdown(&picks.picks, &stats, Some(&bootstrap));
        Ok(LiveBreakdown {
            entry_id,
            gameweek,
            live_points: contributions.iter().map(|c| c.contribution).sum(),
            gameweek_points: picks.entry_history.as_ref().map(|h| h.points),
            picks: contributions,
            last_updated: Utc::now(),
        })
    }

    pub async fn safety_score(&self, entry_id: u64) -> Result<DerivedSafetyScore, FplError> {
        let bootstrap = self.source.bootstrap().await?;
        let gameweek = bootstrap.current_gameweek();
        let (history, picks) = tokio::try_join!(
            self.source.entry_history(entry_id),
            self.source.entry_picks(entry_id, gameweek),
        )?;

        let latest = history
            .latest()
            .ok_or_else(|| FplError::missing(format!("rank history for entry {entry_id}")))?;
        let current_rank = latest
            .overall_rank
            .ok_or_else(|| FplError::missing(format!("overall rank for entry {entry_id}")))?;

        let inputs = SafetyInputs {
            entry_id,
            gameweek,
            current_rank,
            current_points: latest.total_points,
            current_gw_points: picks.entry_history.as_ref().map(|h| h.points).unwrap_or(0),
            average_score: bootstrap.average_score(gameweek),
            total_players: bootstrap
                .total_players
                .filter(|n| *n > 0)
                .unwrap_or(self.fallback_total_players),
        };
        Ok(estimate_safety(&self.policy, inputs, Utc::now()))
    }

    pub async fn team(&self, entry_id: u64) -> Result<TeamOverview, FplError> {
        let gameweek = self.current_gameweek().await?;
        let (current, history) = tokio::try_join!(
            self.source.entry_picks(entry_id, gameweek),
            self.source.entry_history(entry_id),
        )?;
        let team_info = TeamInfo::from_payloads(&current, &history, gameweek);
        Ok(TeamOverview {
            current,
            history,
            team_info,
        })
    }

    pub async fn team_leagues(&self, entry_id: u64) -> Result<TeamLeagues, FplError> {
        Ok(TeamLeagues::from(self.source.entry(entry_id).await?))
    }

    /// Raw bootstrap document.
    pub async fn bootstrap(&self) -> Result<Value, FplError> {
        self.source.get_json(paths::BOOTSTRAP).await
    }

    /// Raw fixtures document, optionally for a single gameweek.
    pub async fn fixtures(&self, gameweek: Option<u32>) -> Result<Value, FplError> {
        match gameweek {
            Some(gw) => self.source.get_json(&paths::fixtures_for(gw)).await,
            None => self.source.get_json(paths::FIXTURES).await,
        }
    }

    pub async fn fixture_schedule(&self, view: FixtureView) -> Result<FixtureSchedule, FplError> {
        let (bootstrap, fixtures) =
            tokio::try_join!(self.source.bootstrap(), self.source.fixtures(None))?;
        Ok(build_schedule(&bootstrap, &fixtures, view))
    }

    /// Upcoming schedule and next-gameweek preview from one pair of fetches.
    pub async fn fixtures_snapshot(&self) -> Result<FixturesSnapshot, FplError> {
        let (bootstrap, fixtures) =
            tokio::try_join!(self.source.bootstrap(), self.source.fixtures(None))?;
        Ok(FixturesSnapshot {
            schedule: build_schedule(&bootstrap, &fixtures, FixtureView::All),
            preview: next_gameweek_preview(&bootstrap, &fixtures),
        })
    }

    pub async fn league_standings(&self, league_id: u64, page: u32) -> Result<LeagueStandings, FplError> {
        self.source.league_standings(league_id, page).await
    }

    pub async fn league_standings_raw(&self, league_id: u64, page: u32) -> Result<Value, FplError> {
        self.source
            .get_json(&paths::league_standings(league_id, page))
            .await
    }

    pub async fn player(&self, player_id: u32) -> Result<Value, FplError> {
        self.source.element_summary(player_id).await
    }
}
