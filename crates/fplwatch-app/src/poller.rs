// Scheduled polling of the dashboard metrics.
//
// Each metric has its own interval. A tick computes the metric for the
// connected team and publishes the result (or a `Failed` update) on the
// broadcast channel. Connecting a team or a `RefreshNow` command polls
// everything at once. An open league table is re-polled with the leagues.

use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use fplwatch_core::config::PollingConfig;
use fplwatch_core::session::Session;

use crate::protocol::{DashboardUpdate, MetricKind, PollCommand};
use crate::service::DashboardService;

/// Capacity of the update broadcast channel.
pub const UPDATE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub team: Duration,
    pub live_points: Duration,
    pub safety: Duration,
    pub leagues: Duration,
    pub fixtures: Duration,
}

impl From<&PollingConfig> for PollIntervals {
    fn from(config: &PollingConfig) -> Self {
        PollIntervals {
            team: Duration::from_secs(config.team_secs),
            live_points: Duration::from_secs(config.live_points_secs),
            safety: Duration::from_secs(config.safety_secs),
            leagues: Duration::from_secs(config.leagues_secs),
            fixtures: Duration::from_secs(config.fixtures_secs),
        }
    }
}

impl Default for PollIntervals {
    fn default() -> Self {
        PollIntervals::from(&PollingConfig::default())
    }
}

pub struct Poller {
    service: DashboardService,
    intervals: PollIntervals,
    session: watch::Receiver<Session>,
    updates: broadcast::Sender<DashboardUpdate>,
}

impl Poller {
    pub fn new(
        service: DashboardService,
        intervals: PollIntervals,
        session: watch::Receiver<Session>,
        updates: broadcast::Sender<DashboardUpdate>,
    ) -> Self {
        Self {
            service,
            intervals,
            session,
            updates,
        }
    }

    /// Compute one scheduled metric. `None` when the metric needs a team and
    /// none is connected.
    pub async fn poll(&self, metric: MetricKind, entry: Option<u64>) -> Option<DashboardUpdate> {
        let entry_id = match (metric.needs_entry(), entry) {
            (true, None) => return None,
            (_, entry) => entry.unwrap_or_default(),
        };

        let result = match metric {
            MetricKind::Team => self
                .service
                .team(entry_id)
                .await
                .map(|team| DashboardUpdate::Team { entry_id, team }),
            MetricKind::LivePoints => self
                .service
                .live_breakdown(entry_id)
                .await
                .map(DashboardUpdate::LivePoints),
            MetricKind::Safety => self
                .service
                .safety_score(entry_id)
                .await
                .map(DashboardUpdate::Safety),
            MetricKind::Leagues => self
                .service
                .team_leagues(entry_id)
                .await
                .map(|leagues| DashboardUpdate::Leagues { entry_id, leagues }),
            MetricKind::Fixtures => self
                .service
                .fixtures_snapshot()
                .await
                .map(DashboardUpdate::Fixtures),
            // Needs a league and page; see `poll_standings`.
            MetricKind::Standings => return None,
        };

        Some(result.unwrap_or_else(|e| {
            warn!("failed to poll {metric}: {e}");
            DashboardUpdate::Failed {
                metric,
                entry_id: metric.needs_entry().then_some(entry_id),
                message: e.to_string(),
            }
        }))
    }

    /// Fetch one page of a classic league table.
    pub async fn poll_standings(&self, league_id: u64, page: u32) -> DashboardUpdate {
        match self.service.league_standings(league_id, page).await {
            Ok(standings) => DashboardUpdate::Standings {
                league_id,
                page,
                standings,
            },
            Err(e) => {
                warn!(league_id, page, "failed to poll league standings: {e}");
                DashboardUpdate::Failed {
                    metric: MetricKind::Standings,
                    entry_id: None,
                    message: e.to_string(),
                }
            }
        }
    }

    async fn publish_standings(&self, open: Option<(u64, u32)>) {
        if let Some((league_id, page)) = open {
            let update = self.poll_standings(league_id, page).await;
            self.publish(update);
        }
    }

    async fn poll_and_publish(&self, metric: MetricKind, entry: Option<u64>) {
        if let Some(update) = self.poll(metric, entry).await {
            self.publish(update);
        }
    }

    /// Poll every metric concurrently, publishing in `MetricKind::ALL` order.
    pub async fn refresh_all(&self, entry: Option<u64>) {
        let updates = join_all(MetricKind::ALL.iter().map(|m| self.poll(*m, entry))).await;
        for update in updates.into_iter().flatten() {
            self.publish(update);
        }
    }

    fn publish(&self, update: DashboardUpdate) {
        // No subscribers is fine: nobody is watching yet.
        if self.updates.send(update).is_err() {
            debug!("update dropped, no subscribers");
        }
    }

    /// Run until `PollCommand::Shutdown`, the command channel closes, or the
    /// session channel closes.
    pub async fn run(mut self, mut cmd_rx: mpsc::Receiver<PollCommand>) -> anyhow::Result<()> {
        info!("Poller started");

        let mut team = skipping_interval(self.intervals.team).await;
        let mut live_points = skipping_interval(self.intervals.live_points).await;
        let mut safety = skipping_interval(self.intervals.safety).await;
        let mut leagues = skipping_interval(self.intervals.leagues).await;
        let mut fixtures = skipping_interval(self.intervals.fixtures).await;

        let mut entry = self.session.borrow_and_update().entry_id;
        let mut standings: Option<(u64, u32)> = None;
        self.refresh_all(entry).await;

        loop {
            tokio::select! {
                _ = team.tick() => self.poll_and_publish(MetricKind::Team, entry).await,
                _ = live_points.tick() => self.poll_and_publish(MetricKind::LivePoints, entry).await,
                _ = safety.tick() => self.poll_and_publish(MetricKind::Safety, entry).await,
                _ = leagues.tick() => {
                    self.poll_and_publish(MetricKind::Leagues, entry).await;
                    self.publish_standings(standings).await;
                }
                _ = fixtures.tick() => self.poll_and_publish(MetricKind::Fixtures, entry).await,

                changed = self.session.changed() => {
                    if changed.is_err() {
                        info!("Session channel closed, stopping poller");
                        break;
                    }
                    let next = self.session.borrow_and_update().entry_id;
                    if next == entry {
                        continue;
                    }
                    entry = next;
                    match entry {
                        Some(entry_id) => {
                            info!(entry_id, "polling new team");
                            self.refresh_all(entry).await;
                        }
                        None => self.publish(DashboardUpdate::Disconnected),
                    }
                }

                cmd = cmd_rx.recv() => match cmd {
                    Some(PollCommand::RefreshNow) => {
                        debug!("refresh requested");
                        self.refresh_all(entry).await;
                        self.publish_standings(standings).await;
                    }
                    Some(PollCommand::OpenStandings { league_id, page }) => {
                        debug!(league_id, page, "league standings opened");
                        standings = Some((league_id, page));
                        self.publish_standings(standings).await;
                    }
                    Some(PollCommand::CloseStandings) => standings = None,
                    Some(PollCommand::Shutdown) | None => {
                        info!("Poller shutting down");
                        break;
                    }
                },
            }
        }

        Ok(())
    }
}

/// An interval whose immediate first tick has already been consumed, so the
/// first real tick lands one full period later.
async fn skipping_interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await;
    interval
}
