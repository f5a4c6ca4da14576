// Live gameweek points: the team's picks weighted by captaincy, scored
// against the live per-player feed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Bootstrap, PlayerLiveStat, TeamPick};

/// Result of one aggregation. Never stored; recomputed on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedLivePoints {
    pub entry_id: u64,
    pub gameweek: u32,
    pub live_points: i64,
    pub last_updated: DateTime<Utc>,
}

impl DerivedLivePoints {
    pub fn compute(
        entry_id: u64,
        gameweek: u32,
        picks: &[TeamPick],
        live: &HashMap<u32, PlayerLiveStat>,
        now: DateTime<Utc>,
    ) -> Self {
        DerivedLivePoints {
            entry_id,
            gameweek,
            live_points: aggregate_live_points(picks, live),
            last_updated: now,
        }
    }
}

/// Sum `total_points * multiplier` over every pick that has a live stat.
///
/// Picks without a stat contribute nothing. An unset multiplier counts as 1;
/// any present multiplier is applied unmodified.
pub fn aggregate_live_points(picks: &[TeamPick], live: &HashMap<u32, PlayerLiveStat>) -> i64 {
    picks
        .iter()
        .filter_map(|pick| {
            live.get(&pick.element)
                .map(|stat| stat.total_points * pick.effective_multiplier())
        })
        .sum()
}

/// One pick's share of the live total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickContribution {
    pub player_id: u32,
    pub name: String,
    pub multiplier: i64,
    pub live_points: i64,
    pub minutes: u32,
    pub contribution: i64,
    /// False when the live feed had no entry for this player.
    pub has_stat: bool,
}

/// Per-pick breakdown in pick order. Names come from bootstrap data when
/// available, `#{id}` otherwise.
pub fn live_breakdown(
    picks: &[TeamPick],
    live: &HashMap<u32, PlayerLiveStat>,
    bootstrap: Option<&Bootstrap>,
) -> Vec<PickContribution> {
    picks
        .iter()
        .map(|pick| {
            let name = bootstrap
                .and_then(|b| b.player(pick.element))
                .map(|p| p.web_name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("#{}", pick.element));
            let multiplier = pick.effective_multiplier();
            match live.get(&pick.element) {
                Some(stat) => PickContribution {
                    player_id: pick.element,
                    name,
                    multiplier,
                    live_points: stat.total_points,
                    minutes: stat.minutes,
                    contribution: stat.total_points * multiplier,
                    has_stat: true,
                },
                None => PickContribution {
                    player_id: pick.element,
                    name,
                    multiplier,
                    live_points: 0,
                    minutes: 0,
                    contribution: 0,
                    has_stat: false,
                },
            }
        })
        .collect()
}
