// Team summary shown on the dashboard header: value, bank, rank and points.

use serde::{Deserialize, Serialize};

use crate::models::{EntryHistory, EntryPicks};

/// Headline figures for a connected team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamInfo {
    /// Squad value in millions.
    pub team_value: f64,
    /// Money in the bank in millions.
    pub bank: f64,
    pub total_value: f64,
    pub overall_rank: Option<u64>,
    pub gameweek_points: Option<i64>,
    pub total_points: Option<i64>,
    pub current_gameweek: u32,
}

impl TeamInfo {
    /// Combine the current-gameweek picks payload with the season history.
    ///
    /// Money comes from the picks payload (tenths of a million). Rank and
    /// season total come from the latest history row, falling back to the
    /// gameweek row in the picks payload.
    pub fn from_payloads(picks: &EntryPicks, history: &EntryHistory, current_gameweek: u32) -> Self {
        let entry_history = picks.entry_history.as_ref();
        let team_value = entry_history.map(|h| tenths_to_millions(h.value)).unwrap_or(0.0);
        let bank = entry_history.map(|h| tenths_to_millions(h.bank)).unwrap_or(0.0);
        let latest = history.latest();

        TeamInfo {
            team_value,
            bank,
            total_value: tenths_to_millions(
                entry_history.map(|h| h.value + h.bank).unwrap_or(0),
            ),
            overall_rank: latest
                .and_then(|r| r.overall_rank)
                .or_else(|| entry_history.and_then(|h| h.overall_rank)),
            gameweek_points: entry_history.map(|h| h.points),
            total_points: latest
                .map(|r| r.total_points)
                .or_else(|| entry_history.map(|h| h.total_points)),
            current_gameweek,
        }
    }
}

fn tenths_to_millions(tenths: i64) -> f64 {
    tenths as f64 / 10.0
}

/// `£104.5m`
pub fn format_currency(millions: f64) -> String {
    format!("£{millions:.1}m")
}

/// Rank with thousands separators, `--` when unknown.
pub fn format_rank(rank: Option<u64>) -> String {
    let Some(rank) = rank else {
        return "--".to_string();
    };
    let digits = rank.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
