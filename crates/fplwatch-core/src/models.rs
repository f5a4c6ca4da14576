// Upstream FPL payload shapes.
//
// Only the fields the dashboard reads are modelled. Every field the API may
// omit carries `#[serde(default)]` so a partial payload still decodes; fields
// whose absence must fail a computation are `Option`s checked by the caller.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// bootstrap-static/
// ---------------------------------------------------------------------------

/// The `bootstrap-static/` payload: gameweeks, clubs, players and the size of
/// the game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bootstrap {
    #[serde(default)]
    pub events: Vec<GameweekMeta>,
    #[serde(default)]
    pub teams: Vec<Club>,
    #[serde(default)]
    pub elements: Vec<PlayerInfo>,
    #[serde(default)]
    pub total_players: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameweekMeta {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub is_next: bool,
    #[serde(default)]
    pub finished: bool,
    /// Population-average score; `null` before the gameweek starts.
    #[serde(default)]
    pub average_entry_score: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: u32,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: u32,
    #[serde(default)]
    pub web_name: String,
    /// Club id.
    #[serde(default)]
    pub team: u32,
    #[serde(default)]
    pub element_type: u32,
}

/// Gameweek used when the collaborator reports none as current.
pub const FALLBACK_GAMEWEEK: u32 = 1;

impl Bootstrap {
    /// The current gameweek id: the first event flagged `is_current`, or
    /// gameweek 1 when none is.
    pub fn current_gameweek(&self) -> u32 {
        self.events
            .iter()
            .find(|e| e.is_current)
            .map(|e| e.id)
            .unwrap_or(FALLBACK_GAMEWEEK)
    }

    /// The gameweek flagged `is_next`, if any.
    pub fn next_gameweek(&self) -> Option<u32> {
        self.events.iter().find(|e| e.is_next).map(|e| e.id)
    }

    pub fn gameweek(&self, id: u32) -> Option<&GameweekMeta> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Average score of gameweek `id`, 0 when unknown.
    pub fn average_score(&self, id: u32) -> i64 {
        self.gameweek(id)
            .and_then(|e| e.average_entry_score)
            .unwrap_or(0)
    }

    pub fn club(&self, id: u32) -> Option<&Club> {
        self.teams.iter().find(|c| c.id == id)
    }

    pub fn player(&self, id: u32) -> Option<&PlayerInfo> {
        self.elements.iter().find(|p| p.id == id)
    }
}

// ---------------------------------------------------------------------------
// entry/{id}/event/{gw}/picks/
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryPicks {
    #[serde(default)]
    pub picks: Vec<TeamPick>,
    #[serde(default)]
    pub entry_history: Option<EntryEventHistory>,
    #[serde(default)]
    pub active_chip: Option<String>,
}

/// One selected player. `multiplier` encodes captaincy (2, or 3 for a triple
/// captain); bench players carry 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPick {
    pub element: u32,
    #[serde(default)]
    pub multiplier: Option<u32>,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub is_captain: bool,
    #[serde(default)]
    pub is_vice_captain: bool,
}

impl TeamPick {
    pub fn new(element: u32, multiplier: Option<u32>) -> Self {
        TeamPick {
            element,
            multiplier,
            ..Default::default()
        }
    }

    /// The multiplier to apply, 1 when the upstream left it unset. Any value
    /// that is present is used as-is.
    pub fn effective_multiplier(&self) -> i64 {
        i64::from(self.multiplier.unwrap_or(1))
    }
}

/// The team's row for a single gameweek. Money fields are tenths of a
/// million.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryEventHistory {
    #[serde(default)]
    pub event: u32,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub total_points: i64,
    #[serde(default)]
    pub rank: Option<u64>,
    #[serde(default)]
    pub overall_rank: Option<u64>,
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub bank: i64,
    #[serde(default)]
    pub event_transfers: u32,
    #[serde(default)]
    pub event_transfers_cost: i64,
    #[serde(default)]
    pub points_on_bench: i64,
}

// ---------------------------------------------------------------------------
// event/{gw}/live/
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLive {
    #[serde(default)]
    pub elements: Vec<LiveElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveElement {
    pub id: u32,
    #[serde(default)]
    pub stats: LiveStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveStats {
    #[serde(default)]
    pub total_points: i64,
    #[serde(default)]
    pub minutes: u32,
}

/// Live score of one player for the gameweek.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLiveStat {
    pub player_id: u32,
    pub total_points: i64,
    pub minutes: u32,
}

impl EventLive {
    /// Index the live feed by player id for pick lookups.
    pub fn stats_by_player(&self) -> HashMap<u32, PlayerLiveStat> {
        self.elements
            .iter()
            .map(|e| {
                (
                    e.id,
                    PlayerLiveStat {
                        player_id: e.id,
                        total_points: e.stats.total_points,
                        minutes: e.stats.minutes,
                    },
                )
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// entry/{id}/history/
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryHistory {
    /// One row per played gameweek this season, oldest first.
    #[serde(default)]
    pub current: Vec<RankSnapshot>,
    #[serde(default)]
    pub chips: Vec<ChipPlay>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankSnapshot {
    #[serde(default)]
    pub event: u32,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub total_points: i64,
    #[serde(default)]
    pub rank: Option<u64>,
    #[serde(default)]
    pub overall_rank: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipPlay {
    pub name: String,
    #[serde(default)]
    pub event: u32,
}

impl EntryHistory {
    /// Latest gameweek row, if the team has played any.
    pub fn latest(&self) -> Option<&RankSnapshot> {
        self.current.last()
    }
}

// ---------------------------------------------------------------------------
// entry/{id}/
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntrySummary {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub player_first_name: String,
    #[serde(default)]
    pub player_last_name: String,
    #[serde(default)]
    pub summary_overall_points: Option<i64>,
    #[serde(default)]
    pub summary_overall_rank: Option<u64>,
    #[serde(default)]
    pub leagues: EntryLeagues,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryLeagues {
    #[serde(default)]
    pub classic: Vec<LeagueMembership>,
    #[serde(default)]
    pub h2h: Vec<LeagueMembership>,
    #[serde(default)]
    pub cup: Option<serde_json::Value>,
    #[serde(default)]
    pub cup_matches: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueMembership {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub entry_rank: Option<u64>,
    #[serde(default)]
    pub entry_last_rank: Option<u64>,
    #[serde(default)]
    pub league_type: String,
}

// ---------------------------------------------------------------------------
// leagues-classic/{id}/standings/
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueStandings {
    #[serde(default)]
    pub league: LeagueHeader,
    #[serde(default)]
    pub standings: StandingsPage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueHeader {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsPage {
    #[serde(default)]
    pub has_next: bool,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<StandingRow>,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    pub entry: u64,
    #[serde(default)]
    pub entry_name: String,
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub rank: u64,
    #[serde(default)]
    pub last_rank: u64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub event_total: i64,
}

// ---------------------------------------------------------------------------
// fixtures/
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u32,
    /// Gameweek; `null` for fixtures not yet scheduled.
    #[serde(default)]
    pub event: Option<u32>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub kickoff_time: Option<String>,
    #[serde(default)]
    pub minutes: u32,
    pub team_h: u32,
    pub team_a: u32,
    #[serde(default)]
    pub team_h_score: Option<u32>,
    #[serde(default)]
    pub team_a_score: Option<u32>,
    #[serde(default)]
    pub team_h_difficulty: u8,
    #[serde(default)]
    pub team_a_difficulty: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bootstrap(events: serde_json::Value) -> Bootstrap {
        serde_json::from_value(json!({ "events": events })).unwrap()
    }

    #[test]
    fn current_gameweek_picks_flagged_event() {
        let b = bootstrap(json!([
            { "id": 1, "is_current": false },
            { "id": 2, "is_current": true, "average_entry_score": 54 },
            { "id": 3, "is_current": false, "is_next": true }
        ]));
        assert_eq!(b.current_gameweek(), 2);
        assert_eq!(b.next_gameweek(), Some(3));
        assert_eq!(b.average_score(2), 54);
    }

    #[test]
    fn current_gameweek_falls_back_to_one() {
        let b = bootstrap(json!([{ "id": 5 }, { "id": 6 }]));
        assert_eq!(b.current_gameweek(), FALLBACK_GAMEWEEK);
        assert_eq!(b.next_gameweek(), None);
    }

    #[test]
    fn average_score_defaults_to_zero() {
        let b = bootstrap(json!([{ "id": 1, "is_current": true, "average_entry_score": null }]));
        assert_eq!(b.average_score(1), 0);
        assert_eq!(b.average_score(38), 0);
    }

    #[test]
    fn picks_decode_with_missing_multiplier() {
        let picks: EntryPicks = serde_json::from_value(json!({
            "picks": [
                { "element": 7 },
                { "element": 8, "multiplier": 2, "is_captain": true }
            ]
        }))
        .unwrap();
        assert_eq!(picks.picks[0].effective_multiplier(), 1);
        assert_eq!(picks.picks[1].effective_multiplier(), 2);
        assert!(picks.picks[1].is_captain);
        assert!(picks.entry_history.is_none());
    }

    #[test]
    fn zero_multiplier_is_kept() {
        let pick = TeamPick::new(11, Some(0));
        assert_eq!(pick.effective_multiplier(), 0);
    }

    #[test]
    fn live_feed_indexes_by_player() {
        let live: EventLive = serde_json::from_value(json!({
            "elements": [
                { "id": 7, "stats": { "total_points": 5, "minutes": 90 } },
                { "id": 9, "stats": { "total_points": -1 } }
            ]
        }))
        .unwrap();
        let map = live.stats_by_player();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&7].total_points, 5);
        assert_eq!(map[&7].minutes, 90);
        assert_eq!(map[&9].total_points, -1);
    }

    #[test]
    fn history_latest_is_last_row() {
        let history: EntryHistory = serde_json::from_value(json!({
            "current": [
                { "event": 1, "total_points": 60, "overall_rank": 900000 },
                { "event": 2, "total_points": 120, "overall_rank": 450000 }
            ]
        }))
        .unwrap();
        let latest = history.latest().unwrap();
        assert_eq!(latest.event, 2);
        assert_eq!(latest.overall_rank, Some(450000));
    }

    #[test]
    fn unscheduled_fixture_has_no_event() {
        let fixture: Fixture = serde_json::from_value(json!({
            "id": 380, "event": null, "team_h": 1, "team_a": 2
        }))
        .unwrap();
        assert_eq!(fixture.event, None);
        assert!(!fixture.finished);
    }
}
