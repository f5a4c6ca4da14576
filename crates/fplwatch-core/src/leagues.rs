// League membership reshaping and favourite ordering.

use serde::{Deserialize, Serialize};

use crate::models::{EntrySummary, LeagueMembership};

/// A team's leagues as exposed to presentation, with empty defaults for
/// anything the upstream omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamLeagues {
    pub classic: Vec<LeagueMembership>,
    pub h2h: Vec<LeagueMembership>,
    pub cup: serde_json::Value,
    pub cup_matches: Vec<serde_json::Value>,
}

impl From<EntrySummary> for TeamLeagues {
    fn from(entry: EntrySummary) -> Self {
        let leagues = entry.leagues;
        TeamLeagues {
            classic: leagues.classic,
            h2h: leagues.h2h,
            cup: leagues.cup.unwrap_or(serde_json::Value::Null),
            cup_matches: leagues.cup_matches,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankMovement {
    Up,
    Down,
    Same,
    Unknown,
}

impl RankMovement {
    /// Lower rank numbers are better, so a drop in the number is a rise.
    pub fn between(last: Option<u64>, now: Option<u64>) -> Self {
        match (last, now) {
            (Some(last), Some(now)) if now < last => RankMovement::Up,
            (Some(last), Some(now)) if now > last => RankMovement::Down,
            (Some(_), Some(_)) => RankMovement::Same,
            _ => RankMovement::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueRow {
    pub id: u64,
    pub name: String,
    pub rank: Option<u64>,
    pub movement: RankMovement,
    pub favorite: bool,
}

/// Classic leagues with favourites first (in favourite order), then the
/// remaining memberships in upstream order. Favourites the team is not a
/// member of are listed under a placeholder name.
pub fn favorites_first(classic: &[LeagueMembership], favorites: &[u64]) -> Vec<LeagueRow> {
    let row = |league: &LeagueMembership, favorite: bool| LeagueRow {
        id: league.id,
        name: league.name.clone(),
        rank: league.entry_rank,
        movement: RankMovement::between(league.entry_last_rank, league.entry_rank),
        favorite,
    };

    let mut rows: Vec<LeagueRow> = favorites
        .iter()
        .map(|id| match classic.iter().find(|l| l.id == *id) {
            Some(league) => row(league, true),
            None => LeagueRow {
                id: *id,
                name: format!("League {id}"),
                rank: None,
                movement: RankMovement::Unknown,
                favorite: true,
            },
        })
        .collect();

    rows.extend(
        classic
            .iter()
            .filter(|l| !favorites.contains(&l.id))
            .map(|l| row(l, false)),
    );
    rows
}
