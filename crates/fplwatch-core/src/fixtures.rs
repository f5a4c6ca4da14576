// Fixture schedule: filter by gameweek view, resolve club names, group by
// gameweek.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{Bootstrap, Fixture};

/// Number of fixtures in the dashboard preview.
pub const PREVIEW_LEN: usize = 3;

/// Which gameweeks a schedule covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FixtureView {
    #[default]
    Current,
    /// The gameweek after the current one.
    Next,
    /// The current gameweek and everything after it.
    All,
    Gameweek(u32),
}

impl FixtureView {
    pub fn includes(self, event: u32, current: u32) -> bool {
        match self {
            FixtureView::Current => event == current,
            FixtureView::Next => event == current + 1,
            FixtureView::All => event >= current,
            FixtureView::Gameweek(gw) => event == gw,
        }
    }
}

impl FromStr for FixtureView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "current" => Ok(FixtureView::Current),
            "next" => Ok(FixtureView::Next),
            "all" => Ok(FixtureView::All),
            other => other
                .parse::<u32>()
                .ok()
                .filter(|gw| *gw > 0)
                .map(FixtureView::Gameweek)
                .ok_or_else(|| format!("invalid fixture view `{s}`")),
        }
    }
}

impl fmt::Display for FixtureView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureView::Current => f.write_str("current"),
            FixtureView::Next => f.write_str("next"),
            FixtureView::All => f.write_str("all"),
            FixtureView::Gameweek(gw) => write!(f, "{gw}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureSide {
    pub club_id: u32,
    pub name: String,
    pub short_name: String,
    pub score: Option<u32>,
    pub difficulty: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureLine {
    pub id: u32,
    pub gameweek: u32,
    pub kickoff_time: Option<String>,
    pub finished: bool,
    pub minutes: u32,
    pub home: FixtureSide,
    pub away: FixtureSide,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameweekFixtures {
    pub gameweek: u32,
    pub fixtures: Vec<FixtureLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureSchedule {
    pub view: String,
    pub current_gameweek: u32,
    pub gameweeks: Vec<GameweekFixtures>,
}

impl FixtureSchedule {
    pub fn fixture_count(&self) -> usize {
        self.gameweeks.iter().map(|g| g.fixtures.len()).sum()
    }
}

fn side(bootstrap: &Bootstrap, club_id: u32, score: Option<u32>, difficulty: u8) -> FixtureSide {
    let club = bootstrap.club(club_id);
    FixtureSide {
        club_id,
        name: club
            .map(|c| c.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Team {club_id}")),
        short_name: club
            .map(|c| c.short_name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("T{club_id}")),
        score,
        difficulty,
    }
}

fn line(bootstrap: &Bootstrap, fixture: &Fixture, gameweek: u32) -> FixtureLine {
    FixtureLine {
        id: fixture.id,
        gameweek,
        kickoff_time: fixture.kickoff_time.clone(),
        finished: fixture.finished,
        minutes: fixture.minutes,
        home: side(bootstrap, fixture.team_h, fixture.team_h_score, fixture.team_h_difficulty),
        away: side(bootstrap, fixture.team_a, fixture.team_a_score, fixture.team_a_difficulty),
    }
}

/// Build the schedule for `view`. Unscheduled fixtures (no gameweek) are
/// never included. Gameweeks ascend; fixtures keep upstream order.
pub fn build_schedule(bootstrap: &Bootstrap, fixtures: &[Fixture], view: FixtureView) -> FixtureSchedule {
    let current = bootstrap.current_gameweek();
    let mut grouped: BTreeMap<u32, Vec<FixtureLine>> = BTreeMap::new();

    for fixture in fixtures {
        let Some(event) = fixture.event else {
            continue;
        };
        if view.includes(event, current) {
            grouped.entry(event).or_default().push(line(bootstrap, fixture, event));
        }
    }

    FixtureSchedule {
        view: view.to_string(),
        current_gameweek: current,
        gameweeks: grouped
            .into_iter()
            .map(|(gameweek, fixtures)| GameweekFixtures { gameweek, fixtures })
            .collect(),
    }
}

/// The first few fixtures of the gameweek flagged `is_next`; empty when the
/// season has no next gameweek.
pub fn next_gameweek_preview(bootstrap: &Bootstrap, fixtures: &[Fixture]) -> Vec<FixtureLine> {
    let Some(next) = bootstrap.next_gameweek() else {
        return Vec::new();
    };
    fixtures
        .iter()
        .filter(|f| f.event == Some(next))
        .take(PREVIEW_LEN)
        .map(|f| line(bootstrap, f, next))
        .collect()
}
