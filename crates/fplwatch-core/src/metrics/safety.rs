// Safety score: a heuristic for how many more gameweek points a team needs
// to hold its overall rank.
//
// The buffer is the gameweek average scaled by a rank-tier percentage. The
// tiers are an approximation with no upstream source, so they live in a
// replaceable `SafetyPolicy` rather than being hard-coded into the formula.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// One rank band. Applies to ranks strictly below `below_rank`; the final
/// tier has no bound and catches everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyTier {
    #[serde(default)]
    pub below_rank: Option<u64>,
    /// Buffer as a percentage of the gameweek average (115 = 1.15x).
    pub percent: u32,
}

/// Ordered rank tiers, best ranks first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyPolicy {
    tiers: Vec<SafetyTier>,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        SafetyPolicy {
            tiers: vec![
                SafetyTier { below_rank: Some(10_000), percent: 115 },
                SafetyTier { below_rank: Some(100_000), percent: 110 },
                SafetyTier { below_rank: Some(1_000_000), percent: 105 },
                SafetyTier { below_rank: None, percent: 100 },
            ],
        }
    }
}

impl SafetyPolicy {
    /// Build a policy, checking that bounds strictly increase and that only
    /// the last tier is unbounded.
    pub fn new(tiers: Vec<SafetyTier>) -> Result<Self, String> {
        let Some(last) = tiers.last() else {
            return Err("at least one tier is required".into());
        };
        if last.below_rank.is_some() {
            return Err("the last tier must not have a below_rank bound".into());
        }
        let mut previous: Option<u64> = None;
        for (i, tier) in tiers[..tiers.len() - 1].iter().enumerate() {
            let Some(bound) = tier.below_rank else {
                return Err(format!("tier {i} is unbounded but is not the last tier"));
            };
            if previous.is_some_and(|p| bound <= p) {
                return Err(format!("tier {i} bound {bound} does not increase"));
            }
            previous = Some(bound);
        }
        if let Some(tier) = tiers.iter().find(|t| t.percent == 0) {
            return Err(format!("tier percent must be > 0, got {}", tier.percent));
        }
        Ok(SafetyPolicy { tiers })
    }

    pub fn tiers(&self) -> &[SafetyTier] {
        &self.tiers
    }

    /// Percentage for `rank`. Lower bounds are inclusive: rank 10,000 falls
    /// in the tier after `below_rank = 10000`.
    pub fn percent_for(&self, rank: u64) -> u32 {
        self.tiers
            .iter()
            .find(|t| t.below_rank.map_or(true, |bound| rank < bound))
            .map(|t| t.percent)
            .unwrap_or(100)
    }

    /// The points a team at `rank` should score to hold position:
    /// `round(average * percent / 100)`, rounding halves up.
    ///
    /// Integer arithmetic keeps `round(50 * 1.15)` at 58; the float product
    /// is 57.4999… and would round down.
    pub fn buffer(&self, rank: u64, average_score: i64) -> i64 {
        let percent = i64::from(self.percent_for(rank));
        (average_score * percent + 50).div_euclid(100)
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowDirection {
    Up,
    Down,
}

impl ArrowDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            ArrowDirection::Up => "up",
            ArrowDirection::Down => "down",
        }
    }
}

/// Everything the estimate needs, already extracted from upstream payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyInputs {
    pub entry_id: u64,
    pub gameweek: u32,
    pub current_rank: u64,
    pub current_points: i64,
    pub current_gw_points: i64,
    pub average_score: i64,
    pub total_players: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedSafetyScore {
    pub entry_id: u64,
    pub current_rank: u64,
    pub current_points: i64,
    pub gameweek: u32,
    pub current_gw_points: i64,
    /// Points still needed to reach the buffer; never negative.
    pub safety_score: i64,
    pub average_score: i64,
    pub arrow_direction: ArrowDirection,
    pub rank_percentile: f64,
    pub live_points: i64,
    pub status_message: String,
    pub last_updated: DateTime<Utc>,
}

/// Run the estimate for one team.
pub fn estimate_safety(
    policy: &SafetyPolicy,
    inputs: SafetyInputs,
    now: DateTime<Utc>,
) -> DerivedSafetyScore {
    let buffer = policy.buffer(inputs.current_rank, inputs.average_score);
    let points_needed = (buffer - inputs.current_gw_points).max(0);
    let arrow_direction = if inputs.current_gw_points >= buffer {
        ArrowDirection::Up
    } else {
        ArrowDirection::Down
    };

    let status_message = match arrow_direction {
        ArrowDirection::Up => format!(
            "On track for an up arrow! {} points above the safety line.",
            inputs.current_gw_points - buffer
        ),
        ArrowDirection::Down => {
            format!("Need {points_needed} more points to avoid a down arrow.")
        }
    };

    let rank_percentile = if inputs.total_players == 0 {
        0.0
    } else {
        inputs.current_rank as f64 / inputs.total_players as f64
    };

    DerivedSafetyScore {
        entry_id: inputs.entry_id,
        current_rank: inputs.current_rank,
        current_points: inputs.current_points,
        gameweek: inputs.gameweek,
        current_gw_points: inputs.current_gw_points,
        safety_score: points_needed,
        average_score: inputs.average_score,
        arrow_direction,
        rank_percentile,
        live_points: inputs.current_gw_points,
        status_message,
        last_updated: now,
    }
}
