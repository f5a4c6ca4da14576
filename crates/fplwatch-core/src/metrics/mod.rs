// Derived metrics: live gameweek points and the rank safety estimate.

pub mod live_points;
pub mod safety;

pub use live_points::{aggregate_live_points, live_breakdown, DerivedLivePoints, PickContribution};
pub use safety::{
    estimate_safety, ArrowDirection, DerivedSafetyScore, SafetyInputs, SafetyPolicy, SafetyTier,
};
