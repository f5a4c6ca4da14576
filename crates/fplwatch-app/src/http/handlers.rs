// HTTP handlers.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::Value;

use fplwatch_core::fixtures::{FixtureSchedule, FixtureView};
use fplwatch_core::leagues::TeamLeagues;
use fplwatch_core::metrics::{DerivedLivePoints, DerivedSafetyScore};
use fplwatch_core::session::{parse_team_id, Session};

use super::dto::{ConnectRequest, HealthResponse, PageQuery, ScheduleQuery};
use super::error::{AppError, UpstreamContext};
use super::state::AppState;
use crate::service::{LiveBreakdown, TeamOverview};

pub type HandlerResult<T> = Result<Json<T>, AppError>;

const FPL_DATA_FAILED: &str = "Failed to fetch FPL data";
const FIXTURES_FAILED: &str = "Failed to fetch fixtures data";
const TEAM_FAILED: &str = "Failed to fetch FPL data. Please try again or check your team ID.";
const LEAGUES_FAILED: &str = "Failed to fetch team leagues";
const STANDINGS_FAILED: &str = "Failed to fetch league data";
const LIVE_POINTS_FAILED: &str = "Failed to fetch live points data";
const SAFETY_FAILED: &str = "Failed to calculate safety score";
const PLAYER_FAILED: &str = "Failed to fetch player data";

/// Parse a numeric path segment, answering 400 with `message` otherwise.
fn parse_id<T: FromStr>(raw: &str, message: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(message.to_string()))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        connected_entry: state.session.current().entry_id,
    })
}

// ---------------------------------------------------------------------------
// Pass-through data
// ---------------------------------------------------------------------------

/// GET /api/fpl/bootstrap
pub async fn bootstrap(State(state): State<AppState>) -> HandlerResult<Value> {
    let value = state.service.bootstrap().await.or_upstream(FPL_DATA_FAILED)?;
    Ok(Json(value))
}

/// GET /api/fpl/fixtures
pub async fn fixtures(State(state): State<AppState>) -> HandlerResult<Value> {
    let value = state.service.fixtures(None).await.or_upstream(FIXTURES_FAILED)?;
    Ok(Json(value))
}

/// GET /api/fpl/fixtures/{gameweek}
pub async fn fixtures_for_gameweek(
    State(state): State<AppState>,
    Path(gameweek): Path<String>,
) -> HandlerResult<Value> {
    let gameweek: u32 = parse_id(&gameweek, "Invalid gameweek")?;
    let value = state
        .service
        .fixtures(Some(gameweek))
        .await
        .or_upstream(FIXTURES_FAILED)?;
    Ok(Json(value))
}

/// GET /api/fpl/schedule?view=current|next|all|{gameweek}
pub async fn schedule(
    State(state): State<AppState>,
    Query(query): Query<ScheduleQuery>,
) -> HandlerResult<FixtureSchedule> {
    let view: FixtureView = query
        .view
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid fixture view".to_string()))?;
    let schedule = state
        .service
        .fixture_schedule(view)
        .await
        .or_upstream(FIXTURES_FAILED)?;
    Ok(Json(schedule))
}

/// GET /api/fpl/leagues/{leagueId}?page=
pub async fn league_standings(
    State(state): State<AppState>,
    Path(league_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> HandlerResult<Value> {
    let league_id: u64 = parse_id(&league_id, "Invalid league ID")?;
    let page = match query.page.as_deref() {
        None | Some("") => 1,
        Some(raw) => parse_id::<u32>(raw, "Invalid page")?.max(1),
    };
    let value = state
        .service
        .league_standings_raw(league_id, page)
        .await
        .or_upstream(STANDINGS_FAILED)?;
    Ok(Json(value))
}

/// GET /api/fpl/players/{playerId}
pub async fn player(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> HandlerResult<Value> {
    let player_id: u32 = parse_id(&player_id, "Invalid player ID")?;
    let value = state.service.player(player_id).await.or_upstream(PLAYER_FAILED)?;
    Ok(Json(value))
}

// ---------------------------------------------------------------------------
// Team metrics
// ---------------------------------------------------------------------------

/// GET /api/fpl/team/{entryId}
pub async fn team(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> HandlerResult<TeamOverview> {
    let entry_id: u64 = parse_id(&entry_id, "Invalid entry ID")?;
    let team = state.service.team(entry_id).await.or_upstream(TEAM_FAILED)?;
    Ok(Json(team))
}

/// GET /api/fpl/team-leagues/{entryId}
pub async fn team_leagues(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> HandlerResult<TeamLeagues> {
    let entry_id: u64 = parse_id(&entry_id, "Invalid entry ID")?;
    let leagues = state
        .service
        .team_leagues(entry_id)
        .await
        .or_upstream(LEAGUES_FAILED)?;
    Ok(Json(leagues))
}

/// GET /api/fpl/live-points/{entryId}
pub async fn live_points(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> HandlerResult<DerivedLivePoints> {
    let entry_id: u64 = parse_id(&entry_id, "Invalid entry ID")?;
    let live = state
        .service
        .live_points(entry_id)
        .await
        .or_upstream(LIVE_POINTS_FAILED)?;
    Ok(Json(live))
}

/// GET /api/fpl/live-points/{entryId}/breakdown
pub async fn live_breakdown(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> HandlerResult<LiveBreakdown> {
    let entry_id: u64 = parse_id(&entry_id, "Invalid entry ID")?;
    let breakdown = state
        .service
        .live_breakdown(entry_id)
        .await
        .or_upstream(LIVE_POINTS_FAILED)?;
    Ok(Json(breakdown))
}

/// GET /api/fpl/safety-score/{entryId}
pub async fn safety_score(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> HandlerResult<DerivedSafetyScore> {
    let entry_id: u64 = parse_id(&entry_id, "Invalid entry ID")?;
    let score = state
        .service
        .safety_score(entry_id)
        .await
        .or_upstream(SAFETY_FAILED)?;
    Ok(Json(score))
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// GET /api/session
pub async fn get_session(State(state): State<AppState>) -> Json<Session> {
    Json(state.session.current())
}

/// PUT /api/session
pub async fn connect_session(
    State(state): State<AppState>,
    Json(request): Json<ConnectRequest>,
) -> HandlerResult<Session> {
    let entry_id =
        parse_team_id(&request.team_id_text()).map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(Json(state.session.connect(entry_id)?))
}

/// DELETE /api/session
pub async fn disconnect_session(State(state): State<AppState>) -> HandlerResult<Session> {
    Ok(Json(state.session.disconnect()?))
}

/// POST /api/session/favorites/{leagueId}
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(league_id): Path<String>,
) -> HandlerResult<Session> {
    let league_id: u64 = parse_id(&league_id, "Invalid league ID")?;
    Ok(Json(state.session.toggle_favorite(league_id)?))
}
