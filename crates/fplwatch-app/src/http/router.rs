// Route table and middleware.

use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use super::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let fpl = Router::new()
        .route("/bootstrap", get(handlers::bootstrap))
        .route("/fixtures", get(handlers::fixtures))
        .route("/fixtures/{gameweek}", get(handlers::fixtures_for_gameweek))
        .route("/schedule", get(handlers::schedule))
        .route("/team/{entry_id}", get(handlers::team))
        .route("/team-leagues/{entry_id}", get(handlers::team_leagues))
        .route("/leagues/{league_id}", get(handlers::league_standings))
        .route("/live-points/{entry_id}", get(handlers::live_points))
        .route("/live-points/{entry_id}/breakdown", get(handlers::live_breakdown))
        .route("/safety-score/{entry_id}", get(handlers::safety_score))
        .route("/players/{player_id}", get(handlers::player));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/fpl", fpl)
        .route(
            "/api/session",
            get(handlers::get_session)
                .put(handlers::connect_session)
                .delete(handlers::disconnect_session),
        )
        .route("/api/session/favorites/{league_id}", post(handlers::toggle_favorite))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve the API until the task is cancelled.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP API listening on {}", listener.local_addr()?);
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
