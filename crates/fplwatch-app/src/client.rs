// Fantasy Premier League HTTP client.
//
// `FplSource` is the seam between the dashboard and the upstream API: one
// required method that fetches a JSON document by path, plus typed accessors
// built on it. `HttpFplClient` is the reqwest implementation; `MemorySource`
// serves canned documents for tests and offline runs.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use fplwatch_core::config::ApiConfig;
use fplwatch_core::models::{
    Bootstrap, EntryHistory, EntryPicks, EntrySummary, EventLive, Fixture, LeagueStandings,
};
use fplwatch_core::FplError;

// ---------------------------------------------------------------------------
// Upstream paths
// ---------------------------------------------------------------------------

/// Paths relative to the API base URL. The trailing slashes are significant
/// upstream.
pub mod paths {
    pub const BOOTSTRAP: &str = "bootstrap-static/";
    pub const FIXTURES: &str = "fixtures/";

    pub fn fixtures_for(gameweek: u32) -> String {
        format!("fixtures/?event={gameweek}")
    }

    pub fn entry(entry_id: u64) -> String {
        format!("entry/{entry_id}/")
    }

    pub fn entry_history(entry_id: u64) -> String {
        format!("entry/{entry_id}/history/")
    }

    pub fn entry_picks(entry_id: u64, gameweek: u32) -> String {
        format!("entry/{entry_id}/event/{gameweek}/picks/")
    }

    pub fn event_live(gameweek: u32) -> String {
        format!("event/{gameweek}/live/")
    }

    pub fn league_standings(league_id: u64, page: u32) -> String {
        format!("leagues-classic/{league_id}/standings/?page_standings={page}")
    }

    pub fn element_summary(player_id: u32) -> String {
        format!("element-summary/{player_id}/")
    }
}

// ---------------------------------------------------------------------------
// FplSource
// ---------------------------------------------------------------------------

/// Decode a fetched document, reporting shape mismatches as missing data.
pub fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, FplError> {
    serde_json::from_value(value).map_err(|e| FplError::missing(format!("{path}: {e}")))
}

#[async_trait]
pub trait FplSource: Send + Sync {
    /// Fetch the JSON document at `path` (relative to the API base).
    async fn get_json(&self, path: &str) -> Result<Value, FplError>;

    async fn bootstrap(&self) -> Result<Bootstrap, FplError> {
        let value = self.get_json(paths::BOOTSTRAP).await?;
        decode(paths::BOOTSTRAP, value)
    }

    /// All fixtures, or only those of `gameweek`.
    async fn fixtures(&self, gameweek: Option<u32>) -> Result<Vec<Fixture>, FplError> {
        let path = match gameweek {
            Some(gw) => paths::fixtures_for(gw),
            None => paths::FIXTURES.to_string(),
        };
        let value = self.get_json(&path).await?;
        decode(&path, value)
    }

    async fn entry(&self, entry_id: u64) -> Result<EntrySummary, FplError> {
        let path = paths::entry(entry_id);
        let value = self.get_json(&path).await?;
        decode(&path, value)
    }

    async fn entry_history(&self, entry_id: u64) -> Result<EntryHistory, FplError> {
        let path = paths::entry_history(entry_id);
        let value = self.get_json(&path).await?;
        decode(&path, value)
    }

    async fn entry_picks(&self, entry_id: u64, gameweek: u32) -> Result<EntryPicks, FplError> {
        let path = paths::entry_picks(entry_id, gameweek);
        let value = self.get_json(&path).await?;
        decode(&path, value)
    }

    async fn event_live(&self, gameweek: u32) -> Result<EventLive, FplError> {
        let path = paths::event_live(gameweek);
        let value = self.get_json(&path).await?;
        decode(&path, value)
    }

    async fn league_standings(&self, league_id: u64, page: u32) -> Result<LeagueStandings, FplError> {
        let path = paths::league_standings(league_id, page);
        let value = self.get_json(&path).await?;
        decode(&path, value)
    }

    /// Player history and upcoming fixtures, passed through undecoded.
    async fn element_summary(&self, player_id: u32) -> Result<Value, FplError> {
        self.get_json(&paths::element_summary(player_id)).await
    }
}

// ---------------------------------------------------------------------------
// HttpFplClient
// ---------------------------------------------------------------------------

/// A fetch shared by every caller that asks for the same path. Resolves to
/// the completion time and the document.
type SharedFetch = Shared<BoxFuture<'static, Result<(Instant, Value), FplError>>>;

/// reqwest-backed source with a short response cache. Requests for the same
/// path inside the dedupe window are answered once: callers that arrive
/// while the fetch is in flight await the same response, later callers get
/// the cached document. Failures are never cached.
pub struct HttpFplClient {
    http: reqwest::Client,
    base_url: String,
    dedupe_window: Duration,
    recent: Mutex<HashMap<String, SharedFetch>>,
}

impl HttpFplClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, dedupe_window: Duration) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            dedupe_window,
            recent: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(api: &ApiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(api.timeout())
            .user_agent(api.user_agent.clone())
            .build()?;
        Ok(Self::new(http, api.base_url.clone(), api.dedupe_window()))
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Join the pending or recent fetch for `path`, or start a new one.
    fn shared_fetch(&self, path: &str) -> SharedFetch {
        let window = self.dedupe_window;
        let mut recent = self.recent.lock().expect("response cache mutex poisoned");
        recent.retain(|_, fetch| match fetch.peek() {
            None => true,
            Some(Ok((done_at, _))) => done_at.elapsed() < window,
            Some(Err(_)) => false,
        });

        if let Some(fetch) = recent.get(path) {
            debug!(path, "joining cached or in-flight request");
            return fetch.clone();
        }

        let fetch = fetch_document(self.http.clone(), self.url_for(path), path.to_string())
            .map(|result| result.map(|value| (Instant::now(), value)))
            .boxed()
            .shared();
        recent.insert(path.to_string(), fetch.clone());
        fetch
    }
}

async fn fetch_document(http: reqwest::Client, url: String, path: String) -> Result<Value, FplError> {
    debug!(%url, "fetching");
    let response = http
        .get(&url)
        .send()
        .await
        .map_err(|e| FplError::fetch(&path, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FplError::status(&path, status.as_u16()));
    }

    response
        .json()
        .await
        .map_err(|e| FplError::fetch(&path, format!("invalid JSON body: {e}")))
}

#[async_trait]
impl FplSource for HttpFplClient {
    async fn get_json(&self, path: &str) -> Result<Value, FplError> {
        if self.dedupe_window.is_zero() {
            return fetch_document(self.http.clone(), self.url_for(path), path.to_string()).await;
        }
        let (_, value) = self.shared_fetch(path).await?;
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// MemorySource
// ---------------------------------------------------------------------------

/// In-memory source keyed by path. Unknown paths answer 404. Records every
/// request so callers can assert on upstream traffic.
#[derive(Default)]
pub struct MemorySource {
    responses: Mutex<HashMap<String, Result<Value, FplError>>>,
    calls: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, path: impl Into<String>, value: Value) -> Self {
        self.set(path, value);
        self
    }

    pub fn set(&self, path: impl Into<String>, value: Value) {
        self.responses
            .lock()
            .expect("memory source mutex poisoned")
            .insert(path.into(), Ok(value));
    }

    pub fn fail(&self, path: impl Into<String>, error: FplError) {
        self.responses
            .lock()
            .expect("memory source mutex poisoned")
            .insert(path.into(), Err(error));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("memory source mutex poisoned").clone()
    }

    pub fn call_count(&self, path: &str) -> usize {
        self.calls
            .lock()
            .expect("memory source mutex poisoned")
            .iter()
            .filter(|p| p.as_str() == path)
            .count()
    }
}

#[async_trait]
impl FplSource for MemorySource {
    async fn get_json(&self, path: &str) -> Result<Value, FplError> {
        self.calls
            .lock()
            .expect("memory source mutex poisoned")
            .push(path.to_string());
        self.responses
            .lock()
            .expect("memory source mutex poisoned")
            .get(path)
            .cloned()
            .unwrap_or_else(|| Err(FplError::status(path, 404)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    /// Serve `router` on an ephemeral local port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn counting_bootstrap_router(hits: Arc<AtomicUsize>) -> Router {
        Router::new().route(
            "/api/bootstrap-static/",
            get(move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "events": [{ "id": 4, "is_current": true }] }))
                }
            }),
        )
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_upstream_fetch() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/api/bootstrap-static/",
            get(move || {
                let hits = counter.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Json(json!({ "events": [{ "id": 4, "is_current": true }] }))
                }
            }),
        );
        let base = serve(router).await;
        let client = HttpFplClient::new(reqwest::Client::new(), base, Duration::from_secs(5));

        let (a, b, c, d) = tokio::join!(
            client.bootstrap(),
            client.bootstrap(),
            client.bootstrap(),
            client.bootstrap()
        );
        for result in [a, b, c, d] {
            assert_eq!(result.unwrap().current_gameweek(), 4);
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/api/bootstrap-static/",
            get(move || {
                let hits = counter.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    axum::http::StatusCode::SERVICE_UNAVAILABLE
                }
            }),
        );
        let base = serve(router).await;
        let client = HttpFplClient::new(reqwest::Client::new(), base, Duration::from_secs(60));

        assert_eq!(client.bootstrap().await.unwrap_err().upstream_status(), Some(503));
        assert_eq!(client.bootstrap().await.unwrap_err().upstream_status(), Some(503));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn paths_match_upstream_layout() {
        assert_eq!(paths::entry_picks(12, 3), "entry/12/event/3/picks/");
        assert_eq!(paths::event_live(3), "event/3/live/");
        assert_eq!(paths::entry_history(12), "entry/12/history/");
        assert_eq!(paths::fixtures_for(7), "fixtures/?event=7");
        assert_eq!(
            paths::league_standings(314, 2),
            "leagues-classic/314/standings/?page_standings=2"
        );
        assert_eq!(paths::element_summary(328), "element-summary/328/");
    }

    #[test]
    fn url_joins_base_and_path() {
        let client = HttpFplClient::new(
            reqwest::Client::new(),
            "https://fantasy.premierleague.com/api/",
            Duration::ZERO,
        );
        assert_eq!(
            client.url_for("bootstrap-static/"),
            "https://fantasy.premierleague.com/api/bootstrap-static/"
        );
        assert_eq!(client.url_for("/event/3/live/"), "https://fantasy.premierleague.com/api/event/3/live/");
    }

    #[tokio::test]
    async fn repeated_requests_inside_window_hit_upstream_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(counting_bootstrap_router(hits.clone())).await;
        let client = HttpFplClient::new(reqwest::Client::new(), base, Duration::from_secs(60));

        let first = client.bootstrap().await.unwrap();
        let second = client.bootstrap().await.unwrap();
        assert_eq!(first.current_gameweek(), 4);
        assert_eq!(first, second);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_window_disables_cache() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(counting_bootstrap_router(hits.clone())).await;
        let client = HttpFplClient::new(reqwest::Client::new(), base, Duration::ZERO);

        client.bootstrap().await.unwrap();
        client.bootstrap().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_success_status_is_fetch_failure() {
        let base = serve(Router::new()).await;
        let client = HttpFplClient::new(reqwest::Client::new(), base, Duration::ZERO);

        let err = client.event_live(3).await.unwrap_err();
        assert_eq!(err.upstream_status(), Some(404));
        assert!(matches!(err, FplError::FetchFailure { ref path, .. } if path == "event/3/live/"));
    }

    #[tokio::test]
    async fn unexpected_shape_is_missing_data() {
        let source = MemorySource::new().with(paths::BOOTSTRAP, json!({ "events": "soon" }));
        let err = source.bootstrap().await.unwrap_err();
        assert!(matches!(err, FplError::MissingData { .. }));
    }

    #[tokio::test]
    async fn memory_source_records_calls_and_404s_unknown_paths() {
        let source = MemorySource::new().with(paths::FIXTURES, json!([]));
        assert!(source.fixtures(None).await.unwrap().is_empty());
        let err = source.fixtures(Some(2)).await.unwrap_err();
        assert_eq!(err.upstream_status(), Some(404));
        assert_eq!(source.calls(), vec!["fixtures/".to_string(), "fixtures/?event=2".to_string()]);
        assert_eq!(source.call_count("fixtures/"), 1);
    }
}
