// fplwatch entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, or stdout when headless)
// 2. Load config
// 3. Open the session database
// 4. Build the FPL client and dashboard service
// 5. Create channels
// 6. Spawn the HTTP API and WebSocket server tasks
// 7. Spawn the poller and command tasks
// 8. Run the TUI (or wait for Ctrl+C when headless)
// 9. Cleanup on exit

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};

use fplwatch_app::client::HttpFplClient;
use fplwatch_app::http::{self, AppState};
use fplwatch_app::poller::{PollIntervals, Poller, UPDATE_CHANNEL_CAPACITY};
use fplwatch_app::service::DashboardService;
use fplwatch_app::session::SessionHandle;
use fplwatch_app::ws_server;
use fplwatch_core::config;
use fplwatch_core::session::SessionStore;
use fplwatch_tui::{commands, tui};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let headless = std::env::args().skip(1).any(|arg| arg == "--headless");

    // 1. Initialize tracing
    init_tracing(headless)?;
    info!("fplwatch starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!("Config loaded: upstream={}", config.api.base_url);

    // 3. Open the session database
    let db_path = config.resolve_db_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let store = SessionStore::open(&db_path.to_string_lossy()).context("failed to open database")?;
    let session = SessionHandle::new(store).context("failed to load session")?;
    info!(
        "Database opened at {}, connected team: {:?}",
        db_path.display(),
        session.current().entry_id
    );

    // 4. Build the FPL client and dashboard service
    let client = HttpFplClient::from_config(&config.api).context("failed to build FPL client")?;
    let service = DashboardService::new(Arc::new(client), &config.safety);

    // 5. Create channels
    let (updates_tx, updates_rx) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
    let (poll_tx, poll_rx) = mpsc::channel(16);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);

    // 6. Spawn the HTTP API and WebSocket server tasks
    let http_addr = format!("{}:{}", config.server.host, config.server.port);
    let http_state = AppState::new(service.clone(), session.clone());
    let http_handle = tokio::spawn(async move {
        if let Err(e) = http::serve(&http_addr, http_state).await {
            error!("HTTP server error on {}: {:#}", http_addr, e);
        }
    });

    let ws_addr = format!("{}:{}", config.server.host, config.server.ws_port);
    let ws_updates = updates_tx.clone();
    let ws_handle = tokio::spawn(async move {
        match tokio::net::TcpListener::bind(&ws_addr).await {
            Ok(listener) => {
                if let Err(e) = ws_server::run(listener, ws_updates).await {
                    error!("WebSocket server error: {}", e);
                }
            }
            Err(e) => error!("Failed to bind WebSocket server on {}: {}", ws_addr, e),
        }
    });

    // 7. Spawn the poller and command tasks
    let poller = Poller::new(
        service,
        PollIntervals::from(&config.polling),
        session.subscribe(),
        updates_tx,
    );
    let poller_handle = tokio::spawn(async move {
        if let Err(e) = poller.run(poll_rx).await {
            error!("Poller error: {}", e);
        }
    });

    let command_session = session.clone();
    let command_handle = tokio::spawn(async move {
        if let Err(e) = commands::handle_commands(cmd_rx, command_session, poll_tx).await {
            error!("Command handler error: {}", e);
        }
    });

    // 8. Run the TUI, or wait for Ctrl+C
    info!(
        "Application ready. HTTP on {}:{}, WebSocket on {}:{}",
        config.server.host, config.server.port, config.server.host, config.server.ws_port
    );

    if headless {
        drop(updates_rx);
        tokio::signal::ctrl_c().await.context("failed to listen for Ctrl+C")?;
        info!("Ctrl+C received");
        let _ = cmd_tx.send(tui::UserCommand::Quit).await;
    } else if let Err(e) = tui::run(updates_rx, session.subscribe(), cmd_tx.clone()).await {
        error!("TUI error: {}", e);
        let _ = cmd_tx.send(tui::UserCommand::Quit).await;
    }
    drop(cmd_tx);

    // 9. Cleanup: let the command task stop the poller, then stop the servers
    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = command_handle.await;
        let _ = poller_handle.await;
    })
    .await;

    http_handle.abort();
    ws_handle.abort();

    info!("fplwatch shut down cleanly");
    Ok(())
}

/// Log to `logs/fplwatch.log` while the TUI owns the terminal; to stdout
/// when headless.
fn init_tracing(headless: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    // Target prefixes cover the fplwatch_* library crates too.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fplwatch=info,warn"));

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true);

    if headless {
        tracing::subscriber::set_global_default(builder.finish())
            .context("failed to set tracing subscriber")?;
        return Ok(());
    }

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let log_file = std::fs::File::create(log_dir.join("fplwatch.log"))?;

    let subscriber = builder
        .with_writer(log_file)
        .with_ansi(false)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
