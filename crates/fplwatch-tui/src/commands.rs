// Command task: carries out the TUI's UserCommands against the shared
// session and the poller.
//
// Session changes reach the poller through the session watch channel, so
// connecting or disconnecting here is enough for it to switch teams.

use tokio::sync::mpsc;
use tracing::{error, info};

use fplwatch_app::protocol::PollCommand;
use fplwatch_app::session::SessionHandle;

use crate::tui::UserCommand;

/// Run until `UserCommand::Quit` or the command channel closes. Either way
/// the poller is told to shut down.
pub async fn handle_commands(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    session: SessionHandle,
    poll_tx: mpsc::Sender<PollCommand>,
) -> anyhow::Result<()> {
    info!("Command handler started");

    while let Some(cmd) = cmd_rx.recv().await {
        if cmd == UserCommand::Quit {
            info!("Quit command received, shutting down");
            break;
        }
        handle_user_command(cmd, &session, &poll_tx).await;
    }

    let _ = poll_tx.send(PollCommand::Shutdown).await;
    Ok(())
}

async fn handle_user_command(
    cmd: UserCommand,
    session: &SessionHandle,
    poll_tx: &mpsc::Sender<PollCommand>,
) {
    let result = match cmd {
        UserCommand::Connect(entry_id) => session.connect(entry_id).map(drop),
        UserCommand::Disconnect => session.disconnect().map(drop),
        UserCommand::ToggleFavorite(league_id) => session.toggle_favorite(league_id).map(drop),
        UserCommand::Refresh => forward(poll_tx, PollCommand::RefreshNow).await,
        UserCommand::OpenStandings { league_id, page } => {
            forward(poll_tx, PollCommand::OpenStandings { league_id, page }).await
        }
        UserCommand::CloseStandings => forward(poll_tx, PollCommand::CloseStandings).await,
        // Handled in the loop
        UserCommand::Quit => Ok(()),
    };

    if let Err(e) = result {
        error!("{cmd:?} failed: {e:#}");
    }
}

async fn forward(poll_tx: &mpsc::Sender<PollCommand>, cmd: PollCommand) -> anyhow::Result<()> {
    if poll_tx.send(cmd).await.is_err() {
        error!("{cmd:?} requested but the poller has stopped");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
