// Shared session: every mutation is written to the store first, then
// published to watchers (the poller, HTTP handlers, the TUI).

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use fplwatch_core::session::{Session, SessionStore};

#[derive(Clone)]
pub struct SessionHandle {
    store: Arc<SessionStore>,
    tx: Arc<watch::Sender<Session>>,
}

impl SessionHandle {
    /// Load the persisted session and start publishing from it.
    pub fn new(store: SessionStore) -> Result<Self> {
        let initial = store.load()?;
        let (tx, _rx) = watch::channel(initial);
        Ok(Self {
            store: Arc::new(store),
            tx: Arc::new(tx),
        })
    }

    pub fn current(&self) -> Session {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    pub fn connect(&self, entry_id: u64) -> Result<Session> {
        self.store.connect_team(entry_id)?;
        info!(entry_id, "team connected");
        self.publish()
    }

    pub fn disconnect(&self) -> Result<Session> {
        self.store.disconnect()?;
        info!("team disconnected");
        self.publish()
    }

    pub fn toggle_favorite(&self, league_id: u64) -> Result<Session> {
        let now_favorite = self.store.toggle_favorite(league_id)?;
        info!(league_id, now_favorite, "favourite toggled");
        self.publish()
    }

    /// Re-read the store so watchers see exactly what was persisted.
    fn publish(&self) -> Result<Session> {
        let session = self.store.load()?;
        self.tx.send_replace(session.clone());
        Ok(session)
    }
}
