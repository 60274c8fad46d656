//! One streaming session per client.
//!
//! The registry builds each client's relay, backend, session and button
//! presser from the host configuration, and routes button taps and reset
//! requests to the right session by client identity.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use tilecast_core::{
    Button, ButtonPresser, EmulatorBackend, FrameRelay, MapSurface, Session,
    SessionStatsSnapshot, TestPatternBackend, TilecastError,
};

use crate::config::HostConfig;

// ── ClientId ─────────────────────────────────────────────────────

/// Identity of a connected client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ClientId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ── RegistryError ────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("client {0} already has a session")]
    Duplicate(ClientId),

    #[error("no session for client {0}")]
    UnknownClient(ClientId),

    #[error("session limit of {0} reached")]
    LimitReached(usize),

    #[error(transparent)]
    Session(#[from] TilecastError),
}

// ── SessionRegistry ──────────────────────────────────────────────

struct ClientSession {
    session: Session,
    presser: ButtonPresser,
}

/// All live sessions, keyed by client.
pub struct SessionRegistry {
    config: HostConfig,
    sessions: Mutex<HashMap<ClientId, ClientSession>>,
}

impl SessionRegistry {
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Build and start a session for `client` drawing onto `surface`.
    pub async fn start_session(
        &self,
        client: ClientId,
        surface: Arc<dyn MapSurface>,
    ) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&client) {
            return Err(RegistryError::Duplicate(client));
        }
        let limit = self.config.session.max_sessions;
        if limit > 0 && sessions.len() >= limit {
            return Err(RegistryError::LimitReached(limit));
        }

        let kind = self.config.backend_kind();
        let relay = Arc::new(FrameRelay::new(kind.width(), kind.height())?);
        let backend: Arc<dyn EmulatorBackend> =
            Arc::new(TestPatternBackend::new(kind, Arc::clone(&relay))?);

        let mut session = Session::new(
            client.as_str(),
            Arc::clone(&backend),
            relay,
            surface,
            self.config.to_session_config(),
        )?;
        session.start().await?;

        let presser = ButtonPresser::new(backend, self.config.hold());
        sessions.insert(client.clone(), ClientSession { session, presser });
        info!(%client, backend = kind.name(), active = sessions.len(), "client session registered");
        Ok(())
    }

    /// Stop and forget `client`'s session, returning its final counters.
    pub async fn stop_session(&self, client: &ClientId) -> Result<SessionStatsSnapshot, RegistryError> {
        let entry = self.sessions.lock().await.remove(client);
        let Some(mut entry) = entry else {
            return Err(RegistryError::UnknownClient(client.clone()));
        };
        entry.session.stop().await;
        let stats = entry.session.stats();
        info!(%client, tiles = stats.tiles_sent, "client session removed");
        Ok(stats)
    }

    /// Tap `button` on `client`'s backend.
    ///
    /// Returns `false` if the button was still held and the tap ignored.
    pub async fn press_button(&self, client: &ClientId, button: Button) -> Result<bool, RegistryError> {
        let sessions = self.sessions.lock().await;
        let entry = sessions
            .get(client)
            .ok_or_else(|| RegistryError::UnknownClient(client.clone()))?;
        Ok(entry.presser.tap(button))
    }

    /// Force a full redraw of `client`'s display.
    pub async fn reset_display(&self, client: &ClientId) -> Result<(), RegistryError> {
        let sessions = self.sessions.lock().await;
        let entry = sessions
            .get(client)
            .ok_or_else(|| RegistryError::UnknownClient(client.clone()))?;
        entry.session.request_reset();
        Ok(())
    }

    pub async fn stats(&self, client: &ClientId) -> Result<SessionStatsSnapshot, RegistryError> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(client)
            .map(|entry| entry.session.stats())
            .ok_or_else(|| RegistryError::UnknownClient(client.clone()))
    }

    /// Clients with a live session, sorted.
    pub async fn active_clients(&self) -> Vec<ClientId> {
        let mut clients: Vec<_> = self.sessions.lock().await.keys().cloned().collect();
        clients.sort();
        clients
    }

    /// Stop every session. Returns how many were stopped.
    pub async fn shutdown_all(&self) -> usize {
        let drained: Vec<_> = self.sessions.lock().await.drain().collect();
        let count = drained.len();
        for (client, mut entry) in drained {
            entry.session.stop().await;
            if entry.session.is_running() {
                warn!(%client, "session still running after stop");
            }
        }
        if count > 0 {
            info!(count, "all sessions stopped");
        }
        count
    }
}

// ── Tests ────────────────────────────────────────────────────────
