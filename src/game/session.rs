//! Round session - one task per connected client, owning its controller

use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::RoundConfig;
use crate::ws::protocol::ServerMsg;
use crate::ws::sink::{ClientPresenter, ClientScene};

use super::clock::IntervalClock;
use super::round::{Collaborators, RoundController};
use super::selection::SelectionFeed;
use super::{RoundEvent, RoundQueue};

/// Handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub id: Uuid,
    /// Round queue: commands and clock events all land here
    pub queue: RoundQueue,
    /// Outbound messages for the client
    pub updates_tx: broadcast::Sender<ServerMsg>,
    /// Where the client's picks are published
    pub selection: SelectionFeed,
}

impl SessionHandle {
    /// Post an event to the session. Returns false once the session is gone.
    pub fn send(&self, event: RoundEvent) -> bool {
        self.queue.send(event).is_ok()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerMsg> {
        self.updates_tx.subscribe()
    }
}

/// Registry of all live sessions
pub struct SessionRegistry {
    sessions: DashMap<Uuid, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.get(id).map(|s| s.value().clone())
    }

    pub fn insert(&self, handle: SessionHandle) {
        self.sessions.insert(handle.id, handle);
    }

    pub fn remove(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.remove(id).map(|(_, h)| h)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The task that serializes every event of one client's rounds
pub struct RoundSession {
    id: Uuid,
    controller: RoundController,
    queue_rx: mpsc::UnboundedReceiver<RoundEvent>,
}

impl RoundSession {
    /// Create a session wired to a real clock and client-facing sinks
    pub fn new(id: Uuid, config: RoundConfig) -> (Self, SessionHandle) {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (updates_tx, _) = broadcast::channel(256);
        let selection = SelectionFeed::new();

        let collaborators = Collaborators {
            clock: Box::new(IntervalClock::new()),
            selection: Box::new(selection.clone()),
            scene: Box::new(ClientScene::new(updates_tx.clone(), config.ball_radius)),
            presentation: Box::new(ClientPresenter::new(updates_tx.clone())),
        };

        let handle = SessionHandle {
            id,
            queue: queue_tx.clone(),
            updates_tx,
            selection,
        };

        let session = Self {
            id,
            controller: RoundController::new(config, collaborators, queue_tx),
            queue_rx,
        };

        (session, handle)
    }

    /// Process events until shutdown
    pub async fn run(mut self) {
        info!(session_id = %self.id, "Session started");

        while let Some(event) = self.queue_rx.recv().await {
            let shutdown = event == RoundEvent::Shutdown;
            self.controller.handle(event);
            if shutdown {
                debug!(session_id = %self.id, "Shutdown requested");
                break;
            }
        }

        self.controller.cleanup();
        info!(session_id = %self.id, "Session ended");
    }
}
