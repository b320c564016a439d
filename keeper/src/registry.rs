//! Session registry - the owned collection of all sessions.
//!
//! An explicit arena, passed where it is needed; there is no ambient global
//! table. The registry assigns default names, routes captured requests into
//! fresh sessions, and derives the per-session running badge. It never
//! destroys a session on its own; removal is a display-layer request that
//! still goes through the stop contract first.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::models::TargetRequest;
use crate::session::Session;
use crate::transport::Transport;

/// Owned collection of sessions, in creation order.
pub struct SessionRegistry {
    sessions: HashMap<Uuid, Session>,
    order: Vec<Uuid>,
    /// Strictly increasing; never reused even after removals.
    next_ordinal: u64,
    transport: Arc<dyn Transport>,
}

impl SessionRegistry {
    /// Create an empty registry. Every session it creates replays through
    /// the given transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            sessions: HashMap::new(),
            order: Vec::new(),
            next_ordinal: 0,
            transport,
        }
    }

    /// Allocate a new idle session with the next default name.
    pub fn create_session(&mut self) -> Uuid {
        self.next_ordinal += 1;
        let name = format!("Session {}", self.next_ordinal);
        let session = Session::new(&name, Arc::clone(&self.transport));
        let id = session.id();
        info!(%id, %name, "session created");
        self.sessions.insert(id, session);
        self.order.push(id);
        id
    }

    /// Route a captured request: always a fresh session, never merged into
    /// an existing one.
    pub async fn route_captured_request(&mut self, target: TargetRequest) -> Uuid {
        let id = self.create_session();
        if let Some(session) = self.sessions.get_mut(&id) {
            session.load_request(target).await;
        }
        id
    }

    /// Look up a session.
    pub fn get(&self, id: Uuid) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Look up a session mutably.
    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    /// Sessions in creation order.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.order.iter().filter_map(|id| self.sessions.get(id))
    }

    /// The display title for a session: name plus a two-state badge derived
    /// purely from the scheduler's real lifecycle.
    pub fn rendered_status(&self, id: Uuid) -> Option<String> {
        self.sessions.get(&id).map(|session| {
            let badge = if session.is_running() { "RUN" } else { "STOP" };
            format!("{} [{}]", session.name(), badge)
        })
    }

    /// Stop a session and remove it from the registry. Returns false when
    /// the id is unknown.
    pub async fn remove_session(&mut self, id: Uuid) -> bool {
        let Some(mut session) = self.sessions.remove(&id) else {
            return false;
        };
        session.shutdown().await;
        self.order.retain(|other| *other != id);
        info!(%id, name = %session.name(), "session removed");
        true
    }

    /// Stop every session's scheduler. Used at process teardown; idempotent
    /// and tolerant of sessions that are already stopped.
    pub async fn shutdown_all(&mut self) {
        for id in self.order.clone() {
            if let Some(session) = self.sessions.get_mut(&id) {
                session.shutdown().await;
            }
        }
        info!(sessions = self.order.len(), "all sessions stopped");
    }

    /// Number of sessions currently held.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the registry holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
