//! Per-chat search sessions with time-based expiry.

use std::collections::HashMap;
use std::sync::Arc;
use teloxide::types::ChatId;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::catalog::Track;

/// The most recent search of one chat: the query, its ordered results and
/// when it happened. Replaced wholesale on every new search.
#[derive(Debug, Clone)]
pub struct Session {
    pub query: String,
    pub tracks: Vec<Track>,
    pub created_at: Instant,
}

type Clock = Arc<dyn Fn() -> Instant + Send + Sync>;

/// In-memory map from chat to its last search session.
///
/// Last-writer-wins per chat; no cross-chat shared state. The clock is
/// injectable so expiry is testable without real time delays.
pub struct SessionStore {
    sessions: Mutex<HashMap<ChatId, Session>>,
    clock: Clock,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Instant::now))
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Stores the results of a search, overwriting any previous session for
    /// the chat and stamping the current time.
    pub async fn put(&self, owner: ChatId, query: &str, tracks: Vec<Track>) {
        let session = Session {
            query: query.to_string(),
            tracks,
            created_at: (self.clock)(),
        };
        self.sessions.lock().await.insert(owner, session);
    }

    /// Returns a snapshot of the chat's session, if any.
    pub async fn get(&self, owner: ChatId) -> Option<Session> {
        self.sessions.lock().await.get(&owner).cloned()
    }

    /// Resolves a track id against the chat's stored results. Absent when
    /// the chat has no session or the id is not in the last result list
    /// (covers both expiry and stale-button presses).
    pub async fn resolve_track(&self, owner: ChatId, track_id: &str) -> Option<Track> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(&owner)?
            .tracks
            .iter()
            .find(|t| t.id == track_id)
            .cloned()
    }

    /// Removes every session strictly older than `max_age` and returns how
    /// many were removed. Sessions aged exactly `max_age` are retained.
    pub async fn sweep_expired(&self, max_age: Duration) -> usize {
        let now = (self.clock)();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.created_at) <= max_age);
        let removed = before - sessions.len();
        if removed > 0 {
            log::debug!("Swept {} expired session(s)", removed);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
