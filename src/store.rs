//! In-memory registry of live sessions.
//!
//! Sessions are dropped once they have been idle for longer than the
//! configured TTL, either by the background sweeper or when a new session
//! needs room. The number of live sessions never exceeds the cap.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::analysis::AnalysisClient;
use crate::session::SessionController;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

struct SessionEntry {
    controller: Arc<SessionController>,
    last_seen: Instant,
}

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_ttl,
            max_sessions,
        }
    }

    /// Register a new session. Returns `None` when the store is full even
    /// after dropping idle sessions.
    pub async fn create(&self, client: Arc<dyn AnalysisClient>) -> Option<Uuid> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions {
            let evicted = retain_active(&mut sessions, now, self.idle_ttl);
            if evicted > 0 {
                tracing::info!("Evicted {} idle sessions to make room", evicted);
            }
            if sessions.len() >= self.max_sessions {
                tracing::warn!("Session limit of {} reached", self.max_sessions);
                return None;
            }
        }

        let id = Uuid::new_v4();
        sessions.insert(
            id,
            SessionEntry {
                controller: Arc::new(SessionController::new(client)),
                last_seen: now,
            },
        );
        Some(id)
    }

    /// Look up a session and mark it as used.
    pub async fn get(&self, id: Uuid) -> Option<Arc<SessionController>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_seen = Instant::now();
        Some(entry.controller.clone())
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Drop every session not used within the TTL as of `now`.
    pub async fn evict_idle(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        retain_active(&mut sessions, now, self.idle_ttl)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Periodically evict idle sessions until the returned handle is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle(Instant::now()).await;
                if evicted > 0 {
                    tracing::info!("Evicted {} idle sessions", evicted);
                }
            }
        })
    }
}

fn retain_active(sessions: &mut HashMap<Uuid, SessionEntry>, now: Instant, ttl: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|_, entry| now.saturating_duration_since(entry.last_seen) < ttl);
    before - sessions.len()
}
