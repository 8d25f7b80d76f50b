use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

use crate::models::Session;

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Shared handle to one session. Holding the lock serializes actions on it.
pub type SessionHandle = Arc<Mutex<Session>>;

struct Entry {
    handle: SessionHandle,
    last_seen: Instant,
}

/// Live sessions keyed by opaque id.
///
/// Sessions untouched for longer than the idle timeout are evicted by
/// [`SessionRegistry::sweep_idle`], which also runs on every `create`.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Entry>>>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Start an anonymous session and return its id
    pub async fn create(&self) -> String {
        self.sweep_idle().await;

        let id = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            id.clone(),
            Entry {
                handle: Arc::new(Mutex::new(Session::initialize())),
                last_seen: Instant::now(),
            },
        );
        tracing::debug!("Session created: {} (live={})", id, sessions.len());
        id
    }

    /// Look up a session and mark it as recently used
    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(entry.handle.clone())
    }

    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::debug!("Session removed: {}", id);
        }
        removed
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle past the timeout. A session whose handle is
    /// still held by a request is kept. Returns how many were evicted.
    pub async fn sweep_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            entry.last_seen.elapsed() < self.idle_timeout || Arc::strong_count(&entry.handle) > 1
        });

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(
                "Evicted {} idle sessions (live={}, idle timeout={}s)",
                evicted,
                sessions.len(),
                self.idle_timeout.as_secs()
            );
        }
        evicted
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
