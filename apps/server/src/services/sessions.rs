// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server-held explorer sessions.
//!
//! Each session owns one [`Cascade`]. Requests lock the session, apply the
//! change and wait up to the settle timeout for the fetches it issued, so a
//! response usually carries loaded options. Fetches that outlast the timeout
//! keep running and are applied on the session's next request.
//!
//! Sessions idle for longer than [`SessionLimits::idle_ttl`] are dropped on the
//! next registry access, and the least recently used session makes room when
//! the registry is full.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bim_dash_client::{Backend, Cascade, CascadeSnapshot};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::ApiError;

/// Which selector chain a session drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// project → file → version → view → elements.
    #[default]
    Elements,
    /// project → designers.
    Designers,
}

/// Session id with the state of its selectors.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub kind: SessionKind,
    #[serde(flatten)]
    pub snapshot: CascadeSnapshot,
}

/// Lifetime limits of explorer sessions.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// How long a request waits for the fetches it issued.
    pub settle_timeout: Duration,
    /// Idle time after which a session is dropped.
    pub idle_ttl: Duration,
    /// Most sessions kept at once.
    pub max_sessions: usize,
}

struct Session {
    kind: SessionKind,
    cascade: Cascade,
}

struct Entry {
    session: Arc<Mutex<Session>>,
    last_access: Instant,
    /// Registry-wide access counter value, for least-recently-used order.
    touched: u64,
}

/// Registry of live explorer sessions.
pub struct ExplorerSessions {
    backend: Arc<dyn Backend>,
    limits: SessionLimits,
    clock: AtomicU64,
    sessions: RwLock<FxHashMap<Uuid, Entry>>,
}

impl ExplorerSessions {
    pub fn new(backend: Arc<dyn Backend>, limits: SessionLimits) -> Self {
        Self {
            backend,
            limits,
            clock: AtomicU64::new(0),
            sessions: RwLock::new(FxHashMap::default()),
        }
    }

    /// Opens a session and loads its root options.
    pub async fn create(&self, kind: SessionKind) -> Result<SessionView, ApiError> {
        let backend = Arc::clone(&self.backend);
        let mut cascade = match kind {
            SessionKind::Elements => Cascade::elements_explorer(backend)?,
            SessionKind::Designers => Cascade::designer_directory(backend)?,
        };
        cascade.start();

        let id = Uuid::new_v4();
        let mut session = Session { kind, cascade };
        let view = self.settled_view(id, &mut session).await;

        let mut sessions = self.sessions.write().await;
        self.evict_idle(&mut sessions);
        while sessions.len() >= self.limits.max_sessions.max(1) {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.touched)
                .map(|(id, _)| *id)
            else {
                break;
            };
            sessions.remove(&oldest);
            tracing::info!(session = %oldest, "Evicted least recently used explorer session");
        }
        sessions.insert(
            id,
            Entry {
                session: Arc::new(Mutex::new(session)),
                last_access: Instant::now(),
                touched: self.tick(),
            },
        );
        drop(sessions);

        tracing::info!(session = %id, kind = ?kind, "Explorer session opened");
        Ok(view)
    }

    /// Current state, applying any fetches that finished since the last
    /// request.
    pub async fn view(&self, id: Uuid) -> Result<SessionView, ApiError> {
        let session = self.get(id).await?;
        let mut session = session.lock().await;
        session.cascade.drain_ready();
        Ok(take_view(id, &mut session))
    }

    /// Selects `value` at the level named `level` (empty value clears it).
    pub async fn select(
        &self,
        id: Uuid,
        level: &str,
        value: &str,
    ) -> Result<SessionView, ApiError> {
        let session = self.get(id).await?;
        let mut session = session.lock().await;
        session.cascade.drain_ready();
        session.cascade.select_named(level, value)?;
        tracing::debug!(session = %id, level, value, "Selection changed");
        Ok(self.settled_view(id, &mut session).await)
    }

    /// Clears every selection; root options stay.
    pub async fn reset(&self, id: Uuid) -> Result<SessionView, ApiError> {
        let session = self.get(id).await?;
        let mut session = session.lock().await;
        session.cascade.drain_ready();
        session.cascade.reset();
        Ok(take_view(id, &mut session))
    }

    /// Re-fetches one slot, e.g. after a failure.
    pub async fn refresh(&self, id: Uuid, slot: usize) -> Result<SessionView, ApiError> {
        let session = self.get(id).await?;
        let mut session = session.lock().await;
        session.cascade.drain_ready();
        session.cascade.refresh(slot)?;
        Ok(self.settled_view(id, &mut session).await)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), ApiError> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                tracing::info!(session = %id, "Explorer session closed");
                Ok(())
            }
            None => Err(not_found(id)),
        }
    }

    /// Number of live sessions, after dropping idle ones.
    pub async fn len(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        self.evict_idle(&mut sessions);
        sessions.len()
    }

    async fn get(&self, id: Uuid) -> Result<Arc<Mutex<Session>>, ApiError> {
        let mut sessions = self.sessions.write().await;
        self.evict_idle(&mut sessions);
        let entry = sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
        entry.last_access = Instant::now();
        entry.touched = self.tick();
        Ok(Arc::clone(&entry.session))
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn evict_idle(&self, sessions: &mut FxHashMap<Uuid, Entry>) {
        let ttl = self.limits.idle_ttl;
        sessions.retain(|id, entry| {
            let live = entry.last_access.elapsed() < ttl;
            if !live {
                tracing::info!(session = %id, "Explorer session expired");
            }
            live
        });
    }

    async fn settled_view(&self, id: Uuid, session: &mut Session) -> SessionView {
        if tokio::time::timeout(self.limits.settle_timeout, session.cascade.settle())
            .await
            .is_err()
        {
            tracing::debug!(
                session = %id,
                in_flight = session.cascade.in_flight(),
                "Responding before fetches settled"
            );
        }
        take_view(id, session)
    }
}

/// Snapshot the session; notices are reported once.
fn take_view(id: Uuid, session: &mut Session) -> SessionView {
    let snapshot = session.cascade.snapshot();
    session.cascade.take_notices();
    SessionView {
        id,
        kind: session.kind,
        snapshot,
    }
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("explorer session {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubBackend;

    fn registry(idle_ttl: Duration, max_sessions: usize) -> ExplorerSessions {
        ExplorerSessions::new(
            Arc::new(StubBackend::sample()),
            SessionLimits {
                settle_timeout: Duration::from_secs(2),
                idle_ttl,
                max_sessions,
            },
        )
    }

    async fn open(sessions: &ExplorerSessions) -> Uuid {
        sessions.create(SessionKind::Designers).await.unwrap().id
    }

    #[tokio::test]
    async fn idle_sessions_expire() {
        let sessions = registry(Duration::from_millis(50), 16);
        let id = open(&sessions).await;
        assert_eq!(sessions.len().await, 1);

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(matches!(sessions.view(id).await, Err(ApiError::NotFound(_))));
        assert_eq!(sessions.len().await, 0);
    }

    #[tokio::test]
    async fn full_registry_drops_least_recently_used() {
        let sessions = registry(Duration::from_secs(600), 3);
        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(open(&sessions).await);
        }

        assert_eq!(sessions.len().await, 3);
        for id in &ids[..2] {
            assert!(sessions.view(*id).await.is_err());
        }
        for id in &ids[2..] {
            assert!(sessions.view(*id).await.is_ok());
        }
    }

    #[tokio::test]
    async fn access_keeps_a_session_alive() {
        let sessions = registry(Duration::from_secs(600), 2);
        let first = open(&sessions).await;
        let second = open(&sessions).await;

        sessions.view(first).await.unwrap();
        let third = open(&sessions).await;

        assert!(sessions.view(first).await.is_ok());
        assert!(sessions.view(second).await.is_err());
        assert!(sessions.view(third).await.is_ok());
    }
}
