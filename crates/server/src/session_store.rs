//! In-memory store for live lesson sessions.
//!
//! Exactly one engine instance exists per started lesson; every session is
//! behind its own lock so one request mutates it at a time. Removing a
//! session drops the last strong reference, which invalidates any in-flight
//! opponent-reply timer still holding a `Weak` to it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use lesson_engine::LessonSession;

pub struct ActiveSession {
    pub lesson_id: String,
    pub session: LessonSession,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Arc<Mutex<ActiveSession>>>>>,
}

impl SessionStore {
    pub async fn insert(&self, session: ActiveSession) -> Uuid {
        let id = Uuid::new_v4();
        self.inner
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        id
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<Mutex<ActiveSession>>> {
        self.inner.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &Uuid) -> Option<Arc<Mutex<ActiveSession>>> {
        self.inner.write().await.remove(id)
    }

    pub async fn live_count(&self) -> usize {
        self.inner.read().await.len()
    }
}
