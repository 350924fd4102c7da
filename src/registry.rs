//! Process-wide map from user identity to that user's transcript.
//!
//! Entries are created on first contact and live until the registry is
//! dropped. There is no eviction, TTL or size cap.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::memory::Transcript;

/// Shared handle to one user's transcript. Holding the lock serializes
/// relay calls for that user.
pub type SharedTranscript = Arc<Mutex<Transcript>>;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, SharedTranscript>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the transcript for `user_id`, creating an empty one if needed.
    /// The boolean is `true` when the entry was just created.
    pub async fn open(&self, user_id: &str) -> (SharedTranscript, bool) {
        if let Some(existing) = self.sessions.read().await.get(user_id) {
            return (Arc::clone(existing), false);
        }

        let mut sessions = self.sessions.write().await;
        // Another caller may have inserted between the two locks.
        if let Some(existing) = sessions.get(user_id) {
            return (Arc::clone(existing), false);
        }
        let created = SharedTranscript::default();
        sessions.insert(user_id.to_string(), Arc::clone(&created));
        (created, true)
    }

    pub async fn get(&self, user_id: &str) -> Option<SharedTranscript> {
        self.sessions.read().await.get(user_id).cloned()
    }

    /// Copy of the user's transcript. Waits for any in-flight call for that
    /// user to finish.
    pub async fn snapshot(&self, user_id: &str) -> Option<Transcript> {
        let shared = self.get(user_id).await?;
        let transcript = shared.lock().await;
        Some(transcript.clone())
    }

    pub async fn contains(&self, user_id: &str) -> bool {
        self.sessions.read().await.contains_key(user_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
