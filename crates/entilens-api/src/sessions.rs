//! In-memory session list
//!
//! Every extraction is saved as a snapshot. The list lives for the
//! lifetime of the process and is shown newest first.
//!
//! Author: hephaex@gmail.com

use chrono::{DateTime, Utc};
use entilens_core::{EntityLabel, LabelSelection, SessionSnapshot};
use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

/// One line of the saved sessions list
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSummary {
    /// Position in the list, `1` being the most recent
    #[schema(example = 1)]
    pub number: usize,

    pub id: Uuid,

    pub created_at: DateTime<Utc>,

    /// Uploaded file name
    pub source: Option<String>,

    #[schema(example = "en_core_web_sm")]
    pub model: String,

    #[schema(value_type = Vec<EntityLabel>)]
    pub selected_labels: LabelSelection,

    #[schema(example = 12)]
    pub entity_count: usize,
}

/// Saved extraction snapshots
pub struct SessionStore {
    sessions: RwLock<Vec<SessionSnapshot>>,
    max_sessions: Option<usize>,
}

impl SessionStore {
    /// Create a store; `max_sessions` caps the list by dropping the oldest
    pub fn new(max_sessions: Option<usize>) -> Self {
        Self {
            sessions: RwLock::new(Vec::new()),
            max_sessions,
        }
    }

    /// Append a snapshot and return its id
    pub async fn save(&self, snapshot: SessionSnapshot) -> Uuid {
        let id = snapshot.id;
        let mut sessions = self.sessions.write().await;
        sessions.push(snapshot);

        if let Some(max) = self.max_sessions {
            if sessions.len() > max {
                let excess = sessions.len() - max;
                sessions.drain(..excess);
                tracing::debug!(dropped = excess, max, "Dropped oldest sessions");
            }
        }

        id
    }

    /// Summaries, most recent first
    pub async fn list(&self) -> Vec<SessionSummary> {
        let sessions = self.sessions.read().await;
        sessions
            .iter()
            .rev()
            .enumerate()
            .map(|(index, snapshot)| SessionSummary {
                number: index + 1,
                id: snapshot.id,
                created_at: snapshot.created_at,
                source: snapshot.source.clone(),
                model: snapshot.model.clone(),
                selected_labels: snapshot.selected_labels.clone(),
                entity_count: snapshot.entity_count(),
            })
            .collect()
    }

    pub async fn get(&self, id: Uuid) -> Option<SessionSnapshot> {
        self.sessions
            .read()
            .await
            .iter()
            .find(|snapshot| snapshot.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Remove every snapshot, returning how many were removed
    pub async fn clear(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.len();
        sessions.clear();
        removed
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(None)
    }
}
