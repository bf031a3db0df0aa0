use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{SessionResponse, StudentProfile};

/// Errors that can occur with session operations
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(Uuid),
}

/// Profile accumulated over one conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSession {
    pub id: Uuid,
    pub profile: StudentProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileSession {
    fn new(profile: StudentProfile) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            profile,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.profile.missing_fields()
    }
}

impl From<ProfileSession> for SessionResponse {
    fn from(session: ProfileSession) -> Self {
        let missing_fields: Vec<String> = session
            .missing_fields()
            .into_iter()
            .map(str::to_string)
            .collect();

        SessionResponse {
            session_id: session.id,
            complete: missing_fields.is_empty(),
            missing_fields,
            profile: session.profile,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// In-memory session store
///
/// Bounded by `max_sessions`; a session expires after `ttl` without being
/// read or written. Sessions never outlive the process.
#[derive(Clone)]
pub struct SessionStore {
    sessions: moka::future::Cache<Uuid, ProfileSession>,
}

impl SessionStore {
    pub fn new(max_sessions: u64, ttl: Duration) -> Self {
        let sessions = moka::future::CacheBuilder::new(max_sessions)
            .time_to_idle(ttl)
            .build();

        Self { sessions }
    }

    /// Open a session, optionally seeded with a partial profile
    pub async fn create(&self, profile: StudentProfile) -> ProfileSession {
        let session = ProfileSession::new(profile);
        self.sessions.insert(session.id, session.clone()).await;
        tracing::debug!("Session created: {}", session.id);
        session
    }

    pub async fn get(&self, id: Uuid) -> Result<ProfileSession, SessionError> {
        self.sessions.get(&id).await.ok_or(SessionError::NotFound(id))
    }

    /// Overlay the fields set in `patch` onto the stored profile
    ///
    /// Concurrent merges on the same session are last-writer-wins.
    pub async fn merge(
        &self,
        id: Uuid,
        patch: StudentProfile,
    ) -> Result<ProfileSession, SessionError> {
        let mut session = self.get(id).await?;
        session.profile.merge(patch);
        session.updated_at = Utc::now();

        self.sessions.insert(id, session.clone()).await;
        tracing::debug!(
            "Session {} updated, {} fields still missing",
            id,
            session.missing_fields().len()
        );
        Ok(session)
    }

    /// Forget a session entirely
    pub async fn delete(&self, id: Uuid) -> Result<(), SessionError> {
        match self.sessions.remove(&id).await {
            Some(_) => {
                tracing::debug!("Session deleted: {}", id);
                Ok(())
            }
            None => Err(SessionError::NotFound(id)),
        }
    }

    /// Approximate number of live sessions
    pub fn len(&self) -> u64 {
        self.sessions.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(100, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = store();
        let seed = StudentProfile {
            budget: Some(8000.0),
            ..Default::default()
        };

        let created = store.create(seed.clone()).await;
        let fetched = store.get(created.id).await.unwrap();

        assert_eq!(fetched.profile, seed);
        assert_eq!(fetched.created_at, fetched.updated_at);
    }

    #[tokio::test]
    async fn test_merge_accumulates_fields() {
        let store = store();
        let session = store
            .create(StudentProfile {
                origin: Some("Roma".to_string()),
                budget: Some(8000.0),
                ..Default::default()
            })
            .await;

        let merged = store
            .merge(
                session.id,
                StudentProfile {
                    budget: Some(12000.0),
                    gpa: Some(8.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(merged.profile.origin.as_deref(), Some("Roma"));
        assert_eq!(merged.profile.budget, Some(12000.0));
        assert_eq!(merged.profile.gpa, Some(8.0));
        assert!(merged.updated_at >= merged.created_at);
        assert!(!merged.missing_fields().contains(&"gpa"));

        let stored = store.get(session.id).await.unwrap();
        assert_eq!(stored.profile, merged.profile);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let store = store();
        let id = Uuid::new_v4();

        assert_eq!(store.get(id).await, Err(SessionError::NotFound(id)));
        assert_eq!(
            store.merge(id, StudentProfile::default()).await,
            Err(SessionError::NotFound(id))
        );
        assert_eq!(store.delete(id).await, Err(SessionError::NotFound(id)));
    }

    #[tokio::test]
    async fn test_delete_resets() {
        let store = store();
        let session = store.create(StudentProfile::default()).await;

        store.delete(session.id).await.unwrap();
        assert!(store.get(session.id).await.is_err());
    }

    #[tokio::test]
    async fn test_session_response_reports_missing_fields() {
        let store = store();
        let session = store.create(StudentProfile::default()).await;
        let response = SessionResponse::from(session);

        assert!(!response.complete);
        assert_eq!(response.missing_fields.len(), 12);
        assert!(response.missing_fields.contains(&"budget".to_string()));
    }
}
