// libs/video-conferencing-cell/src/services/session.rs
use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{RemoteSession, RemoteSessionError, RemoteSessionStatus};

/// Persistence for remote session records.
#[async_trait]
pub trait RemoteSessionStore: Send + Sync {
    async fn insert(&self, session: RemoteSession) -> Result<RemoteSession, RemoteSessionError>;

    async fn get(&self, id: Uuid) -> Result<Option<RemoteSession>, RemoteSessionError>;

    async fn get_for_appointment(&self, appointment_id: Uuid) -> Result<Option<RemoteSession>, RemoteSessionError>;

    /// Returns `None` when no session has that id.
    async fn set_status(
        &self,
        id: Uuid,
        status: RemoteSessionStatus,
    ) -> Result<Option<RemoteSession>, RemoteSessionError>;
}

#[derive(Default)]
pub struct InMemoryRemoteSessionStore {
    sessions: RwLock<HashMap<Uuid, RemoteSession>>,
}

impl InMemoryRemoteSessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RemoteSessionStore for InMemoryRemoteSessionStore {
    async fn insert(&self, session: RemoteSession) -> Result<RemoteSession, RemoteSessionError> {
        let mut sessions = self.sessions.write().await;

        if sessions.values().any(|s| s.appointment_id == session.appointment_id) {
            return Err(RemoteSessionError::Store(format!(
                "Appointment {} already has a remote session",
                session.appointment_id
            )));
        }

        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get(&self, id: Uuid) -> Result<Option<RemoteSession>, RemoteSessionError> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn get_for_appointment(&self, appointment_id: Uuid) -> Result<Option<RemoteSession>, RemoteSessionError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .find(|s| s.appointment_id == appointment_id)
            .cloned())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: RemoteSessionStatus,
    ) -> Result<Option<RemoteSession>, RemoteSessionError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.get_mut(&id).map(|session| {
            session.status = status;
            session.clone()
        }))
    }
}

/// `remote_sessions` table behind PostgREST.
pub struct SupabaseRemoteSessionStore {
    supabase: SupabaseClient,
}

impl SupabaseRemoteSessionStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    fn parse_first(rows: Vec<Value>) -> Result<Option<RemoteSession>, RemoteSessionError> {
        rows.into_iter()
            .next()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| RemoteSessionError::Store(format!("Failed to parse remote session: {}", e)))
    }
}

#[async_trait]
impl RemoteSessionStore for SupabaseRemoteSessionStore {
    async fn insert(&self, session: RemoteSession) -> Result<RemoteSession, RemoteSessionError> {
        debug!("Storing remote session {} for appointment {}", session.id, session.appointment_id);

        let body = serde_json::to_value(&session)
            .map_err(|e| RemoteSessionError::Store(format!("Failed to serialize remote session: {}", e)))?;

        let rows = self
            .supabase
            .write_returning(Method::POST, "/rest/v1/remote_sessions", body)
            .await
            .map_err(|e| RemoteSessionError::Store(e.to_string()))?;

        let stored = Self::parse_first(rows)?
            .ok_or_else(|| RemoteSessionError::Store("Failed to create remote session".to_string()))?;

        info!("Remote session {} stored", stored.id);
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<RemoteSession>, RemoteSessionError> {
        let path = format!("/rest/v1/remote_sessions?id=eq.{}", id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| RemoteSessionError::Store(e.to_string()))?;

        Self::parse_first(rows)
    }

    async fn get_for_appointment(&self, appointment_id: Uuid) -> Result<Option<RemoteSession>, RemoteSessionError> {
        let path = format!("/rest/v1/remote_sessions?appointment_id=eq.{}", appointment_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| RemoteSessionError::Store(e.to_string()))?;

        Self::parse_first(rows)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: RemoteSessionStatus,
    ) -> Result<Option<RemoteSession>, RemoteSessionError> {
        let path = format!("/rest/v1/remote_sessions?id=eq.{}", id);
        let rows = self
            .supabase
            .write_returning(Method::PATCH, &path, json!({ "status": status }))
            .await
            .map_err(|e| RemoteSessionError::Store(e.to_string()))?;

        Self::parse_first(rows)
    }
}
