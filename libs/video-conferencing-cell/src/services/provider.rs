// libs/video-conferencing-cell/src/services/provider.rs
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, instrument, warn};

use shared_config::AppConfig;

use crate::models::{JoinLink, RemoteSessionError, SessionKind, SessionRequest};

/// Opaque "create remote session" capability. Returns the join URL.
#[async_trait]
pub trait RemoteSessionProvider: Send + Sync {
    async fn create_session(&self, request: &SessionRequest) -> Result<String, RemoteSessionError>;
}

/// Stand-in used when no conferencing credentials are configured.
#[derive(Debug, Default)]
pub struct UnavailableProvider;

#[async_trait]
impl RemoteSessionProvider for UnavailableProvider {
    async fn create_session(&self, _request: &SessionRequest) -> Result<String, RemoteSessionError> {
        Err(RemoteSessionError::NotConfigured)
    }
}

/// Wraps a provider with a timeout and the fallback link policy.
/// `obtain_link` never fails: any provider error, timeout, or empty URL
/// yields the fallback link instead.
pub struct RemoteSessionBroker {
    provider: Arc<dyn RemoteSessionProvider>,
    fallback_url: String,
    timeout: Duration,
}

impl RemoteSessionBroker {
    pub fn new(provider: Arc<dyn RemoteSessionProvider>, fallback_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            provider,
            fallback_url: fallback_url.into(),
            timeout,
        }
    }

    pub fn from_config(provider: Arc<dyn RemoteSessionProvider>, config: &AppConfig) -> Self {
        Self::new(
            provider,
            config.remote_session_fallback_url.clone(),
            Duration::from_secs(config.remote_session_timeout_seconds),
        )
    }

    pub fn fallback_url(&self) -> &str {
        &self.fallback_url
    }

    pub async fn try_create(&self, request: &SessionRequest) -> Result<String, RemoteSessionError> {
        let url = tokio::time::timeout(self.timeout, self.provider.create_session(request))
            .await
            .map_err(|_| RemoteSessionError::Timeout {
                seconds: self.timeout.as_secs(),
            })??;

        if url.trim().is_empty() {
            return Err(RemoteSessionError::EmptyJoinUrl);
        }

        Ok(url)
    }

    #[instrument(skip(self), fields(topic = %request.topic))]
    pub async fn obtain_link(&self, request: &SessionRequest) -> JoinLink {
        match self.try_create(request).await {
            Ok(url) => {
                info!("Remote session created by provider");
                JoinLink {
                    url,
                    kind: SessionKind::ProviderIssued,
                }
            }
            Err(RemoteSessionError::NotConfigured) => {
                warn!("Remote session provider not configured, using fallback link");
                self.fallback()
            }
            Err(e) => {
                error!("Remote session provider unavailable, using fallback link: {}", e);
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> JoinLink {
        JoinLink {
            url: self.fallback_url.clone(),
            kind: SessionKind::Fallback,
        }
    }
}
