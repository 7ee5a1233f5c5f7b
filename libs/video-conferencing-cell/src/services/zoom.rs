// libs/video-conferencing-cell/src/services/zoom.rs
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::models::{
    RemoteSessionError, SessionRequest, ZoomMeetingRequest, ZoomMeetingResponse, ZoomMeetingSettings,
    ZoomTokenResponse,
};
use crate::services::provider::RemoteSessionProvider;

/// Zoom server-to-server OAuth client that schedules one meeting per remote visit.
pub struct ZoomClient {
    client: Client,
    account_id: String,
    client_id: String,
    client_secret: String,
    api_base_url: String,
    oauth_url: String,
    timezone: String,
}

impl ZoomClient {
    pub fn new(config: &AppConfig) -> Result<Self, RemoteSessionError> {
        if !config.is_remote_sessions_configured() {
            return Err(RemoteSessionError::NotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            account_id: config.zoom_account_id.clone(),
            client_id: config.zoom_client_id.clone(),
            client_secret: config.zoom_client_secret.clone(),
            api_base_url: config.zoom_api_base_url.trim_end_matches('/').to_string(),
            oauth_url: config.zoom_oauth_url.clone(),
            timezone: config.zoom_timezone.clone(),
        })
    }

    /// POST {oauth_url}?grant_type=account_credentials&account_id={id}
    async fn get_access_token(&self) -> Result<String, RemoteSessionError> {
        let url = format!(
            "{}?grant_type=account_credentials&account_id={}",
            self.oauth_url, self.account_id
        );
        let credentials = BASE64.encode(format!("{}:{}", self.client_id, self.client_secret));

        debug!("Requesting Zoom access token");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Basic {}", credentials))
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            error!("Zoom token request failed: {} - {}", status, response_text);
            return Err(RemoteSessionError::Provider {
                message: format!("Failed to get access token: HTTP {}: {}", status, response_text),
            });
        }

        let token: ZoomTokenResponse =
            serde_json::from_str(&response_text).map_err(|e| RemoteSessionError::Provider {
                message: format!("Failed to parse token response: {}", e),
            })?;

        Ok(token.access_token)
    }

    /// POST {api_base_url}/users/me/meetings
    pub async fn create_meeting(&self, request: &SessionRequest) -> Result<ZoomMeetingResponse, RemoteSessionError> {
        info!("Creating Zoom meeting '{}' at {}", request.topic, request.start);

        let access_token = self.get_access_token().await?;
        let url = format!("{}/users/me/meetings", self.api_base_url);

        let body = ZoomMeetingRequest {
            topic: request.topic.clone(),
            meeting_type: 2,
            start_time: request.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
            duration: request.duration_minutes,
            timezone: self.timezone.clone(),
            agenda: format!("Host: {}", request.host_contact),
            settings: ZoomMeetingSettings::default(),
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        debug!("Zoom meeting creation response: {} - {}", status, response_text);

        if !status.is_success() {
            error!("Zoom meeting creation failed: {} - {}", status, response_text);
            return Err(RemoteSessionError::Provider {
                message: format!("HTTP {}: {}", status, response_text),
            });
        }

        let meeting: ZoomMeetingResponse =
            serde_json::from_str(&response_text).map_err(|e| RemoteSessionError::Provider {
                message: format!("Failed to parse meeting response: {}", e),
            })?;

        info!("Created Zoom meeting {}", meeting.id);
        Ok(meeting)
    }
}

#[async_trait]
impl RemoteSessionProvider for ZoomClient {
    async fn create_session(&self, request: &SessionRequest) -> Result<String, RemoteSessionError> {
        let meeting = self.create_meeting(request).await?;
        meeting.join_url.ok_or(RemoteSessionError::EmptyJoinUrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_utils::test_utils::TestConfig;

    #[test]
    fn test_client_creation() {
        let config = TestConfig::default().to_app_config();
        assert!(ZoomClient::new(&config).is_ok());
    }

    #[test]
    fn test_client_creation_fails_without_config() {
        let mut config = TestConfig::default().to_app_config();
        config.zoom_client_secret = String::new();

        assert!(matches!(ZoomClient::new(&config), Err(RemoteSessionError::NotConfigured)));
    }
}
