// libs/video-conferencing-cell/src/models.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// REMOTE SESSION DOMAIN MODELS
// ==============================================================================

/// Join link record for a Remote appointment. One per appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteSession {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub scheduled_start: NaiveDateTime,
    pub status: RemoteSessionStatus,
    pub session_kind: SessionKind,
    pub join_url: String,
    /// Clinic-local, from the same clock as the appointment.
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemoteSessionStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl RemoteSessionStatus {
    pub fn is_concluded(&self) -> bool {
        matches!(self, RemoteSessionStatus::Completed | RemoteSessionStatus::Cancelled)
    }
}

impl fmt::Display for RemoteSessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteSessionStatus::Scheduled => write!(f, "scheduled"),
            RemoteSessionStatus::InProgress => write!(f, "in_progress"),
            RemoteSessionStatus::Completed => write!(f, "completed"),
            RemoteSessionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Where the join link came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Minted by the conferencing provider for this visit.
    ProviderIssued,
    /// The well-known link used while the provider is unavailable.
    Fallback,
}

/// Parameters of the provider's "create remote session" capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRequest {
    pub topic: String,
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
    pub host_contact: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinLink {
    pub url: String,
    pub kind: SessionKind,
}

// ==============================================================================
// ZOOM API MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ZoomTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoomMeetingRequest {
    pub topic: String,
    #[serde(rename = "type")]
    pub meeting_type: u8,
    pub start_time: String,
    pub duration: u32,
    pub timezone: String,
    pub agenda: String,
    pub settings: ZoomMeetingSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoomMeetingSettings {
    pub host_video: bool,
    pub participant_video: bool,
    pub join_before_host: bool,
    pub mute_upon_entry: bool,
    pub approval_type: u8,
    pub audio: String,
    pub auto_recording: String,
    pub waiting_room: bool,
}

impl Default for ZoomMeetingSettings {
    fn default() -> Self {
        Self {
            host_video: true,
            participant_video: true,
            join_before_host: true,
            mute_upon_entry: false,
            approval_type: 2,
            audio: "both".to_string(),
            auto_recording: "none".to_string(),
            waiting_room: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoomMeetingResponse {
    pub id: i64,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub join_url: Option<String>,
    #[serde(default)]
    pub start_url: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum RemoteSessionError {
    #[error("Remote session provider not configured")]
    NotConfigured,

    #[error("Remote session provider error: {message}")]
    Provider { message: String },

    #[error("Remote session provider timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Remote session provider returned an empty join URL")]
    EmptyJoinUrl,

    #[error("Remote session store error: {0}")]
    Store(String),
}

impl From<reqwest::Error> for RemoteSessionError {
    fn from(err: reqwest::Error) -> Self {
        RemoteSessionError::Provider {
            message: err.to_string(),
        }
    }
}
