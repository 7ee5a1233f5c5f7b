// libs/video-conferencing-cell/src/lib.rs
//! # Video Conferencing Cell
//!
//! Obtains join links for Remote appointments and stores the resulting
//! session records.
//!
//! ```text
//! +-----------------------------------------------------+
//! |                   Video Cell                        |
//! +-----------------------------------------------------+
//! |  models.rs      |  Session records, Zoom DTOs       |
//! |  services/      |                                   |
//! |    provider.rs  |  Provider trait, fallback broker  |
//! |    zoom.rs      |  Zoom server-to-server client     |
//! |    session.rs   |  Remote session persistence       |
//! +-----------------------------------------------------+
//! ```
//!
//! The broker never fails a booking: when the provider errors, times out,
//! or is not configured, the configured fallback link is issued instead.
//!
//! ## Configuration
//!
//! - `ZOOM_ACCOUNT_ID`, `ZOOM_CLIENT_ID`, `ZOOM_CLIENT_SECRET` - server-to-server app credentials
//! - `REMOTE_SESSION_FALLBACK_URL` - link issued while the provider is unavailable
//! - `REMOTE_SESSION_TIMEOUT_SECONDS` - bound on each provider call

pub mod models;
pub mod services;

pub use models::{JoinLink, RemoteSession, RemoteSessionError, RemoteSessionStatus, SessionKind, SessionRequest};

pub use services::{
    InMemoryRemoteSessionStore, RemoteSessionBroker, RemoteSessionProvider, RemoteSessionStore,
    SupabaseRemoteSessionStore, UnavailableProvider, ZoomClient,
};
