// libs/video-conferencing-cell/src/services/mod.rs

pub mod provider;
pub mod session;
pub mod zoom;

pub use provider::{RemoteSessionBroker, RemoteSessionProvider, UnavailableProvider};
pub use session::{InMemoryRemoteSessionStore, RemoteSessionStore, SupabaseRemoteSessionStore};
pub use zoom::ZoomClient;
