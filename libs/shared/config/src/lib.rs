use std::env;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_ZOOM_API_BASE_URL: &str = "https://api.zoom.us/v2";
pub const DEFAULT_ZOOM_OAUTH_URL: &str = "https://zoom.us/oauth/token";
pub const DEFAULT_FALLBACK_JOIN_URL: &str = "https://zoom.us/j/0000000000";
/// Upper bound on weekly occurrences generated in one pass (one year).
pub const MAX_SLOT_HORIZON_OCCURRENCES: u32 = 52;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub zoom_account_id: String,
    pub zoom_client_id: String,
    pub zoom_client_secret: String,
    pub zoom_api_base_url: String,
    pub zoom_oauth_url: String,
    pub zoom_timezone: String,
    pub remote_session_fallback_url: String,
    pub remote_session_timeout_seconds: u64,
    pub slot_horizon_occurrences: u32,
    pub payment_currency: String,
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            zoom_account_id: String::new(),
            zoom_client_id: String::new(),
            zoom_client_secret: String::new(),
            zoom_api_base_url: DEFAULT_ZOOM_API_BASE_URL.to_string(),
            zoom_oauth_url: DEFAULT_ZOOM_OAUTH_URL.to_string(),
            zoom_timezone: "Africa/Cairo".to_string(),
            remote_session_fallback_url: DEFAULT_FALLBACK_JOIN_URL.to_string(),
            remote_session_timeout_seconds: 10,
            slot_horizon_occurrences: 4,
            payment_currency: "EGP".to_string(),
            server_port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            zoom_account_id: env::var("ZOOM_ACCOUNT_ID")
                .unwrap_or_else(|_| {
                    warn!("ZOOM_ACCOUNT_ID not set, remote sessions will use the fallback link");
                    String::new()
                }),
            zoom_client_id: env::var("ZOOM_CLIENT_ID")
                .unwrap_or_else(|_| {
                    warn!("ZOOM_CLIENT_ID not set, using empty value");
                    String::new()
                }),
            zoom_client_secret: env::var("ZOOM_CLIENT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("ZOOM_CLIENT_SECRET not set, using empty value");
                    String::new()
                }),
            zoom_api_base_url: env::var("ZOOM_API_BASE_URL")
                .unwrap_or(defaults.zoom_api_base_url),
            zoom_oauth_url: env::var("ZOOM_OAUTH_URL")
                .unwrap_or(defaults.zoom_oauth_url),
            zoom_timezone: env::var("ZOOM_TIMEZONE")
                .unwrap_or(defaults.zoom_timezone),
            remote_session_fallback_url: env::var("REMOTE_SESSION_FALLBACK_URL")
                .unwrap_or_else(|_| {
                    warn!("REMOTE_SESSION_FALLBACK_URL not set, using default");
                    defaults.remote_session_fallback_url
                }),
            remote_session_timeout_seconds: parse_or_default(
                "REMOTE_SESSION_TIMEOUT_SECONDS",
                defaults.remote_session_timeout_seconds,
            ),
            slot_horizon_occurrences: bounded_horizon(
                parse_or_default("SLOT_HORIZON_OCCURRENCES", defaults.slot_horizon_occurrences),
                defaults.slot_horizon_occurrences,
            ),
            payment_currency: env::var("PAYMENT_CURRENCY")
                .unwrap_or(defaults.payment_currency),
            server_port: parse_or_default("SERVER_PORT", defaults.server_port),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - falling back to in-memory stores");
        }

        config
    }

    /// True when the PostgREST-backed stores can be used.
    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    pub fn is_remote_sessions_configured(&self) -> bool {
        !self.zoom_account_id.is_empty()
            && !self.zoom_client_id.is_empty()
            && !self.zoom_client_secret.is_empty()
            && !self.zoom_api_base_url.is_empty()
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn bounded_horizon(requested: u32, default: u32) -> u32 {
    if (1..=MAX_SLOT_HORIZON_OCCURRENCES).contains(&requested) {
        requested
    } else {
        warn!(
            "SLOT_HORIZON_OCCURRENCES must be between 1 and {}, got {}, using {}",
            MAX_SLOT_HORIZON_OCCURRENCES, requested, default
        );
        default
    }
}
