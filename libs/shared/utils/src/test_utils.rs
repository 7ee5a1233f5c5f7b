use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;

use crate::clock::FixedClock;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub zoom_api_base_url: String,
    pub zoom_oauth_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            zoom_api_base_url: "http://localhost:54322/v2".to_string(),
            zoom_oauth_url: "http://localhost:54322/oauth/token".to_string(),
        }
    }
}

impl TestConfig {
    /// Point both the store and the Zoom endpoints at one mock server.
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            zoom_api_base_url: format!("{}/v2", uri),
            zoom_oauth_url: format!("{}/oauth/token", uri),
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            zoom_account_id: "test-account".to_string(),
            zoom_client_id: "test-client".to_string(),
            zoom_client_secret: "test-secret".to_string(),
            zoom_api_base_url: self.zoom_api_base_url.clone(),
            zoom_oauth_url: self.zoom_oauth_url.clone(),
            remote_session_timeout_seconds: 2,
            ..AppConfig::default()
        }
    }
}

/// Sunday 2026-10-18, 08:00 clinic time. The next Monday is 2026-10-19.
pub fn sunday_morning() -> FixedClock {
    FixedClock::at(test_date(2026, 10, 18), test_time(8, 0))
}

pub fn test_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

pub fn test_time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid test time")
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn doctor_response(doctor_id: i64, clinic_id: Option<i64>) -> serde_json::Value {
        json!({
            "id": doctor_id,
            "first_name": "Mona",
            "last_name": "Hassan",
            "email": format!("doctor{}@clinic.example", doctor_id),
            "consultation_fee": "300.00",
            "online_fee": "200.00",
            "clinic_id": clinic_id,
            "available_for_video": true
        })
    }

    pub fn rule_response(doctor_id: i64, day_of_week: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "day_of_week": day_of_week,
            "start_time": "09:00:00",
            "end_time": "11:00:00",
            "max_slots_per_day": 4
        })
    }

    pub fn open_slot_response(slot_id: Uuid, doctor_id: i64, date: &str, time: &str) -> serde_json::Value {
        json!({
            "id": slot_id,
            "doctor_id": doctor_id,
            "patient_id": null,
            "date": date,
            "time": time,
            "visit_type": "in_person",
            "status": "pending",
            "fee": "300.00",
            "clinic_id": null,
            "remote_session_id": null,
            "symptoms": null
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
