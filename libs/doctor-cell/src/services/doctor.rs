use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Doctor, DoctorError, DoctorId};

/// Read contract for doctor profiles. Registration and profile editing live
/// elsewhere; scheduling only ever looks doctors up.
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    async fn get_doctor(&self, doctor_id: DoctorId) -> Result<Option<Doctor>, DoctorError>;

    async fn require_doctor(&self, doctor_id: DoctorId) -> Result<Doctor, DoctorError> {
        self.get_doctor(doctor_id)
            .await?
            .ok_or(DoctorError::NotFound(doctor_id))
    }
}

#[derive(Default)]
pub struct InMemoryDoctorDirectory {
    doctors: RwLock<HashMap<DoctorId, Doctor>>,
}

impl InMemoryDoctorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doctors(doctors: impl IntoIterator<Item = Doctor>) -> Self {
        Self {
            doctors: RwLock::new(doctors.into_iter().map(|d| (d.id, d)).collect()),
        }
    }

    pub async fn upsert(&self, doctor: Doctor) {
        self.doctors.write().await.insert(doctor.id, doctor);
    }
}

#[async_trait]
impl DoctorDirectory for InMemoryDoctorDirectory {
    async fn get_doctor(&self, doctor_id: DoctorId) -> Result<Option<Doctor>, DoctorError> {
        Ok(self.doctors.read().await.get(&doctor_id).cloned())
    }
}

pub struct SupabaseDoctorDirectory {
    supabase: SupabaseClient,
}

impl SupabaseDoctorDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl DoctorDirectory for SupabaseDoctorDirectory {
    async fn get_doctor(&self, doctor_id: DoctorId) -> Result<Option<Doctor>, DoctorError> {
        debug!("Fetching doctor: {}", doctor_id);

        let path = format!(
            "/rest/v1/doctors?id=eq.{}&select=id,first_name,last_name,email,consultation_fee,online_fee,clinic_id,available_for_video",
            doctor_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::Store(e.to_string()))?;

        result
            .into_iter()
            .next()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| DoctorError::Store(format!("Failed to parse doctor: {}", e)))
    }
}
