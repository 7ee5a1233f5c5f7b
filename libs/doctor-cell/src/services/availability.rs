// libs/doctor-cell/src/services/availability.rs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilityRule, DoctorError, DoctorId, SaveAvailabilityRequest, ValidatedRule};
use crate::services::doctor::DoctorDirectory;

/// Holds at most one weekly rule per doctor.
#[async_trait]
pub trait AvailabilityRuleStore: Send + Sync {
    async fn get_rule(&self, doctor_id: DoctorId) -> Result<Option<AvailabilityRule>, DoctorError>;

    /// Replace the doctor's rule in place, or create it if none exists.
    async fn upsert_rule(&self, doctor_id: DoctorId, rule: ValidatedRule) -> Result<AvailabilityRule, DoctorError>;
}

#[derive(Default)]
pub struct InMemoryAvailabilityRuleStore {
    rules: RwLock<HashMap<DoctorId, AvailabilityRule>>,
}

impl InMemoryAvailabilityRuleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AvailabilityRuleStore for InMemoryAvailabilityRuleStore {
    async fn get_rule(&self, doctor_id: DoctorId) -> Result<Option<AvailabilityRule>, DoctorError> {
        Ok(self.rules.read().await.get(&doctor_id).cloned())
    }

    async fn upsert_rule(&self, doctor_id: DoctorId, rule: ValidatedRule) -> Result<AvailabilityRule, DoctorError> {
        let mut rules = self.rules.write().await;
        let id = rules.get(&doctor_id).map(|existing| existing.id).unwrap_or_else(Uuid::new_v4);

        let stored = AvailabilityRule {
            id,
            doctor_id,
            day_of_week: rule.day_of_week,
            start_time: rule.start_time,
            end_time: rule.end_time,
            max_slots_per_day: rule.max_slots_per_day,
        };
        rules.insert(doctor_id, stored.clone());

        Ok(stored)
    }
}

pub struct SupabaseAvailabilityRuleStore {
    supabase: SupabaseClient,
}

impl SupabaseAvailabilityRuleStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl AvailabilityRuleStore for SupabaseAvailabilityRuleStore {
    async fn get_rule(&self, doctor_id: DoctorId) -> Result<Option<AvailabilityRule>, DoctorError> {
        debug!("Fetching availability rule for doctor: {}", doctor_id);

        let path = format!("/rest/v1/doctor_schedules?doctor_id=eq.{}", doctor_id);
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
            .map_err(|e| DoctorError::Store(format!("Failed to parse availability rule: {}", e)))
    }

    async fn upsert_rule(&self, doctor_id: DoctorId, rule: ValidatedRule) -> Result<AvailabilityRule, DoctorError> {
        let id = match self.get_rule(doctor_id).await? {
            Some(existing) => existing.id,
            None => Uuid::new_v4(),
        };

        let rule_data = json!({
            "id": id,
            "doctor_id": doctor_id,
            "day_of_week": rule.day_of_week,
            "start_time": rule.start_time.format("%H:%M:%S").to_string(),
            "end_time": rule.end_time.format("%H:%M:%S").to_string(),
            "max_slots_per_day": rule.max_slots_per_day,
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctor_schedules?on_conflict=doctor_id",
                Some(rule_data),
                Some(headers),
            )
            .await
            .map_err(|e| DoctorError::Store(e.to_string()))?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| DoctorError::Store("Failed to save availability rule".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| DoctorError::Store(format!("Failed to parse availability rule: {}", e)))
    }
}

/// Validates and stores weekly rules.
pub struct AvailabilityService {
    rules: Arc<dyn AvailabilityRuleStore>,
    doctors: Arc<dyn DoctorDirectory>,
}

impl AvailabilityService {
    pub fn new(rules: Arc<dyn AvailabilityRuleStore>, doctors: Arc<dyn DoctorDirectory>) -> Self {
        Self { rules, doctors }
    }

    pub async fn save_rule(
        &self,
        doctor_id: DoctorId,
        request: SaveAvailabilityRequest,
    ) -> Result<AvailabilityRule, DoctorError> {
        debug!("Saving availability rule for doctor: {}", doctor_id);

        let validated = request.validate()?;
        self.doctors.require_doctor(doctor_id).await?;

        let rule = self.rules.upsert_rule(doctor_id, validated).await?;
        info!(
            "Availability rule saved for doctor {}: {} {}-{} ({} slots)",
            doctor_id, rule.day_of_week, rule.start_time, rule.end_time, rule.max_slots_per_day
        );

        Ok(rule)
    }

    pub async fn get_rule(&self, doctor_id: DoctorId) -> Result<Option<AvailabilityRule>, DoctorError> {
        self.rules.get_rule(doctor_id).await
    }
}
