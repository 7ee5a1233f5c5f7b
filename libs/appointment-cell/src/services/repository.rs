// libs/appointment-cell/src/services/repository.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use doctor_cell::DoctorId;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, PatientId, Payment, PaymentSettlement, PaymentStatus,
    SlotClaim,
};

// ==============================================================================
// SLOT REPOSITORY
// ==============================================================================

/// Single source of truth for slot occupancy.
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Inserts unless a non-cancelled row already holds the same
    /// (doctor, date, time). Returns whether a row was written.
    async fn insert_if_absent(&self, slot: Appointment) -> Result<bool, AppointmentError>;

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError>;

    /// Compare-and-set on "patient is null and status is pending". Applies the
    /// whole claim in one write; `None` means the condition did not hold.
    async fn claim(&self, id: Uuid, claim: &SlotClaim) -> Result<Option<Appointment>, AppointmentError>;

    /// Restores `original` if the row is still held by `patient_id`.
    async fn release(
        &self,
        original: &Appointment,
        patient_id: PatientId,
    ) -> Result<Option<Appointment>, AppointmentError>;

    /// Conditional status change; `None` when the current status is not in `from`.
    async fn update_status(
        &self,
        id: Uuid,
        from: &[AppointmentStatus],
        to: AppointmentStatus,
    ) -> Result<Option<Appointment>, AppointmentError>;

    /// Open slots dated on or after `from`, ordered by date then time.
    async fn list_open(
        &self,
        doctor_id: Option<DoctorId>,
        from: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError>;

    async fn list_for_patient(&self, patient_id: PatientId) -> Result<Vec<Appointment>, AppointmentError>;
}

#[derive(Default)]
pub struct InMemorySlotRepository {
    slots: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemorySlotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<Appointment> {
        let mut slots: Vec<_> = self.slots.read().await.values().cloned().collect();
        slots.sort_by_key(|s| (s.doctor_id, s.date, s.time));
        slots
    }
}

#[async_trait]
impl SlotRepository for InMemorySlotRepository {
    async fn insert_if_absent(&self, slot: Appointment) -> Result<bool, AppointmentError> {
        let mut slots = self.slots.write().await;
        let key = slot.key();

        if slots
            .values()
            .any(|s| s.key() == key && s.status != AppointmentStatus::Cancelled)
        {
            return Ok(false);
        }

        slots.insert(slot.id, slot);
        Ok(true)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self.slots.read().await.get(&id).cloned())
    }

    async fn claim(&self, id: Uuid, claim: &SlotClaim) -> Result<Option<Appointment>, AppointmentError> {
        let mut slots = self.slots.write().await;

        let Some(slot) = slots.get_mut(&id) else {
            return Ok(None);
        };
        if !slot.is_open() {
            return Ok(None);
        }

        slot.patient_id = Some(claim.patient_id);
        slot.status = AppointmentStatus::Confirmed;
        slot.visit_type = claim.visit_type;
        slot.fee = claim.fee;
        slot.clinic_id = claim.clinic_id;
        slot.remote_session_id = claim.remote_session_id;
        slot.symptoms = claim.symptoms.clone();

        Ok(Some(slot.clone()))
    }

    async fn release(
        &self,
        original: &Appointment,
        patient_id: PatientId,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let mut slots = self.slots.write().await;

        match slots.get_mut(&original.id) {
            Some(slot) if slot.patient_id == Some(patient_id) && slot.status == AppointmentStatus::Confirmed => {
                *slot = original.clone();
                Ok(Some(slot.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: &[AppointmentStatus],
        to: AppointmentStatus,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let mut slots = self.slots.write().await;

        match slots.get_mut(&id) {
            Some(slot) if from.contains(&slot.status) => {
                slot.status = to;
                Ok(Some(slot.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_open(
        &self,
        doctor_id: Option<DoctorId>,
        from: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut open: Vec<_> = self
            .slots
            .read()
            .await
            .values()
            .filter(|s| s.is_open() && s.date >= from)
            .filter(|s| doctor_id.map_or(true, |d| s.doctor_id == d))
            .cloned()
            .collect();

        open.sort_by_key(|s| (s.date, s.time));
        Ok(open)
    }

    async fn list_for_patient(&self, patient_id: PatientId) -> Result<Vec<Appointment>, AppointmentError> {
        let mut booked: Vec<_> = self
            .slots
            .read()
            .await
            .values()
            .filter(|s| s.patient_id == Some(patient_id))
            .cloned()
            .collect();

        booked.sort_by_key(|s| (s.date, s.time));
        Ok(booked)
    }
}

/// `appointments` table behind PostgREST. A partial unique index on
/// (doctor_id, date, time) where status <> 'cancelled' backs `insert_if_absent`.
pub struct SupabaseSlotRepository {
    supabase: SupabaseClient,
}

impl SupabaseSlotRepository {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn fetch(&self, path: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let rows: Vec<Value> = self.supabase.request(Method::GET, path, None).await?;
        parse_rows(rows)
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Option<Appointment>, AppointmentError> {
        let rows = self.supabase.write_returning(Method::PATCH, path, body).await?;
        Ok(parse_rows(rows)?.into_iter().next())
    }
}

#[async_trait]
impl SlotRepository for SupabaseSlotRepository {
    async fn insert_if_absent(&self, slot: Appointment) -> Result<bool, AppointmentError> {
        let existing_path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&date=eq.{}&time=eq.{}&status=neq.cancelled&select=id",
            slot.doctor_id,
            slot.date,
            slot.time.format("%H:%M:%S")
        );
        let existing: Vec<Value> = self.supabase.request(Method::GET, &existing_path, None).await?;
        if !existing.is_empty() {
            return Ok(false);
        }

        let body = serde_json::to_value(&slot)
            .map_err(|e| AppointmentError::ValidationError(format!("Failed to serialize slot: {}", e)))?;

        match self
            .supabase
            .write_returning(Method::POST, "/rest/v1/appointments", body)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_conflict() => {
                debug!("Slot {} {} for doctor {} inserted concurrently", slot.date, slot.time, slot.doctor_id);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        Ok(self.fetch(&path).await?.into_iter().next())
    }

    async fn claim(&self, id: Uuid, claim: &SlotClaim) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&patient_id=is.null&status=eq.{}",
            id,
            AppointmentStatus::Pending
        );
        let body = json!({
            "patient_id": claim.patient_id,
            "status": AppointmentStatus::Confirmed,
            "visit_type": claim.visit_type,
            "fee": claim.fee,
            "clinic_id": claim.clinic_id,
            "remote_session_id": claim.remote_session_id,
            "symptoms": claim.symptoms,
        });

        self.patch(&path, body).await
    }

    async fn release(
        &self,
        original: &Appointment,
        patient_id: PatientId,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&patient_id=eq.{}&status=eq.confirmed",
            original.id, patient_id
        );
        let body = json!({
            "patient_id": original.patient_id,
            "status": original.status,
            "visit_type": original.visit_type,
            "fee": original.fee,
            "clinic_id": original.clinic_id,
            "remote_session_id": original.remote_session_id,
            "symptoms": original.symptoms,
        });

        self.patch(&path, body).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: &[AppointmentStatus],
        to: AppointmentStatus,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let allowed = from.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(",");
        let path = format!("/rest/v1/appointments?id=eq.{}&status=in.({})", id, allowed);

        self.patch(&path, json!({ "status": to })).await
    }

    async fn list_open(
        &self,
        doctor_id: Option<DoctorId>,
        from: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut path = format!(
            "/rest/v1/appointments?patient_id=is.null&status=eq.{}&date=gte.{}",
            AppointmentStatus::Pending,
            from
        );
        if let Some(doctor_id) = doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", doctor_id));
        }
        path.push_str("&order=date.asc,time.asc");

        self.fetch(&path).await
    }

    async fn list_for_patient(&self, patient_id: PatientId) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=date.asc,time.asc",
            patient_id
        );
        self.fetch(&path).await
    }
}

// ==============================================================================
// PAYMENT STORE
// ==============================================================================

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// One payment per appointment. Returns whether a row was written.
    async fn insert_if_absent(&self, payment: Payment) -> Result<bool, AppointmentError>;

    async fn get(&self, id: Uuid) -> Result<Option<Payment>, AppointmentError>;

    /// Payments for the given appointments, in creation order.
    async fn list_for_appointments(&self, appointment_ids: &[Uuid]) -> Result<Vec<Payment>, AppointmentError>;

    /// Applies `settlement` only while the payment is still Pending.
    async fn settle(&self, id: Uuid, settlement: &PaymentSettlement) -> Result<Option<Payment>, AppointmentError>;
}

#[derive(Default)]
pub struct InMemoryPaymentStore {
    payments: RwLock<Vec<Payment>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert_if_absent(&self, payment: Payment) -> Result<bool, AppointmentError> {
        let mut payments = self.payments.write().await;

        if payments.iter().any(|p| p.appointment_id == payment.appointment_id) {
            return Ok(false);
        }

        payments.push(payment);
        Ok(true)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payment>, AppointmentError> {
        Ok(self.payments.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn list_for_appointments(&self, appointment_ids: &[Uuid]) -> Result<Vec<Payment>, AppointmentError> {
        Ok(self
            .payments
            .read()
            .await
            .iter()
            .filter(|p| appointment_ids.contains(&p.appointment_id))
            .cloned()
            .collect())
    }

    async fn settle(&self, id: Uuid, settlement: &PaymentSettlement) -> Result<Option<Payment>, AppointmentError> {
        let mut payments = self.payments.write().await;

        match payments.iter_mut().find(|p| p.id == id) {
            Some(payment) if payment.status == PaymentStatus::Pending => {
                payment.status = settlement.status;
                payment.paid_at = settlement.paid_at;
                payment.transaction_id = Some(settlement.transaction_id.clone());
                Ok(Some(payment.clone()))
            }
            _ => Ok(None),
        }
    }
}

/// `payments` table behind PostgREST, unique on `appointment_id`.
pub struct SupabasePaymentStore {
    supabase: SupabaseClient,
}

impl SupabasePaymentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl PaymentStore for SupabasePaymentStore {
    async fn insert_if_absent(&self, payment: Payment) -> Result<bool, AppointmentError> {
        let body = serde_json::to_value(&payment)
            .map_err(|e| AppointmentError::ValidationError(format!("Failed to serialize payment: {}", e)))?;

        match self
            .supabase
            .write_returning(Method::POST, "/rest/v1/payments", body)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_conflict() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payment>, AppointmentError> {
        let path = format!("/rest/v1/payments?id=eq.{}", id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(parse_rows(rows)?.into_iter().next())
    }

    async fn list_for_appointments(&self, appointment_ids: &[Uuid]) -> Result<Vec<Payment>, AppointmentError> {
        if appointment_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = appointment_ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",");
        let path = format!("/rest/v1/payments?appointment_id=in.({})&order=created_at.asc", ids);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        parse_rows(rows)
    }

    async fn settle(&self, id: Uuid, settlement: &PaymentSettlement) -> Result<Option<Payment>, AppointmentError> {
        let path = format!("/rest/v1/payments?id=eq.{}&status=eq.{}", id, PaymentStatus::Pending);
        let body = json!({
            "status": settlement.status,
            "paid_at": settlement.paid_at,
            "transaction_id": settlement.transaction_id,
        });

        let rows = self.supabase.write_returning(Method::PATCH, &path, body).await?;
        Ok(parse_rows(rows)?.into_iter().next())
    }
}

fn parse_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, AppointmentError> {
    rows.into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| AppointmentError::CollaboratorUnavailable(format!("Failed to parse store response: {}", e)))
}
