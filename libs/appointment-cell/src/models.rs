// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use doctor_cell::{AvailabilityRule, ClinicId, DoctorError, DoctorId};
use shared_database::supabase::SupabaseError;
use video_conferencing_cell::{RemoteSession, RemoteSessionError};

pub type PatientId = i64;

// ==============================================================================
// SLOT / APPOINTMENT MODELS
// ==============================================================================

/// One bookable (doctor, date, time) unit. Open while `patient_id` is `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: DoctorId,
    pub patient_id: Option<PatientId>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub visit_type: VisitType,
    pub status: AppointmentStatus,
    pub fee: Decimal,
    pub clinic_id: Option<ClinicId>,
    pub remote_session_id: Option<Uuid>,
    pub symptoms: Option<String>,
}

/// Slots and appointments are the same record at different points of its life.
pub type Slot = Appointment;

impl Appointment {
    pub fn is_open(&self) -> bool {
        self.patient_id.is_none() && self.status == AppointmentStatus::Pending
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    pub fn key(&self) -> SlotKey {
        SlotKey {
            doctor_id: self.doctor_id,
            date: self.date,
            time: self.time,
        }
    }
}

/// Uniqueness key among non-cancelled rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub doctor_id: DoctorId,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisitType {
    Remote,
    #[default]
    InPerson,
}

impl fmt::Display for VisitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisitType::Remote => write!(f, "remote"),
            VisitType::InPerson => write!(f, "in_person"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn can_cancel(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    pub fn can_complete(&self) -> bool {
        matches!(self, AppointmentStatus::Confirmed)
    }

    /// PostgREST filter literal.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A slot the generator wants to exist.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSpec {
    pub doctor_id: DoctorId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub visit_type: VisitType,
    pub fee: Decimal,
}

impl SlotSpec {
    pub fn into_open_slot(self) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            doctor_id: self.doctor_id,
            patient_id: None,
            date: self.date,
            time: self.time,
            visit_type: self.visit_type,
            status: AppointmentStatus::Pending,
            fee: self.fee,
            clinic_id: None,
            remote_session_id: None,
            symptoms: None,
        }
    }
}

/// Everything the conditional claim writes in one step.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotClaim {
    pub patient_id: PatientId,
    pub visit_type: VisitType,
    pub fee: Decimal,
    pub clinic_id: Option<ClinicId>,
    pub remote_session_id: Option<Uuid>,
    pub symptoms: Option<String>,
}

// ==============================================================================
// BOOKING REQUEST / RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingRequest {
    pub patient_id: PatientId,
    pub visit_type: Option<VisitType>,
    pub symptoms: Option<String>,
    /// Human-entered time from the direct-booking flow; must match the slot.
    pub requested_time: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingResult {
    pub appointment: Appointment,
    pub remote_session: Option<RemoteSession>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenerationReport {
    pub doctor_id: DoctorId,
    pub created: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleReport {
    pub rule: AvailabilityRule,
    pub generation: GenerationReport,
}

// ==============================================================================
// PAYMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub paid_at: Option<NaiveDateTime>,
    pub transaction_id: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Fields written when a Pending payment settles.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSettlement {
    pub status: PaymentStatus,
    pub paid_at: Option<NaiveDateTime>,
    pub transaction_id: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PaymentSummary {
    pub pending_count: usize,
    pub completed_count: usize,
    pub completed_total: Decimal,
    pub pending_total: Decimal,
}

impl PaymentSummary {
    pub fn from_payments(payments: &[Payment]) -> Self {
        payments.iter().fold(Self::default(), |mut summary, payment| {
            match payment.status {
                PaymentStatus::Pending => {
                    summary.pending_count += 1;
                    summary.pending_total += payment.amount;
                }
                PaymentStatus::Completed => {
                    summary.completed_count += 1;
                    summary.completed_total += payment.amount;
                }
                PaymentStatus::Failed => {}
            }
            summary
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentHistory {
    pub payments: Vec<Payment>,
    pub summary: PaymentSummary,
}

// ==============================================================================
// LIFECYCLE MODELS
// ==============================================================================

/// Outcome of a guarded state transition. A disallowed transition is not an
/// error: nothing is written and the caller gets the current record back.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition<T> {
    Applied(T),
    Unchanged { current: T, warning: String },
}

impl<T> Transition<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied(_))
    }

    pub fn record(&self) -> &T {
        match self {
            Transition::Applied(record) | Transition::Unchanged { current: record, .. } => record,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Transition::Applied(_) => None,
            Transition::Unchanged { warning, .. } => Some(warning),
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum AppointmentError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Slot already booked")]
    AlreadyBooked,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl AppointmentError {
    pub fn code(&self) -> &'static str {
        match self {
            AppointmentError::NotFound(_) => "not_found",
            AppointmentError::AlreadyBooked => "already_booked",
            AppointmentError::InvalidState(_) => "invalid_state",
            AppointmentError::CollaboratorUnavailable(_) => "collaborator_unavailable",
            AppointmentError::ValidationError(_) => "validation_error",
        }
    }
}

impl From<SupabaseError> for AppointmentError {
    fn from(err: SupabaseError) -> Self {
        if err.is_not_found() {
            AppointmentError::NotFound(err.to_string())
        } else if err.is_conflict() {
            AppointmentError::InvalidState(err.to_string())
        } else {
            AppointmentError::CollaboratorUnavailable(err.to_string())
        }
    }
}

impl From<DoctorError> for AppointmentError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound(id) => AppointmentError::NotFound(format!("Doctor {}", id)),
            DoctorError::ValidationError(message) => AppointmentError::ValidationError(message),
            DoctorError::Store(message) => AppointmentError::CollaboratorUnavailable(message),
        }
    }
}

impl From<RemoteSessionError> for AppointmentError {
    fn from(err: RemoteSessionError) -> Self {
        AppointmentError::CollaboratorUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn payment(status: PaymentStatus, amount: &str) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            appointment_id: Uuid::new_v4(),
            amount: Decimal::from_str(amount).unwrap(),
            currency: "EGP".to_string(),
            status,
            paid_at: None,
            transaction_id: None,
            created_at: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap().and_hms_opt(8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn visit_type_wire_names() {
        assert_eq!(serde_json::to_value(VisitType::InPerson).unwrap(), "in_person");
        assert_eq!(serde_json::from_str::<VisitType>("\"remote\"").unwrap(), VisitType::Remote);
    }

    #[test]
    fn only_pending_and_confirmed_cancel() {
        assert!(AppointmentStatus::Pending.can_cancel());
        assert!(AppointmentStatus::Confirmed.can_cancel());
        assert!(!AppointmentStatus::Completed.can_cancel());
        assert!(!AppointmentStatus::Cancelled.can_cancel());
        assert!(!AppointmentStatus::Pending.can_complete());
    }

    #[test]
    fn summary_ignores_failed_payments() {
        let summary = PaymentSummary::from_payments(&[
            payment(PaymentStatus::Pending, "200.00"),
            payment(PaymentStatus::Completed, "300.00"),
            payment(PaymentStatus::Completed, "150.50"),
            payment(PaymentStatus::Failed, "999.00"),
        ]);

        assert_eq!(summary.pending_count, 1);
        assert_eq!(summary.completed_count, 2);
        assert_eq!(summary.completed_total, Decimal::from_str("450.50").unwrap());
        assert_eq!(summary.pending_total, Decimal::from_str("200.00").unwrap());
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(AppointmentError::AlreadyBooked.code(), "already_booked");
        assert_eq!(
            AppointmentError::from(DoctorError::NotFound(7)),
            AppointmentError::NotFound("Doctor 7".to_string())
        );
        assert_eq!(
            AppointmentError::from(RemoteSessionError::NotConfigured).code(),
            "collaborator_unavailable"
        );
    }
}
