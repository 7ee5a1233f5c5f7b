// libs/appointment-cell/src/services/lifecycle.rs
use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_utils::clock::Clock;
use video_conferencing_cell::{RemoteSessionStatus, RemoteSessionStore};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, PatientId, Payment, PaymentHistory, PaymentSettlement,
    PaymentStatus, PaymentSummary, Transition,
};
use crate::services::repository::{PaymentStore, SlotRepository};

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Status transitions for appointments, their payments and remote sessions.
///
/// Disallowed transitions never fail: they write nothing and come back as
/// [`Transition::Unchanged`] with a warning.
pub struct LifecycleManager {
    slots: Arc<dyn SlotRepository>,
    payments: Arc<dyn PaymentStore>,
    sessions: Arc<dyn RemoteSessionStore>,
    clock: Arc<dyn Clock>,
    currency: String,
}

impl LifecycleManager {
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        payments: Arc<dyn PaymentStore>,
        sessions: Arc<dyn RemoteSessionStore>,
        clock: Arc<dyn Clock>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            slots,
            payments,
            sessions,
            clock,
            currency: currency.into(),
        }
    }

    // ==========================================================================
    // APPOINTMENT TRANSITIONS
    // ==========================================================================

    /// Pending|Confirmed -> Cancelled. Payment and session rows are kept; the
    /// session is forced to Cancelled.
    #[instrument(skip(self))]
    pub async fn cancel(&self, appointment_id: Uuid) -> Result<Transition<Appointment>, AppointmentError> {
        let current = self.require_appointment(appointment_id).await?;

        if current.status == AppointmentStatus::Cancelled {
            // A previous cancel may have died before the cascade.
            self.cancel_remote_session(&current).await?;
            return Ok(unchanged(current, "Appointment is already cancelled"));
        }
        if !current.status.can_cancel() {
            let warning = format!("Appointment is {} and cannot be cancelled", current.status);
            return Ok(unchanged(current, warning));
        }

        let Some(cancelled) = self
            .slots
            .update_status(
                appointment_id,
                &[AppointmentStatus::Pending, AppointmentStatus::Confirmed],
                AppointmentStatus::Cancelled,
            )
            .await?
        else {
            let latest = self.require_appointment(appointment_id).await?;
            let warning = format!("Appointment changed to {} before it could be cancelled", latest.status);
            return Ok(unchanged(latest, warning));
        };

        self.cancel_remote_session(&cancelled).await?;
        info!("Appointment {} cancelled", appointment_id);

        Ok(Transition::Applied(cancelled))
    }

    /// Confirmed -> Completed, by explicit administrative marking.
    #[instrument(skip(self))]
    pub async fn complete(&self, appointment_id: Uuid) -> Result<Transition<Appointment>, AppointmentError> {
        let current = self.require_appointment(appointment_id).await?;

        if !current.status.can_complete() {
            let warning = format!("Appointment is {} and cannot be completed", current.status);
            return Ok(unchanged(current, warning));
        }

        match self
            .slots
            .update_status(appointment_id, &[AppointmentStatus::Confirmed], AppointmentStatus::Completed)
            .await?
        {
            Some(completed) => {
                info!("Appointment {} completed", appointment_id);
                Ok(Transition::Applied(completed))
            }
            None => {
                let latest = self.require_appointment(appointment_id).await?;
                let warning = format!("Appointment changed to {} before it could be completed", latest.status);
                Ok(unchanged(latest, warning))
            }
        }
    }

    async fn cancel_remote_session(&self, appointment: &Appointment) -> Result<(), AppointmentError> {
        let session = match appointment.remote_session_id {
            Some(session_id) => self.sessions.get(session_id).await?,
            None => self.sessions.get_for_appointment(appointment.id).await?,
        };

        let Some(session) = session else {
            return Ok(());
        };
        if session.status == RemoteSessionStatus::Cancelled {
            return Ok(());
        }

        self.sessions
            .set_status(session.id, RemoteSessionStatus::Cancelled)
            .await?;
        info!("Remote session {} cancelled with appointment {}", session.id, appointment.id);

        Ok(())
    }

    // ==========================================================================
    // PAYMENT TRANSITIONS
    // ==========================================================================

    /// Pending -> Completed. Stamps `paid_at` and keeps the caller's transaction
    /// id or generates an administrative one.
    #[instrument(skip(self, transaction_id))]
    pub async fn approve_payment(
        &self,
        payment_id: Uuid,
        transaction_id: Option<String>,
    ) -> Result<Transition<Payment>, AppointmentError> {
        let now = self.clock.now();
        let transaction_id = transaction_id
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("ADMIN_{}_{}", now.format(TIMESTAMP_FORMAT), payment_id));

        self.settle_payment(
            payment_id,
            PaymentSettlement {
                status: PaymentStatus::Completed,
                paid_at: Some(now),
                transaction_id,
            },
        )
        .await
    }

    /// Pending -> Failed, recording the rejection in the transaction reference.
    #[instrument(skip(self, reason))]
    pub async fn reject_payment(
        &self,
        payment_id: Uuid,
        reason: Option<String>,
    ) -> Result<Transition<Payment>, AppointmentError> {
        let transaction_id = match reason.filter(|r| !r.trim().is_empty()) {
            Some(reason) => format!("REJECTED: {}", reason.trim()),
            None => format!("REJECTED_BY_ADMIN_{}", self.clock.now().format(TIMESTAMP_FORMAT)),
        };

        self.settle_payment(
            payment_id,
            PaymentSettlement {
                status: PaymentStatus::Failed,
                paid_at: None,
                transaction_id,
            },
        )
        .await
    }

    async fn settle_payment(
        &self,
        payment_id: Uuid,
        settlement: PaymentSettlement,
    ) -> Result<Transition<Payment>, AppointmentError> {
        let current = self.require_payment(payment_id).await?;

        if current.status != PaymentStatus::Pending {
            let warning = format!("Payment is already {}; nothing changed", current.status);
            return Ok(unchanged(current, warning));
        }

        match self.payments.settle(payment_id, &settlement).await? {
            Some(settled) => {
                info!("Payment {} marked {}", payment_id, settled.status);
                Ok(Transition::Applied(settled))
            }
            None => {
                let latest = self.require_payment(payment_id).await?;
                let warning = format!("Payment is already {}; nothing changed", latest.status);
                Ok(unchanged(latest, warning))
            }
        }
    }

    // ==========================================================================
    // PATIENT VIEWS
    // ==========================================================================

    /// Creates the missing Pending payments for the patient's live bookings,
    /// then lists every payment, most recently paid first.
    #[instrument(skip(self))]
    pub async fn payment_history(&self, patient_id: PatientId) -> Result<PaymentHistory, AppointmentError> {
        let appointments = self.slots.list_for_patient(patient_id).await?;
        let appointment_ids: Vec<Uuid> = appointments.iter().map(|a| a.id).collect();

        let existing = self.payments.list_for_appointments(&appointment_ids).await?;
        let now = self.clock.now();

        for appointment in appointments
            .iter()
            .filter(|a| a.status != AppointmentStatus::Cancelled)
            .filter(|a| !existing.iter().any(|p| p.appointment_id == a.id))
        {
            let payment = Payment {
                id: Uuid::new_v4(),
                appointment_id: appointment.id,
                amount: appointment.fee,
                currency: self.currency.clone(),
                status: PaymentStatus::Pending,
                paid_at: None,
                transaction_id: None,
                created_at: now,
            };

            if self.payments.insert_if_absent(payment).await? {
                debug!("Created pending payment for appointment {}", appointment.id);
            }
        }

        // Creation order from the store; reversed so ties keep newest first.
        let mut payments = self.payments.list_for_appointments(&appointment_ids).await?;
        payments.reverse();
        payments.sort_by(|a, b| match (a.paid_at, b.paid_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| b.created_at.cmp(&a.created_at)));

        let summary = PaymentSummary::from_payments(&payments);
        Ok(PaymentHistory { payments, summary })
    }

    /// Live appointments starting now or later, soonest first.
    pub async fn upcoming(&self, patient_id: PatientId) -> Result<Vec<Appointment>, AppointmentError> {
        let now = self.clock.now();
        let mut upcoming: Vec<_> = self
            .slots
            .list_for_patient(patient_id)
            .await?
            .into_iter()
            .filter(|a| a.status != AppointmentStatus::Cancelled && a.starts_at() >= now)
            .collect();

        upcoming.sort_by_key(Appointment::starts_at);
        Ok(upcoming)
    }

    /// Appointments dated before today, most recent first.
    pub async fn history(&self, patient_id: PatientId) -> Result<Vec<Appointment>, AppointmentError> {
        let today = self.clock.today();
        let mut past: Vec<_> = self
            .slots
            .list_for_patient(patient_id)
            .await?
            .into_iter()
            .filter(|a| a.date < today)
            .collect();

        past.sort_by_key(|a| std::cmp::Reverse(a.starts_at()));
        Ok(past)
    }

    async fn require_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.slots
            .get(appointment_id)
            .await?
            .ok_or_else(|| AppointmentError::NotFound(format!("Appointment {}", appointment_id)))
    }

    async fn require_payment(&self, payment_id: Uuid) -> Result<Payment, AppointmentError> {
        self.payments
            .get(payment_id)
            .await?
            .ok_or_else(|| AppointmentError::NotFound(format!("Payment {}", payment_id)))
    }
}

fn unchanged<T>(current: T, warning: impl Into<String>) -> Transition<T> {
    let warning = warning.into();
    warn!("{}", warning);
    Transition::Unchanged { current, warning }
}
