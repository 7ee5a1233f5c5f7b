// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use doctor_cell::{Doctor, DoctorDirectory, DoctorId};
use shared_utils::clock::Clock;
use shared_utils::time::parse_time_of_day;
use video_conferencing_cell::{
    RemoteSession, RemoteSessionBroker, RemoteSessionStatus, RemoteSessionStore, SessionRequest,
};

use crate::models::{Appointment, AppointmentError, BookingRequest, BookingResult, SlotClaim, VisitType};
use crate::services::repository::SlotRepository;

/// Remote visits are always booked as one-hour sessions.
pub const REMOTE_SESSION_MINUTES: u32 = 60;

/// Assigns patients to open slots. The conditional claim is the only way a
/// slot becomes booked.
pub struct BookingAllocator {
    slots: Arc<dyn SlotRepository>,
    doctors: Arc<dyn DoctorDirectory>,
    sessions: Arc<dyn RemoteSessionStore>,
    broker: Arc<RemoteSessionBroker>,
    clock: Arc<dyn Clock>,
}

impl BookingAllocator {
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        doctors: Arc<dyn DoctorDirectory>,
        sessions: Arc<dyn RemoteSessionStore>,
        broker: Arc<RemoteSessionBroker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            slots,
            doctors,
            sessions,
            broker,
            clock,
        }
    }

    #[instrument(skip(self, request), fields(patient_id = request.patient_id))]
    pub async fn book(&self, slot_id: Uuid, request: BookingRequest) -> Result<BookingResult, AppointmentError> {
        let requested_time = match request.requested_time.as_deref() {
            Some(raw) => Some(parse_time_of_day(raw).ok_or_else(|| {
                AppointmentError::ValidationError(format!("'{}' is not a valid time of day", raw))
            })?),
            None => None,
        };

        let slot = self
            .slots
            .get(slot_id)
            .await?
            .ok_or_else(|| AppointmentError::NotFound(format!("Slot {}", slot_id)))?;

        if let Some(time) = requested_time {
            if time != slot.time {
                return Err(AppointmentError::ValidationError(format!(
                    "Requested time {} does not match slot time {}",
                    time, slot.time
                )));
            }
        }

        if slot.patient_id.is_some() {
            return Err(AppointmentError::AlreadyBooked);
        }
        if !slot.is_open() {
            return Err(AppointmentError::InvalidState(format!(
                "Slot {} is {} and cannot be booked",
                slot_id, slot.status
            )));
        }

        let doctor = self.doctors.require_doctor(slot.doctor_id).await?;
        let claim = Self::derive_claim(&slot, &doctor, &request);
        if claim.visit_type == VisitType::Remote && !doctor.available_for_video {
            return Err(AppointmentError::ValidationError(format!(
                "Dr. {} does not offer remote consultations",
                doctor.full_name()
            )));
        }

        debug!("Claiming slot {} as {}", slot_id, claim.visit_type);

        let Some(booked) = self.slots.claim(slot_id, &claim).await? else {
            return Err(self.explain_lost_claim(slot_id).await);
        };

        info!(
            "Slot {} booked for patient {} with Dr. {} on {} at {}",
            booked.id,
            request.patient_id,
            doctor.full_name(),
            booked.date,
            booked.time
        );

        let remote_session = match booked.remote_session_id {
            Some(session_id) => Some(self.open_remote_session(&slot, &booked, &doctor, session_id).await?),
            None => None,
        };

        Ok(BookingResult {
            appointment: booked,
            remote_session,
        })
    }

    /// Open slots a patient can choose from, earliest first.
    pub async fn available_slots(&self, doctor_id: Option<DoctorId>) -> Result<Vec<Appointment>, AppointmentError> {
        self.slots.list_open(doctor_id, self.clock.today()).await
    }

    /// Fee and location follow the visit type. Computed before the claim and
    /// written by it, so they can never land without the booking.
    fn derive_claim(slot: &Appointment, doctor: &Doctor, request: &BookingRequest) -> SlotClaim {
        let visit_type = request.visit_type.unwrap_or(slot.visit_type);

        let (fee, clinic_id, remote_session_id) = match visit_type {
            VisitType::InPerson => {
                let fee = if slot.fee.is_zero() {
                    doctor.consultation_fee
                } else {
                    slot.fee
                };
                (fee, doctor.clinic_id, None)
            }
            VisitType::Remote => (doctor.online_fee, None, Some(Uuid::new_v4())),
        };

        SlotClaim {
            patient_id: request.patient_id,
            visit_type,
            fee,
            clinic_id,
            remote_session_id,
            symptoms: request.symptoms.clone(),
        }
    }

    async fn explain_lost_claim(&self, slot_id: Uuid) -> AppointmentError {
        match self.slots.get(slot_id).await {
            Ok(Some(current)) if current.patient_id.is_some() => {
                warn!("Slot {} was claimed by another booking", slot_id);
                AppointmentError::AlreadyBooked
            }
            Ok(Some(current)) => {
                AppointmentError::InvalidState(format!("Slot {} is {} and cannot be booked", slot_id, current.status))
            }
            Ok(None) => AppointmentError::NotFound(format!("Slot {}", slot_id)),
            Err(e) => e,
        }
    }

    /// The slot is already ours here. A provider failure only changes which
    /// link is issued; a failure to store the session undoes the claim.
    async fn open_remote_session(
        &self,
        original: &Appointment,
        booked: &Appointment,
        doctor: &Doctor,
        session_id: Uuid,
    ) -> Result<RemoteSession, AppointmentError> {
        let request = SessionRequest {
            topic: format!("Consultation with Dr. {}", doctor.full_name()),
            start: booked.starts_at(),
            duration_minutes: REMOTE_SESSION_MINUTES,
            host_contact: doctor.email.clone(),
        };
        let link = self.broker.obtain_link(&request).await;

        let session = RemoteSession {
            id: session_id,
            appointment_id: booked.id,
            scheduled_start: booked.starts_at(),
            status: RemoteSessionStatus::Scheduled,
            session_kind: link.kind,
            join_url: link.url,
            created_at: self.clock.now(),
        };

        match self.sessions.insert(session).await {
            Ok(stored) => Ok(stored),
            Err(e) => {
                error!("Failed to store remote session for slot {}: {}", booked.id, e);

                // patient_id is Some on every booked row
                if let Some(patient_id) = booked.patient_id {
                    match self.slots.release(original, patient_id).await {
                        Ok(Some(_)) => info!("Released slot {} after session failure", booked.id),
                        Ok(None) => warn!("Slot {} changed hands before it could be released", booked.id),
                        Err(release_err) => error!("Failed to release slot {}: {}", booked.id, release_err),
                    }
                }

                Err(e.into())
            }
        }
    }
}
