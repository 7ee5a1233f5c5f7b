// libs/appointment-cell/src/services/schedule.rs
use std::sync::Arc;

use tracing::info;

use doctor_cell::{AvailabilityService, DoctorId, SaveAvailabilityRequest};
use shared_config::MAX_SLOT_HORIZON_OCCURRENCES;

use crate::models::{AppointmentError, GenerationReport, ScheduleReport};
use crate::services::slot_generator::SlotGenerator;

/// Saving a doctor's rule regenerates that doctor's slots in the same request.
pub struct ScheduleService {
    availability: Arc<AvailabilityService>,
    generator: Arc<SlotGenerator>,
    horizon: u32,
}

impl ScheduleService {
    pub fn new(availability: Arc<AvailabilityService>, generator: Arc<SlotGenerator>, horizon: u32) -> Self {
        Self {
            availability,
            generator,
            horizon,
        }
    }

    pub async fn save_rule(
        &self,
        doctor_id: DoctorId,
        request: SaveAvailabilityRequest,
    ) -> Result<ScheduleReport, AppointmentError> {
        let rule = self.availability.save_rule(doctor_id, request).await?;
        let generation = self.generator.generate(&rule, self.horizon).await?;

        info!(
            "Schedule saved for doctor {}: {} slots created",
            doctor_id, generation.created
        );

        Ok(ScheduleReport { rule, generation })
    }

    /// Re-runs generation from the stored rule, e.g. to extend the horizon.
    pub async fn regenerate(
        &self,
        doctor_id: DoctorId,
        horizon: Option<u32>,
    ) -> Result<GenerationReport, AppointmentError> {
        let horizon = horizon.unwrap_or(self.horizon);
        if !(1..=MAX_SLOT_HORIZON_OCCURRENCES).contains(&horizon) {
            return Err(AppointmentError::ValidationError(format!(
                "horizon must be between 1 and {} occurrences, got {}",
                MAX_SLOT_HORIZON_OCCURRENCES, horizon
            )));
        }

        let rule = self
            .availability
            .get_rule(doctor_id)
            .await?
            .ok_or_else(|| AppointmentError::NotFound(format!("Availability rule for doctor {}", doctor_id)))?;

        self.generator.generate(&rule, horizon).await
    }
}
