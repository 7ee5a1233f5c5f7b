// libs/appointment-cell/src/services/slot_generator.rs
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use doctor_cell::{AvailabilityRule, DoctorDirectory};
use shared_utils::clock::Clock;

use crate::models::{AppointmentError, GenerationReport, SlotSpec, VisitType};
use crate::services::repository::SlotRepository;

/// Length of each slot: the rule's window split evenly, floored to whole seconds.
/// A non-positive slot count is treated as one slot covering the whole window.
pub fn slot_duration(rule: &AvailabilityRule) -> Duration {
    let slots_per_day = i64::from(rule.max_slots_per_day.max(1));
    let window = (rule.end_time - rule.start_time).num_seconds();

    Duration::seconds(window / slots_per_day)
}

/// The first `horizon` dates on or after `today` that fall on the rule's weekday.
/// Stops early at the end of the representable calendar.
pub fn matching_dates(rule: &AvailabilityRule, horizon: u32, today: NaiveDate) -> Vec<NaiveDate> {
    let weekday = rule.day_of_week.weekday();
    let offset = (7 + weekday.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
    let Some(first) = today.checked_add_signed(Duration::days(i64::from(offset))) else {
        return Vec::new();
    };

    (0..horizon)
        .map_while(|week| first.checked_add_signed(Duration::weeks(i64::from(week))))
        .collect()
}

/// Expands a weekly rule into the slots that should exist over `horizon`
/// matching dates. Pure: the same inputs always yield the same specs.
pub fn generate_slots(rule: &AvailabilityRule, fee: Decimal, horizon: u32, today: NaiveDate) -> Vec<SlotSpec> {
    let duration = slot_duration(rule);
    let step = duration.num_seconds();
    if step <= 0 {
        return Vec::new();
    }

    // Flooring the step can fit extra slots into the window; the rule's maximum still wins.
    let window = (rule.end_time - rule.start_time).num_seconds();
    let max_per_day = i64::from(rule.max_slots_per_day.max(1));
    let per_day = if window > 0 { (window / step).min(max_per_day) } else { 0 };

    matching_dates(rule, horizon, today)
        .into_iter()
        .flat_map(|date| {
            (0..per_day).map(move |index| SlotSpec {
                doctor_id: rule.doctor_id,
                date,
                time: rule.start_time + Duration::seconds(index * step),
                visit_type: VisitType::InPerson,
                fee,
            })
        })
        .collect()
}

/// Persists the generator's output, skipping slots that already exist.
pub struct SlotGenerator {
    slots: Arc<dyn SlotRepository>,
    doctors: Arc<dyn DoctorDirectory>,
    clock: Arc<dyn Clock>,
}

impl SlotGenerator {
    pub fn new(slots: Arc<dyn SlotRepository>, doctors: Arc<dyn DoctorDirectory>, clock: Arc<dyn Clock>) -> Self {
        Self { slots, doctors, clock }
    }

    #[instrument(skip(self, rule), fields(doctor_id = rule.doctor_id, day = %rule.day_of_week))]
    pub async fn generate(&self, rule: &AvailabilityRule, horizon: u32) -> Result<GenerationReport, AppointmentError> {
        let mut report = GenerationReport {
            doctor_id: rule.doctor_id,
            created: 0,
            skipped: 0,
        };

        let Some(doctor) = self.doctors.get_doctor(rule.doctor_id).await? else {
            warn!("Doctor {} not found, skipping slot generation", rule.doctor_id);
            return Ok(report);
        };

        if slot_duration(rule) <= Duration::zero() {
            warn!(
                "Window {}-{} is too short for {} slots",
                rule.start_time, rule.end_time, rule.max_slots_per_day
            );
        }

        let today = self.clock.today();
        for planned in generate_slots(rule, doctor.consultation_fee, horizon, today) {
            if self.slots.insert_if_absent(planned.into_open_slot()).await? {
                report.created += 1;
            } else {
                report.skipped += 1;
            }
        }

        debug!("Generation touched {} slots", report.created + report.skipped);
        info!(
            "Generated {} new slots for doctor {} ({} already present)",
            report.created, rule.doctor_id, report.skipped
        );

        Ok(report)
    }
}
