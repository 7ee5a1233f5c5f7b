// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers;
use crate::services::{BookingAllocator, LifecycleManager, ScheduleService};

/// Services shared by the scheduling handlers.
pub struct AppointmentState {
    pub schedules: Arc<ScheduleService>,
    pub booking: Arc<BookingAllocator>,
    pub lifecycle: Arc<LifecycleManager>,
}

pub fn appointment_routes(state: Arc<AppointmentState>) -> Router {
    Router::new()
        // Doctor schedules
        .route("/schedules/{doctor_id}", put(handlers::save_schedule))
        .route("/schedules/{doctor_id}/generate", post(handlers::generate_slots))

        // Slot booking
        .route("/slots/available", get(handlers::get_available_slots))
        .route("/slots/{slot_id}/book", post(handlers::book_slot))

        // Lifecycle
        .route("/appointments/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/appointments/{appointment_id}/complete", post(handlers::complete_appointment))
        .route("/payments/{payment_id}/approve", post(handlers::approve_payment))
        .route("/payments/{payment_id}/reject", post(handlers::reject_payment))

        // Patient views
        .route("/patients/{patient_id}/upcoming", get(handlers::get_upcoming_appointments))
        .route("/patients/{patient_id}/history", get(handlers::get_appointment_history))
        .route("/patients/{patient_id}/payments", get(handlers::get_payment_history))

        .with_state(state)
}
