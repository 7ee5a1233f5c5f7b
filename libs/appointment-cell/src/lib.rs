// libs/appointment-cell/src/lib.rs
//! # Appointment Cell
//!
//! Slot generation, booking allocation and status lifecycle for clinic
//! appointments.
//!
//! ```text
//! AvailabilityRuleStore -> SlotGenerator -> SlotRepository
//!                                             |
//!                           BookingAllocator -+-> RemoteSessionBroker
//!                                             |
//!                           LifecycleManager -+-> PaymentStore, RemoteSessionStore
//! ```
//!
//! Every booking goes through [`SlotRepository::claim`], a compare-and-set on
//! "patient is null". Fee and location are part of that same write.

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    Appointment, AppointmentError, AppointmentStatus, BookingRequest, BookingResult, GenerationReport, PatientId,
    Payment, PaymentHistory, PaymentSettlement, PaymentStatus, PaymentSummary, ScheduleReport, Slot, SlotClaim, SlotSpec,
    Transition, VisitType,
};
pub use router::{appointment_routes, AppointmentState};
pub use services::*;
