//! Doctor-side scheduling data: the doctor read model and the single weekly
//! availability rule each doctor publishes.

pub mod models;
pub mod services;

pub use models::{
    AvailabilityRule, ClinicId, DayOfWeek, Doctor, DoctorError, DoctorId, SaveAvailabilityRequest, ValidatedRule,
};
pub use services::*;
