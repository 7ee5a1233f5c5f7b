pub mod availability;
pub mod doctor;

pub use availability::{
    AvailabilityRuleStore, AvailabilityService, InMemoryAvailabilityRuleStore, SupabaseAvailabilityRuleStore,
};
pub use doctor::{DoctorDirectory, InMemoryDoctorDirectory, SupabaseDoctorDirectory};
