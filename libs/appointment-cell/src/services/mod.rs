// libs/appointment-cell/src/services/mod.rs

pub mod booking;
pub mod lifecycle;
pub mod repository;
pub mod schedule;
pub mod slot_generator;

pub use booking::BookingAllocator;
pub use lifecycle::LifecycleManager;
pub use repository::{
    InMemoryPaymentStore, InMemorySlotRepository, PaymentStore, SlotRepository, SupabasePaymentStore,
    SupabaseSlotRepository,
};
pub use schedule::ScheduleService;
pub use slot_generator::{generate_slots, SlotGenerator};
