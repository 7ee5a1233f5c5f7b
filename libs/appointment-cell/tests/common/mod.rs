#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use appointment_cell::{
    Appointment, BookingAllocator, BookingRequest, InMemoryPaymentStore, InMemorySlotRepository, LifecycleManager,
    ScheduleReport, ScheduleService, SlotGenerator, VisitType,
};
use doctor_cell::{
    AvailabilityService, Doctor, InMemoryAvailabilityRuleStore, InMemoryDoctorDirectory, SaveAvailabilityRequest,
};
use shared_utils::clock::FixedClock;
use shared_utils::test_utils::{sunday_morning, test_date, test_time};
use video_conferencing_cell::{
    InMemoryRemoteSessionStore, RemoteSessionBroker, RemoteSessionError, RemoteSessionProvider, RemoteSessionStore,
    SessionRequest, UnavailableProvider,
};

pub const FALLBACK_URL: &str = "https://zoom.us/j/0000000000";

pub fn doctor_seven() -> Doctor {
    Doctor {
        id: 7,
        first_name: "Mona".to_string(),
        last_name: "Hassan".to_string(),
        email: "mona@clinic.example".to_string(),
        consultation_fee: Decimal::new(30000, 2),
        online_fee: Decimal::new(20000, 2),
        clinic_id: Some(3),
        available_for_video: true,
    }
}

pub fn monday_morning_rule() -> SaveAvailabilityRequest {
    SaveAvailabilityRequest {
        day_of_week: "Monday".to_string(),
        start_time: test_time(9, 0),
        end_time: test_time(11, 0),
        max_slots_per_day: 4,
    }
}

pub fn in_person(patient_id: i64) -> BookingRequest {
    BookingRequest {
        patient_id,
        visit_type: Some(VisitType::InPerson),
        ..Default::default()
    }
}

pub fn remote(patient_id: i64) -> BookingRequest {
    BookingRequest {
        patient_id,
        visit_type: Some(VisitType::Remote),
        ..Default::default()
    }
}

/// Provider that always issues the same link.
pub struct StaticProvider(pub &'static str);

#[async_trait]
impl RemoteSessionProvider for StaticProvider {
    async fn create_session(&self, _request: &SessionRequest) -> Result<String, RemoteSessionError> {
        Ok(self.0.to_string())
    }
}

/// Provider that always errors.
pub struct BrokenProvider;

#[async_trait]
impl RemoteSessionProvider for BrokenProvider {
    async fn create_session(&self, _request: &SessionRequest) -> Result<String, RemoteSessionError> {
        Err(RemoteSessionError::Provider {
            message: "HTTP 500 Internal Server Error".to_string(),
        })
    }
}

/// All services over in-memory stores, with the clock at Sunday 2026-10-18 08:00.
pub struct Harness {
    pub clock: Arc<FixedClock>,
    pub slots: Arc<InMemorySlotRepository>,
    pub payments: Arc<InMemoryPaymentStore>,
    pub sessions: Arc<dyn RemoteSessionStore>,
    pub doctors: Arc<InMemoryDoctorDirectory>,
    pub generator: Arc<SlotGenerator>,
    pub booking: Arc<BookingAllocator>,
    pub lifecycle: Arc<LifecycleManager>,
    pub schedules: Arc<ScheduleService>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_provider(Arc::new(UnavailableProvider))
    }

    pub fn with_provider(provider: Arc<dyn RemoteSessionProvider>) -> Self {
        Self::build(provider, Arc::new(InMemoryRemoteSessionStore::new()), 1)
    }

    pub fn build(
        provider: Arc<dyn RemoteSessionProvider>,
        sessions: Arc<dyn RemoteSessionStore>,
        horizon: u32,
    ) -> Self {
        let clock = Arc::new(sunday_morning());
        let slots = Arc::new(InMemorySlotRepository::new());
        let payments = Arc::new(InMemoryPaymentStore::new());
        let doctors = Arc::new(InMemoryDoctorDirectory::with_doctors([doctor_seven()]));
        let rules = Arc::new(InMemoryAvailabilityRuleStore::new());

        let broker = Arc::new(RemoteSessionBroker::new(provider, FALLBACK_URL, Duration::from_secs(1)));
        let generator = Arc::new(SlotGenerator::new(slots.clone(), doctors.clone(), clock.clone()));
        let booking = Arc::new(BookingAllocator::new(
            slots.clone(),
            doctors.clone(),
            sessions.clone(),
            broker,
            clock.clone(),
        ));
        let lifecycle = Arc::new(LifecycleManager::new(
            slots.clone(),
            payments.clone(),
            sessions.clone(),
            clock.clone(),
            "EGP",
        ));
        let availability = Arc::new(AvailabilityService::new(rules, doctors.clone()));
        let schedules = Arc::new(ScheduleService::new(availability, generator.clone(), horizon));

        Self {
            clock,
            slots,
            payments,
            sessions,
            doctors,
            generator,
            booking,
            lifecycle,
            schedules,
        }
    }

    /// Doctor 7, Mondays 09:00-11:00 in four slots.
    pub async fn publish_monday_rule(&self) -> ScheduleReport {
        self.schedules
            .save_rule(7, monday_morning_rule())
            .await
            .expect("rule saves")
    }

    /// The open 2026-10-19 slot at `hour:minute`.
    pub async fn monday_slot(&self, hour: u32, minute: u32) -> Appointment {
        let date = test_date(2026, 10, 19);
        let time = test_time(hour, minute);

        self.slots
            .all()
            .await
            .into_iter()
            .find(|s| s.date == date && s.time == time)
            .expect("slot exists")
    }

    pub async fn slot(&self, id: Uuid) -> Appointment {
        use appointment_cell::SlotRepository;
        self.slots.get(id).await.unwrap().expect("slot exists")
    }
}
