use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};
use tracing::{info, warn};

use appointment_cell::{
    appointment_routes, AppointmentState, BookingAllocator, InMemoryPaymentStore, InMemorySlotRepository,
    LifecycleManager, PaymentStore, ScheduleService, SlotGenerator, SlotRepository, SupabasePaymentStore,
    SupabaseSlotRepository,
};
use doctor_cell::{
    AvailabilityRuleStore, AvailabilityService, DoctorDirectory, InMemoryAvailabilityRuleStore,
    InMemoryDoctorDirectory, SupabaseAvailabilityRuleStore, SupabaseDoctorDirectory,
};
use shared_config::AppConfig;
use shared_utils::clock::{Clock, SystemClock};
use video_conferencing_cell::{
    InMemoryRemoteSessionStore, RemoteSessionBroker, RemoteSessionProvider, RemoteSessionStore,
    SupabaseRemoteSessionStore, UnavailableProvider, ZoomClient,
};

struct Stores {
    slots: Arc<dyn SlotRepository>,
    payments: Arc<dyn PaymentStore>,
    sessions: Arc<dyn RemoteSessionStore>,
    rules: Arc<dyn AvailabilityRuleStore>,
    doctors: Arc<dyn DoctorDirectory>,
}

fn stores(config: &AppConfig) -> Stores {
    if config.is_configured() {
        info!("Using Supabase stores at {}", config.supabase_url);
        Stores {
            slots: Arc::new(SupabaseSlotRepository::new(config)),
            payments: Arc::new(SupabasePaymentStore::new(config)),
            sessions: Arc::new(SupabaseRemoteSessionStore::new(config)),
            rules: Arc::new(SupabaseAvailabilityRuleStore::new(config)),
            doctors: Arc::new(SupabaseDoctorDirectory::new(config)),
        }
    } else {
        warn!("Supabase not configured, using in-memory stores");
        Stores {
            slots: Arc::new(InMemorySlotRepository::new()),
            payments: Arc::new(InMemoryPaymentStore::new()),
            sessions: Arc::new(InMemoryRemoteSessionStore::new()),
            rules: Arc::new(InMemoryAvailabilityRuleStore::new()),
            doctors: Arc::new(InMemoryDoctorDirectory::new()),
        }
    }
}

fn remote_session_provider(config: &AppConfig) -> Arc<dyn RemoteSessionProvider> {
    match ZoomClient::new(config) {
        Ok(zoom) => Arc::new(zoom),
        Err(e) => {
            warn!("{}; remote visits will use the fallback link", e);
            Arc::new(UnavailableProvider)
        }
    }
}

pub fn create_router(config: &AppConfig) -> Router {
    let stores = stores(config);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let broker = Arc::new(RemoteSessionBroker::from_config(remote_session_provider(config), config));
    let generator = Arc::new(SlotGenerator::new(stores.slots.clone(), stores.doctors.clone(), clock.clone()));
    let availability = Arc::new(AvailabilityService::new(stores.rules, stores.doctors.clone()));

    let state = Arc::new(AppointmentState {
        schedules: Arc::new(ScheduleService::new(
            availability,
            generator,
            config.slot_horizon_occurrences,
        )),
        booking: Arc::new(BookingAllocator::new(
            stores.slots.clone(),
            stores.doctors,
            stores.sessions.clone(),
            broker,
            clock.clone(),
        )),
        lifecycle: Arc::new(LifecycleManager::new(
            stores.slots,
            stores.payments,
            stores.sessions,
            clock,
            config.payment_currency.clone(),
        )),
    });

    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .merge(appointment_routes(state))
}
