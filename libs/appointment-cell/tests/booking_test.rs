mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::task::JoinSet;
use uuid::Uuid;

use appointment_cell::{AppointmentError, AppointmentStatus, BookingRequest, SlotRepository, VisitType};
use common::{doctor_seven, in_person, remote, BrokenProvider, Harness, StaticProvider, FALLBACK_URL};
use doctor_cell::Doctor;
use shared_utils::clock::Clock;
use video_conferencing_cell::{
    RemoteSession, RemoteSessionError, RemoteSessionStatus, RemoteSessionStore, SessionKind,
};

#[tokio::test]
async fn concurrent_bookings_have_exactly_one_winner() {
    let harness = Harness::new();
    harness.publish_monday_rule().await;
    let slot = harness.monday_slot(9, 0).await;

    let (first, second) = tokio::join!(
        harness.booking.book(slot.id, in_person(42)),
        harness.booking.book(slot.id, in_person(99)),
    );

    let outcomes = [first, second];
    let winners: Vec<_> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].appointment.status, AppointmentStatus::Confirmed);
    assert_eq!(
        outcomes.iter().filter(|r| matches!(r, Err(AppointmentError::AlreadyBooked))).count(),
        1
    );

    let stored = harness.slot(slot.id).await;
    assert_eq!(stored.patient_id, winners[0].appointment.patient_id);
}

#[tokio::test]
async fn many_racing_patients_still_leave_one_booking() {
    let harness = Harness::new();
    harness.publish_monday_rule().await;
    let slot_id = harness.monday_slot(10, 30).await.id;

    let mut tasks = JoinSet::new();
    for patient_id in 100..120 {
        let booking = harness.booking.clone();
        tasks.spawn(async move { booking.book(slot_id, in_person(patient_id)).await });
    }

    let mut booked = 0;
    let mut lost = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(_) => booked += 1,
            Err(AppointmentError::AlreadyBooked) => lost += 1,
            Err(other) => panic!("unexpected booking error: {other}"),
        }
    }

    assert_eq!(booked, 1);
    assert_eq!(lost, 19);
}

#[tokio::test]
async fn remote_booking_survives_provider_failure() {
    let harness = Harness::with_provider(Arc::new(BrokenProvider));
    harness.publish_monday_rule().await;
    let slot = harness.monday_slot(9, 30).await;

    let result = harness.booking.book(slot.id, remote(42)).await.unwrap();

    let appointment = result.appointment;
    let session = result.remote_session.expect("remote booking has a session");
    assert_eq!(appointment.status, AppointmentStatus::Confirmed);
    assert_eq!(appointment.visit_type, VisitType::Remote);
    assert_eq!(appointment.fee, Decimal::new(20000, 2));
    assert_eq!(appointment.clinic_id, None);
    assert_eq!(appointment.remote_session_id, Some(session.id));

    assert_eq!(session.join_url, FALLBACK_URL);
    assert_eq!(session.session_kind, SessionKind::Fallback);
    assert_eq!(session.status, RemoteSessionStatus::Scheduled);
    assert_eq!(session.scheduled_start, appointment.starts_at());
    assert_eq!(session.created_at, harness.clock.now());

    let stored = harness.sessions.get_for_appointment(appointment.id).await.unwrap().unwrap();
    assert_eq!(stored, session);
}

#[tokio::test]
async fn remote_booking_uses_provider_link() {
    let harness = Harness::with_provider(Arc::new(StaticProvider("https://zoom.us/j/555")));
    harness.publish_monday_rule().await;
    let slot = harness.monday_slot(10, 0).await;

    let result = harness.booking.book(slot.id, remote(42)).await.unwrap();
    let session = result.remote_session.unwrap();

    assert_eq!(session.join_url, "https://zoom.us/j/555");
    assert_eq!(session.session_kind, SessionKind::ProviderIssued);
}

#[tokio::test]
async fn in_person_booking_keeps_generated_fee_and_stores_symptoms() {
    let harness = Harness::new();
    harness.publish_monday_rule().await;
    let slot = harness.monday_slot(9, 0).await;

    let request = BookingRequest {
        patient_id: 42,
        visit_type: None,
        symptoms: Some("Persistent cough".to_string()),
        requested_time: None,
    };
    let booked = harness.booking.book(slot.id, request).await.unwrap().appointment;

    assert_eq!(booked.visit_type, VisitType::InPerson);
    assert_eq!(booked.fee, Decimal::new(30000, 2));
    assert_eq!(booked.clinic_id, Some(3));
    assert_eq!(booked.remote_session_id, None);
    assert_eq!(booked.symptoms.as_deref(), Some("Persistent cough"));
}

#[tokio::test]
async fn unparseable_time_is_rejected_before_touching_the_slot() {
    let harness = Harness::new();
    harness.publish_monday_rule().await;
    let slot = harness.monday_slot(9, 30).await;

    let request = BookingRequest {
        requested_time: Some("half past nine".to_string()),
        ..in_person(42)
    };

    assert_matches!(
        harness.booking.book(slot.id, request).await,
        Err(AppointmentError::ValidationError(_))
    );
    // Unparseable input never reaches the store, even for unknown slots.
    let unknown = BookingRequest {
        requested_time: Some("25:61".to_string()),
        ..in_person(42)
    };
    assert_matches!(
        harness.booking.book(Uuid::new_v4(), unknown).await,
        Err(AppointmentError::ValidationError(_))
    );
    assert!(harness.slot(slot.id).await.is_open());
}

#[tokio::test]
async fn requested_time_must_match_the_slot() {
    let harness = Harness::new();
    harness.publish_monday_rule().await;
    let slot = harness.monday_slot(9, 30).await;

    let mismatch = BookingRequest {
        requested_time: Some("10:00".to_string()),
        ..in_person(42)
    };
    assert_matches!(
        harness.booking.book(slot.id, mismatch).await,
        Err(AppointmentError::ValidationError(_))
    );

    let matching = BookingRequest {
        requested_time: Some("9:30 AM".to_string()),
        ..in_person(42)
    };
    let booked = harness.booking.book(slot.id, matching).await.unwrap();
    assert_eq!(booked.appointment.patient_id, Some(42));
}

#[tokio::test]
async fn missing_and_cancelled_slots_cannot_be_booked() {
    let harness = Harness::new();
    harness.publish_monday_rule().await;

    assert_matches!(
        harness.booking.book(Uuid::new_v4(), in_person(42)).await,
        Err(AppointmentError::NotFound(_))
    );

    let slot = harness.monday_slot(10, 30).await;
    harness.lifecycle.cancel(slot.id).await.unwrap();

    assert_matches!(
        harness.booking.book(slot.id, in_person(42)).await,
        Err(AppointmentError::InvalidState(_))
    );
}

/// Session store that refuses every write.
struct UnwritableSessions;

#[async_trait]
impl RemoteSessionStore for UnwritableSessions {
    async fn insert(&self, _session: RemoteSession) -> Result<RemoteSession, RemoteSessionError> {
        Err(RemoteSessionError::Store("connection refused".to_string()))
    }

    async fn get(&self, _id: Uuid) -> Result<Option<RemoteSession>, RemoteSessionError> {
        Ok(None)
    }

    async fn get_for_appointment(&self, _appointment_id: Uuid) -> Result<Option<RemoteSession>, RemoteSessionError> {
        Ok(None)
    }

    async fn set_status(
        &self,
        _id: Uuid,
        _status: RemoteSessionStatus,
    ) -> Result<Option<RemoteSession>, RemoteSessionError> {
        Ok(None)
    }
}

#[tokio::test]
async fn failed_session_write_releases_the_slot() {
    let harness = Harness::build(Arc::new(StaticProvider("https://zoom.us/j/1")), Arc::new(UnwritableSessions), 1);
    harness.publish_monday_rule().await;
    let slot = harness.monday_slot(9, 0).await;

    let result = harness.booking.book(slot.id, remote(42)).await;
    assert_matches!(result, Err(AppointmentError::CollaboratorUnavailable(_)));

    let restored = harness.slots.get(slot.id).await.unwrap().unwrap();
    assert_eq!(restored, slot);
    assert!(restored.is_open());

    // The slot is bookable again for an in-person visit.
    let retry = harness.booking.book(slot.id, in_person(99)).await.unwrap();
    assert_eq!(retry.appointment.patient_id, Some(99));
}

#[tokio::test]
async fn remote_booking_needs_a_video_doctor() {
    let harness = Harness::with_provider(Arc::new(StaticProvider("https://zoom.us/j/555")));
    harness.publish_monday_rule().await;
    harness
        .doctors
        .upsert(Doctor {
            available_for_video: false,
            ..doctor_seven()
        })
        .await;
    let slot = harness.monday_slot(9, 0).await;

    assert_matches!(
        harness.booking.book(slot.id, remote(42)).await,
        Err(AppointmentError::ValidationError(_))
    );
    assert!(harness.slot(slot.id).await.is_open());
    assert!(harness.sessions.get_for_appointment(slot.id).await.unwrap().is_none());

    let booked = harness.booking.book(slot.id, in_person(42)).await.unwrap();
    assert_eq!(booked.appointment.visit_type, VisitType::InPerson);
}
