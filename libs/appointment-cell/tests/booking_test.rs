use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{AppointmentError, AppointmentStatus, BookAppointmentRequest};
use appointment_cell::services::booking::AppointmentBookingService;
use shared_utils::test_utils::{MockRows, TestConfig, TestUser};

fn booking_service_for(server: &MockServer) -> AppointmentBookingService {
    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    AppointmentBookingService::new(&config)
}

fn booking_request(pet_id: Uuid, doctor_id: Uuid, when: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        pet_id: Some(pet_id),
        doctor_id: Some(doctor_id),
        appointment_date: Some(when.to_string()),
        query: Some("limping".to_string()),
    }
}

/// Doctor with a single Monday 18:00-20:00 window.
async fn mount_monday_doctor(server: &MockServer, doctor_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::doctor_with_schedule(
                &doctor_id.to_string(),
                "Emily Carter",
                "Dermatology",
                json!([MockRows::schedule_slot(1, "18:00", "20:00")]),
            )
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn only_pet_owners_can_book() {
    let server = MockServer::start().await;
    let service = booking_service_for(&server);
    let doctor = TestUser::doctor("doc@example.com").to_user();

    let err = service
        .book_appointment(
            &doctor,
            booking_request(Uuid::new_v4(), Uuid::new_v4(), "2024-07-01T18:30:00Z"),
            "test-token",
        )
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::Unauthorized(msg) => {
        assert!(msg.contains("pet owners"));
    });
}

#[tokio::test]
async fn missing_fields_fail_validation() {
    let server = MockServer::start().await;
    let service = booking_service_for(&server);
    let owner = TestUser::pet_owner("owner@example.com").to_user();

    let request = BookAppointmentRequest {
        pet_id: Some(Uuid::new_v4()),
        doctor_id: Some(Uuid::new_v4()),
        appointment_date: None,
        query: None,
    };

    let err = service.book_appointment(&owner, request, "test-token").await.unwrap_err();

    assert_matches!(err, AppointmentError::ValidationError(msg) => {
        assert!(msg.contains("petId, doctorId, and appointmentDate"));
    });
}

#[tokio::test]
async fn unknown_doctor_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = booking_service_for(&server);
    let owner = TestUser::pet_owner("owner@example.com").to_user();

    let err = service
        .book_appointment(
            &owner,
            booking_request(Uuid::new_v4(), Uuid::new_v4(), "2024-07-01T18:30:00Z"),
            "test-token",
        )
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::DoctorNotFound);
}

#[tokio::test]
async fn unparseable_date_fails_validation() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    mount_monday_doctor(&server, doctor_id).await;

    let service = booking_service_for(&server);
    let owner = TestUser::pet_owner("owner@example.com").to_user();

    let err = service
        .book_appointment(
            &owner,
            booking_request(Uuid::new_v4(), doctor_id, "next monday evening"),
            "test-token",
        )
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::ValidationError(msg) => {
        assert!(msg.contains("Invalid appointment date"));
    });
}

#[tokio::test]
async fn out_of_schedule_booking_creates_no_record() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    mount_monday_doctor(&server, doctor_id).await;

    // The rejection must happen before any write is attempted.
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let service = booking_service_for(&server);
    let owner = TestUser::pet_owner("owner@example.com").to_user();

    // 2024-07-02 is a Tuesday; the doctor only works Mondays.
    let err = service
        .book_appointment(
            &owner,
            booking_request(Uuid::new_v4(), doctor_id, "2024-07-02T18:30:00Z"),
            "test-token",
        )
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::ValidationError(msg) => {
        assert!(msg.contains("not available"));
        assert!(msg.contains("Emily Carter"));
    });
}

#[tokio::test]
async fn in_schedule_booking_creates_pending_appointment() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let owner = TestUser::pet_owner("owner@example.com");
    let pet_id = Uuid::new_v4();
    mount_monday_doctor(&server, doctor_id).await;

    let created = MockRows::appointment(
        &Uuid::new_v4().to_string(),
        &owner.id,
        &pet_id.to_string(),
        &doctor_id.to_string(),
        "2024-07-01T18:30:00Z",
        "Pending",
    );
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([created])))
        .expect(1)
        .mount(&server)
        .await;

    let service = booking_service_for(&server);

    // Monday 18:30, inside the published window
    let appointment = service
        .book_appointment(
            &owner.to_user(),
            booking_request(pet_id, doctor_id, "2024-07-01T18:30:00Z"),
            "test-token",
        )
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Pending);
    assert_eq!(appointment.doctor_id, doctor_id);
    assert!(appointment.acted_by.is_none());
}

#[tokio::test]
async fn window_end_is_exclusive() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    mount_monday_doctor(&server, doctor_id).await;

    let service = booking_service_for(&server);
    let owner = TestUser::pet_owner("owner@example.com").to_user();

    // Exactly 20:00 on Monday: the window closes at 20:00 exclusive.
    let err = service
        .book_appointment(
            &owner,
            booking_request(Uuid::new_v4(), doctor_id, "2024-07-01T20:00:00Z"),
            "test-token",
        )
        .await
        .unwrap_err();

    assert_matches!(err, AppointmentError::ValidationError(_));
}

#[tokio::test]
async fn doctor_without_schedule_accepts_any_time() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let owner = TestUser::pet_owner("owner@example.com");
    let pet_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::doctor(&doctor_id.to_string(), "Sam Rivera", "General")
        ])))
        .mount(&server)
        .await;

    let created = MockRows::appointment(
        &Uuid::new_v4().to_string(),
        &owner.id,
        &pet_id.to_string(),
        &doctor_id.to_string(),
        "2024-07-07T03:15:00Z",
        "Pending",
    );
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([created])))
        .mount(&server)
        .await;

    let service = booking_service_for(&server);

    // Sunday at 03:15 - admissible because the schedule is unconstrained
    let appointment = service
        .book_appointment(
            &owner.to_user(),
            booking_request(pet_id, doctor_id, "2024-07-07T03:15:00Z"),
            "test-token",
        )
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Pending);
}
