use axum::extract::{Extension, State};
use axum::Json;
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::handlers;
use appointment_cell::models::{BookAppointmentRequest, RespondToAppointmentRequest};
use notification_cell::services::realtime::RealtimeChannelRegistry;
use shared_models::error::AppError;
use shared_utils::test_utils::{MockRows, TestConfig, TestUser};

fn auth_header() -> TypedHeader<Authorization<Bearer>> {
    TypedHeader(Authorization::bearer("test-token").unwrap())
}

#[tokio::test]
async fn book_handler_returns_created_appointment() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let owner = TestUser::pet_owner("owner@example.com");
    let pet_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::doctor_with_schedule(
                &doctor_id.to_string(),
                "Emily Carter",
                "Dermatology",
                json!([MockRows::schedule_slot(1, "18:00", "20:00")]),
            )
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([MockRows::appointment(
            &Uuid::new_v4().to_string(),
            &owner.id,
            &pet_id.to_string(),
            &doctor_id.to_string(),
            "2024-07-01T18:30:00Z",
            "Pending",
        )])))
        .mount(&server)
        .await;

    let state = TestConfig::with_supabase_url(&server.uri()).to_arc();

    let Json(body) = handlers::book_appointment(
        State(state),
        auth_header(),
        Extension(owner.to_user()),
        Json(BookAppointmentRequest {
            pet_id: Some(pet_id),
            doctor_id: Some(doctor_id),
            appointment_date: Some("2024-07-01T18:30:00Z".to_string()),
            query: Some("limping".to_string()),
        }),
    )
    .await
    .unwrap();

    assert_eq!(body["success"], json!(true));
    assert_eq!(body["appointment"]["status"], "Pending");
    assert_eq!(body["message"], "Appointment booked successfully");
}

#[tokio::test]
async fn book_handler_maps_role_failure_to_auth_error() {
    let server = MockServer::start().await;
    let state = TestConfig::with_supabase_url(&server.uri()).to_arc();
    let doctor = TestUser::doctor("doc@example.com");

    let err = handlers::book_appointment(
        State(state),
        auth_header(),
        Extension(doctor.to_user()),
        Json(BookAppointmentRequest {
            pet_id: Some(Uuid::new_v4()),
            doctor_id: Some(Uuid::new_v4()),
            appointment_date: Some("2024-07-01T18:30:00Z".to_string()),
            query: None,
        }),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Auth(_)));
}

#[tokio::test]
async fn respond_handler_reports_the_new_status() {
    let server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();
    let owner_id = Uuid::new_v4();
    let pet_id = Uuid::new_v4();
    let doctor = TestUser::doctor("doc@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([MockRows::appointment(
            &appointment_id.to_string(),
            &owner_id.to_string(),
            &pet_id.to_string(),
            &doctor.id,
            "2024-07-01T18:30:00Z",
            "Pending",
        )])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::doctor(&doctor.id, "Emily Carter", "Dermatology")
        ])))
        .mount(&server)
        .await;

    let mut updated = MockRows::appointment(
        &appointment_id.to_string(),
        &owner_id.to_string(),
        &pet_id.to_string(),
        &doctor.id,
        "2024-07-01T18:30:00Z",
        "Rejected",
    );
    updated["acted_by"] = json!("Emily Carter");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated])))
        .mount(&server)
        .await;

    // Tolerant lookups performed while building the fan-out event
    Mock::given(method("GET"))
        .and(path("/rest/v1/pets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/pet_owners"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .mount(&server)
        .await;

    let state = TestConfig::with_supabase_url(&server.uri()).to_arc();

    let Json(body) = handlers::respond_to_appointment(
        State(state),
        auth_header(),
        Extension(doctor.to_user()),
        Extension(RealtimeChannelRegistry::new()),
        Json(RespondToAppointmentRequest {
            appointment_id: Some(appointment_id),
            response: Some("Rejected".to_string()),
            rejection_reason: None,
        }),
    )
    .await
    .unwrap();

    assert_eq!(body["success"], json!(true));
    assert_eq!(body["appointment"]["status"], "Rejected");
    assert_eq!(body["message"], "Appointment has been rejected successfully.");
}
