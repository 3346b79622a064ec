use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::models::DoctorError;
use doctor_cell::services::directory::DoctorDirectoryService;
use shared_utils::test_utils::{MockRows, TestConfig};

fn directory_for(server: &MockServer) -> DoctorDirectoryService {
    let config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    DoctorDirectoryService::new(&config)
}

#[tokio::test]
async fn get_doctor_parses_weekly_schedule() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::doctor_with_schedule(
                &doctor_id.to_string(),
                "Emily Carter",
                "Dermatology",
                json!([
                    MockRows::schedule_slot(1, "18:00", "20:00"),
                    MockRows::schedule_slot(3, "09:00", "12:00"),
                ]),
            )
        ])))
        .mount(&server)
        .await;

    let directory = directory_for(&server);
    let doctor = directory.get_doctor(doctor_id, "test-token").await.unwrap();

    assert_eq!(doctor.name, "Emily Carter");
    assert!(doctor.has_schedule());
    assert_eq!(doctor.schedule.len(), 2);
    assert_eq!(doctor.schedule[0].day_of_week, 1);
    assert_eq!(doctor.schedule[0].start_time.as_deref(), Some("18:00"));
    assert_eq!(doctor.schedule[0].end_time.as_deref(), Some("20:00"));
}

#[tokio::test]
async fn doctor_without_schedule_deserializes_as_unconstrained() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    // Legacy rows carry no schedule key at all
    let mut row = MockRows::doctor(&doctor_id.to_string(), "Sam Rivera", "General");
    row.as_object_mut().unwrap().remove("schedule");

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&server)
        .await;

    let directory = directory_for(&server);
    let doctor = directory.get_doctor(doctor_id, "test-token").await.unwrap();

    assert!(!doctor.has_schedule());
}

#[tokio::test]
async fn missing_doctor_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let directory = directory_for(&server);
    let err = directory
        .get_doctor(Uuid::new_v4(), "test-token")
        .await
        .unwrap_err();

    assert_matches!(err, DoctorError::NotFound);
}

#[tokio::test]
async fn list_doctors_returns_every_row() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::doctor(&Uuid::new_v4().to_string(), "Emily Carter", "Dermatology"),
            MockRows::doctor(&Uuid::new_v4().to_string(), "Sam Rivera", "General"),
        ])))
        .mount(&server)
        .await;

    let directory = directory_for(&server);
    let doctors = directory.list_doctors("test-token").await.unwrap();

    assert_eq!(doctors.len(), 2);
}
