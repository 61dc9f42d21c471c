// libs/availability-cell/tests/supabase_store_test.rs

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use availability_cell::{
    AppointmentLedger, AppointmentStatus, AvailabilityStore, NewAppointment, SchedulingError,
    SupabaseAppointmentLedger, SupabaseAvailabilityStore,
};
use shared_database::SupabaseClient;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn client(server: &MockServer) -> Arc<SupabaseClient> {
    Arc::new(SupabaseClient::new(&TestConfig::with_supabase_url(server.uri()).to_app_config()))
}

fn appointment_row(id: Uuid, practitioner_id: Uuid, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "practitioner_id": practitioner_id,
        "patient_id": Uuid::new_v4(),
        "consultation_type_id": Uuid::new_v4(),
        "starts_at": "2030-06-03T10:00:00Z",
        "ends_at": "2030-06-03T10:30:00Z",
        "status": status
    })
}

#[tokio::test]
async fn test_rules_are_filtered_by_weekday() {
    let server = MockServer::start().await;
    let practitioner_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/working_hour_rules"))
        .and(query_param("practitioner_id", format!("eq.{}", practitioner_id)))
        .and(query_param("weekday", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::working_hour_rule_response(&practitioner_id.to_string(), 1, "09:00:00", "12:00:00")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store = SupabaseAvailabilityStore::new(client(&server), None);
    let rules = store.working_hour_rules(practitioner_id, Some(1)).await.unwrap();

    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].weekday, 1);
}

#[tokio::test]
async fn test_overrides_are_read_for_date_range() {
    let server = MockServer::start().await;
    let practitioner_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/availability_overrides"))
        .and(query_param("practitioner_id", format!("eq.{}", practitioner_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": Uuid::new_v4(),
            "practitioner_id": practitioner_id,
            "override_date": "2030-06-04",
            "is_closed": false,
            "open_intervals": [{ "start_time": "14:00:00", "end_time": "16:00:00" }],
            "reason": "Afternoon only"
        }])))
        .mount(&server)
        .await;

    let store = SupabaseAvailabilityStore::new(client(&server), None);
    let overrides = store
        .overrides_between(
            practitioner_id,
            NaiveDate::from_ymd_opt(2030, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2030, 6, 30).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(overrides.len(), 1);
    assert!(!overrides[0].is_closed);
    assert_eq!(overrides[0].open_intervals.len(), 1);
}

#[tokio::test]
async fn test_confirmed_window_query_uses_utc_timestamps() {
    let server = MockServer::start().await;
    let practitioner_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.confirmed"))
        .and(query_param("starts_at", "lt.2030-06-04T00:00:00Z"))
        .and(query_param("ends_at", "gt.2030-06-03T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment_row(Uuid::new_v4(), practitioner_id, "confirmed")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let ledger = SupabaseAppointmentLedger::new(client(&server), None);
    let appointments = ledger
        .confirmed_between(
            practitioner_id,
            Utc.with_ymd_and_hms(2030, 6, 3, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2030, 6, 4, 0, 0, 0).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(appointments.len(), 1);
    assert!(appointments[0].is_confirmed());
}

#[tokio::test]
async fn test_insert_conflict_maps_to_slot_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({
            "status": "confirmed",
            "buffer_before_minutes": 5,
            "buffer_after_minutes": 10
        })))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23P01",
            "message": "conflicting key value violates exclusion constraint \"appointments_no_overlap\""
        })))
        .mount(&server)
        .await;

    let ledger = SupabaseAppointmentLedger::new(client(&server), Some("service-token".to_string()));
    let result = ledger
        .insert_confirmed(NewAppointment {
            practitioner_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            consultation_type_id: Uuid::new_v4(),
            starts_at: Utc.with_ymd_and_hms(2030, 6, 3, 10, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2030, 6, 3, 10, 30, 0).unwrap(),
            buffer_before_minutes: 5,
            buffer_after_minutes: 10,
        })
        .await;

    assert_matches!(result, Err(SchedulingError::SlotUnavailable));
}

#[tokio::test]
async fn test_server_error_surfaces_as_database_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/practitioners"))
        .respond_with(ResponseTemplate::new(500).set_body_json(MockSupabaseResponses::error_response("boom", "XX000")))
        .mount(&server)
        .await;

    let store = SupabaseAvailabilityStore::new(client(&server), None);
    let result = store.find_practitioner_by_slug("dr-test").await;

    assert_matches!(result, Err(SchedulingError::Database(_)));
}

#[tokio::test]
async fn test_cancel_is_conditional_on_confirmed_status() {
    let server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();
    let practitioner_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .and(query_param("status", "eq.confirmed"))
        .and(body_partial_json(json!({ "status": "cancelled" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment_row(appointment_id, practitioner_id, "cancelled")
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let ledger = SupabaseAppointmentLedger::new(client(&server), None);
    let now = Utc.with_ymd_and_hms(2030, 6, 1, 8, 0, 0).unwrap();

    let first = ledger.cancel(appointment_id, practitioner_id, now).await.unwrap();
    assert_eq!(first.map(|a| a.status), Some(AppointmentStatus::Cancelled));

    let second = ledger.cancel(appointment_id, practitioner_id, now).await.unwrap();
    assert!(second.is_none());
}
