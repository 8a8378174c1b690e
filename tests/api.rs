//! HTTP surface tests: status codes and stable error codes through the full
//! middleware stack (rate limiters, bearer auth, handlers).

use std::str::FromStr;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test, web::Data};
use chrono::{Duration, TimeZone, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use timecard::config::Config;
use timecard::engine::{AttendanceEngine, ManualClock};
use timecard::models::Claims;
use timecard::routes;
use timecard::store::MemoryStore;

const SECRET: &str = "test-secret";

const TENANT_A: u64 = 10;
const TENANT_B: u64 = 20;

const OWNER: u8 = 1;
const ADMIN: u8 = 2;
const EMPLOYEE: u8 = 3;

fn config() -> Config {
    Config {
        database_url: "mysql://unused".to_string(),
        jwt_secret: SECRET.to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        db_max_connections: 1,
        rate_protected_per_min: 10_000,
        rate_punch_per_min: 10_000,
        api_prefix: "/api".to_string(),
        log_dir: "logs".to_string(),
        log_level: tracing::Level::DEBUG,
    }
}

fn engine() -> (AttendanceEngine, Arc<ManualClock>) {
    let store = Arc::new(MemoryStore::new());
    store.add_user(1, TENANT_A).unwrap();
    store.add_user(2, TENANT_A).unwrap();
    store.add_user(3, TENANT_B).unwrap();
    store.add_user(4, TENANT_B).unwrap();

    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
    ));
    (AttendanceEngine::new(store, clock.clone()), clock)
}

fn token(user_id: u64, tenant_id: u64, role: u8) -> String {
    let claims = Claims {
        user_id,
        tenant_id,
        sub: format!("user-{user_id}"),
        role,
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        jti: uuid::Uuid::new_v4().to_string(),
    };
    let jwt = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {jwt}")
}

fn punch_body() -> Value {
    json!({
        "device_info": "Pixel 8 / Android 15",
        "location": { "latitude": 14.5547, "longitude": 121.0244 },
        "time_zone": "Asia/Manila"
    })
}

macro_rules! init_app {
    ($engine:expr) => {{
        let config = config();
        let routes_config = config.clone();
        test::init_service(
            App::new()
                .app_data(Data::new($engine))
                .app_data(Data::new(config))
                .configure(move |cfg| routes::configure(cfg, routes_config)),
        )
        .await
    }};
}

fn post(uri: &str, auth: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .insert_header(("Authorization", auth.to_string()))
}

fn get(uri: &str, auth: &str) -> test::TestRequest {
    test::TestRequest::get()
        .uri(uri)
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .insert_header(("Authorization", auth.to_string()))
}

fn put(uri: &str, auth: &str) -> test::TestRequest {
    test::TestRequest::put()
        .uri(uri)
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .insert_header(("Authorization", auth.to_string()))
}

// =============================================================================
// Authentication
// =============================================================================

#[actix_web::test]
async fn test_missing_token_is_unauthorized() {
    let (engine, _) = engine();
    let app = init_app!(engine);

    let req = test::TestRequest::post()
        .uri("/api/attendance/time-in")
        .peer_addr("127.0.0.1:12345".parse().unwrap())
        .set_json(punch_body())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_token_signed_with_other_secret_is_unauthorized() {
    let (engine, _) = engine();
    let app = init_app!(engine);

    let claims = Claims {
        user_id: 1,
        tenant_id: TENANT_A,
        sub: "user-1".to_string(),
        role: EMPLOYEE,
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        jti: uuid::Uuid::new_v4().to_string(),
    };
    let forged = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"someone-else"),
    )
    .unwrap();

    let req = get("/api/attendance/current", &format!("Bearer {forged}")).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Punches and breaks
// =============================================================================

#[actix_web::test]
async fn test_time_in_then_duplicate_is_conflict() {
    let (engine, _) = engine();
    let app = init_app!(engine);
    let auth = token(1, TENANT_A, EMPLOYEE);

    let req = post("/api/attendance/time-in", &auth)
        .set_json(punch_body())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["open"], true);
    assert_eq!(body["break_phase"], "idle");
    assert_eq!(body["time_in_time_zone"], "Asia/Manila");

    let req = post("/api/attendance/time-in", &auth)
        .set_json(punch_body())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "CONFLICT");
}

#[actix_web::test]
async fn test_time_out_without_session_is_not_found() {
    let (engine, _) = engine();
    let app = init_app!(engine);

    let req = post("/api/attendance/time-out", &token(1, TENANT_A, EMPLOYEE))
        .set_json(punch_body())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "NOT_FOUND");
}

#[actix_web::test]
async fn test_time_out_reports_total_hours() {
    let (engine, clock) = engine();
    let app = init_app!(engine);
    let auth = token(1, TENANT_A, EMPLOYEE);

    let req = post("/api/attendance/time-in", &auth)
        .set_json(punch_body())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    clock.advance(Duration::minutes(510));
    let req = post("/api/attendance/time-out", &auth)
        .set_json(punch_body())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["open"], false);
    assert_eq!(body["total_hours"], "8.50");
}

#[actix_web::test]
async fn test_fifth_coffee_toggle_is_break_limit() {
    let (engine, _) = engine();
    let app = init_app!(engine);
    let auth = token(1, TENANT_A, EMPLOYEE);

    let req = post("/api/attendance/time-in", &auth)
        .set_json(punch_body())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    for _ in 0..4 {
        let req = post("/api/attendance/breaks/coffee", &auth).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let req = post("/api/attendance/breaks/coffee", &auth).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "BREAK_LIMIT");
}

#[actix_web::test]
async fn test_punch_outside_geofence_is_location_denied() {
    let (engine, _) = engine();
    let app = init_app!(engine);
    let admin = token(2, TENANT_A, ADMIN);

    let req = post("/api/admin/locations", &admin)
        .set_json(json!({
            "name": "Makati Office",
            "center": { "latitude": 14.5547, "longitude": 121.0244 },
            "radius_meters": 150.0
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let location: Value = test::read_body_json(resp).await;
    let location_id = location["id"].as_u64().unwrap();

    let req = put(
        &format!("/api/admin/users/1/restrictions/{location_id}"),
        &admin,
    )
    .set_json(json!({ "enabled": true }))
    .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = post("/api/attendance/time-in", &token(1, TENANT_A, EMPLOYEE))
        .set_json(json!({
            "device_info": "Pixel 8 / Android 15",
            "location": { "latitude": 14.6000, "longitude": 121.0244 },
            "time_zone": "Asia/Manila"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "LOCATION_DENIED");
    assert_eq!(body["latitude"], 14.6);
}

// =============================================================================
// Logs
// =============================================================================

#[actix_web::test]
async fn test_monthly_logs_reject_bad_month() {
    let (engine, _) = engine();
    let app = init_app!(engine);

    let req = get(
        "/api/attendance/logs/monthly?year=2026&month=13",
        &token(1, TENANT_A, EMPLOYEE),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[actix_web::test]
async fn test_cross_tenant_range_logs_are_forbidden() {
    let (engine, _) = engine();
    let app = init_app!(engine);

    let req = get(
        "/api/attendance/logs?user_id=1&start_date=2026-03-01&end_date=2026-03-31",
        &token(4, TENANT_B, OWNER),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "FORBIDDEN");
}

#[actix_web::test]
async fn test_own_range_logs_default_to_caller() {
    let (engine, _) = engine();
    let app = init_app!(engine);
    let auth = token(1, TENANT_A, EMPLOYEE);

    let req = post("/api/attendance/time-in", &auth)
        .set_json(punch_body())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = get(
        "/api/attendance/logs?start_date=2026-03-02&end_date=2026-03-02",
        &auth,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["user_id"], 1);
}

// =============================================================================
// Payroll
// =============================================================================

#[actix_web::test]
async fn test_payroll_without_pay_rate_is_missing_configuration() {
    let (engine, _) = engine();
    let app = init_app!(engine);

    let req = post("/api/payroll/calculate", &token(2, TENANT_A, ADMIN))
        .set_json(json!({
            "user_id": 1,
            "start_date": "2026-03-01",
            "end_date": "2026-03-15"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "MISSING_CONFIGURATION");
}

#[actix_web::test]
async fn test_employee_cannot_calculate_payroll() {
    let (engine, _) = engine();
    let app = init_app!(engine);

    let req = post("/api/payroll/calculate", &token(1, TENANT_A, EMPLOYEE))
        .set_json(json!({
            "user_id": 1,
            "start_date": "2026-03-01",
            "end_date": "2026-03-15"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_configured_payroll_is_calculated_and_listed() {
    let (engine, clock) = engine();
    let app = init_app!(engine);
    let admin = token(2, TENANT_A, ADMIN);
    let employee = token(1, TENANT_A, EMPLOYEE);

    let req = put("/api/admin/pay-rates/1", &admin)
        .set_json(json!({ "pay_type": "hourly", "rate": "20" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = put("/api/admin/payroll-settings", &admin)
        .set_json(json!({
            "cutoff_cycle": "semi_monthly",
            "currency": "php",
            "overtime_rate_multiplier": "1.25"
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = post("/api/attendance/time-in", &employee)
        .set_json(punch_body())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    clock.advance(Duration::hours(8));
    let req = post("/api/attendance/time-out", &employee)
        .set_json(punch_body())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = post("/api/payroll/calculate", &admin)
        .set_json(json!({
            "user_id": 1,
            "start_date": "2026-03-01",
            "end_date": "2026-03-15"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let record: Value = test::read_body_json(resp).await;
    let gross = Decimal::from_str(record["gross_pay"].as_str().unwrap()).unwrap();
    assert_eq!(gross, Decimal::from(160));

    let req = get("/api/payroll", &employee).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let records: Value = test::read_body_json(resp).await;
    assert_eq!(records.as_array().map(Vec::len), Some(1));
    assert_eq!(records[0]["id"], record["id"]);
}
