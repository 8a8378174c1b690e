use crate::auth::auth::AuthUser;
use crate::engine::AttendanceEngine;
use crate::engine::punch::Punch;
use crate::model::attendance::AttendanceSession;
use crate::model::break_slot::BreakPhase;
use crate::model::location::GeoPoint;
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 12,
    "user_id": 1000,
    "time_in_at": "2026-03-02T09:00:00Z",
    "time_out_at": "2026-03-02T17:30:00Z",
    "open": false,
    "time_in_location": { "latitude": 14.5547, "longitude": 121.0244 },
    "time_out_location": { "latitude": 14.5547, "longitude": 121.0244 },
    "time_in_device": "Pixel 8 / Android 15",
    "time_out_device": "Pixel 8 / Android 15",
    "time_in_time_zone": "Asia/Manila",
    "time_out_time_zone": "Asia/Manila",
    "coffee_break1_start": null,
    "coffee_break1_end": null,
    "coffee_break2_start": null,
    "coffee_break2_end": null,
    "lunch_break_start": "2026-03-02T12:00:00Z",
    "lunch_break_end": "2026-03-02T12:30:00Z",
    "break_phase": "idle",
    "coffee_break_minutes": 0,
    "lunch_break_minutes": 30,
    "total_hours": "8.00"
}))]
pub struct AttendanceResponse {
    pub id: u64,
    pub user_id: u64,
    #[schema(value_type = String, format = "date-time")]
    pub time_in_at: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub time_out_at: Option<DateTime<Utc>>,
    pub open: bool,
    pub time_in_location: GeoPoint,
    pub time_out_location: Option<GeoPoint>,
    pub time_in_device: String,
    pub time_out_device: Option<String>,
    pub time_in_time_zone: String,
    pub time_out_time_zone: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub coffee_break1_start: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub coffee_break1_end: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub coffee_break2_start: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub coffee_break2_end: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub lunch_break_start: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub lunch_break_end: Option<DateTime<Utc>>,
    pub break_phase: BreakPhase,
    /// Completed coffee breaks; paid, so not deducted from total_hours
    pub coffee_break_minutes: i64,
    pub lunch_break_minutes: i64,
    #[schema(value_type = Option<String>)]
    pub total_hours: Option<Decimal>,
}

impl From<AttendanceSession> for AttendanceResponse {
    fn from(session: AttendanceSession) -> Self {
        let breaks = session.breaks;
        Self {
            id: session.id,
            user_id: session.user_id,
            time_in_at: session.time_in_at,
            time_out_at: session.time_out_at,
            open: session.open,
            time_in_location: session.time_in_location,
            time_out_location: session.time_out_location,
            time_in_device: session.time_in_device,
            time_out_device: session.time_out_device,
            time_in_time_zone: session.time_in_time_zone,
            time_out_time_zone: session.time_out_time_zone,
            coffee_break1_start: breaks.coffee(0).start(),
            coffee_break1_end: breaks.coffee(0).end(),
            coffee_break2_start: breaks.coffee(1).start(),
            coffee_break2_end: breaks.coffee(1).end(),
            lunch_break_start: breaks.lunch().start(),
            lunch_break_end: breaks.lunch().end(),
            break_phase: breaks.phase(),
            coffee_break_minutes: breaks.coffee_duration().num_minutes(),
            lunch_break_minutes: breaks.lunch_duration().num_minutes(),
            total_hours: session.total_hours,
        }
    }
}

fn to_responses(sessions: Vec<AttendanceSession>) -> Vec<AttendanceResponse> {
    sessions.into_iter().map(AttendanceResponse::from).collect()
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MonthlyLogsQuery {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 3)]
    /// Calendar month, 1-12
    pub month: u32,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct RangeLogsQuery {
    #[schema(example = 1001)]
    /// Target user; defaults to the caller
    pub user_id: Option<u64>,
    #[schema(example = "2026-03-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-15", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

/// Time-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/time-in",
    request_body = Punch,
    responses(
        (status = 200, description = "Clocked in", body = AttendanceResponse),
        (status = 400, description = "Invalid coordinates"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Outside allowed area", body = Object, example = json!({
            "code": "LOCATION_DENIED",
            "message": "Location (14.6, 121.1) is outside the allowed area",
            "latitude": 14.6,
            "longitude": 121.1
        })),
        (status = 409, description = "Already clocked in", body = Object, example = json!({
            "code": "CONFLICT",
            "message": "Already clocked in"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn time_in(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
    payload: web::Json<Punch>,
) -> actix_web::Result<impl Responder> {
    let session = engine.punch_time_in(&auth, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(AttendanceResponse::from(session)))
}

/// Time-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/time-out",
    request_body = Punch,
    responses(
        (status = 200, description = "Clocked out", body = AttendanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Outside allowed area"),
        (status = 404, description = "No open session", body = Object, example = json!({
            "code": "NOT_FOUND",
            "message": "Open session not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn time_out(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
    payload: web::Json<Punch>,
) -> actix_web::Result<impl Responder> {
    let session = engine.punch_time_out(&auth, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(AttendanceResponse::from(session)))
}

/// Coffee break toggle: start1, end1, start2, end2
#[utoipa::path(
    post,
    path = "/api/attendance/breaks/coffee",
    responses(
        (status = 200, description = "Break toggled", body = AttendanceResponse),
        (status = 404, description = "No open session"),
        (status = 409, description = "Lunch break in progress"),
        (status = 422, description = "Both coffee breaks used", body = Object, example = json!({
            "code": "BREAK_LIMIT",
            "message": "No coffee break slots left for this session"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn coffee_break(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
) -> actix_web::Result<impl Responder> {
    let session = engine.toggle_coffee_break(&auth).await?;
    Ok(HttpResponse::Ok().json(AttendanceResponse::from(session)))
}

/// Lunch break toggle; starting lunch ends an open coffee break
#[utoipa::path(
    post,
    path = "/api/attendance/breaks/lunch",
    responses(
        (status = 200, description = "Break toggled", body = AttendanceResponse),
        (status = 404, description = "No open session"),
        (status = 422, description = "Lunch break already taken")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn lunch_break(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
) -> actix_web::Result<impl Responder> {
    let session = engine.toggle_lunch_break(&auth).await?;
    Ok(HttpResponse::Ok().json(AttendanceResponse::from(session)))
}

#[utoipa::path(
    get,
    path = "/api/attendance/current",
    responses(
        (status = 200, description = "Open session", body = AttendanceResponse),
        (status = 404, description = "Not clocked in")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn current_session(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
) -> actix_web::Result<impl Responder> {
    let session = engine.current_session(&auth).await?;
    Ok(HttpResponse::Ok().json(AttendanceResponse::from(session)))
}

#[utoipa::path(
    get,
    path = "/api/attendance/logs/monthly",
    params(MonthlyLogsQuery),
    responses(
        (status = 200, description = "Caller's sessions for the month, newest first", body = [AttendanceResponse]),
        (status = 400, description = "Invalid month")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn monthly_logs(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
    query: web::Query<MonthlyLogsQuery>,
) -> actix_web::Result<impl Responder> {
    let sessions = engine.monthly_logs(&auth, query.year, query.month).await?;
    Ok(HttpResponse::Ok().json(to_responses(sessions)))
}

#[utoipa::path(
    get,
    path = "/api/attendance/logs",
    params(RangeLogsQuery),
    responses(
        (status = 200, description = "Sessions in range, newest first", body = [AttendanceResponse]),
        (status = 400, description = "start_date after end_date"),
        (status = 403, description = "Target user outside caller's tenant", body = Object, example = json!({
            "code": "FORBIDDEN",
            "message": "Access to the requested user is forbidden"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn range_logs(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
    query: web::Query<RangeLogsQuery>,
) -> actix_web::Result<impl Responder> {
    let target = query.user_id.unwrap_or(auth.user_id);
    let sessions = engine
        .range_logs(&auth, target, query.start_date, query.end_date)
        .await?;
    Ok(HttpResponse::Ok().json(to_responses(sessions)))
}
