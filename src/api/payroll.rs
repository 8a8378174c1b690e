use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::engine::AttendanceEngine;
use crate::model::payroll::PayrollRecord;

#[derive(Deserialize, ToSchema)]
pub struct CalculatePayroll {
    #[schema(example = 1001)]
    pub user_id: u64,

    #[schema(example = "2026-03-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(example = "2026-03-15", value_type = String, format = "date")]
    pub end_date: NaiveDate,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayrollQuery {
    #[schema(example = 1001)]
    /// Defaults to the caller
    pub user_id: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/api/payroll/calculate",
    request_body = CalculatePayroll,
    responses(
        (status = 200, description = "Payroll computed and stored", body = PayrollRecord),
        (status = 400, description = "start_date after end_date"),
        (status = 403, description = "Caller is not an owner/admin of the user's tenant"),
        (status = 404, description = "Pay rate or payroll settings missing", body = Object, example = json!({
            "code": "MISSING_CONFIGURATION",
            "message": "Pay rate is not configured"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn calculate_payroll(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
    payload: web::Json<CalculatePayroll>,
) -> actix_web::Result<impl Responder> {
    let record = engine
        .calculate_payroll(&auth, payload.user_id, payload.start_date, payload.end_date)
        .await?;

    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, body = [PayrollRecord]),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
    query: web::Query<PayrollQuery>,
) -> actix_web::Result<impl Responder> {
    let user_id = query.user_id.unwrap_or(auth.user_id);
    let records = engine.payroll_records(&auth, user_id).await?;

    Ok(HttpResponse::Ok().json(records))
}
