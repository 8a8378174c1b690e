use actix_web::{HttpResponse, Responder, web};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::engine::AttendanceEngine;
use crate::model::location::{AllowedLocation, GeoPoint, LocationRestriction, NewAllowedLocation};
use crate::model::payroll::{CutoffCycle, PayRate, PayType, PayrollSettings};

#[derive(Deserialize, ToSchema)]
pub struct SetPayRate {
    pub pay_type: PayType,
    #[schema(example = "20.00", value_type = String)]
    pub rate: Decimal,
}

#[derive(Deserialize, ToSchema)]
pub struct SetPayrollSettings {
    pub cutoff_cycle: CutoffCycle,
    #[schema(example = "USD")]
    pub currency: String,
    #[schema(example = "1.5", value_type = String)]
    pub overtime_rate_multiplier: Decimal,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateLocation {
    #[schema(example = "Head office")]
    pub name: String,
    pub center: GeoPoint,
    #[schema(example = 100.0)]
    pub radius_meters: f64,
}

#[derive(Deserialize, ToSchema)]
pub struct SetRestriction {
    #[schema(example = true)]
    pub enabled: bool,
}

#[utoipa::path(
    put,
    path = "/api/admin/pay-rates/{user_id}",
    request_body = SetPayRate,
    params(
        ("user_id" = u64, Path, description = "User whose rate is set")
    ),
    responses(
        (status = 200, body = PayRate),
        (status = 400),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn set_pay_rate(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
    path: web::Path<u64>,
    body: web::Json<SetPayRate>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();
    let body = body.into_inner();

    let rate = engine
        .set_pay_rate(&auth, user_id, body.pay_type, body.rate)
        .await?;

    Ok(HttpResponse::Ok().json(rate))
}

#[utoipa::path(
    put,
    path = "/api/admin/payroll-settings",
    request_body = SetPayrollSettings,
    responses(
        (status = 200, body = PayrollSettings),
        (status = 400),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn set_payroll_settings(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
    body: web::Json<SetPayrollSettings>,
) -> actix_web::Result<impl Responder> {
    let body = body.into_inner();

    let settings = engine
        .set_payroll_settings(
            &auth,
            body.cutoff_cycle,
            body.currency,
            body.overtime_rate_multiplier,
        )
        .await?;

    Ok(HttpResponse::Ok().json(settings))
}

#[utoipa::path(
    post,
    path = "/api/admin/locations",
    request_body = CreateLocation,
    responses(
        (status = 201, body = AllowedLocation),
        (status = 400),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_location(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
    body: web::Json<CreateLocation>,
) -> actix_web::Result<impl Responder> {
    let body = body.into_inner();

    let location = engine
        .add_allowed_location(
            &auth,
            NewAllowedLocation {
                tenant_id: auth.tenant_id,
                name: body.name,
                center: body.center,
                radius_meters: body.radius_meters,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(location))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{user_id}/restrictions/{location_id}",
    request_body = SetRestriction,
    params(
        ("user_id" = u64, Path, description = "Restricted user"),
        ("location_id" = u64, Path, description = "Allowed location")
    ),
    responses(
        (status = 200, body = LocationRestriction),
        (status = 403),
        (status = 404, description = "Location not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn set_restriction(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
    path: web::Path<(u64, u64)>,
    body: web::Json<SetRestriction>,
) -> actix_web::Result<impl Responder> {
    let (user_id, location_id) = path.into_inner();

    let restriction = engine
        .set_location_restriction(&auth, user_id, location_id, body.enabled)
        .await?;

    Ok(HttpResponse::Ok().json(restriction))
}
