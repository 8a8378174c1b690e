use crate::api::admin::{CreateLocation, SetPayRate, SetPayrollSettings, SetRestriction};
use crate::api::attendance::{AttendanceResponse, MonthlyLogsQuery, RangeLogsQuery};
use crate::api::payroll::{CalculatePayroll, PayrollQuery};
use crate::engine::punch::Punch;
use crate::model::break_slot::BreakPhase;
use crate::model::location::{AllowedLocation, GeoPoint, LocationRestriction};
use crate::model::payroll::{
    CutoffCycle, PayRate, PayType, PayrollFigures, PayrollRecord, PayrollSettings,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Timecard API",
        version = "0.1.0",
        description = r#"
## Attendance & Payroll Engine

Multi-tenant punch clock and payroll calculator.

### Key Features
- **Punches**
  - Time-in / time-out with geofence admission against the user's allowed locations
  - Two coffee breaks and one lunch break per session
- **Attendance logs**
  - Monthly and date-range queries, newest first
- **Payroll**
  - Hours, overtime past 40 hours per range, gross and net pay

### Security
All endpoints require a **JWT Bearer** token issued by the identity service.
Only **Owner** and **Admin** roles can act on other users of their own tenant.

### Errors
Failures return `{"code": ..., "message": ...}` with a stable `code`:
`CONFLICT`, `NOT_FOUND`, `LOCATION_DENIED`, `BREAK_LIMIT`, `FORBIDDEN`,
`MISSING_CONFIGURATION`, `INVALID_INPUT`, `INTERNAL`, and `UNAUTHORIZED` for a
missing or invalid bearer token.
"#,
    ),
    paths(
        crate::api::attendance::time_in,
        crate::api::attendance::time_out,
        crate::api::attendance::coffee_break,
        crate::api::attendance::lunch_break,
        crate::api::attendance::current_session,
        crate::api::attendance::monthly_logs,
        crate::api::attendance::range_logs,

        crate::api::payroll::calculate_payroll,
        crate::api::payroll::list_payrolls,

        crate::api::admin::set_pay_rate,
        crate::api::admin::set_payroll_settings,
        crate::api::admin::create_location,
        crate::api::admin::set_restriction
    ),
    components(
        schemas(
            Punch,
            GeoPoint,
            BreakPhase,
            AttendanceResponse,
            MonthlyLogsQuery,
            RangeLogsQuery,
            CalculatePayroll,
            PayrollQuery,
            PayType,
            PayRate,
            CutoffCycle,
            PayrollSettings,
            PayrollFigures,
            PayrollRecord,
            AllowedLocation,
            LocationRestriction,
            SetPayRate,
            SetPayrollSettings,
            CreateLocation,
            SetRestriction
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Attendance", description = "Punch clock and attendance log APIs"),
        (name = "Payroll", description = "Payroll calculation APIs"),
        (name = "Admin", description = "Tenant administration of pay and location settings"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
