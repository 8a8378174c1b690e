//! Payroll calculation over a date range.
//!
//! ## Rules
//!
//! - Worked time per session is `(time_out ?? now) - time_in`, minus a
//!   completed lunch break. Negative durations are excluded and logged.
//! - The range total is split at [`NORMAL_HOURS_THRESHOLD`] once for the
//!   whole range, not per calendar week.
//! - Hourly staff: `normal * rate + overtime * rate * multiplier`.
//! - Monthly staff: the flat rate; overtime hours are reported but unpaid.
//! - No deductions are modeled, so net pay equals gross pay.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use super::{AttendanceEngine, day_bounds, hours_in, round2};
use crate::auth::auth::AuthUser;
use crate::error::{EngineError, EngineResult};
use crate::model::attendance::AttendanceSession;
use crate::model::payroll::{PayRate, PayType, PayrollFigures, PayrollRecord, PayrollSettings};

/// Hours in a range paid at the normal rate before overtime applies.
pub const NORMAL_HOURS_THRESHOLD: Decimal = Decimal::from_parts(40, 0, 0, false, 0);

/// Total worked hours across sessions, rounded to 2 decimal places.
/// Open sessions count up to `now`.
pub fn total_worked_hours(sessions: &[AttendanceSession], now: DateTime<Utc>) -> Decimal {
    let mut worked = Duration::zero();

    for session in sessions {
        let until = session.time_out_at.unwrap_or(now);
        let duration = session.worked_duration(until);

        if duration < Duration::zero() {
            warn!(
                session_id = session.id,
                user_id = session.user_id,
                worked_seconds = duration.num_seconds(),
                "Negative worked duration excluded from payroll"
            );
            continue;
        }
        worked = worked + duration;
    }

    round2(hours_in(worked))
}

/// Splits `total_hours` into normal and overtime hours.
pub fn split_overtime(total_hours: Decimal) -> (Decimal, Decimal) {
    let normal = total_hours.min(NORMAL_HOURS_THRESHOLD);
    let overtime = (total_hours - NORMAL_HOURS_THRESHOLD).max(Decimal::ZERO);
    (normal, overtime)
}

/// Derives the payroll figures for one range.
pub fn compute_figures(
    user_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    total_hours: Decimal,
    rate: &PayRate,
    settings: &PayrollSettings,
) -> PayrollFigures {
    let (normal_hours, overtime_hours) = split_overtime(total_hours);

    let (overtime_pay, gross_pay) = match rate.pay_type {
        PayType::Hourly => {
            let overtime_pay =
                round2(overtime_hours * rate.rate * settings.overtime_rate_multiplier);
            (overtime_pay, round2(normal_hours * rate.rate + overtime_pay))
        }
        PayType::Monthly => (round2(Decimal::ZERO), round2(rate.rate)),
    };

    PayrollFigures {
        user_id,
        start_date,
        end_date,
        pay_type: rate.pay_type,
        hours_worked: round2(total_hours),
        overtime_hours: round2(overtime_hours),
        overtime_pay,
        gross_pay,
        net_pay: gross_pay,
    }
}

impl AttendanceEngine {
    /// Computes and stores the payroll record for `user_id` over the range.
    /// Re-running for the same range replaces the stored record.
    #[instrument(
        name = "calculate_payroll",
        skip(self, requester),
        fields(requester_id = requester.user_id, tenant_id = requester.tenant_id)
    )]
    pub async fn calculate_payroll(
        &self,
        requester: &AuthUser,
        user_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<PayrollRecord> {
        let (from, to) = day_bounds(start_date, end_date)?;
        let account = self.authorize_privileged(requester, user_id).await?;

        let rate = self
            .store
            .pay_rate(user_id)
            .await?
            .ok_or_else(|| EngineError::MissingConfiguration {
                what: "Pay rate".to_string(),
            })?;
        let settings = self
            .store
            .payroll_settings(account.tenant_id)
            .await?
            .ok_or_else(|| EngineError::MissingConfiguration {
                what: "Payroll settings".to_string(),
            })?;

        let sessions = self.store.sessions_between(user_id, from, to).await?;
        let total_hours = total_worked_hours(&sessions, self.clock.now());
        let figures = compute_figures(user_id, start_date, end_date, total_hours, &rate, &settings);

        let record = self.store.upsert_payroll_record(figures).await?;

        info!(
            payroll_id = record.id,
            sessions = sessions.len(),
            hours_worked = %record.figures.hours_worked,
            overtime_hours = %record.figures.overtime_hours,
            gross_pay = %record.figures.gross_pay,
            currency = %settings.currency,
            "Payroll record stored"
        );
        Ok(record)
    }

    /// Stored payroll records of a user, newest range first.
    #[instrument(
        name = "payroll_records",
        skip(self, requester),
        fields(requester_id = requester.user_id, tenant_id = requester.tenant_id)
    )]
    pub async fn payroll_records(
        &self,
        requester: &AuthUser,
        user_id: u64,
    ) -> EngineResult<Vec<PayrollRecord>> {
        self.authorize_self_or_privileged(requester, user_id)
            .await?;
        self.store.payroll_records(user_id).await
    }
}
