//! Attendance and payroll computation engine.
//!
//! [`AttendanceEngine`] owns the punch state machine, the log queries and
//! the payroll calculator. All state lives behind an [`AttendanceStore`];
//! all timestamps come from a [`Clock`].

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

use crate::auth::auth::AuthUser;
use crate::error::{EngineError, EngineResult};
use crate::model::user::UserAccount;
use crate::store::AttendanceStore;

pub mod admin;
pub mod clock;
pub mod geofence;
pub mod logs;
pub mod payroll;
pub mod punch;

pub use clock::{Clock, ManualClock, SystemClock};

const SECONDS_PER_HOUR: i64 = 3600;

#[derive(Clone)]
pub struct AttendanceEngine {
    store: Arc<dyn AttendanceStore>,
    clock: Arc<dyn Clock>,
}

impl AttendanceEngine {
    pub fn new(store: Arc<dyn AttendanceStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Resolves `target_user_id` for a privileged requester of the same tenant.
    ///
    /// Unknown users and users of other tenants both fail with `Forbidden`,
    /// so the answer never reveals whether an id exists elsewhere.
    async fn authorize_privileged(
        &self,
        requester: &AuthUser,
        target_user_id: u64,
    ) -> EngineResult<UserAccount> {
        if !requester.role.is_privileged() {
            warn!(
                requester_id = requester.user_id,
                target_user_id, "Non-privileged access to another user rejected"
            );
            return Err(EngineError::Forbidden);
        }

        match self.store.find_user(target_user_id).await? {
            Some(account) if account.tenant_id == requester.tenant_id => Ok(account),
            _ => {
                warn!(
                    requester_id = requester.user_id,
                    requester_tenant_id = requester.tenant_id,
                    target_user_id,
                    "Cross-tenant access rejected"
                );
                Err(EngineError::Forbidden)
            }
        }
    }

    /// Same as [`Self::authorize_privileged`] but always lets users read
    /// their own data.
    async fn authorize_self_or_privileged(
        &self,
        requester: &AuthUser,
        target_user_id: u64,
    ) -> EngineResult<()> {
        if requester.user_id == target_user_id {
            return Ok(());
        }
        self.authorize_privileged(requester, target_user_id)
            .await
            .map(|_| ())
    }
}

/// Rounds half away from zero and pads to exactly two decimal places, so
/// `8` is stored and serialised as `8.00`.
pub(crate) fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Exact (unrounded) hours in a duration.
pub(crate) fn hours_in(duration: Duration) -> Decimal {
    Decimal::from(duration.num_seconds()) / Decimal::from(SECONDS_PER_HOUR)
}

/// Half-open UTC instant range `[start 00:00, day after end 00:00)` covering
/// both dates in full.
pub(crate) fn day_bounds(
    start: NaiveDate,
    end: NaiveDate,
) -> EngineResult<(DateTime<Utc>, DateTime<Utc>)> {
    if start > end {
        return Err(EngineError::invalid("start_date must not be after end_date"));
    }
    let after_end = end
        .succ_opt()
        .ok_or_else(|| EngineError::invalid("end_date is out of range"))?;

    Ok((
        Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN)),
        Utc.from_utc_datetime(&after_end.and_time(NaiveTime::MIN)),
    ))
}
