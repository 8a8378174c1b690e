//! Read-side attendance queries. Results are newest-first.

use chrono::{Datelike, NaiveDate};
use tracing::instrument;

use super::{AttendanceEngine, day_bounds};
use crate::auth::auth::AuthUser;
use crate::error::{EngineError, EngineResult};
use crate::model::attendance::AttendanceSession;

/// First and last calendar day of a month.
pub fn month_dates(year: i32, month: u32) -> EngineResult<(NaiveDate, NaiveDate)> {
    if !(1..=12).contains(&month) {
        return Err(EngineError::invalid("month must be between 1 and 12"));
    }
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EngineError::invalid("year is out of range"))?;
    let (next_year, next_month) = if first.month() == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or_else(|| EngineError::invalid("year is out of range"))?;
    let last = next_first
        .pred_opt()
        .ok_or_else(|| EngineError::invalid("year is out of range"))?;

    Ok((first, last))
}

impl AttendanceEngine {
    /// The caller's sessions that started in the given UTC month.
    #[instrument(name = "monthly_logs", skip(self, user), fields(user_id = user.user_id))]
    pub async fn monthly_logs(
        &self,
        user: &AuthUser,
        year: i32,
        month: u32,
    ) -> EngineResult<Vec<AttendanceSession>> {
        let (first, last) = month_dates(year, month)?;
        let (from, to) = day_bounds(first, last)?;

        self.store.sessions_between(user.user_id, from, to).await
    }

    /// Sessions of `target_user_id` that started between the two dates
    /// (inclusive). Privileged requesters may query users of their own
    /// tenant; anything else is `Forbidden`, never an empty list.
    #[instrument(
        name = "range_logs",
        skip(self, requester),
        fields(requester_id = requester.user_id, tenant_id = requester.tenant_id)
    )]
    pub async fn range_logs(
        &self,
        requester: &AuthUser,
        target_user_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<Vec<AttendanceSession>> {
        let (from, to) = day_bounds(start_date, end_date)?;
        self.authorize_self_or_privileged(requester, target_user_id)
            .await?;

        self.store.sessions_between(target_user_id, from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_dates_handles_leap_february() {
        let (first, last) = month_dates(2028, 2).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2028, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2028, 2, 29).unwrap());
    }

    #[test]
    fn test_month_dates_handles_december() {
        let (_, last) = month_dates(2026, 12).unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    }

    #[test]
    fn test_month_dates_rejects_month_13() {
        assert!(matches!(
            month_dates(2026, 13),
            Err(EngineError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_month_dates_names_the_bad_field() {
        let month = month_dates(2026, 0).unwrap_err();
        assert_eq!(month.to_string(), "Invalid input: month must be between 1 and 12");

        let year = month_dates(300_000, 3).unwrap_err();
        assert_eq!(year.to_string(), "Invalid input: year is out of range");
    }
}
