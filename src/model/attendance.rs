use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::model::break_slot::BreakSchedule;
use crate::model::location::GeoPoint;

/// One time-in/time-out cycle. Retained as the attendance-of-record.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceSession {
    pub id: u64,
    pub user_id: u64,
    pub time_in_at: DateTime<Utc>,
    pub time_out_at: Option<DateTime<Utc>>,
    pub open: bool,
    pub time_in_location: GeoPoint,
    pub time_out_location: Option<GeoPoint>,
    pub time_in_device: String,
    pub time_out_device: Option<String>,
    pub time_in_time_zone: String,
    pub time_out_time_zone: Option<String>,
    pub breaks: BreakSchedule,
    /// Frozen at time-out, `None` while open.
    pub total_hours: Option<Decimal>,
}

impl AttendanceSession {
    /// Worked time from time-in to `until`, minus a completed lunch break.
    /// Coffee breaks are paid and not deducted.
    ///
    /// May be negative when timestamps are out of order; callers clamp.
    pub fn worked_duration(&self, until: DateTime<Utc>) -> Duration {
        until - self.time_in_at - self.breaks.lunch_duration()
    }
}

/// Everything captured at time-in.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: u64,
    pub time_in_at: DateTime<Utc>,
    pub location: GeoPoint,
    pub device: String,
    pub time_zone: String,
}

impl NewSession {
    pub fn into_session(self, id: u64) -> AttendanceSession {
        AttendanceSession {
            id,
            user_id: self.user_id,
            time_in_at: self.time_in_at,
            time_out_at: None,
            open: true,
            time_in_location: self.location,
            time_out_location: None,
            time_in_device: self.device,
            time_out_device: None,
            time_in_time_zone: self.time_zone,
            time_out_time_zone: None,
            breaks: BreakSchedule::default(),
            total_hours: None,
        }
    }
}
