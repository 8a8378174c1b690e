//! Persistence seam for the engine.
//!
//! Every read-modify-write that must be atomic per user (opening a session,
//! mutating the open session, upserting a payroll range) is a single trait
//! method, so each implementation can make it atomic in its own way.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::EngineResult;
use crate::model::attendance::{AttendanceSession, NewSession};
use crate::model::break_slot::BreakTransition;
use crate::model::location::{AllowedLocation, LocationRestriction, NewAllowedLocation};
use crate::model::payroll::{PayRate, PayrollFigures, PayrollRecord, PayrollSettings};
use crate::model::user::UserAccount;

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// Mutation applied to the open session while it is locked. Returns the
/// break transitions it performed so the caller can log them after commit.
pub type SessionUpdate =
    Box<dyn FnOnce(&mut AttendanceSession) -> EngineResult<Vec<BreakTransition>> + Send>;

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_user(&self, user_id: u64) -> EngineResult<Option<UserAccount>>;

    async fn find_open_session(&self, user_id: u64) -> EngineResult<Option<AttendanceSession>>;

    /// Inserts an open session and raises the user's live status flag.
    ///
    /// Fails with `Conflict` if the user already has an open session, even
    /// when a concurrent caller won the race after our own check.
    async fn open_session(&self, new: NewSession) -> EngineResult<AttendanceSession>;

    /// Locks the user's open session, applies `update` and writes it back.
    /// Returns the written session with the transitions `update` reported.
    ///
    /// Fails with `Lookup` if no session is open. If `update` fails nothing
    /// is written. When `update` closes the session the live status flag is
    /// cleared in the same write.
    async fn update_open_session(
        &self,
        user_id: u64,
        update: SessionUpdate,
    ) -> EngineResult<(AttendanceSession, Vec<BreakTransition>)>;

    /// Sessions whose time-in falls in `[from, to)`, newest first.
    async fn sessions_between(
        &self,
        user_id: u64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<Vec<AttendanceSession>>;

    /// Allowed locations behind the user's enabled restriction rows.
    async fn enabled_locations(&self, user_id: u64) -> EngineResult<Vec<AllowedLocation>>;

    async fn pay_rate(&self, user_id: u64) -> EngineResult<Option<PayRate>>;

    async fn payroll_settings(&self, tenant_id: u64) -> EngineResult<Option<PayrollSettings>>;

    /// Inserts or replaces the record keyed by `(user_id, start_date, end_date)`.
    async fn upsert_payroll_record(&self, figures: PayrollFigures) -> EngineResult<PayrollRecord>;

    async fn payroll_records(&self, user_id: u64) -> EngineResult<Vec<PayrollRecord>>;

    async fn upsert_pay_rate(&self, rate: PayRate) -> EngineResult<PayRate>;

    async fn upsert_payroll_settings(
        &self,
        settings: PayrollSettings,
    ) -> EngineResult<PayrollSettings>;

    async fn create_allowed_location(
        &self,
        location: NewAllowedLocation,
    ) -> EngineResult<AllowedLocation>;

    async fn find_allowed_location(&self, location_id: u64)
    -> EngineResult<Option<AllowedLocation>>;

    async fn set_restriction(
        &self,
        restriction: LocationRestriction,
    ) -> EngineResult<LocationRestriction>;
}
