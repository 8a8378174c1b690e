//! Punch state machine: `CLOSED -> OPEN -> CLOSED` per user, with break
//! toggles nested inside `OPEN`.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use super::{AttendanceEngine, geofence, hours_in, round2};
use crate::auth::auth::AuthUser;
use crate::error::{EngineError, EngineResult};
use crate::model::attendance::{AttendanceSession, NewSession};
use crate::model::break_slot::{BreakKind, BreakTransition};
use crate::model::location::GeoPoint;

/// Client-supplied punch metadata.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct Punch {
    /// Opaque device descriptor, stored as-is.
    #[schema(example = "Pixel 8 / Android 15")]
    pub device_info: String,
    pub location: GeoPoint,
    /// IANA zone name, stored for display only.
    #[schema(example = "Asia/Manila")]
    pub time_zone: String,
}

impl AttendanceEngine {
    #[instrument(
        name = "punch_time_in",
        skip(self, user, punch),
        fields(user_id = user.user_id, tenant_id = user.tenant_id)
    )]
    pub async fn punch_time_in(
        &self,
        user: &AuthUser,
        punch: Punch,
    ) -> EngineResult<AttendanceSession> {
        punch.location.validate()?;

        if self.store.find_open_session(user.user_id).await?.is_some() {
            return Err(EngineError::conflict("Already clocked in"));
        }

        self.check_geofence(user.user_id, punch.location).await?;

        // the store re-checks exclusivity atomically
        let session = self
            .store
            .open_session(NewSession {
                user_id: user.user_id,
                time_in_at: self.clock.now(),
                location: punch.location,
                device: punch.device_info,
                time_zone: punch.time_zone,
            })
            .await?;

        info!(session_id = session.id, time_in_at = %session.time_in_at, "Time-in recorded");
        Ok(session)
    }

    #[instrument(
        name = "punch_time_out",
        skip(self, user, punch),
        fields(user_id = user.user_id, tenant_id = user.tenant_id)
    )]
    pub async fn punch_time_out(
        &self,
        user: &AuthUser,
        punch: Punch,
    ) -> EngineResult<AttendanceSession> {
        punch.location.validate()?;

        if self.store.find_open_session(user.user_id).await?.is_none() {
            return Err(EngineError::lookup("Open session"));
        }

        self.check_geofence(user.user_id, punch.location).await?;

        let now = self.clock.now();
        let (session, closed) = self
            .store
            .update_open_session(
                user.user_id,
                Box::new(move |session| {
                    // a closed session is never left on break
                    let closed = session.breaks.close_open(now);

                    let mut worked = session.worked_duration(now);
                    if worked < Duration::zero() {
                        warn!(
                            session_id = session.id,
                            worked_seconds = worked.num_seconds(),
                            "Negative worked duration at time-out clamped to zero"
                        );
                        worked = Duration::zero();
                    }

                    session.time_out_at = Some(now);
                    session.time_out_location = Some(punch.location);
                    session.time_out_device = Some(punch.device_info);
                    session.time_out_time_zone = Some(punch.time_zone);
                    session.total_hours = Some(round2(hours_in(worked)));
                    session.open = false;
                    Ok(closed)
                }),
            )
            .await?;

        log_transitions(session.id, now, &closed);
        info!(
            session_id = session.id,
            total_hours = ?session.total_hours,
            "Time-out recorded"
        );
        Ok(session)
    }

    #[instrument(
        name = "toggle_coffee_break",
        skip(self, user),
        fields(user_id = user.user_id)
    )]
    pub async fn toggle_coffee_break(&self, user: &AuthUser) -> EngineResult<AttendanceSession> {
        self.toggle_break(user, BreakKind::Coffee).await
    }

    #[instrument(
        name = "toggle_lunch_break",
        skip(self, user),
        fields(user_id = user.user_id)
    )]
    pub async fn toggle_lunch_break(&self, user: &AuthUser) -> EngineResult<AttendanceSession> {
        self.toggle_break(user, BreakKind::Lunch).await
    }

    /// The caller's open session.
    #[instrument(name = "current_session", skip(self, user), fields(user_id = user.user_id))]
    pub async fn current_session(&self, user: &AuthUser) -> EngineResult<AttendanceSession> {
        self.store
            .find_open_session(user.user_id)
            .await?
            .ok_or_else(|| EngineError::lookup("Open session"))
    }

    async fn toggle_break(&self, user: &AuthUser, kind: BreakKind) -> EngineResult<AttendanceSession> {
        let now = self.clock.now();

        let (session, transitions) = self
            .store
            .update_open_session(
                user.user_id,
                Box::new(move |session| match kind {
                    BreakKind::Coffee => Ok(vec![session.breaks.toggle_coffee(now)?]),
                    BreakKind::Lunch => session.breaks.toggle_lunch(now),
                }),
            )
            .await?;

        log_transitions(session.id, now, &transitions);
        Ok(session)
    }

    /// Re-reads the user's enabled restrictions on every call, so an admin
    /// change only affects the next punch.
    async fn check_geofence(&self, user_id: u64, point: GeoPoint) -> EngineResult<()> {
        let allowed = self.store.enabled_locations(user_id).await?;

        if geofence::is_admissible(point, &allowed) {
            return Ok(());
        }

        warn!(
            user_id,
            latitude = point.latitude,
            longitude = point.longitude,
            "Punch outside allowed locations"
        );
        Err(EngineError::LocationDenied {
            latitude: point.latitude,
            longitude: point.longitude,
        })
    }
}

/// Audit log of break transitions, written once the store has committed them.
fn log_transitions(session_id: u64, at: DateTime<Utc>, transitions: &[BreakTransition]) {
    for step in transitions {
        match *step {
            BreakTransition::Started { kind, slot } => {
                info!(session_id, %kind, slot, %at, "Break started")
            }
            BreakTransition::Ended { kind, slot } => {
                info!(session_id, %kind, slot, %at, "Break ended")
            }
        }
    }
}
