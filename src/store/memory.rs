use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{EngineError, EngineResult};
use crate::model::attendance::{AttendanceSession, NewSession};
use crate::model::break_slot::BreakTransition;
use crate::model::location::{AllowedLocation, LocationRestriction, NewAllowedLocation};
use crate::model::payroll::{PayRate, PayrollFigures, PayrollRecord, PayrollSettings};
use crate::model::user::UserAccount;
use crate::store::{AttendanceStore, SessionUpdate};

#[derive(Default)]
struct MemoryState {
    users: HashMap<u64, UserAccount>,
    sessions: Vec<AttendanceSession>,
    locations: Vec<AllowedLocation>,
    restrictions: HashMap<(u64, u64), LocationRestriction>,
    pay_rates: HashMap<u64, PayRate>,
    settings: HashMap<u64, PayrollSettings>,
    payroll: Vec<PayrollRecord>,
}

/// In-process store. A single mutex makes every trait method atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user account. Accounts are owned by the identity service
    /// in production, so the trait has no way to create them.
    pub fn add_user(&self, user_id: u64, tenant_id: u64) -> EngineResult<()> {
        let mut state = self.lock()?;
        state.users.insert(
            user_id,
            UserAccount {
                id: user_id,
                tenant_id,
                is_clocked_in: false,
            },
        );
        Ok(())
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| EngineError::internal("memory store lock poisoned"))
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn find_user(&self, user_id: u64) -> EngineResult<Option<UserAccount>> {
        Ok(self.lock()?.users.get(&user_id).cloned())
    }

    async fn find_open_session(&self, user_id: u64) -> EngineResult<Option<AttendanceSession>> {
        let state = self.lock()?;
        Ok(state
            .sessions
            .iter()
            .find(|s| s.user_id == user_id && s.open)
            .cloned())
    }

    async fn open_session(&self, new: NewSession) -> EngineResult<AttendanceSession> {
        let mut state = self.lock()?;

        if !state.users.contains_key(&new.user_id) {
            return Err(EngineError::lookup("User"));
        }
        if state.sessions.iter().any(|s| s.user_id == new.user_id && s.open) {
            return Err(EngineError::conflict("Already clocked in"));
        }

        let user_id = new.user_id;
        let session = new.into_session(state.sessions.len() as u64 + 1);
        state.sessions.push(session.clone());
        if let Some(user) = state.users.get_mut(&user_id) {
            user.is_clocked_in = true;
        }

        Ok(session)
    }

    async fn update_open_session(
        &self,
        user_id: u64,
        update: SessionUpdate,
    ) -> EngineResult<(AttendanceSession, Vec<BreakTransition>)> {
        let mut state = self.lock()?;

        let index = state
            .sessions
            .iter()
            .position(|s| s.user_id == user_id && s.open)
            .ok_or_else(|| EngineError::lookup("Open session"))?;

        let mut session = state.sessions[index].clone();
        let transitions = update(&mut session)?;

        state.sessions[index] = session.clone();
        if !session.open {
            if let Some(user) = state.users.get_mut(&user_id) {
                user.is_clocked_in = false;
            }
        }

        Ok((session, transitions))
    }

    async fn sessions_between(
        &self,
        user_id: u64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<Vec<AttendanceSession>> {
        let state = self.lock()?;
        let mut sessions: Vec<AttendanceSession> = state
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.time_in_at >= from && s.time_in_at < to)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(sessions)
    }

    async fn enabled_locations(&self, user_id: u64) -> EngineResult<Vec<AllowedLocation>> {
        let state = self.lock()?;
        let mut enabled: Vec<&LocationRestriction> = state
            .restrictions
            .values()
            .filter(|r| r.user_id == user_id && r.enabled)
            .collect();
        enabled.sort_by_key(|r| r.location_id);

        Ok(enabled
            .into_iter()
            .filter_map(|r| state.locations.iter().find(|l| l.id == r.location_id))
            .cloned()
            .collect())
    }

    async fn pay_rate(&self, user_id: u64) -> EngineResult<Option<PayRate>> {
        Ok(self.lock()?.pay_rates.get(&user_id).cloned())
    }

    async fn payroll_settings(&self, tenant_id: u64) -> EngineResult<Option<PayrollSettings>> {
        Ok(self.lock()?.settings.get(&tenant_id).cloned())
    }

    async fn upsert_payroll_record(&self, figures: PayrollFigures) -> EngineResult<PayrollRecord> {
        let mut state = self.lock()?;

        let existing = state.payroll.iter_mut().find(|r| {
            r.figures.user_id == figures.user_id
                && r.figures.start_date == figures.start_date
                && r.figures.end_date == figures.end_date
        });

        if let Some(record) = existing {
            record.figures = figures;
            return Ok(record.clone());
        }

        let record = PayrollRecord {
            id: state.payroll.len() as u64 + 1,
            figures,
        };
        state.payroll.push(record.clone());
        Ok(record)
    }

    async fn payroll_records(&self, user_id: u64) -> EngineResult<Vec<PayrollRecord>> {
        let state = self.lock()?;
        let mut records: Vec<PayrollRecord> = state
            .payroll
            .iter()
            .filter(|r| r.figures.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.figures.start_date.cmp(&a.figures.start_date));
        Ok(records)
    }

    async fn upsert_pay_rate(&self, rate: PayRate) -> EngineResult<PayRate> {
        self.lock()?.pay_rates.insert(rate.user_id, rate.clone());
        Ok(rate)
    }

    async fn upsert_payroll_settings(
        &self,
        settings: PayrollSettings,
    ) -> EngineResult<PayrollSettings> {
        self.lock()?
            .settings
            .insert(settings.tenant_id, settings.clone());
        Ok(settings)
    }

    async fn create_allowed_location(
        &self,
        location: NewAllowedLocation,
    ) -> EngineResult<AllowedLocation> {
        let mut state = self.lock()?;
        let created = AllowedLocation {
            id: state.locations.len() as u64 + 1,
            tenant_id: location.tenant_id,
            name: location.name,
            latitude: location.center.latitude,
            longitude: location.center.longitude,
            radius_meters: location.radius_meters,
        };
        state.locations.push(created.clone());
        Ok(created)
    }

    async fn find_allowed_location(
        &self,
        location_id: u64,
    ) -> EngineResult<Option<AllowedLocation>> {
        let state = self.lock()?;
        Ok(state.locations.iter().find(|l| l.id == location_id).cloned())
    }

    async fn set_restriction(
        &self,
        restriction: LocationRestriction,
    ) -> EngineResult<LocationRestriction> {
        self.lock()?.restrictions.insert(
            (restriction.user_id, restriction.location_id),
            restriction.clone(),
        );
        Ok(restriction)
    }
}
