use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool};

use crate::error::{EngineError, EngineResult};
use crate::model::attendance::{AttendanceSession, NewSession};
use crate::model::break_slot::{BreakSchedule, BreakSlot, BreakTransition};
use crate::model::location::{AllowedLocation, GeoPoint, LocationRestriction, NewAllowedLocation};
use crate::model::payroll::{
    CutoffCycle, PayRate, PayType, PayrollFigures, PayrollRecord, PayrollSettings,
};
use crate::model::user::UserAccount;
use crate::store::{AttendanceStore, SessionUpdate};

const SESSION_COLUMNS: &str = "id, user_id, time_in_at, time_out_at, is_open, \
    time_in_latitude, time_in_longitude, time_out_latitude, time_out_longitude, \
    time_in_device, time_out_device, time_in_time_zone, time_out_time_zone, \
    coffee_break1_start, coffee_break1_end, coffee_break2_start, coffee_break2_end, \
    lunch_break_start, lunch_break_end, total_hours";

const PAYROLL_COLUMNS: &str = "id, user_id, start_date, end_date, pay_type, hours_worked, \
    overtime_hours, overtime_pay, gross_pay, net_pay";

#[derive(FromRow)]
struct SessionRow {
    id: u64,
    user_id: u64,
    time_in_at: DateTime<Utc>,
    time_out_at: Option<DateTime<Utc>>,
    is_open: bool,
    time_in_latitude: f64,
    time_in_longitude: f64,
    time_out_latitude: Option<f64>,
    time_out_longitude: Option<f64>,
    time_in_device: String,
    time_out_device: Option<String>,
    time_in_time_zone: String,
    time_out_time_zone: Option<String>,
    coffee_break1_start: Option<DateTime<Utc>>,
    coffee_break1_end: Option<DateTime<Utc>>,
    coffee_break2_start: Option<DateTime<Utc>>,
    coffee_break2_end: Option<DateTime<Utc>>,
    lunch_break_start: Option<DateTime<Utc>>,
    lunch_break_end: Option<DateTime<Utc>>,
    total_hours: Option<Decimal>,
}

impl TryFrom<SessionRow> for AttendanceSession {
    type Error = EngineError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let corrupt = || EngineError::internal(format!("session {} has corrupt break data", row.id));

        let coffee1 = BreakSlot::from_columns(row.coffee_break1_start, row.coffee_break1_end)
            .ok_or_else(corrupt)?;
        let coffee2 = BreakSlot::from_columns(row.coffee_break2_start, row.coffee_break2_end)
            .ok_or_else(corrupt)?;
        let lunch = BreakSlot::from_columns(row.lunch_break_start, row.lunch_break_end)
            .ok_or_else(corrupt)?;
        let breaks = BreakSchedule::from_slots(coffee1, coffee2, lunch).ok_or_else(corrupt)?;

        let time_out_location = match (row.time_out_latitude, row.time_out_longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint::new(latitude, longitude)),
            _ => None,
        };

        Ok(AttendanceSession {
            id: row.id,
            user_id: row.user_id,
            time_in_at: row.time_in_at,
            time_out_at: row.time_out_at,
            open: row.is_open,
            time_in_location: GeoPoint::new(row.time_in_latitude, row.time_in_longitude),
            time_out_location,
            time_in_device: row.time_in_device,
            time_out_device: row.time_out_device,
            time_in_time_zone: row.time_in_time_zone,
            time_out_time_zone: row.time_out_time_zone,
            breaks,
            total_hours: row.total_hours,
        })
    }
}

#[derive(FromRow)]
struct PayRateRow {
    user_id: u64,
    pay_type: String,
    rate: Decimal,
}

#[derive(FromRow)]
struct PayrollSettingsRow {
    tenant_id: u64,
    cutoff_cycle: String,
    currency: String,
    overtime_rate_multiplier: Decimal,
}

#[derive(FromRow)]
struct PayrollRecordRow {
    id: u64,
    user_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    pay_type: String,
    hours_worked: Decimal,
    overtime_hours: Decimal,
    overtime_pay: Decimal,
    gross_pay: Decimal,
    net_pay: Decimal,
}

fn parse_column<T: FromStr>(column: &str, value: &str) -> EngineResult<T> {
    value
        .parse()
        .map_err(|_| EngineError::internal(format!("unexpected {column} value '{value}'")))
}

impl TryFrom<PayrollRecordRow> for PayrollRecord {
    type Error = EngineError;

    fn try_from(row: PayrollRecordRow) -> Result<Self, Self::Error> {
        Ok(PayrollRecord {
            id: row.id,
            figures: PayrollFigures {
                user_id: row.user_id,
                start_date: row.start_date,
                end_date: row.end_date,
                pay_type: parse_column::<PayType>("pay_type", &row.pay_type)?,
                hours_worked: row.hours_worked,
                overtime_hours: row.overtime_hours,
                overtime_pay: row.overtime_pay,
                gross_pay: row.gross_pay,
                net_pay: row.net_pay,
            },
        })
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// MySQL-backed store.
///
/// "One open session per user" is the `uq_attendance_one_open_per_user`
/// index on the generated `open_user_id` column; mutations of the open row
/// happen under `SELECT ... FOR UPDATE` inside a transaction.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn find_user(&self, user_id: u64) -> EngineResult<Option<UserAccount>> {
        let user = sqlx::query_as::<_, UserAccount>(
            "SELECT id, tenant_id, is_clocked_in FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_open_session(&self, user_id: u64) -> EngineResult<Option<AttendanceSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM attendance_sessions WHERE user_id = ? AND is_open = TRUE"
        );
        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(AttendanceSession::try_from).transpose()
    }

    async fn open_session(&self, new: NewSession) -> EngineResult<AttendanceSession> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO attendance_sessions
                (user_id, time_in_at, is_open, time_in_latitude, time_in_longitude,
                 time_in_device, time_in_time_zone)
            VALUES (?, ?, TRUE, ?, ?, ?, ?)
            "#,
        )
        .bind(new.user_id)
        .bind(new.time_in_at)
        .bind(new.location.latitude)
        .bind(new.location.longitude)
        .bind(new.device.as_str())
        .bind(new.time_zone.as_str())
        .execute(&mut *tx)
        .await;

        let id = match result {
            Ok(done) => done.last_insert_id(),
            // a concurrent time-in committed first
            Err(e) if is_unique_violation(&e) => {
                return Err(EngineError::conflict("Already clocked in"));
            }
            Err(e) => return Err(e.into()),
        };

        sqlx::query("UPDATE users SET is_clocked_in = TRUE WHERE id = ?")
            .bind(new.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(new.into_session(id))
    }

    async fn update_open_session(
        &self,
        user_id: u64,
        update: SessionUpdate,
    ) -> EngineResult<(AttendanceSession, Vec<BreakTransition>)> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM attendance_sessions \
             WHERE user_id = ? AND is_open = TRUE FOR UPDATE"
        );
        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| EngineError::lookup("Open session"))?;

        let mut session = AttendanceSession::try_from(row)?;
        let transitions = update(&mut session)?;

        let breaks = session.breaks;
        sqlx::query(
            r#"
            UPDATE attendance_sessions
            SET time_out_at = ?, is_open = ?,
                time_out_latitude = ?, time_out_longitude = ?,
                time_out_device = ?, time_out_time_zone = ?,
                coffee_break1_start = ?, coffee_break1_end = ?,
                coffee_break2_start = ?, coffee_break2_end = ?,
                lunch_break_start = ?, lunch_break_end = ?,
                total_hours = ?
            WHERE id = ?
            "#,
        )
        .bind(session.time_out_at)
        .bind(session.open)
        .bind(session.time_out_location.map(|p| p.latitude))
        .bind(session.time_out_location.map(|p| p.longitude))
        .bind(session.time_out_device.as_deref())
        .bind(session.time_out_time_zone.as_deref())
        .bind(breaks.coffee(0).start())
        .bind(breaks.coffee(0).end())
        .bind(breaks.coffee(1).start())
        .bind(breaks.coffee(1).end())
        .bind(breaks.lunch().start())
        .bind(breaks.lunch().end())
        .bind(session.total_hours)
        .bind(session.id)
        .execute(&mut *tx)
        .await?;

        if !session.open {
            sqlx::query("UPDATE users SET is_clocked_in = FALSE WHERE id = ?")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok((session, transitions))
    }

    async fn sessions_between(
        &self,
        user_id: u64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<Vec<AttendanceSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM attendance_sessions \
             WHERE user_id = ? AND time_in_at >= ? AND time_in_at < ? \
             ORDER BY id DESC"
        );
        let rows = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(AttendanceSession::try_from).collect()
    }

    async fn enabled_locations(&self, user_id: u64) -> EngineResult<Vec<AllowedLocation>> {
        let locations = sqlx::query_as::<_, AllowedLocation>(
            r#"
            SELECT l.id, l.tenant_id, l.name, l.latitude, l.longitude, l.radius_meters
            FROM location_restrictions r
            JOIN allowed_locations l ON l.id = r.location_id
            WHERE r.user_id = ? AND r.enabled = TRUE
            ORDER BY l.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    async fn pay_rate(&self, user_id: u64) -> EngineResult<Option<PayRate>> {
        let row = sqlx::query_as::<_, PayRateRow>(
            "SELECT user_id, pay_type, rate FROM pay_rates WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(PayRate {
                user_id: row.user_id,
                pay_type: parse_column("pay_type", &row.pay_type)?,
                rate: row.rate,
            })
        })
        .transpose()
    }

    async fn payroll_settings(&self, tenant_id: u64) -> EngineResult<Option<PayrollSettings>> {
        let row = sqlx::query_as::<_, PayrollSettingsRow>(
            r#"
            SELECT tenant_id, cutoff_cycle, currency, overtime_rate_multiplier
            FROM payroll_settings
            WHERE tenant_id = ?
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(PayrollSettings {
                tenant_id: row.tenant_id,
                cutoff_cycle: parse_column::<CutoffCycle>("cutoff_cycle", &row.cutoff_cycle)?,
                currency: row.currency,
                overtime_rate_multiplier: row.overtime_rate_multiplier,
            })
        })
        .transpose()
    }

    async fn upsert_payroll_record(&self, figures: PayrollFigures) -> EngineResult<PayrollRecord> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO payroll_records
                (user_id, start_date, end_date, pay_type, hours_worked,
                 overtime_hours, overtime_pay, gross_pay, net_pay)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                pay_type = VALUES(pay_type),
                hours_worked = VALUES(hours_worked),
                overtime_hours = VALUES(overtime_hours),
                overtime_pay = VALUES(overtime_pay),
                gross_pay = VALUES(gross_pay),
                net_pay = VALUES(net_pay)
            "#,
        )
        .bind(figures.user_id)
        .bind(figures.start_date)
        .bind(figures.end_date)
        .bind(figures.pay_type.to_string())
        .bind(figures.hours_worked)
        .bind(figures.overtime_hours)
        .bind(figures.overtime_pay)
        .bind(figures.gross_pay)
        .bind(figures.net_pay)
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            "SELECT {PAYROLL_COLUMNS} FROM payroll_records \
             WHERE user_id = ? AND start_date = ? AND end_date = ?"
        );
        let row = sqlx::query_as::<_, PayrollRecordRow>(&sql)
            .bind(figures.user_id)
            .bind(figures.start_date)
            .bind(figures.end_date)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        PayrollRecord::try_from(row)
    }

    async fn payroll_records(&self, user_id: u64) -> EngineResult<Vec<PayrollRecord>> {
        let sql = format!(
            "SELECT {PAYROLL_COLUMNS} FROM payroll_records \
             WHERE user_id = ? ORDER BY start_date DESC"
        );
        let rows = sqlx::query_as::<_, PayrollRecordRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(PayrollRecord::try_from).collect()
    }

    async fn upsert_pay_rate(&self, rate: PayRate) -> EngineResult<PayRate> {
        sqlx::query(
            r#"
            INSERT INTO pay_rates (user_id, pay_type, rate)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE pay_type = VALUES(pay_type), rate = VALUES(rate)
            "#,
        )
        .bind(rate.user_id)
        .bind(rate.pay_type.to_string())
        .bind(rate.rate)
        .execute(&self.pool)
        .await?;

        Ok(rate)
    }

    async fn upsert_payroll_settings(
        &self,
        settings: PayrollSettings,
    ) -> EngineResult<PayrollSettings> {
        sqlx::query(
            r#"
            INSERT INTO payroll_settings
                (tenant_id, cutoff_cycle, currency, overtime_rate_multiplier)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                cutoff_cycle = VALUES(cutoff_cycle),
                currency = VALUES(currency),
                overtime_rate_multiplier = VALUES(overtime_rate_multiplier)
            "#,
        )
        .bind(settings.tenant_id)
        .bind(settings.cutoff_cycle.to_string())
        .bind(settings.currency.as_str())
        .bind(settings.overtime_rate_multiplier)
        .execute(&self.pool)
        .await?;

        Ok(settings)
    }

    async fn create_allowed_location(
        &self,
        location: NewAllowedLocation,
    ) -> EngineResult<AllowedLocation> {
        let done = sqlx::query(
            r#"
            INSERT INTO allowed_locations (tenant_id, name, latitude, longitude, radius_meters)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(location.tenant_id)
        .bind(location.name.as_str())
        .bind(location.center.latitude)
        .bind(location.center.longitude)
        .bind(location.radius_meters)
        .execute(&self.pool)
        .await?;

        Ok(AllowedLocation {
            id: done.last_insert_id(),
            tenant_id: location.tenant_id,
            name: location.name,
            latitude: location.center.latitude,
            longitude: location.center.longitude,
            radius_meters: location.radius_meters,
        })
    }

    async fn find_allowed_location(
        &self,
        location_id: u64,
    ) -> EngineResult<Option<AllowedLocation>> {
        let location = sqlx::query_as::<_, AllowedLocation>(
            r#"
            SELECT id, tenant_id, name, latitude, longitude, radius_meters
            FROM allowed_locations
            WHERE id = ?
            "#,
        )
        .bind(location_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }

    async fn set_restriction(
        &self,
        restriction: LocationRestriction,
    ) -> EngineResult<LocationRestriction> {
        sqlx::query(
            r#"
            INSERT INTO location_restrictions (user_id, location_id, enabled)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE enabled = VALUES(enabled)
            "#,
        )
        .bind(restriction.user_id)
        .bind(restriction.location_id)
        .bind(restriction.enabled)
        .execute(&self.pool)
        .await?;

        Ok(restriction)
    }
}
