//! Tenant administration of the engine's inputs: pay rates, payroll
//! settings, allowed locations and per-user restrictions.

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use super::AttendanceEngine;
use crate::auth::auth::AuthUser;
use crate::error::{EngineError, EngineResult};
use crate::model::location::{AllowedLocation, LocationRestriction, NewAllowedLocation};
use crate::model::payroll::{CutoffCycle, PayRate, PayType, PayrollSettings};

impl AttendanceEngine {
    #[instrument(name = "set_pay_rate", skip(self, requester), fields(requester_id = requester.user_id))]
    pub async fn set_pay_rate(
        &self,
        requester: &AuthUser,
        user_id: u64,
        pay_type: PayType,
        rate: Decimal,
    ) -> EngineResult<PayRate> {
        let rate = PayRate {
            user_id,
            pay_type,
            rate,
        }
        .normalized()?;
        self.authorize_privileged(requester, user_id).await?;

        let stored = self.store.upsert_pay_rate(rate).await?;

        info!(user_id, %pay_type, rate = %stored.rate, "Pay rate updated");
        Ok(stored)
    }

    #[instrument(
        name = "set_payroll_settings",
        skip(self, requester, currency),
        fields(requester_id = requester.user_id, tenant_id = requester.tenant_id)
    )]
    pub async fn set_payroll_settings(
        &self,
        requester: &AuthUser,
        cutoff_cycle: CutoffCycle,
        currency: String,
        overtime_rate_multiplier: Decimal,
    ) -> EngineResult<PayrollSettings> {
        require_privileged(requester)?;
        let settings = PayrollSettings {
            tenant_id: requester.tenant_id,
            cutoff_cycle,
            currency,
            overtime_rate_multiplier,
        }
        .normalized()?;

        let settings = self.store.upsert_payroll_settings(settings).await?;

        info!(
            %cutoff_cycle,
            currency = %settings.currency,
            multiplier = %settings.overtime_rate_multiplier,
            "Payroll settings updated"
        );
        Ok(settings)
    }

    #[instrument(
        name = "add_allowed_location",
        skip(self, requester, location),
        fields(requester_id = requester.user_id, tenant_id = requester.tenant_id)
    )]
    pub async fn add_allowed_location(
        &self,
        requester: &AuthUser,
        location: NewAllowedLocation,
    ) -> EngineResult<AllowedLocation> {
        require_privileged(requester)?;
        let location = NewAllowedLocation {
            tenant_id: requester.tenant_id,
            ..location
        };
        location.validate()?;

        let created = self.store.create_allowed_location(location).await?;

        info!(location_id = created.id, radius_meters = created.radius_meters, "Allowed location created");
        Ok(created)
    }

    /// Enables or disables one of the user's restriction rows. Takes effect
    /// from the user's next punch.
    #[instrument(
        name = "set_location_restriction",
        skip(self, requester),
        fields(requester_id = requester.user_id, tenant_id = requester.tenant_id)
    )]
    pub async fn set_location_restriction(
        &self,
        requester: &AuthUser,
        user_id: u64,
        location_id: u64,
        enabled: bool,
    ) -> EngineResult<LocationRestriction> {
        self.authorize_privileged(requester, user_id).await?;

        let location = self
            .store
            .find_allowed_location(location_id)
            .await?
            .ok_or_else(|| EngineError::lookup("Allowed location"))?;
        if location.tenant_id != requester.tenant_id {
            warn!(location_id, "Restriction against another tenant's location rejected");
            return Err(EngineError::Forbidden);
        }

        let restriction = self
            .store
            .set_restriction(LocationRestriction {
                user_id,
                location_id,
                enabled,
            })
            .await?;

        info!(user_id, location_id, enabled, "Location restriction updated");
        Ok(restriction)
    }
}

fn require_privileged(requester: &AuthUser) -> EngineResult<()> {
    if requester.role.is_privileged() {
        Ok(())
    } else {
        Err(EngineError::Forbidden)
    }
}
