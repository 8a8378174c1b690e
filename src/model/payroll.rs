use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::{EngineError, EngineResult};

/// Largest value of the `DECIMAL(12, 2)` rate column.
pub const MAX_PAY_RATE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);
/// Largest value of the `DECIMAL(6, 3)` multiplier column.
pub const MAX_OVERTIME_MULTIPLIER: Decimal = Decimal::from_parts(999_999, 0, 0, false, 3);
const MAX_CURRENCY_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PayType {
    Hourly,
    Monthly,
}

/// Exactly one per user (upsert semantics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayRate {
    pub user_id: u64,
    pub pay_type: PayType,
    #[schema(example = "20.00", value_type = String)]
    pub rate: Decimal,
}

impl PayRate {
    /// Checks the rate fits its column exactly and pads it to 2 decimal
    /// places, so every store hands back the value it will compute with.
    pub fn normalized(mut self) -> EngineResult<Self> {
        if self.rate.is_sign_negative() {
            return Err(EngineError::invalid("rate must not be negative"));
        }
        if self.rate.normalize().scale() > 2 {
            return Err(EngineError::invalid("rate must have at most 2 decimal places"));
        }
        if self.rate > MAX_PAY_RATE {
            return Err(EngineError::invalid(format!("rate must not exceed {MAX_PAY_RATE}")));
        }

        self.rate = self.rate.normalize();
        self.rate.rescale(2);
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CutoffCycle {
    Weekly,
    BiWeekly,
    SemiMonthly,
    Monthly,
}

/// One row per tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayrollSettings {
    pub tenant_id: u64,
    pub cutoff_cycle: CutoffCycle,
    #[schema(example = "USD")]
    pub currency: String,
    #[schema(example = "1.5", value_type = String)]
    pub overtime_rate_multiplier: Decimal,
}

impl PayrollSettings {
    /// Upper-cases the currency and checks both fields fit their columns.
    pub fn normalized(mut self) -> EngineResult<Self> {
        let multiplier = self.overtime_rate_multiplier;
        if multiplier < Decimal::ONE {
            return Err(EngineError::invalid(
                "overtime_rate_multiplier must be at least 1",
            ));
        }
        if multiplier.normalize().scale() > 3 {
            return Err(EngineError::invalid(
                "overtime_rate_multiplier must have at most 3 decimal places",
            ));
        }
        if multiplier > MAX_OVERTIME_MULTIPLIER {
            return Err(EngineError::invalid(format!(
                "overtime_rate_multiplier must not exceed {MAX_OVERTIME_MULTIPLIER}"
            )));
        }

        let currency = self.currency.trim().to_uppercase();
        if currency.is_empty() {
            return Err(EngineError::invalid("currency must not be empty"));
        }
        if currency.chars().count() > MAX_CURRENCY_LEN {
            return Err(EngineError::invalid(format!(
                "currency must be at most {MAX_CURRENCY_LEN} characters"
            )));
        }

        self.currency = currency;
        self.overtime_rate_multiplier = multiplier.normalize();
        self.overtime_rate_multiplier.rescale(3);
        Ok(self)
    }
}

/// Computed figures for one `(user_id, start_date, end_date)` range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayrollFigures {
    pub user_id: u64,
    #[schema(example = "2026-03-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-15", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub pay_type: PayType,
    #[schema(example = "46.25", value_type = String)]
    pub hours_worked: Decimal,
    #[schema(example = "6.25", value_type = String)]
    pub overtime_hours: Decimal,
    #[schema(example = "187.50", value_type = String)]
    pub overtime_pay: Decimal,
    #[schema(example = "987.50", value_type = String)]
    pub gross_pay: Decimal,
    #[schema(example = "987.50", value_type = String)]
    pub net_pay: Decimal,
}

/// A stored payroll row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayrollRecord {
    pub id: u64,
    #[serde(flatten)]
    pub figures: PayrollFigures,
}
