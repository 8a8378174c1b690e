use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{EngineError, EngineResult};

/// A coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[schema(example = 14.5547)]
    pub latitude: f64,
    #[schema(example = 121.0244)]
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(EngineError::invalid("latitude must be between -90 and 90"));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(EngineError::invalid(
                "longitude must be between -180 and 180",
            ));
        }
        Ok(())
    }
}

/// A circular admissible area owned by a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AllowedLocation {
    pub id: u64,
    pub tenant_id: u64,
    #[schema(example = "Head office")]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[schema(example = 100.0)]
    pub radius_meters: f64,
}

impl AllowedLocation {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone)]
pub struct NewAllowedLocation {
    pub tenant_id: u64,
    pub name: String,
    pub center: GeoPoint,
    pub radius_meters: f64,
}

impl NewAllowedLocation {
    pub fn validate(&self) -> EngineResult<()> {
        self.center.validate()?;
        if !self.radius_meters.is_finite() || self.radius_meters <= 0.0 {
            return Err(EngineError::invalid("radius_meters must be positive"));
        }
        if self.name.trim().is_empty() {
            return Err(EngineError::invalid("name must not be empty"));
        }
        Ok(())
    }
}

/// Per-user link to an allowed location. Enabled rows restrict punches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LocationRestriction {
    pub user_id: u64,
    pub location_id: u64,
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_out_of_range_coordinates() {
        assert!(GeoPoint::new(91.0, 0.0).validate().is_err());
        assert!(GeoPoint::new(0.0, -180.5).validate().is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).validate().is_err());
        assert!(GeoPoint::new(-33.8688, 151.2093).validate().is_ok());
    }

    #[test]
    fn test_new_location_requires_positive_radius() {
        let location = NewAllowedLocation {
            tenant_id: 1,
            name: "Warehouse".to_string(),
            center: GeoPoint::new(10.0, 10.0),
            radius_meters: 0.0,
        };
        assert!(location.validate().is_err());
    }
}
