//! Orbital Mechanics Library
//!
//! SGP4 propagation, ECI/geodetic coordinate transforms and great-circle
//! distance for ground-observer pass prediction.
//!
//! The propagation math itself lives in the `sgp4` crate; this crate wraps it
//! behind the [`propagation::Propagator`] trait so callers can swap in their
//! own position source.

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod geodesy;
pub mod propagation;
pub mod transforms;

pub use geodesy::haversine_km;
pub use propagation::{Propagator, Sgp4Propagator};
pub use transforms::{eci_to_geodetic, geodetic_to_eci, gmst};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrbitalError {
    #[error("Malformed element set: {0}")]
    MalformedElementSet(String),
    #[error("Propagation invalid: {0}")]
    PropagationInvalid(String),
}

pub type Result<T> = std::result::Result<T, OrbitalError>;

/// Earth-centred inertial (TEME) position in km.
pub type EciPosition = Vector3<f64>;

/// Raw two-line element set as supplied by an element feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSet {
    pub line1: String,
    pub line2: String,
}

impl ElementSet {
    pub fn new(line1: impl Into<String>, line2: impl Into<String>) -> Self {
        Self {
            line1: line1.into(),
            line2: line2.into(),
        }
    }
}

/// One propagation step. `eci` is `None` when SGP4 had no solution at
/// `instant` (decayed orbit, numerical breakdown, unrepresentable time).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub instant: DateTime<Utc>,
    pub eci: Option<EciPosition>,
}

impl PositionSample {
    pub fn valid(instant: DateTime<Utc>, eci: EciPosition) -> Self {
        Self {
            instant,
            eci: Some(eci),
        }
    }

    pub fn invalid(instant: DateTime<Utc>) -> Self {
        Self { instant, eci: None }
    }

    pub fn is_valid(&self) -> bool {
        self.eci.is_some()
    }
}

/// Geodetic position in degrees; altitude above the WGS-84 ellipsoid in km.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_km: f64,
}

impl GeodeticPoint {
    /// Surface point (zero altitude).
    pub fn surface(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude_km: 0.0,
        }
    }

    /// Great-circle distance between the surface projections of two points.
    pub fn surface_distance_km(&self, other: &GeodeticPoint) -> f64 {
        haversine_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_sample_validity() {
        let now = Utc::now();
        assert!(PositionSample::valid(now, Vector3::new(7000.0, 0.0, 0.0)).is_valid());
        assert!(!PositionSample::invalid(now).is_valid());
    }

    #[test]
    fn test_surface_distance_ignores_altitude() {
        let ground = GeodeticPoint::surface(10.0, 20.0);
        let high = GeodeticPoint {
            latitude: 10.0,
            longitude: 20.0,
            altitude_km: 700.0,
        };
        assert_eq!(ground.surface_distance_km(&high), 0.0);
    }
}
