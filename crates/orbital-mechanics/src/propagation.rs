//! SGP4 propagation adapter.

use crate::{ElementSet, EciPosition, OrbitalError, PositionSample, Result};
use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use std::fmt;
use tracing::trace;

/// Source of ECI positions over time.
///
/// Implementations must not fail: an instant with no solution yields
/// [`PositionSample::invalid`] so a search loop can skip it and carry on.
pub trait Propagator {
    fn propagate(&self, time: DateTime<Utc>) -> PositionSample;
}

/// SGP4/SDP4 state built once from a two-line element set.
pub struct Sgp4Propagator {
    norad_id: u64,
    epoch: DateTime<Utc>,
    constants: sgp4::Constants,
}

impl fmt::Debug for Sgp4Propagator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sgp4Propagator")
            .field("norad_id", &self.norad_id)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl Sgp4Propagator {
    pub fn from_element_set(set: &ElementSet) -> Result<Self> {
        let elements = sgp4::Elements::from_tle(
            None,
            set.line1.trim_end().as_bytes(),
            set.line2.trim_end().as_bytes(),
        )
        .map_err(|e| OrbitalError::MalformedElementSet(format!("{:?}", e)))?;

        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| OrbitalError::MalformedElementSet(format!("{:?}", e)))?;

        Ok(Self {
            norad_id: elements.norad_id,
            epoch: DateTime::<Utc>::from_naive_utc_and_offset(elements.datetime, Utc),
            constants,
        })
    }

    pub fn norad_id(&self) -> u64 {
        self.norad_id
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// Propagate to `time`, reporting why there is no solution.
    pub fn try_propagate(&self, time: DateTime<Utc>) -> Result<EciPosition> {
        let minutes_since_epoch =
            time.signed_duration_since(self.epoch).num_milliseconds() as f64 / 60_000.0;

        let prediction = self
            .constants
            .propagate(minutes_since_epoch)
            .map_err(|e| OrbitalError::PropagationInvalid(format!("{:?}", e)))?;

        let [x, y, z] = prediction.position;
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(OrbitalError::PropagationInvalid(format!(
                "non-finite position at {:.3} min from epoch",
                minutes_since_epoch
            )));
        }

        Ok(Vector3::new(x, y, z))
    }
}

impl Propagator for Sgp4Propagator {
    fn propagate(&self, time: DateTime<Utc>) -> PositionSample {
        match self.try_propagate(time) {
            Ok(eci) => PositionSample::valid(time, eci),
            Err(e) => {
                trace!(norad_id = self.norad_id, %time, "no solution: {}", e);
                PositionSample::invalid(time)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::{eci_to_geodetic, gmst};
    use chrono::Duration;

    const ISS_LINE1: &str = "1 25544U 98067A   25278.49802050  .00011384  00000+0  20935-3 0  9990";
    const ISS_LINE2: &str = "2 25544  51.6327 120.3420 0000884 206.2421 153.8523 15.49697304532279";

    fn iss() -> Sgp4Propagator {
        Sgp4Propagator::from_element_set(&ElementSet::new(ISS_LINE1, ISS_LINE2)).unwrap()
    }

    #[test]
    fn test_parse_epoch_and_catalog_number() {
        let prop = iss();
        assert_eq!(prop.norad_id(), 25544);
        assert_eq!(prop.epoch().format("%Y-%m-%d").to_string(), "2025-10-05");
    }

    #[test]
    fn test_propagate_near_epoch() {
        let prop = iss();
        let time = prop.epoch() + Duration::minutes(45);
        let sample = prop.propagate(time);

        let eci = sample.eci.expect("ISS should propagate shortly after epoch");
        let radius = eci.norm();
        assert!(radius > 6_650.0 && radius < 6_900.0, "radius {} km", radius);

        let point = eci_to_geodetic(&eci, gmst(time));
        assert!(point.latitude.abs() <= 52.0, "lat {} beyond inclination", point.latitude);
        assert!(point.altitude_km > 350.0 && point.altitude_km < 480.0);
    }

    #[test]
    fn test_trailing_newline_tolerated() {
        let set = ElementSet::new(format!("{}\n", ISS_LINE1), format!("{}\r\n", ISS_LINE2));
        assert!(Sgp4Propagator::from_element_set(&set).is_ok());
    }

    #[test]
    fn test_malformed_element_set() {
        let set = ElementSet::new("1 garbage", "2 garbage");
        assert!(matches!(
            Sgp4Propagator::from_element_set(&set),
            Err(OrbitalError::MalformedElementSet(_))
        ));
    }

    #[test]
    fn test_swapped_lines_rejected() {
        let set = ElementSet::new(ISS_LINE2, ISS_LINE1);
        assert!(Sgp4Propagator::from_element_set(&set).is_err());
    }

    #[test]
    fn test_far_future_never_panics() {
        let prop = iss();
        for years in [1, 10, 50, 200] {
            let sample = prop.propagate(prop.epoch() + Duration::days(365 * years));
            if let Some(eci) = sample.eci {
                assert!(eci.iter().all(|c| c.is_finite()));
            }
        }
    }
}
