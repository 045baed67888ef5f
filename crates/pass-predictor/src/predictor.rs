//! Fixed-step forward search for the next overhead pass

use crate::{ElementSet, Observer, PassEvent, PassResult, PredictionConfig, Result};
use chrono::{DateTime, Utc};
use orbital_mechanics::{eci_to_geodetic, gmst, Propagator, Sgp4Propagator};
use tracing::{debug, trace, warn};

#[derive(Debug, Clone)]
pub struct PassPredictor {
    config: PredictionConfig,
}

impl PassPredictor {
    pub fn new(config: PredictionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    /// Predict from the current instant.
    pub fn predict_next_pass(&self, key: &str, set: &ElementSet, observer: &Observer) -> PassResult {
        self.predict_next_pass_from(key, set, observer, Utc::now())
    }

    /// Build SGP4 state for `set` and search from `start`. A malformed
    /// element set yields a failed result rather than an error.
    pub fn predict_next_pass_from(
        &self,
        key: &str,
        set: &ElementSet,
        observer: &Observer,
        start: DateTime<Utc>,
    ) -> PassResult {
        match Sgp4Propagator::from_element_set(set) {
            Ok(propagator) => self.predict_from(key, &propagator, observer, start),
            Err(e) => {
                warn!(object = key, "Cannot build propagator: {}", e);
                PassResult::failed(key, e.to_string())
            }
        }
    }

    pub fn predict_from<P: Propagator + ?Sized>(
        &self,
        key: &str,
        propagator: &P,
        observer: &Observer,
        start: DateTime<Utc>,
    ) -> PassResult {
        match self.find_pass(propagator, observer, start) {
            Some(event) => {
                debug!(
                    object = key,
                    step = event.step_index,
                    distance_km = event.distance_km,
                    "Pass found at {}",
                    event.instant
                );
                PassResult::found(key, event)
            }
            None => {
                debug!(object = key, "No pass within {} from {}", self.config.horizon(), start);
                PassResult::not_found(key)
            }
        }
    }

    /// First sample whose sub-satellite point is within the threshold.
    /// Samples with no propagation solution are skipped.
    pub fn find_pass<P: Propagator + ?Sized>(
        &self,
        propagator: &P,
        observer: &Observer,
        start: DateTime<Utc>,
    ) -> Option<PassEvent> {
        let observer_point = observer.surface_point();

        self.sample_instants(start).find_map(|(step_index, instant)| {
            let eci = propagator.propagate(instant).eci?;
            let point = eci_to_geodetic(&eci, gmst(instant));
            let distance_km = observer_point.surface_distance_km(&point);

            trace!(
                step = step_index,
                lat = point.latitude,
                lon = point.longitude,
                distance_km,
                "sample"
            );

            (distance_km < self.config.threshold_km).then_some(PassEvent {
                instant,
                step_index,
                sub_satellite_point: point,
                distance_km,
            })
        })
    }

    /// `start + i·step` for `i in 0..max_steps`, stopping early if time overflows.
    pub fn sample_instants(
        &self,
        start: DateTime<Utc>,
    ) -> impl Iterator<Item = (u32, DateTime<Utc>)> + '_ {
        let step = self.config.step();
        (0..self.config.max_steps).map_while(move |i| {
            let offset = step.checked_mul(i as i32)?;
            start.checked_add_signed(offset).map(|instant| (i, instant))
        })
    }
}


// ============================================================================
// Property-based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn fuzz_sample_instants_bounded_and_increasing(
            step_seconds in 1u32..=86_400,
            max_steps in 1u32..=200,
            start_secs in 0i64..4_000_000_000,
        ) {
            let predictor = PassPredictor::new(PredictionConfig {
                step_seconds,
                max_steps,
                threshold_km: 1000.0,
            })
            .unwrap();
            let start = DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(start_secs);

            let samples: Vec<_> = predictor.sample_instants(start).collect();
            prop_assert_eq!(samples.len(), max_steps as usize);
            prop_assert_eq!(samples[0], (0, start));

            for (expected_index, pair) in samples.windows(2).enumerate() {
                let (i, earlier) = pair[0];
                let (j, later) = pair[1];
                prop_assert_eq!(i as usize, expected_index);
                prop_assert_eq!(j, i + 1);
                prop_assert_eq!(later - earlier, Duration::seconds(step_seconds as i64));
            }

            let (_, last) = samples[samples.len() - 1];
            prop_assert!(last - start < predictor.config().horizon());
        }
    }
}
