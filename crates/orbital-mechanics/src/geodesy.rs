//! Great-circle distance on a spherical Earth.

/// Mean Earth radius used for surface distances (km)
pub const MEAN_EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in km between two latitude/longitude pairs in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    // Rounding can push `a` past 1 for near-antipodal pairs
    let a = ((d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2))
    .min(1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    MEAN_EARTH_RADIUS_KM * c
}


// ============================================================================
// Property-based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn lat() -> impl Strategy<Value = f64> {
        -90.0f64..=90.0
    }

    fn lon() -> impl Strategy<Value = f64> {
        -180.0f64..=180.0
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(2000))]

        #[test]
        fn fuzz_distance_to_self_is_zero(a in lat(), b in lon()) {
            prop_assert!(haversine_km(a, b, a, b).abs() < 1e-9);
        }

        #[test]
        fn fuzz_distance_symmetric(a1 in lat(), b1 in lon(), a2 in lat(), b2 in lon()) {
            let ab = haversine_km(a1, b1, a2, b2);
            let ba = haversine_km(a2, b2, a1, b1);
            prop_assert!((ab - ba).abs() < 1e-6, "{} != {}", ab, ba);
        }

        #[test]
        fn fuzz_distance_bounded(a1 in lat(), b1 in lon(), a2 in lat(), b2 in lon()) {
            let d = haversine_km(a1, b1, a2, b2);
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * MEAN_EARTH_RADIUS_KM + 1e-6);
        }
    }
}
