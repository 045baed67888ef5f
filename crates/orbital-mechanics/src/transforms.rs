//! Sidereal time and ECI <-> geodetic conversion on the WGS-84 ellipsoid.

use crate::{EciPosition, GeodeticPoint};
use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use std::f64::consts::{PI, TAU};

const EARTH_RADIUS_KM: f64 = 6378.137;
const EARTH_FLATTENING: f64 = 1.0 / 298.257223563;

const UNIX_EPOCH_JD: f64 = 2440587.5;
const J2000_JD: f64 = 2451545.0;

const LATITUDE_MAX_ITERATIONS: usize = 20;
const LATITUDE_TOLERANCE_RAD: f64 = 1e-6;

fn eccentricity_squared() -> f64 {
    EARTH_FLATTENING * (2.0 - EARTH_FLATTENING)
}

/// Greenwich mean sidereal time in radians, in `[0, 2π)`.
pub fn gmst(time: DateTime<Utc>) -> f64 {
    let unix_seconds = time.timestamp() as f64 + time.timestamp_subsec_millis() as f64 / 1000.0;
    let jd = unix_seconds / 86400.0 + UNIX_EPOCH_JD;
    let t = (jd - J2000_JD) / 36525.0;

    // IAU-82, seconds of time
    let gmst_sec = 67310.54841
        + (876600.0 * 3600.0 + 8640184.812866) * t
        + 0.093104 * t * t
        - 6.2e-6 * t * t * t;

    (gmst_sec / 240.0).to_radians().rem_euclid(TAU)
}

/// Convert an ECI position (km) to geodetic coordinates given the sidereal
/// angle at the same instant. Longitude lands in `[-180, 180)`.
pub fn eci_to_geodetic(eci: &EciPosition, gmst_rad: f64) -> GeodeticPoint {
    let a = EARTH_RADIUS_KM;
    let e2 = eccentricity_squared();

    let longitude = (eci.y.atan2(eci.x) - gmst_rad + PI).rem_euclid(TAU) - PI;

    let r = (eci.x * eci.x + eci.y * eci.y).sqrt();
    let mut latitude = eci.z.atan2(r);
    let mut c = 1.0;

    for _ in 0..LATITUDE_MAX_ITERATIONS {
        let previous = latitude;
        c = 1.0 / (1.0 - e2 * latitude.sin().powi(2)).sqrt();
        latitude = (eci.z + a * c * e2 * latitude.sin()).atan2(r);
        if (latitude - previous).abs() < LATITUDE_TOLERANCE_RAD {
            break;
        }
    }

    let (sin_lat, cos_lat) = latitude.sin_cos();
    let altitude_km = if cos_lat.abs() >= sin_lat.abs() {
        r / cos_lat - a * c
    } else {
        eci.z / sin_lat - a * c * (1.0 - e2)
    };

    GeodeticPoint {
        latitude: latitude.to_degrees().clamp(-90.0, 90.0),
        longitude: longitude.to_degrees(),
        altitude_km,
    }
}

/// Convert a geodetic point to an ECI position (km) at the given sidereal angle.
pub fn geodetic_to_eci(point: &GeodeticPoint, gmst_rad: f64) -> EciPosition {
    let lat = point.latitude.to_radians();
    let lon = point.longitude.to_radians();
    let alt = point.altitude_km;
    let e2 = eccentricity_squared();

    // Radius of curvature in prime vertical
    let n = EARTH_RADIUS_KM / (1.0 - e2 * lat.sin().powi(2)).sqrt();

    let x_ecef = (n + alt) * lat.cos() * lon.cos();
    let y_ecef = (n + alt) * lat.cos() * lon.sin();
    let z_ecef = (n * (1.0 - e2) + alt) * lat.sin();

    let (sin_g, cos_g) = gmst_rad.sin_cos();

    Vector3::new(
        cos_g * x_ecef - sin_g * y_ecef,
        sin_g * x_ecef + cos_g * y_ecef,
        z_ecef,
    )
}


// ============================================================================
// Property-based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(2000))]

        #[test]
        fn fuzz_geodetic_ranges(
            x in -42_000.0f64..42_000.0,
            y in -42_000.0f64..42_000.0,
            z in -42_000.0f64..42_000.0,
            g in 0.0f64..TAU,
        ) {
            prop_assume!((x * x + y * y + z * z).sqrt() > 6_000.0);
            let point = eci_to_geodetic(&Vector3::new(x, y, z), g);

            prop_assert!((-90.0..=90.0).contains(&point.latitude), "lat {}", point.latitude);
            prop_assert!((-180.0..=180.0).contains(&point.longitude), "lon {}", point.longitude);
        }

        #[test]
        fn fuzz_longitude_roundtrip(
            lat in -80.0f64..80.0,
            lon in -179.0f64..179.0,
            alt in 200.0f64..2_000.0,
            g in 0.0f64..TAU,
        ) {
            let point = GeodeticPoint { latitude: lat, longitude: lon, altitude_km: alt };
            let back = eci_to_geodetic(&geodetic_to_eci(&point, g), g);
            prop_assert!((back.longitude - lon).abs() < 1e-6);
            prop_assert!((back.latitude - lat).abs() < 1e-3);
        }
    }
}
