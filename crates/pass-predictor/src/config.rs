//! Prediction and element-feed configuration

use crate::{PredictionError, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sampling interval in seconds (10 minutes)
pub const DEFAULT_STEP_SECONDS: u32 = 600;

/// Samples per run (2 hours at the default step)
pub const DEFAULT_MAX_STEPS: u32 = 12;

/// Sub-satellite distance counted as overhead, km
pub const DEFAULT_THRESHOLD_KM: f64 = 1000.0;

/// Longest accepted look-ahead; TLEs are stale well before this
pub const MAX_HORIZON_SECONDS: u64 = 366 * 86_400;

pub const ENV_STEP_SECONDS: &str = "NEXT_PASS_STEP_SECONDS";
pub const ENV_MAX_STEPS: &str = "NEXT_PASS_MAX_STEPS";
pub const ENV_THRESHOLD_KM: &str = "NEXT_PASS_THRESHOLD_KM";

/// Element API (JSON `{ name, line1, line2 }` per NORAD id)
pub const DEFAULT_TLE_API: &str = "https://tle.ivanstanojevic.me/api/tle";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfig {
    pub step_seconds: u32,
    pub max_steps: u32,
    pub threshold_km: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            step_seconds: DEFAULT_STEP_SECONDS,
            max_steps: DEFAULT_MAX_STEPS,
            threshold_km: DEFAULT_THRESHOLD_KM,
        }
    }
}

impl PredictionConfig {
    /// Build from a horizon length; the horizon holds `horizon / step`
    /// samples, the first one at the start instant.
    pub fn from_horizon(horizon_seconds: u64, step_seconds: u32, threshold_km: f64) -> Result<Self> {
        if step_seconds == 0 {
            return Err(PredictionError::InvalidConfig(
                "step_seconds must be positive".to_string(),
            ));
        }
        let max_steps = u32::try_from(horizon_seconds / step_seconds as u64).map_err(|_| {
            PredictionError::InvalidConfig(format!("horizon of {}s is too long", horizon_seconds))
        })?;

        let config = Self {
            step_seconds,
            max_steps,
            threshold_km,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn step(&self) -> Duration {
        Duration::seconds(self.step_seconds as i64)
    }

    pub fn horizon(&self) -> Duration {
        Duration::seconds(self.horizon_seconds().min(MAX_HORIZON_SECONDS) as i64)
    }

    fn horizon_seconds(&self) -> u64 {
        self.step_seconds as u64 * self.max_steps as u64
    }

    pub fn validate(&self) -> Result<()> {
        if self.step_seconds == 0 {
            return Err(PredictionError::InvalidConfig(
                "step_seconds must be positive".to_string(),
            ));
        }
        if self.max_steps == 0 {
            return Err(PredictionError::InvalidConfig(
                "max_steps must be positive".to_string(),
            ));
        }
        if self.horizon_seconds() > MAX_HORIZON_SECONDS {
            return Err(PredictionError::InvalidConfig(format!(
                "horizon of {}s exceeds {}s",
                self.horizon_seconds(),
                MAX_HORIZON_SECONDS
            )));
        }
        if !(self.threshold_km.is_finite() && self.threshold_km > 0.0) {
            return Err(PredictionError::InvalidConfig(format!(
                "threshold_km must be a positive distance, got {}",
                self.threshold_km
            )));
        }
        Ok(())
    }

    /// Apply `NEXT_PASS_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_STEP_SECONDS) {
            self.step_seconds = parse_var(ENV_STEP_SECONDS, &v)?;
        }
        if let Some(v) = lookup(ENV_MAX_STEPS) {
            self.max_steps = parse_var(ENV_MAX_STEPS, &v)?;
        }
        if let Some(v) = lookup(ENV_THRESHOLD_KM) {
            self.threshold_km = parse_var(ENV_THRESHOLD_KM, &v)?;
        }
        Ok(self)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| PredictionError::InvalidConfig(format!("{}={:?} is not a valid value", name, value)))
}

/// HTTP element feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSourceConfig {
    /// Base URL; the NORAD id is appended as the last path segment
    pub base_url: String,
    /// Request timeout in seconds (default: 10)
    pub timeout_sec: u64,
    /// Object key -> NORAD catalog number
    pub catalog: BTreeMap<String, u32>,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        let catalog = [("l7", 25682), ("l8", 39084), ("l9", 49260)]
            .into_iter()
            .map(|(key, norad)| (key.to_string(), norad))
            .collect();

        Self {
            base_url: DEFAULT_TLE_API.to_string(),
            timeout_sec: 10,
            catalog,
        }
    }
}

impl HttpSourceConfig {
    pub fn with_object(mut self, key: impl Into<String>, norad_id: u32) -> Self {
        self.catalog.insert(key.into(), norad_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_cover_two_hours() {
        let config = PredictionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.horizon(), Duration::hours(2));
        assert_eq!(config.step(), Duration::minutes(10));
    }

    #[test]
    fn test_from_horizon_floors() {
        let config = PredictionConfig::from_horizon(7_500, 600, 1000.0).unwrap();
        assert_eq!(config.max_steps, 12);

        assert!(PredictionConfig::from_horizon(7_200, 0, 1000.0).is_err());
        assert!(PredictionConfig::from_horizon(300, 600, 1000.0).is_err());
        assert!(PredictionConfig::from_horizon(MAX_HORIZON_SECONDS + 600, 600, 1000.0).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        for threshold_km in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let config = PredictionConfig {
                threshold_km,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(PredictionError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [(ENV_STEP_SECONDS, "60"), (ENV_THRESHOLD_KM, " 250.5 ")]
            .into_iter()
            .collect();

        let config = PredictionConfig::default()
            .with_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.step_seconds, 60);
        assert_eq!(config.max_steps, DEFAULT_MAX_STEPS);
        assert_eq!(config.threshold_km, 250.5);
    }

    #[test]
    fn test_override_parse_error() {
        let err = PredictionConfig::default()
            .with_overrides(|name| (name == ENV_MAX_STEPS).then(|| "twelve".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_STEPS));
    }

    #[test]
    fn test_default_catalog() {
        let config = HttpSourceConfig::default().with_object("iss", 25544);
        assert_eq!(config.catalog.get("l8"), Some(&39084));
        assert_eq!(config.catalog.get("iss"), Some(&25544));
        assert_eq!(config.catalog.len(), 4);
    }
}
