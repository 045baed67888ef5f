//! Next-Pass Predictor
//!
//! Finds the next time each tracked object passes nearly overhead a ground
//! observer, within a bounded look-ahead horizon.
//!
//! # Search Model
//!
//! ```text
//! for i in 0..max_steps:
//!     t  = start + i·step
//!     p  = propagate(t)           (skip if no solution)
//!     ss = geodetic(p, gmst(t))   (sub-satellite point)
//!     if haversine(observer, ss) < threshold: pass at t
//! ```
//!
//! | Parameter | Default | Description |
//! |-----------|---------|-------------|
//! | step      | 600 s   | Sampling interval |
//! | max_steps | 12      | Samples per run (2 h horizon) |
//! | threshold | 1000 km | Surface distance counted as "overhead" |
//!
//! The first qualifying sample wins; there is no closest-approach refinement
//! and no elevation check. A pass shorter than one step can fall between two
//! samples and go unreported.

use chrono::{DateTime, Local, TimeZone, Utc};
use orbital_mechanics::{GeodeticPoint, OrbitalError};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use thiserror::Error;

pub mod config;
pub mod predictor;
pub mod report;
pub mod scheduler;
pub mod source;

pub use config::{HttpSourceConfig, PredictionConfig};
pub use orbital_mechanics::ElementSet;
pub use predictor::PassPredictor;
pub use report::PassReport;
pub use scheduler::PassScheduler;
pub use source::{ElementSource, HttpElementSource, StaticElementSource};

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Orbital(#[from] OrbitalError),
    #[error("Element retrieval failed for {key}: {reason}")]
    ElementRetrievalFailed { key: String, reason: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, PredictionError>;

/// Ground observer, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observer {
    pub latitude: f64,
    pub longitude: f64,
}

impl Observer {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn surface_point(&self) -> GeodeticPoint {
        GeodeticPoint::surface(self.latitude, self.longitude)
    }
}

/// The sample that satisfied the overhead test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassEvent {
    pub instant: DateTime<Utc>,
    pub step_index: u32,
    pub sub_satellite_point: GeodeticPoint,
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassStatus {
    Found(PassEvent),
    NotFound,
    Failed { reason: String },
}

/// Outcome of one prediction run for one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassResult {
    pub object_key: String,
    pub status: PassStatus,
}

/// Where to drop a map marker for a found pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerPosition {
    pub object_key: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl PassResult {
    pub fn found(object_key: impl Into<String>, event: PassEvent) -> Self {
        Self {
            object_key: object_key.into(),
            status: PassStatus::Found(event),
        }
    }

    pub fn not_found(object_key: impl Into<String>) -> Self {
        Self {
            object_key: object_key.into(),
            status: PassStatus::NotFound,
        }
    }

    pub fn failed(object_key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            object_key: object_key.into(),
            status: PassStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn event(&self) -> Option<&PassEvent> {
        match &self.status {
            PassStatus::Found(event) => Some(event),
            _ => None,
        }
    }

    pub fn pass_instant(&self) -> Option<DateTime<Utc>> {
        self.event().map(|e| e.instant)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, PassStatus::Failed { .. })
    }

    /// Marker at the sub-satellite point of the matching sample.
    pub fn marker(&self) -> Option<MarkerPosition> {
        self.event().map(|e| MarkerPosition {
            object_key: self.object_key.clone(),
            latitude: e.sub_satellite_point.latitude,
            longitude: e.sub_satellite_point.longitude,
        })
    }

    /// One display line, timestamps in the local time zone.
    pub fn summary_line(&self) -> String {
        self.summary_line_in(&Local)
    }

    pub fn summary_line_in<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: Display,
    {
        let label = self.object_key.to_uppercase();
        match &self.status {
            PassStatus::Found(event) => format!(
                "{}: Next pass at {}",
                label,
                event.instant.with_timezone(tz).format("%Y-%m-%d %H:%M:%S %Z")
            ),
            PassStatus::NotFound => format!("{}: No upcoming pass detected.", label),
            PassStatus::Failed { reason } => format!("{}: Prediction unavailable ({})", label, reason),
        }
    }
}
