//! Report output: JSON pass report and plain-text TLE export

use crate::scheduler::PassResults;
use crate::{ElementSet, MarkerPosition, Observer, PassResult, PredictionConfig, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassReport {
    pub generated_at: DateTime<Utc>,
    pub observer: Observer,
    pub config: PredictionConfig,
    pub results: Vec<PassResult>,
    pub markers: Vec<MarkerPosition>,
}

impl PassReport {
    pub fn new(observer: Observer, config: PredictionConfig, results: &PassResults) -> Self {
        let results: Vec<PassResult> = results.values().cloned().collect();
        let markers = results.iter().filter_map(PassResult::marker).collect();

        Self {
            generated_at: Utc::now(),
            observer,
            config,
            results,
            markers,
        }
    }

    pub fn summary_lines(&self) -> Vec<String> {
        self.results.iter().map(PassResult::summary_line).collect()
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!("Writing pass report to {:?}", path);
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// Plain-text dump: `KEY:` then both lines, blank line between objects.
pub fn export_tle_text(sets: &BTreeMap<String, ElementSet>) -> String {
    sets.iter()
        .map(|(key, set)| format!("{}:\n{}\n{}\n\n", key.to_uppercase(), set.line1, set.line2))
        .collect()
}

pub fn write_tle_file(path: impl AsRef<Path>, sets: &BTreeMap<String, ElementSet>) -> Result<()> {
    let path = path.as_ref();
    info!("Writing {} element sets to {:?}", sets.len(), path);
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(export_tle_text(sets).as_bytes())?;
    writer.flush()?;
    Ok(())
}
