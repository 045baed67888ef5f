//! Element set retrieval
//!
//! Element sets come from an [`ElementSource`]: the public TLE API over HTTP,
//! or an in-memory/file-backed map. Retrieval failures stay scoped to the
//! object they concern.

use crate::{ElementSet, HttpSourceConfig, PredictionError, Result};
use futures::future::join_all;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::future::Future;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, warn};

pub trait ElementSource {
    fn fetch(&self, key: &str) -> impl Future<Output = Result<ElementSet>> + Send;
}

/// Result of fetching a batch of keys.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub sets: BTreeMap<String, ElementSet>,
    pub failures: BTreeMap<String, PredictionError>,
}

impl FetchOutcome {
    pub fn requested(&self) -> usize {
        self.sets.len() + self.failures.len()
    }
}

/// Fetch every distinct key concurrently.
pub async fn fetch_all<S, K>(source: &S, keys: K) -> FetchOutcome
where
    S: ElementSource + Sync,
    K: IntoIterator,
    K::Item: Into<String>,
{
    let keys: BTreeSet<String> = keys.into_iter().map(Into::into).collect();

    let futures: Vec<_> = keys
        .into_iter()
        .map(|key| async move {
            let result = source.fetch(&key).await;
            (key, result)
        })
        .collect();

    let mut outcome = FetchOutcome::default();
    for (key, result) in join_all(futures).await {
        match result {
            Ok(set) => {
                debug!(object = %key, "Fetched element set");
                outcome.sets.insert(key, set);
            }
            Err(e) => {
                warn!(object = %key, "Element retrieval failed: {}", e);
                outcome.failures.insert(key, e);
            }
        }
    }

    info!(
        "Fetched {}/{} element sets",
        outcome.sets.len(),
        outcome.requested()
    );
    outcome
}

// ============================================================================
// In-memory / file source
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct StaticElementSource {
    sets: BTreeMap<String, ElementSet>,
}

impl StaticElementSource {
    pub fn new(sets: BTreeMap<String, ElementSet>) -> Self {
        Self { sets }
    }

    /// Load a JSON object of `{ "key": { "line1": ..., "line2": ... } }`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        load_element_file(path).map(Self::new)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.sets.keys()
    }

    pub fn insert(&mut self, key: impl Into<String>, set: ElementSet) {
        self.sets.insert(key.into(), set);
    }
}

impl ElementSource for StaticElementSource {
    async fn fetch(&self, key: &str) -> Result<ElementSet> {
        self.sets
            .get(key)
            .cloned()
            .ok_or_else(|| PredictionError::ElementRetrievalFailed {
                key: key.to_string(),
                reason: "no element set for this key".to_string(),
            })
    }
}

pub fn load_element_file(path: impl AsRef<Path>) -> Result<BTreeMap<String, ElementSet>> {
    let path = path.as_ref();
    info!("Loading element sets from {:?}", path);

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let sets: BTreeMap<String, ElementSet> = serde_json::from_reader(reader)?;

    info!("Loaded {} element sets", sets.len());
    Ok(sets)
}

// ============================================================================
// HTTP source
// ============================================================================

/// Record returned by the TLE API
#[derive(Debug, Deserialize)]
struct TleApiRecord {
    #[serde(default)]
    name: Option<String>,
    line1: String,
    line2: String,
}

pub struct HttpElementSource {
    config: HttpSourceConfig,
    client: reqwest::Client,
}

impl HttpElementSource {
    pub fn new(config: HttpSourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_sec))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &HttpSourceConfig {
        &self.config
    }

    fn url_for(&self, key: &str) -> Result<String> {
        let norad_id = self.config.catalog.get(key).ok_or_else(|| {
            PredictionError::ElementRetrievalFailed {
                key: key.to_string(),
                reason: "object key not in catalog".to_string(),
            }
        })?;
        Ok(format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            norad_id
        ))
    }
}

impl ElementSource for HttpElementSource {
    async fn fetch(&self, key: &str) -> Result<ElementSet> {
        let url = self.url_for(key)?;
        let failed = |reason: String| PredictionError::ElementRetrievalFailed {
            key: key.to_string(),
            reason,
        };

        debug!(object = key, "GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| failed(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(failed(format!("TLE API returned status: {}", response.status())));
        }

        let record: TleApiRecord = response
            .json()
            .await
            .map_err(|e| failed(format!("parse error: {}", e)))?;

        if let Some(name) = &record.name {
            debug!(object = key, "Element set for {}", name);
        }

        Ok(ElementSet::new(record.line1, record.line2))
    }
}
