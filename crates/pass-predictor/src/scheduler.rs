//! Runs the pass predictor for every tracked object
//!
//! Objects are independent: a malformed or unavailable element set produces a
//! failed entry for that key only, and every requested key gets exactly one
//! result.

use crate::source::{fetch_all, FetchOutcome};
use crate::{ElementSet, ElementSource, Observer, PassPredictor, PassResult};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

pub type PassResults = BTreeMap<String, PassResult>;

#[derive(Debug, Clone)]
pub struct PassScheduler {
    predictor: Arc<PassPredictor>,
}

impl PassScheduler {
    pub fn new(predictor: PassPredictor) -> Self {
        Self {
            predictor: Arc::new(predictor),
        }
    }

    pub fn predictor(&self) -> &PassPredictor {
        &self.predictor
    }

    /// Sequential run from the current instant.
    pub fn schedule(&self, sets: &BTreeMap<String, ElementSet>, observer: &Observer) -> PassResults {
        self.schedule_from(sets, observer, Utc::now())
    }

    /// Sequential run; all objects share the same start instant.
    pub fn schedule_from(
        &self,
        sets: &BTreeMap<String, ElementSet>,
        observer: &Observer,
        start: DateTime<Utc>,
    ) -> PassResults {
        info!("Predicting passes for {} objects from {}", sets.len(), start);

        let results: PassResults = sets
            .iter()
            .map(|(key, set)| {
                let result = self
                    .predictor
                    .predict_next_pass_from(key, set, observer, start);
                (key.clone(), result)
            })
            .collect();

        log_summary(&results);
        results
    }

    /// Concurrent run: one blocking task per object on the tokio runtime.
    pub async fn schedule_concurrent(
        &self,
        sets: &BTreeMap<String, ElementSet>,
        observer: &Observer,
    ) -> PassResults {
        self.schedule_concurrent_from(sets, observer, Utc::now()).await
    }

    pub async fn schedule_concurrent_from(
        &self,
        sets: &BTreeMap<String, ElementSet>,
        observer: &Observer,
        start: DateTime<Utc>,
    ) -> PassResults {
        info!(
            "Predicting passes for {} objects concurrently from {}",
            sets.len(),
            start
        );

        let tasks: Vec<_> = sets
            .iter()
            .map(|(key, set)| {
                let predictor = Arc::clone(&self.predictor);
                let key = key.clone();
                let set = set.clone();
                let observer = *observer;
                let handle = tokio::task::spawn_blocking({
                    let key = key.clone();
                    move || predictor.predict_next_pass_from(&key, &set, &observer, start)
                });
                async move { (key, handle.await) }
            })
            .collect();

        let results: PassResults = join_all(tasks)
            .await
            .into_iter()
            .map(|(key, joined)| {
                let result = joined.unwrap_or_else(|e| {
                    error!(object = %key, "Prediction task failed: {}", e);
                    PassResult::failed(key.as_str(), format!("prediction task failed: {}", e))
                });
                (key, result)
            })
            .collect();

        log_summary(&results);
        results
    }

    /// Predict for already-fetched sets; fetch failures become failed entries.
    pub async fn schedule_fetched(&self, fetched: &FetchOutcome, observer: &Observer) -> PassResults {
        let mut results = self.schedule_concurrent(&fetched.sets, observer).await;
        for (key, e) in &fetched.failures {
            results.insert(key.clone(), PassResult::failed(key.as_str(), e.to_string()));
        }
        results
    }

    /// Fetch every key concurrently, then predict.
    pub async fn fetch_and_schedule<S, K>(&self, source: &S, keys: K, observer: &Observer) -> PassResults
    where
        S: ElementSource + Sync,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        let fetched = fetch_all(source, keys).await;
        self.schedule_fetched(&fetched, observer).await
    }
}

fn log_summary(results: &PassResults) {
    let found = results.values().filter(|r| r.pass_instant().is_some()).count();
    let failed = results.values().filter(|r| r.is_failed()).count();
    info!(
        "{} objects: {} with a pass, {} without, {} failed",
        results.len(),
        found,
        results.len() - found - failed,
        failed
    );
}
