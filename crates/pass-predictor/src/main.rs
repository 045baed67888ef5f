//! Next Pass CLI
//!
//! Predicts when each tracked object next passes overhead an observer.
//!
//! Usage:
//!   next-pass --lat 40.0 --lon -75.0
//!   next-pass --lat 40.0 --lon -75.0 --objects l8,l9 --output passes.json
//!   next-pass --lat 40.0 --lon -75.0 --elements tle.json --threshold-km 500

use anyhow::{bail, Result};
use clap::Parser;
use pass_predictor::report::{write_tle_file, PassReport};
use pass_predictor::source::{fetch_all, FetchOutcome};
use pass_predictor::{
    HttpElementSource, HttpSourceConfig, Observer, PassPredictor, PassScheduler,
    PredictionConfig, StaticElementSource,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "next-pass",
    about = "Predict the next overhead pass of TLE-tracked satellites"
)]
struct Args {
    /// Observer latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,

    /// Observer longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lon: f64,

    /// Object keys to predict (default: every key known to the source)
    #[arg(short, long, value_delimiter = ',')]
    objects: Vec<String>,

    /// Read element sets from a JSON file instead of the TLE API
    #[arg(short, long)]
    elements: Option<PathBuf>,

    /// TLE API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long)]
    timeout_sec: Option<u64>,

    /// Sampling interval in seconds
    #[arg(long)]
    step_seconds: Option<u32>,

    /// Number of samples
    #[arg(long)]
    max_steps: Option<u32>,

    /// Overhead distance threshold in km
    #[arg(long)]
    threshold_km: Option<f64>,

    /// Write the pass report as JSON
    #[arg(long)]
    output: Option<PathBuf>,

    /// Save the fetched element sets as plain text
    #[arg(long)]
    save_tle: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn observer(&self) -> Result<Observer> {
        if !(-90.0..=90.0).contains(&self.lat) {
            bail!("latitude {} is outside [-90, 90]", self.lat);
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            bail!("longitude {} is outside [-180, 180]", self.lon);
        }
        Ok(Observer::new(self.lat, self.lon))
    }

    fn prediction_config(&self) -> Result<PredictionConfig> {
        let mut config = PredictionConfig::default().with_env_overrides()?;
        if let Some(step_seconds) = self.step_seconds {
            config.step_seconds = step_seconds;
        }
        if let Some(max_steps) = self.max_steps {
            config.max_steps = max_steps;
        }
        if let Some(threshold_km) = self.threshold_km {
            config.threshold_km = threshold_km;
        }
        config.validate()?;
        Ok(config)
    }

    fn http_config(&self) -> HttpSourceConfig {
        let mut config = HttpSourceConfig::default();
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(timeout_sec) = self.timeout_sec {
            config.timeout_sec = timeout_sec;
        }
        config
    }
}

async fn fetch(args: &Args) -> Result<FetchOutcome> {
    let outcome = match &args.elements {
        Some(path) => {
            let source = StaticElementSource::from_file(path)?;
            let keys: Vec<String> = if args.objects.is_empty() {
                source.keys().cloned().collect()
            } else {
                args.objects.clone()
            };
            fetch_all(&source, keys).await
        }
        None => {
            let source = HttpElementSource::new(args.http_config())?;
            let keys: Vec<String> = if args.objects.is_empty() {
                source.config().catalog.keys().cloned().collect()
            } else {
                args.objects.clone()
            };
            fetch_all(&source, keys).await
        }
    };
    Ok(outcome)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "next_pass=debug,pass_predictor=debug,orbital_mechanics=debug,info"
    } else {
        "next_pass=info,pass_predictor=info,warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let observer = args.observer()?;
    let config = args.prediction_config()?;
    info!(
        "Observer {:.4}, {:.4}; step {}s x {}, threshold {} km",
        observer.latitude, observer.longitude, config.step_seconds, config.max_steps, config.threshold_km
    );

    let fetched = fetch(&args).await?;

    if let Some(path) = &args.save_tle {
        write_tle_file(path, &fetched.sets)?;
    }

    let scheduler = PassScheduler::new(PassPredictor::new(config)?);
    let results = scheduler.schedule_fetched(&fetched, &observer).await;

    let report = PassReport::new(observer, config, &results);
    for line in report.summary_lines() {
        println!("{}", line);
    }

    if let Some(path) = &args.output {
        report.write_json(path)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_negative_coordinates() {
        let args = Args::try_parse_from(["next-pass", "--lat", "-33.87", "--lon", "-151.2", "-o", "l7,l9"]).unwrap();
        let observer = args.observer().unwrap();

        assert_eq!(observer.latitude, -33.87);
        assert_eq!(observer.longitude, -151.2);
        assert_eq!(args.objects, vec!["l7", "l9"]);
    }

    #[test]
    fn test_rejects_out_of_range_observer() {
        let args = Args::try_parse_from(["next-pass", "--lat", "95", "--lon", "0"]).unwrap();
        assert!(args.observer().is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::try_parse_from([
            "next-pass", "--lat", "0", "--lon", "0", "--step-seconds", "60", "--threshold-km", "250",
        ])
        .unwrap();
        let config = args.prediction_config().unwrap();

        assert_eq!(config.step_seconds, 60);
        assert_eq!(config.threshold_km, 250.0);
    }

    #[test]
    fn test_cli_rejects_zero_steps() {
        let args = Args::try_parse_from(["next-pass", "--lat", "0", "--lon", "0", "--max-steps", "0"]).unwrap();
        assert!(args.prediction_config().is_err());
    }
}
