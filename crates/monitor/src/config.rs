use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default milliseconds between telemetry ticks.
pub const DEFAULT_METRICS_INTERVAL_MS: u64 = 2000;
/// Default milliseconds between detection jitter ticks while armed.
pub const DEFAULT_DETECTION_INTERVAL_MS: u64 = 500;
/// Default simulated analysis time for an ingested image.
pub const DEFAULT_INGEST_DELAY_MS: u64 = 1500;
pub const DEFAULT_SESSION_STORE_PATH: &str = ".arsafety/session.json";

/// Monitor configuration loaded from environment variables.
///
/// Every field has a default suitable for running the demo locally.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub metrics_interval: Duration,
    pub detection_interval: Duration,
    pub ingest_delay: Duration,
    /// Seed for every simulation stream; `None` draws from the OS.
    pub seed: Option<u64>,
    pub session_store_path: PathBuf,
    /// Credentials to sign in with at startup, if both are set.
    pub demo_credentials: Option<(String, String)>,
    /// Image to hand to the ingest path once the dashboard is up.
    pub ingest_file: Option<PathBuf>,
}

impl MonitorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                  |
    /// |-------------------------|--------------------------|
    /// | `METRICS_INTERVAL_MS`   | `2000`                   |
    /// | `DETECTION_INTERVAL_MS` | `500`                    |
    /// | `INGEST_DELAY_MS`       | `1500`                   |
    /// | `SIM_SEED`              | unset (OS entropy)       |
    /// | `SESSION_STORE_PATH`    | `.arsafety/session.json` |
    /// | `DEMO_EMAIL`            | unset                    |
    /// | `DEMO_PASSWORD`         | unset                    |
    /// | `INGEST_FILE`           | unset                    |
    ///
    /// Values that fail to parse fall back to the default with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str, default: u64| {
            let ms = parse_or(&lookup, key, default);
            if ms == 0 {
                tracing::warn!(key, default, "Interval must be positive, using default");
                Duration::from_millis(default)
            } else {
                Duration::from_millis(ms)
            }
        };

        let metrics_interval = millis("METRICS_INTERVAL_MS", DEFAULT_METRICS_INTERVAL_MS);
        let detection_interval = millis("DETECTION_INTERVAL_MS", DEFAULT_DETECTION_INTERVAL_MS);
        let ingest_delay = Duration::from_millis(parse_or(&lookup, "INGEST_DELAY_MS", DEFAULT_INGEST_DELAY_MS));

        let seed = lookup("SIM_SEED").and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(seed) => Some(seed),
            Err(_) => {
                tracing::warn!(value = %raw, "SIM_SEED is not a valid u64, using entropy");
                None
            }
        });

        let session_store_path = lookup("SESSION_STORE_PATH")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_STORE_PATH.into())
            .into();

        let demo_credentials = match (lookup("DEMO_EMAIL"), lookup("DEMO_PASSWORD")) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        };

        let ingest_file = lookup("INGEST_FILE").filter(|p| !p.trim().is_empty()).map(PathBuf::from);

        Self {
            metrics_interval,
            detection_interval,
            ingest_delay,
            seed,
            session_store_path,
            demo_credentials,
            ingest_file,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "Unparseable value, using default");
            default
        }),
    }
}
