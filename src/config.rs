//! Tracker configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`). Every value has a default, so a bare invocation talks to the
//! public NSOH and Thames Water endpoints and writes under `./data`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::TrackerError;
use crate::fetch::RetryPolicy;

/// Default Thames Water discharge status endpoint.
pub const DEFAULT_THAMES_WATER_API_URL: &str =
    "https://api.thameswater.co.uk/opendata/v2/discharge/status";

/// Default NSOH ArcGIS FeatureServer query endpoint.
pub const DEFAULT_NSOH_ARCGIS_URL: &str = "https://services2.arcgis.com/g6o32ZDQ33GpCIu3/arcgis/rest/services/Thames_Water_Storm_Overflow_Activity_(Production)_view/FeatureServer/0/query";

/// Top-level tracker configuration.
///
/// Loaded once at startup via [`TrackerConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Thames Water (secondary feed) endpoint.
    pub thames_api_url: String,

    /// NSOH ArcGIS (primary feed) query endpoint.
    pub nsoh_arcgis_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Total attempts per request, including the first one.
    pub max_retries: u32,

    /// Fixed pause between attempts in seconds.
    pub retry_delay_secs: u64,

    /// Records requested per ArcGIS page.
    pub arcgis_page_size: usize,

    /// Root of the persisted `snapshots/`, `latest/` and `rollbacks/` tree.
    pub data_dir: PathBuf,

    /// Bind address for the dashboard API.
    pub listen_addr: SocketAddr,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            thames_api_url: DEFAULT_THAMES_WATER_API_URL.to_string(),
            nsoh_arcgis_url: DEFAULT_NSOH_ARCGIS_URL.to_string(),
            request_timeout_secs: 30,
            max_retries: 3,
            retry_delay_secs: 5,
            arcgis_page_size: 1000,
            data_dir: PathBuf::from("data"),
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

impl TrackerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Config`] if `LISTEN_ADDR` is set but cannot
    /// be parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, TrackerError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Numeric values fall back to their defaults when missing or invalid.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Config`] if `LISTEN_ADDR` is present but not
    /// a valid socket address.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TrackerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let listen_addr = match lookup("LISTEN_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|e| TrackerError::Config(format!("LISTEN_ADDR={raw}: {e}")))?,
            None => defaults.listen_addr,
        };

        Ok(Self {
            thames_api_url: lookup("THAMES_WATER_API_URL").unwrap_or(defaults.thames_api_url),
            nsoh_arcgis_url: lookup("NSOH_ARCGIS_URL").unwrap_or(defaults.nsoh_arcgis_url),
            request_timeout_secs: parse_value(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            ),
            max_retries: parse_value(&lookup, "MAX_RETRIES", defaults.max_retries).max(1),
            retry_delay_secs: parse_value(&lookup, "RETRY_DELAY_SECS", defaults.retry_delay_secs),
            arcgis_page_size: parse_value(&lookup, "ARCGIS_PAGE_SIZE", defaults.arcgis_page_size)
                .max(1),
            data_dir: lookup("DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            listen_addr,
        })
    }

    /// Retry policy shared by both fetchers.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries,
            delay: Duration::from_secs(self.retry_delay_secs),
        }
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Parses a looked-up value as `T`, returning `default` on missing or
/// invalid values.
fn parse_value<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<TrackerConfig, TrackerError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        TrackerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let Ok(config) = config_from(&[]) else {
            panic!("defaults should load");
        };
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.retry_policy().max_attempts, 3);
        assert_eq!(config.retry_policy().delay, Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_applied() {
        let Ok(config) = config_from(&[
            ("DATA_DIR", "/var/lib/tracker"),
            ("MAX_RETRIES", "5"),
            ("RETRY_DELAY_SECS", "1"),
            ("ARCGIS_PAGE_SIZE", "250"),
            ("NSOH_ARCGIS_URL", "http://localhost:9000/query"),
            ("LISTEN_ADDR", "127.0.0.1:8080"),
        ]) else {
            panic!("overrides should load");
        };
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/tracker"));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_delay_secs, 1);
        assert_eq!(config.arcgis_page_size, 250);
        assert_eq!(config.nsoh_arcgis_url, "http://localhost:9000/query");
        assert_eq!(config.listen_addr.port(), 8080);
    }

    #[test]
    fn invalid_numbers_fall_back_and_zero_is_clamped() {
        let Ok(config) = config_from(&[
            ("REQUEST_TIMEOUT_SECS", "soon"),
            ("MAX_RETRIES", "0"),
            ("ARCGIS_PAGE_SIZE", "0"),
        ]) else {
            panic!("config should load");
        };
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.arcgis_page_size, 1);
    }

    #[test]
    fn bad_listen_addr_is_a_config_error() {
        let result = config_from(&[("LISTEN_ADDR", "not-an-address")]);
        assert!(matches!(result, Err(TrackerError::Config(_))));
    }
}
