// ── Engine configuration ──
//
// Built by `netpulse-config` from the TOML profile and CLI flags; the core
// crate never reads files or the environment itself.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_METRIC_WINDOW_MINUTES: u32 = 60;
pub const DEFAULT_ALERT_LIMIT: u32 = 20;

/// Everything needed to reach the backend and drive the sync loop.
///
/// Has no `Default`; a credential must always be supplied.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub base_url: Url,
    pub api_key: SecretString,
    /// Per-request timeout enforced by the transport.
    pub timeout: Duration,
    pub refresh_interval: Duration,
    pub metric_window_minutes: u32,
    pub alert_limit: u32,
}

impl EngineConfig {
    pub fn new(base_url: Url, api_key: SecretString) -> Self {
        Self {
            base_url,
            api_key,
            timeout: DEFAULT_TIMEOUT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            metric_window_minutes: DEFAULT_METRIC_WINDOW_MINUTES,
            alert_limit: DEFAULT_ALERT_LIMIT,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(config_error(format!(
                "base_url must be http or https, got {}",
                self.base_url.scheme()
            )));
        }
        if self.timeout.is_zero() {
            return Err(config_error("timeout must be greater than zero"));
        }
        if self.refresh_interval.is_zero() {
            return Err(config_error("refresh interval must be greater than zero"));
        }
        if self.metric_window_minutes == 0 {
            return Err(config_error("metric window must be at least one minute"));
        }
        if self.alert_limit == 0 {
            return Err(config_error("alert limit must be at least one"));
        }
        Ok(())
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            refresh_interval: self.refresh_interval,
            metric_window_minutes: self.metric_window_minutes,
            alert_limit: self.alert_limit,
        }
    }
}

/// The subset of configuration the engine actor uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub refresh_interval: Duration,
    pub metric_window_minutes: u32,
    pub alert_limit: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            metric_window_minutes: DEFAULT_METRIC_WINDOW_MINUTES,
            alert_limit: DEFAULT_ALERT_LIMIT,
        }
    }
}

fn config_error(message: impl Into<String>) -> CoreError {
    CoreError::Config {
        message: message.into(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(url: &str) -> EngineConfig {
        EngineConfig::new(
            Url::parse(url).unwrap(),
            SecretString::from("k".to_string()),
        )
    }

    #[test]
    fn defaults_validate() {
        let cfg = config("http://127.0.0.1:3000");
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.sync_options(), SyncOptions::default());
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert!(matches!(
            config("ftp://monitor.lan").validate(),
            Err(CoreError::Config { .. })
        ));
    }

    #[test]
    fn rejects_zero_interval_and_limits() {
        let mut cfg = config("https://monitor.lan");
        cfg.refresh_interval = Duration::ZERO;
        assert!(cfg.validate().is_err());

        let mut cfg = config("https://monitor.lan");
        cfg.alert_limit = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = config("https://monitor.lan");
        cfg.metric_window_minutes = 0;
        assert!(cfg.validate().is_err());
    }
}
