// Shared transport configuration for building reqwest::Client instances.
//
// Holds the timeout and user agent applied to every request. The client
// never retries; a hung request is bounded by `timeout` and surfaces as
// `Error::Timeout`.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Header carrying the static backend credential.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("netpulse/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` with additional default headers.
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(Error::Transport)
    }

    /// Build a `reqwest::Client` that sends `X-API-KEY` on every request.
    ///
    /// The header is marked sensitive so it never shows up in debug output.
    pub fn build_authenticated_client(&self, api_key: &SecretString) -> Result<reqwest::Client, Error> {
        let mut value = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|e| Error::InvalidApiKey(e.to_string()))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, value);
        self.build_client_with_headers(headers)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_key_with_control_characters() {
        let key = SecretString::from("bad\nkey".to_string());
        let result = TransportConfig::default().build_authenticated_client(&key);
        assert!(matches!(result, Err(Error::InvalidApiKey(_))));
    }

    #[test]
    fn default_timeout_is_thirty_seconds() {
        assert_eq!(TransportConfig::default().timeout_secs(), 30);
    }
}
