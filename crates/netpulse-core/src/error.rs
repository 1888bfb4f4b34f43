// ── Core error types ──
//
// User-facing errors from netpulse-core. Consumers never see HTTP status
// codes or JSON parse failures directly. The `From<netpulse_api::Error>`
// impl folds transport-layer errors into the four-way taxonomy the
// presentation layer understands.

use thiserror::Error;

/// Unified error type for the core crate.
///
/// `Clone` because one failed cycle may have several coalesced waiters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Connectivity problems, timeouts and 5xx responses.
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Not found: {identifier}")]
    NotFound { identifier: String },

    /// Malformed payload, e.g. an unparseable timestamp.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("No device selected")]
    NoDeviceSelected,

    #[error("Sync engine is not running")]
    EngineStopped,
}

impl CoreError {
    /// Whether the next timer tick or manual poll has a fair chance of
    /// succeeding without user intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<netpulse_api::Error> for CoreError {
    fn from(err: netpulse_api::Error) -> Self {
        match err {
            netpulse_api::Error::Authentication { message } => CoreError::Auth { message },
            netpulse_api::Error::InvalidApiKey(reason) => CoreError::Config {
                message: format!("API key is not a valid header value: {reason}"),
            },
            netpulse_api::Error::Transport(ref e) => {
                if e.status().map(|s| s.as_u16()) == Some(404) {
                    CoreError::NotFound {
                        identifier: e.url().map(|u| u.path().to_string()).unwrap_or_default(),
                    }
                } else {
                    CoreError::Network {
                        message: e.to_string(),
                    }
                }
            }
            netpulse_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            netpulse_api::Error::Timeout { timeout_secs } => CoreError::Network {
                message: format!("request timed out after {timeout_secs}s"),
            },
            netpulse_api::Error::NotFound { path } => CoreError::NotFound { identifier: path },
            netpulse_api::Error::Http { status, message } => CoreError::Network {
                message: format!("HTTP {status}: {message}"),
            },
            netpulse_api::Error::Deserialization { message, body: _ } => {
                CoreError::Validation { message }
            }
        }
    }
}
