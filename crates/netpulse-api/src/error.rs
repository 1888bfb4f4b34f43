use thiserror::Error;

/// Top-level error type for the `netpulse-api` crate.
///
/// Covers every failure mode of the monitoring backend surface:
/// credential rejection, transport, HTTP status, and payload decoding.
/// `netpulse-core` maps these into its own taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The backend rejected the `X-API-KEY` credential (401/403).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The configured key cannot be sent as an HTTP header value.
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Backend ─────────────────────────────────────────────────────
    /// 404 from the backend (unknown device, alert, or route).
    #[error("Resource not found: {path}")]
    NotFound { path: String },

    /// Any other non-success status.
    #[error("Backend error (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the credential was rejected.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::InvalidApiKey(_))
    }

    /// Returns `true` if this is a transient error worth retrying on the
    /// next cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Http {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(err.is_transient());

        let err = Error::Http {
            status: 400,
            message: "bad request".into(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn classification_helpers() {
        assert!(Error::Timeout { timeout_secs: 30 }.is_transient());
        assert!(
            Error::NotFound {
                path: "/api/metrics/x".into()
            }
            .is_not_found()
        );
        assert!(
            Error::Authentication {
                message: "Unauthorized".into()
            }
            .is_auth()
        );
        assert!(!Error::InvalidApiKey("bad".into()).is_transient());
    }
}
