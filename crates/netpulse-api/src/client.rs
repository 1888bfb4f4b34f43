// Monitoring backend HTTP client
//
// Wraps `reqwest::Client` with URL construction, status mapping, and body
// decoding for the `/api/*` surface. The credential lives in the client's
// default headers; nothing here retries.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{AckResponse, AlertEntry, DeviceEntry, ErrorBody, Health, MetricSample, PollSummary};
use crate::transport::TransportConfig;

/// Raw HTTP client for the monitoring backend.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct MonitorClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl MonitorClient {
    /// Create a client that attaches `api_key` to every request.
    ///
    /// `base_url` is the backend root (e.g. `http://127.0.0.1:3000`); the
    /// `/api/...` paths are appended to it.
    pub fn new(
        base_url: Url,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_authenticated_client(api_key)?;
        Ok(Self {
            http,
            base_url,
            timeout: transport.timeout,
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    ///
    /// The caller is responsible for default headers.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout: TransportConfig::default().timeout,
        }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/devices`
    pub async fn list_devices(&self) -> Result<Vec<DeviceEntry>, Error> {
        let url = self.api_url(&["devices"])?;
        self.get(url, &[]).await
    }

    /// `GET /api/metrics/{device_id}?metric=..&minutes=..`
    pub async fn metric_series(
        &self,
        device_id: &str,
        metric: &str,
        minutes: u32,
    ) -> Result<Vec<MetricSample>, Error> {
        let url = self.api_url(&["metrics", device_id])?;
        self.get(
            url,
            &[("metric", metric.to_owned()), ("minutes", minutes.to_string())],
        )
        .await
    }

    /// `GET /api/alerts?limit=..` (most recent first).
    pub async fn list_alerts(&self, limit: u32) -> Result<Vec<AlertEntry>, Error> {
        let url = self.api_url(&["alerts"])?;
        self.get(url, &[("limit", limit.to_string())]).await
    }

    /// `GET /api/alerts?device_id=..&limit=..`
    pub async fn list_alerts_for_device(
        &self,
        device_id: &str,
        limit: u32,
    ) -> Result<Vec<AlertEntry>, Error> {
        let url = self.api_url(&["alerts"])?;
        self.get(
            url,
            &[("device_id", device_id.to_owned()), ("limit", limit.to_string())],
        )
        .await
    }

    /// `POST /api/poll`: ask the backend to run a measurement cycle now.
    ///
    /// Any 2xx counts as accepted. The summary body is decoded leniently
    /// and falls back to an empty summary when it is missing or unexpected.
    pub async fn trigger_poll(&self) -> Result<PollSummary, Error> {
        let url = self.api_url(&["poll"])?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let body = self.checked_body(resp).await?;

        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            trace!(error = %e, "poll summary not decodable, ignoring body");
            PollSummary::default()
        }))
    }

    /// `POST /api/alerts/{id}/ack`
    pub async fn acknowledge_alert(&self, alert_id: &str) -> Result<AckResponse, Error> {
        let url = self.api_url(&["alerts", alert_id, "ack"])?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.decode(resp).await
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<Health, Error> {
        let url = self.root_url(&["health"])?;
        self.get(url, &[]).await
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/{segments..}` with each segment percent-encoded.
    pub(crate) fn api_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut all = Vec::with_capacity(segments.len() + 1);
        all.push("api");
        all.extend_from_slice(segments);
        self.root_url(&all)
    }

    fn root_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let body = self.checked_body(resp).await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Map non-success statuses to typed errors, returning the body text
    /// for 2xx responses.
    async fn checked_body(&self, resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        let path = resp.url().path().to_owned();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;

        if status.is_success() {
            return Ok(body);
        }

        let message = error_message(&body).unwrap_or_else(|| status.to_string());
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Authentication { message },
            StatusCode::NOT_FOUND => Error::NotFound { path },
            _ => Error::Http {
                status: status.as_u16(),
                message,
            },
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

/// Pull `error` out of a `{"error": "..."}` body, if that's what we got.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && trimmed.len() <= 200).then(|| trimmed.to_owned())
        })
}
