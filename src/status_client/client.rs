use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::MonitorError;

use super::api_types::{HealthResponse, StatusResponse};
use super::helpers::DEFAULT_USER_AGENT;
use super::outcome::{FetchErrorKind, FetchOutcome};
use super::target::SyncTarget;

/// One status request against the monitored host.
///
/// Implementations never retry and never return transport errors: every
/// failure is folded into [`FetchOutcome::Failure`].
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch(&self, target: &SyncTarget, timeout: Duration) -> FetchOutcome;
}

#[derive(Clone)]
pub struct StatusClient {
    http: Client,
}

/// Result of probing `/api/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub url: String,
    pub status: String,
    pub server: Option<String>,
    pub server_time: Option<String>,
}

impl StatusClient {
    pub fn new() -> Result<Self, MonitorError> {
        // Timeouts are applied per request by the caller.
        let http = Client::builder().user_agent(DEFAULT_USER_AGENT).build()?;
        Ok(Self { http })
    }

    /// Probe the host's health endpoint. Used for connection diagnostics,
    /// not by the sync cycle.
    pub async fn check_health(
        &self,
        target: &SyncTarget,
        timeout: Duration,
    ) -> Result<HealthReport, MonitorError> {
        if target.is_empty() {
            return Err(MonitorError::NotConfigured);
        }
        let url = target.health_url();
        let response = self.http.get(&url).timeout(timeout).send().await?;

        if !response.status().is_success() {
            return Err(MonitorError::Remote(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let health: HealthResponse = response.json().await?;
        Ok(HealthReport {
            url,
            status: health.status,
            server: health.server,
            server_time: health.timestamp,
        })
    }
}

#[async_trait]
impl StatusFetcher for StatusClient {
    async fn fetch(&self, target: &SyncTarget, timeout: Duration) -> FetchOutcome {
        let url = target.status_url();
        debug!(url = %url, timeout_secs = timeout.as_secs(), "Requesting host status");

        let response = match self.http.get(&url).timeout(timeout).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(url = %url, error = %err, "Status request failed");
                return transport_failure(&err, &url, timeout);
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "Status request rejected");
            return FetchOutcome::failure(
                FetchErrorKind::HttpError {
                    code: status.as_u16(),
                },
                format!("{url} returned {status}"),
            );
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                warn!(url = %url, error = %err, "Failed reading status body");
                return transport_failure(&err, &url, timeout);
            }
        };

        let outcome = parse_status_body(&body);
        debug!(url = %url, success = outcome.is_success(), "Status response handled");
        outcome
    }
}

/// Decode a `/api/status` body into an outcome.
pub fn parse_status_body(body: &[u8]) -> FetchOutcome {
    if body.iter().all(u8::is_ascii_whitespace) {
        return FetchOutcome::failure(FetchErrorKind::ParseError, "Empty response from host");
    }
    match serde_json::from_slice::<StatusResponse>(body) {
        Ok(response) => FetchOutcome::from_response(response),
        Err(err) => FetchOutcome::failure(
            FetchErrorKind::ParseError,
            format!("Unreadable response from host: {err}"),
        ),
    }
}

// Connection-level failures win over timeouts so that a refused or
// unroutable host always reads as unreachable.
fn transport_failure(err: &reqwest::Error, url: &str, timeout: Duration) -> FetchOutcome {
    if err.is_connect() {
        FetchOutcome::failure(
            FetchErrorKind::Unreachable,
            format!("Cannot connect to {url}"),
        )
    } else if err.is_timeout() {
        FetchOutcome::failure(
            FetchErrorKind::Timeout,
            format!("No response from {url} within {}s", timeout.as_secs()),
        )
    } else {
        FetchOutcome::failure(
            FetchErrorKind::Unreachable,
            format!("Request to {url} failed: {err}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status_client::Presence;

    #[test]
    fn parses_well_formed_body() {
        let outcome = parse_status_body(
            br#"{"status":"has","totalCount":3,"message":"ok","timestamp":"2024-01-01T10:00:00"}"#,
        );
        assert_eq!(
            outcome,
            FetchOutcome::Success {
                status: Presence::Present,
                item_count: 3,
                message: "ok".to_string(),
                remote_timestamp: "2024-01-01T10:00:00".to_string(),
            }
        );
    }

    #[test]
    fn empty_and_garbage_bodies_are_parse_errors() {
        for body in [&b""[..], b"  \n", b"<html>oops</html>", br#"{"totalCount":1}"#] {
            match parse_status_body(body) {
                FetchOutcome::Failure { kind, detail } => {
                    assert_eq!(kind, FetchErrorKind::ParseError);
                    assert!(!detail.is_empty());
                }
                other => panic!("expected parse error, got {other:?}"),
            }
        }
    }
}
