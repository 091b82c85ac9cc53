//! HTTP client for the identity service's external check endpoint.

use crate::error::OracleError;
use crate::oracle::IdvOracle;
use crate::status::IdvStatus;

use async_trait::async_trait;
use blam_types::MemberId;
use serde::Deserialize;
use std::time::Duration;

/// Default identity check endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://identity.hackclub.com/api/external/check";

/// Default timeout for identity requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Queries `GET {endpoint}?slack_id={member}`.
pub struct HttpIdvOracle {
    http_client: reqwest::Client,
    endpoint: String,
}

/// Raw JSON response: `{"result": "verified_eligible" | "verified_but_over_18" | ...}`.
#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    result: Option<String>,
}

impl HttpIdvOracle {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            endpoint: endpoint.into(),
        }
    }

    /// Fetch the member's full verification status.
    pub async fn status(&self, member: &MemberId) -> Result<IdvStatus, OracleError> {
        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("slack_id", member.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Unreachable(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    OracleError::Unreachable(format!("connection failed: {e}"))
                } else {
                    OracleError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            tracing::error!(member = %member, status = %response.status(), "IDV request failed");
            return Err(OracleError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let body: CheckResponse = response.json().await.map_err(|e| {
            OracleError::InvalidResponse(format!("failed to parse check response: {e}"))
        })?;

        let status = IdvStatus::from_result(body.result.as_deref());
        tracing::debug!(member = %member, ?status, "IDV status");
        Ok(status)
    }
}

impl Default for HttpIdvOracle {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl IdvOracle for HttpIdvOracle {
    async fn is_verified(&self, member: &MemberId) -> Result<bool, OracleError> {
        Ok(self.status(member).await?.is_verified())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_response_deserialization() {
        let resp: CheckResponse =
            serde_json::from_str(r#"{"result": "verified_but_over_18"}"#).unwrap();
        assert_eq!(resp.result.as_deref(), Some("verified_but_over_18"));
    }

    #[test]
    fn check_response_without_result() {
        let resp: CheckResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(resp.result, None);
    }

    #[tokio::test]
    async fn unreachable_service_is_an_error_not_a_verdict() {
        // Port 9 (discard) on localhost is closed in test environments.
        let oracle = HttpIdvOracle::with_timeout("http://127.0.0.1:9/check", Duration::from_millis(500));
        let err = oracle.is_verified(&MemberId::from("U1AA")).await.unwrap_err();
        assert_eq!(err.kind(), blam_types::ErrorKind::OracleUnavailable);
    }
}
