//! Hosted-checkout gateway adapter
//!
//! Talks to the external payment provider's REST API. The provider hosts
//! the card form; we open a session tagged with the `(job, pro)` pair, send
//! the professional to `redirect_url`, and later learn the outcome by
//! polling or via the provider's webhook hitting our confirmation route.
//!
//! External API errors are mapped to `PortError` variants:
//! - 404 -> `PortError::NotFound`
//! - 401/403 -> `PortError::Unauthorized`
//! - 429 -> `PortError::RateLimited`
//! - 5xx -> `PortError::ServiceUnavailable`
//! - request timeout -> `PortError::Timeout`
//! - anything else -> `PortError::Internal`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use core_kernel::{DomainPort, JobId, Money, PaymentRef, PortError, ProId};
use domain_leads::{CheckoutSession, PaymentGateway, SessionOutcome};

/// Configuration for the checkout gateway
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Base URL of the provider API (e.g., "https://pay.example.com/api")
    pub base_url: String,
    /// Secret API key, sent as a bearer token
    pub api_key: String,
    /// Our own site URL, used to build the success/cancel return redirects
    pub site_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl CheckoutConfig {
    fn success_url(&self, job_id: JobId, pro_id: ProId) -> String {
        format!(
            "{}/payments/return?jobId={}&proId={}&outcome=completed",
            self.site_url,
            job_id.as_uuid(),
            pro_id.as_uuid()
        )
    }

    fn cancel_url(&self, job_id: JobId, pro_id: ProId) -> String {
        format!(
            "{}/payments/return?jobId={}&proId={}&outcome=cancelled",
            self.site_url,
            job_id.as_uuid(),
            pro_id.as_uuid()
        )
    }
}

#[derive(Debug, Serialize)]
struct CreateSessionBody {
    amount_minor: i64,
    currency: String,
    product_name: String,
    success_url: String,
    cancel_url: String,
    metadata: SessionMetadata,
}

#[derive(Debug, Serialize)]
struct SessionMetadata {
    job_id: String,
    pro_id: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct SessionStatusResponse {
    status: String,
    payment_status: Option<String>,
}

/// HTTP adapter to the hosted-checkout provider
#[derive(Debug, Clone)]
pub struct CheckoutGateway {
    config: CheckoutConfig,
    client: reqwest::Client,
}

impl CheckoutGateway {
    /// Creates a gateway from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: CheckoutConfig) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PortError::Internal {
                message: "failed to build HTTP client".to_string(),
                source: Some(Box::new(e)),
            })?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn error_for_status(&self, response: reqwest::Response) -> PortError {
        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => PortError::not_found("PaymentSession", "unknown"),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized {
                message: "checkout provider rejected credentials".to_string(),
            },
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60);
                PortError::RateLimited { retry_after_secs }
            }
            s if s.is_server_error() => PortError::ServiceUnavailable {
                service: "checkout provider".to_string(),
            },
            _ => PortError::internal(format!("checkout provider returned {status}")),
        }
    }

    fn transport_error(err: reqwest::Error, operation: &str, timeout_secs: u64) -> PortError {
        if err.is_timeout() {
            PortError::Timeout {
                operation: operation.to_string(),
                duration_ms: timeout_secs * 1000,
            }
        } else {
            PortError::Connection {
                message: format!("{operation} request failed"),
                source: Some(Box::new(err)),
            }
        }
    }
}

impl DomainPort for CheckoutGateway {}

#[async_trait]
impl PaymentGateway for CheckoutGateway {
    async fn create_session(
        &self,
        job_id: JobId,
        pro_id: ProId,
        amount: Money,
    ) -> Result<CheckoutSession, PortError> {
        let body = CreateSessionBody {
            amount_minor: amount.minor_units(),
            currency: amount.currency().code().to_string(),
            product_name: "Lead Access".to_string(),
            success_url: self.config.success_url(job_id, pro_id),
            cancel_url: self.config.cancel_url(job_id, pro_id),
            metadata: SessionMetadata {
                job_id: job_id.as_uuid().to_string(),
                pro_id: pro_id.as_uuid().to_string(),
            },
        };

        let response = self
            .client
            .post(self.url("v1/checkout/sessions"))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::transport_error(e, "create_session", self.config.timeout_secs))?;

        if !response.status().is_success() {
            let err = self.error_for_status(response).await;
            warn!(%job_id, %pro_id, error = %err, "checkout session creation failed");
            return Err(err);
        }

        let session: SessionResponse = response.json().await.map_err(|e| PortError::Internal {
            message: "malformed session response".to_string(),
            source: Some(Box::new(e)),
        })?;

        debug!(%job_id, %pro_id, session_id = %session.id, "checkout session created");
        Ok(CheckoutSession {
            session_id: PaymentRef::new(session.id),
            redirect_url: session.url,
        })
    }

    async fn outcome(&self, session_id: &PaymentRef) -> Result<SessionOutcome, PortError> {
        let response = self
            .client
            .get(self.url(&format!("v1/checkout/sessions/{}", session_id.as_str())))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| Self::transport_error(e, "outcome", self.config.timeout_secs))?;

        // An unknown session is a reportable outcome, not a failure.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(SessionOutcome::Unknown);
        }
        if !response.status().is_success() {
            return Err(self.error_for_status(response).await);
        }

        let status: SessionStatusResponse =
            response.json().await.map_err(|e| PortError::Internal {
                message: "malformed session status response".to_string(),
                source: Some(Box::new(e)),
            })?;

        Ok(map_outcome(&status))
    }

    async fn refund(&self, session_id: &PaymentRef) -> Result<(), PortError> {
        let response = self
            .client
            .post(self.url("v1/refunds"))
            .bearer_auth(&self.config.api_key)
            .json(&serde_json::json!({ "session_id": session_id.as_str() }))
            .send()
            .await
            .map_err(|e| Self::transport_error(e, "refund", self.config.timeout_secs))?;

        if !response.status().is_success() {
            let err = self.error_for_status(response).await;
            warn!(session = %session_id, error = %err, "refund request failed");
            return Err(err);
        }

        debug!(session = %session_id, "refund accepted by provider");
        Ok(())
    }
}

fn map_outcome(status: &SessionStatusResponse) -> SessionOutcome {
    match (status.status.as_str(), status.payment_status.as_deref()) {
        (_, Some("paid")) | ("complete", _) => SessionOutcome::Completed,
        ("expired", _) | ("cancelled", _) => SessionOutcome::Cancelled,
        ("open", _) => SessionOutcome::Pending,
        _ => SessionOutcome::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: &str, payment_status: Option<&str>) -> SessionStatusResponse {
        SessionStatusResponse {
            status: status.to_string(),
            payment_status: payment_status.map(str::to_string),
        }
    }

    #[test]
    fn test_outcome_mapping() {
        assert_eq!(map_outcome(&status("complete", Some("paid"))), SessionOutcome::Completed);
        assert_eq!(map_outcome(&status("open", Some("paid"))), SessionOutcome::Completed);
        assert_eq!(map_outcome(&status("expired", None)), SessionOutcome::Cancelled);
        assert_eq!(map_outcome(&status("open", Some("unpaid"))), SessionOutcome::Pending);
        assert_eq!(map_outcome(&status("weird", None)), SessionOutcome::Unknown);
    }

    #[test]
    fn test_return_urls_carry_the_pair() {
        let config = CheckoutConfig {
            base_url: "https://pay.example.com/api".to_string(),
            api_key: "sk_test".to_string(),
            site_url: "https://connect.example.com".to_string(),
            timeout_secs: 30,
        };
        let job_id = JobId::new();
        let pro_id = ProId::new();

        let url = config.success_url(job_id, pro_id);
        assert!(url.starts_with("https://connect.example.com/payments/return?"));
        assert!(url.contains(&job_id.as_uuid().to_string()));
        assert!(url.contains(&pro_id.as_uuid().to_string()));
        assert!(url.contains("outcome=completed"));

        assert!(config.cancel_url(job_id, pro_id).contains("outcome=cancelled"));
    }
}
