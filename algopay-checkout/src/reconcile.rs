//! Backend payment reconciliation.
//!
//! After a successful broadcast the transaction id is reported to the
//! merchant backend in a single POST. The backend's answer decides the
//! attempt's terminal state; the call is never retried, and a reconciliation
//! failure deliberately leaves the already-broadcast transfer alone. There
//! is no compensating rollback for an irreversible broadcast.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use algopay::error::CheckoutError;
use algopay_node::client::BoxFuture;

/// Payment report sent to the backend reconciliation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReport {
    /// Backend transaction reference, when known.
    pub tx_reference: Option<String>,
    /// The broadcast transaction id.
    pub tx_hash: String,
    /// The paying wallet's address.
    pub sender_address: String,
}

/// Reconciliation response after envelope unwrapping.
#[derive(Debug, Default, Deserialize)]
struct ReportOutcome {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Unwraps one level of `{"result": ...}` envelope if present.
pub(crate) fn unwrap_result_envelope(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(mut map) if map.contains_key("result") => map
            .remove("result")
            .unwrap_or(serde_json::Value::Object(map)),
        other => other,
    }
}

/// Reports a broadcast payment to the merchant backend.
pub trait Reconcile: Send + Sync {
    /// Sends the report; `Ok(())` means the backend accepted the payment.
    fn report_payment<'a>(
        &'a self,
        report: &'a PaymentReport,
    ) -> BoxFuture<'a, Result<(), CheckoutError>>;
}

/// Configuration for [`HttpReconciler`].
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Full URL of the reconciliation endpoint.
    pub endpoint: String,
    /// HTTP request timeout.
    pub timeout: Duration,
}

impl ReconcilerConfig {
    /// Creates a config for the given endpoint URL.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP reconciliation client.
pub struct HttpReconciler {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpReconciler {
    /// Creates a reconciler from the given configuration.
    #[must_use]
    pub fn new(config: ReconcilerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to build reqwest::Client");
        Self {
            endpoint: config.endpoint,
            client,
        }
    }

    async fn post_report(&self, report: &PaymentReport) -> Result<(), CheckoutError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(report)
            .send()
            .await
            .map_err(|e| CheckoutError::ReconciliationFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CheckoutError::ReconciliationFailed(format!(
                "backend returned {status}"
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CheckoutError::ReconciliationFailed(e.to_string()))?;
        let outcome: ReportOutcome = serde_json::from_value(unwrap_result_envelope(value))
            .unwrap_or_default();

        if outcome.success {
            tracing::info!(tx_hash = %report.tx_hash, "payment reconciled");
            Ok(())
        } else {
            Err(CheckoutError::ReconciliationFailed(
                outcome
                    .message
                    .unwrap_or_else(|| "payment processing failed".to_owned()),
            ))
        }
    }
}

impl std::fmt::Debug for HttpReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpReconciler")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Reconcile for HttpReconciler {
    fn report_payment<'a>(
        &'a self,
        report: &'a PaymentReport,
    ) -> BoxFuture<'a, Result<(), CheckoutError>> {
        Box::pin(self.post_report(report))
    }
}
