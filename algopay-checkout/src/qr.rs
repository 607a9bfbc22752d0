//! Client for the QR/session-initiation endpoint.
//!
//! The point-of-sale screen does not drive the wallet flow; it asks the
//! backend for a payment URI and a pre-rendered QR image, displays them, and
//! lets a mobile wallet take over. This client consumes that endpoint.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::reconcile::unwrap_result_envelope;

/// Errors produced by the QR session endpoint.
#[derive(Debug, thiserror::Error)]
pub enum QrError {
    /// The HTTP request failed.
    #[error("qr session request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The backend reported a failure.
    #[error("qr session rejected: {0}")]
    Backend(String),
    /// The response body did not match the expected shape.
    #[error("could not parse qr session response: {0}")]
    Parse(String),
}

/// Request payload for a new QR payment session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QrSessionRequest {
    /// Payment amount in display units.
    pub amount: Decimal,
    /// Currency code (`ALGO` or an asset name).
    pub currency: String,
    /// Point-of-sale order reference.
    pub order_ref: String,
}

/// A payment session ready for QR display.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QrSession {
    /// Base64-encoded PNG (as a data URI) of the QR code.
    pub qr_code: String,
    /// The `algorand://pay` URI encoded in the QR code.
    pub payment_uri: String,
    /// The merchant's receiving address.
    pub merchant_address: String,
    /// Payment amount in display units.
    pub amount: Decimal,
    /// Currency code.
    pub currency: String,
}

/// Raw endpoint response carrying either a session or an error message.
#[derive(Debug, Deserialize)]
struct RawQrResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(flatten)]
    session: Option<QrSession>,
}

/// HTTP client for the QR/session-initiation endpoint.
pub struct QrSessionClient {
    endpoint: String,
    client: reqwest::Client,
}

impl QrSessionClient {
    /// Creates a client for the given endpoint URL.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build reqwest::Client");
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    /// Requests a payment session for a point-of-sale order.
    ///
    /// # Errors
    ///
    /// Returns [`QrError`] on transport failure, a backend rejection, or a
    /// malformed response.
    pub async fn create_session(&self, request: &QrSessionRequest) -> Result<QrSession, QrError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(QrError::Backend(format!("backend returned {status}")));
        }

        let value: serde_json::Value = response.json().await?;
        let raw: RawQrResponse = serde_json::from_value(unwrap_result_envelope(value))
            .map_err(|e| QrError::Parse(e.to_string()))?;

        if raw.error || !raw.success {
            return Err(QrError::Backend(
                raw.message
                    .unwrap_or_else(|| "qr session creation failed".to_owned()),
            ));
        }
        raw.session
            .ok_or_else(|| QrError::Parse("response missing session fields".to_owned()))
    }
}

impl std::fmt::Debug for QrSessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrSessionClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
