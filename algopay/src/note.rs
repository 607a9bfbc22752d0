//! The structured note embedded in every checkout payment transaction.
//!
//! The note ties the on-chain transfer back to the merchant order: the
//! serving host, the display amount and currency, the backend transaction
//! reference, and for asset payments the asset id and name. It is serialized
//! as UTF-8 JSON bytes and placed in the transaction's note field.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::intent::PaymentIntent;

/// Note payload serialized into the transaction's note field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxNote {
    /// Host name of the page that initiated the payment.
    pub host: String,
    /// Decimal display amount.
    pub amount: Decimal,
    /// Currency display name.
    pub currency: String,
    /// Backend transaction reference, if one exists yet.
    pub tx_id: Option<String>,
    /// Asset id, present only for asset transfers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asa_id: Option<u64>,
    /// Asset display name, present only for asset transfers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asa_name: Option<String>,
}

impl TxNote {
    /// Builds the note for a payment intent originating from `host`.
    #[must_use]
    pub fn for_intent(host: impl Into<String>, intent: &PaymentIntent) -> Self {
        let (asa_id, asa_name) = if intent.is_asset_transfer {
            (
                intent.asset_id,
                Some(intent.currency_display_name.clone()),
            )
        } else {
            (None, None)
        };
        Self {
            host: host.into(),
            amount: intent.amount,
            currency: intent.currency_display_name.clone(),
            tx_id: intent.backend_tx_reference.clone(),
            asa_id,
            asa_name,
        }
    }

    /// Serializes the note to UTF-8 JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
