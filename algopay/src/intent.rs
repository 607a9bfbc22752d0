//! The immutable per-attempt payment intent.
//!
//! An intent is read once from the merchant form's inline JSON blob and never
//! mutated afterwards; a retried payment re-reads a fresh intent. Wire keys
//! follow the form payload (`is_asa`, `tx_id`) rather than the Rust field
//! names.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::networks::Network;

/// Everything the orchestrator needs to know about one payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Decimal display amount, e.g. `2.5`.
    pub amount: Decimal,

    /// Currency name shown to the user (e.g. `ALGO`, `USDC`).
    pub currency_display_name: String,

    /// Whether this pays in a fungible asset rather than the native coin.
    #[serde(rename = "is_asa", default)]
    pub is_asset_transfer: bool,

    /// Asset id, required when [`Self::is_asset_transfer`] is set.
    #[serde(default)]
    pub asset_id: Option<u64>,

    /// Asset decimal count; defaults to 6 when omitted.
    #[serde(default)]
    pub asset_decimals: Option<u32>,

    /// The merchant's receiving address, as configured.
    pub merchant_address: String,

    /// Which network the payment targets.
    pub network: Network,

    /// Base URL of the node to talk to.
    pub node_url: String,

    /// Backend transaction reference used for reconciliation.
    #[serde(rename = "tx_id", default)]
    pub backend_tx_reference: Option<String>,
}

impl PaymentIntent {
    /// Creates a native-currency intent.
    #[must_use]
    pub fn native(
        amount: Decimal,
        merchant_address: impl Into<String>,
        network: Network,
        node_url: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            currency_display_name: "ALGO".to_owned(),
            is_asset_transfer: false,
            asset_id: None,
            asset_decimals: None,
            merchant_address: merchant_address.into(),
            network,
            node_url: node_url.into(),
            backend_tx_reference: None,
        }
    }

    /// Creates an asset-transfer intent.
    #[must_use]
    pub fn asset(
        amount: Decimal,
        asset_id: u64,
        asset_decimals: u32,
        merchant_address: impl Into<String>,
        network: Network,
        node_url: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            currency_display_name: "USDC".to_owned(),
            is_asset_transfer: true,
            asset_id: Some(asset_id),
            asset_decimals: Some(asset_decimals),
            merchant_address: merchant_address.into(),
            network,
            node_url: node_url.into(),
            backend_tx_reference: None,
        }
    }

    /// Sets the currency display name.
    #[must_use]
    pub fn with_currency(mut self, name: impl Into<String>) -> Self {
        self.currency_display_name = name.into();
        self
    }

    /// Sets the backend transaction reference.
    #[must_use]
    pub fn with_tx_reference(mut self, reference: impl Into<String>) -> Self {
        self.backend_tx_reference = Some(reference.into());
        self
    }
}
