//! Unsigned transaction construction.
//!
//! Builds the two transaction shapes checkout needs: a native microalgo
//! payment (`pay`) or a fungible-asset transfer (`axfer`), both flat-fee with
//! the fee floored at the network minimum. Field names follow the chain's
//! canonical short encoding (`snd`, `rcv`, `amt`, `xaid`, ...), so the wallet
//! protocol receives the transaction in the shape it signs.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::amount;
use crate::error::{AddressRole, CheckoutError};
use crate::intent::PaymentIntent;
use crate::networks::USDC_DECIMALS;
use crate::params::{MIN_TXN_FEE, NetworkParameters};

/// Fields common to both transaction bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHeader {
    /// Sending account.
    #[serde(rename = "snd")]
    pub sender: Address,
    /// Flat fee in microalgos.
    #[serde(rename = "fee")]
    pub fee: u64,
    /// First valid round.
    #[serde(rename = "fv")]
    pub first_valid: u64,
    /// Last valid round.
    #[serde(rename = "lv")]
    pub last_valid: u64,
    /// Genesis id of the target network.
    #[serde(rename = "gen")]
    pub genesis_id: String,
    /// Raw genesis hash of the target network.
    #[serde(rename = "gh", with = "crate::encoding::base64_bytes")]
    pub genesis_hash: Vec<u8>,
    /// Optional note payload.
    #[serde(
        rename = "note",
        with = "crate::encoding::base64_bytes",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub note: Vec<u8>,
}

/// The type-specific body of an unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransactionBody {
    /// Native microalgo payment.
    #[serde(rename = "pay")]
    Payment {
        /// Receiving account.
        #[serde(rename = "rcv")]
        receiver: Address,
        /// Amount in microalgos.
        #[serde(rename = "amt")]
        amount: u64,
    },
    /// Fungible-asset transfer (also used zero-amount for opt-ins).
    #[serde(rename = "axfer")]
    AssetTransfer {
        /// Receiving account.
        #[serde(rename = "arcv")]
        receiver: Address,
        /// Amount in the asset's base units.
        #[serde(rename = "aamt")]
        amount: u64,
        /// The transferred asset.
        #[serde(rename = "xaid")]
        asset_id: u64,
    },
}

/// An unsigned transaction ready to hand to the wallet for signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    /// Common fields.
    #[serde(flatten)]
    pub header: TransactionHeader,
    /// Payment or asset-transfer body.
    #[serde(flatten)]
    pub body: TransactionBody,
}

impl UnsignedTransaction {
    /// Returns the receiving address.
    #[must_use]
    pub const fn receiver(&self) -> &Address {
        match &self.body {
            TransactionBody::Payment { receiver, .. }
            | TransactionBody::AssetTransfer { receiver, .. } => receiver,
        }
    }

    /// Returns the transfer amount in base units.
    #[must_use]
    pub const fn amount(&self) -> u64 {
        match &self.body {
            TransactionBody::Payment { amount, .. }
            | TransactionBody::AssetTransfer { amount, .. } => *amount,
        }
    }

    /// Whether this is an asset transfer.
    #[must_use]
    pub const fn is_asset_transfer(&self) -> bool {
        matches!(self.body, TransactionBody::AssetTransfer { .. })
    }
}

fn header(
    sender: Address,
    params: &NetworkParameters,
    note: Vec<u8>,
) -> TransactionHeader {
    TransactionHeader {
        sender,
        fee: params.fee.max(MIN_TXN_FEE),
        first_valid: params.first_valid,
        last_valid: params.last_valid,
        genesis_id: params.genesis_id.clone(),
        genesis_hash: params.genesis_hash.clone(),
        note,
    }
}

/// Builds the checkout transaction for a payment intent.
///
/// Validates both addresses, converts the decimal amount into base units
/// (microalgos for native transfers, asset units otherwise), and embeds the
/// note bytes. The fee is flat and floored at [`MIN_TXN_FEE`].
///
/// # Errors
///
/// Returns [`CheckoutError::InvalidAddress`] if either address fails
/// validation, or [`CheckoutError::TransactionBuild`] on malformed numeric
/// input or an invalid parameter set.
pub fn build_payment(
    intent: &PaymentIntent,
    sender_address: &str,
    params: &NetworkParameters,
    note: Vec<u8>,
) -> Result<UnsignedTransaction, CheckoutError> {
    params
        .validate()
        .map_err(|e| CheckoutError::TransactionBuild(e.to_string()))?;

    let sender: Address =
        sender_address
            .trim()
            .parse()
            .map_err(|source| CheckoutError::InvalidAddress {
                role: AddressRole::Sender,
                source,
            })?;
    let receiver: Address = intent
        .merchant_address
        .trim()
        .parse()
        .map_err(|source| CheckoutError::InvalidAddress {
            role: AddressRole::Merchant,
            source,
        })?;

    let body = if intent.is_asset_transfer {
        let asset_id = intent.asset_id.ok_or_else(|| {
            CheckoutError::TransactionBuild("asset transfer without an asset id".to_owned())
        })?;
        let decimals = intent.asset_decimals.unwrap_or(USDC_DECIMALS);
        let units = amount::to_base_units(intent.amount, decimals)
            .map_err(|e| CheckoutError::TransactionBuild(e.to_string()))?;
        TransactionBody::AssetTransfer {
            receiver,
            amount: units,
            asset_id,
        }
    } else {
        let micros = amount::to_microalgos(intent.amount)
            .map_err(|e| CheckoutError::TransactionBuild(e.to_string()))?;
        TransactionBody::Payment {
            receiver,
            amount: micros,
        }
    };

    Ok(UnsignedTransaction {
        header: header(sender, params, note),
        body,
    })
}

/// Builds a zero-amount self-transfer registering `sender` for an asset.
///
/// # Errors
///
/// Returns [`CheckoutError::TransactionBuild`] on an invalid parameter set.
pub fn build_opt_in(
    sender: Address,
    asset_id: u64,
    params: &NetworkParameters,
) -> Result<UnsignedTransaction, CheckoutError> {
    params
        .validate()
        .map_err(|e| CheckoutError::TransactionBuild(e.to_string()))?;
    Ok(UnsignedTransaction {
        header: header(sender, params, Vec::new()),
        body: TransactionBody::AssetTransfer {
            receiver: sender,
            amount: 0,
            asset_id,
        },
    })
}

/// Errors produced by [`TransactionRecord`] state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// A signature was already attached.
    #[error("transaction is already signed")]
    AlreadySigned,
    /// The record was already broadcast.
    #[error("transaction was already broadcast")]
    AlreadyBroadcast,
    /// Broadcast was attempted before signing.
    #[error("transaction is not signed yet")]
    NotSigned,
}

/// Per-attempt transaction record.
///
/// Enforces the attempt invariants: the signed payload is set at most once
/// and broadcast is recorded at most once. Records are discarded when the
/// attempt completes; a retry starts over with a fresh record.
#[derive(Debug)]
pub struct TransactionRecord {
    unsigned: UnsignedTransaction,
    signed: Option<Vec<u8>>,
    tx_id: Option<String>,
    confirmed_round: Option<u64>,
}

impl TransactionRecord {
    /// Creates a record for a freshly built transaction.
    #[must_use]
    pub const fn new(unsigned: UnsignedTransaction) -> Self {
        Self {
            unsigned,
            signed: None,
            tx_id: None,
            confirmed_round: None,
        }
    }

    /// Returns the unsigned transaction.
    #[must_use]
    pub const fn unsigned(&self) -> &UnsignedTransaction {
        &self.unsigned
    }

    /// Returns the signed payload, if signing has happened.
    #[must_use]
    pub fn signed(&self) -> Option<&[u8]> {
        self.signed.as_deref()
    }

    /// Returns the broadcast transaction id, if any.
    #[must_use]
    pub fn tx_id(&self) -> Option<&str> {
        self.tx_id.as_deref()
    }

    /// Returns the confirmed round, if confirmation was observed.
    #[must_use]
    pub const fn confirmed_round(&self) -> Option<u64> {
        self.confirmed_round
    }

    /// Attaches the signed payload. May be called at most once.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::AlreadySigned`] on a second call.
    pub fn attach_signature(&mut self, signed: Vec<u8>) -> Result<(), RecordError> {
        if self.signed.is_some() {
            return Err(RecordError::AlreadySigned);
        }
        self.signed = Some(signed);
        Ok(())
    }

    /// Records the broadcast transaction id. May be called at most once,
    /// and only after signing.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError`] if unsigned or already broadcast.
    pub fn mark_broadcast(&mut self, tx_id: impl Into<String>) -> Result<(), RecordError> {
        if self.signed.is_none() {
            return Err(RecordError::NotSigned);
        }
        if self.tx_id.is_some() {
            return Err(RecordError::AlreadyBroadcast);
        }
        self.tx_id = Some(tx_id.into());
        Ok(())
    }

    /// Records the round the transaction was confirmed in.
    pub const fn mark_confirmed(&mut self, round: u64) {
        self.confirmed_round = Some(round);
    }
}
