//! Error taxonomy for checkout payment attempts.
//!
//! Every failure a payment attempt can surface to the user is a variant of
//! [`CheckoutError`]. The orchestrator recovers each of these into a terminal
//! `Failed` state with a user-visible notice; none propagate uncaught.

use std::fmt;

use crate::address::AddressError;

/// Which address failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressRole {
    /// The connected wallet's address.
    Sender,
    /// The configured merchant address.
    Merchant,
}

impl fmt::Display for AddressRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sender => f.write_str("sender"),
            Self::Merchant => f.write_str("merchant"),
        }
    }
}

/// Which party is missing an asset opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptInParty {
    /// The paying wallet.
    Sender,
    /// The receiving merchant account.
    Merchant,
}

impl fmt::Display for OptInParty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sender => f.write_str("sender"),
            Self::Merchant => f.write_str("merchant"),
        }
    }
}

/// Terminal failure reasons for a payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    /// The wallet connect/reconnect lifecycle failed.
    #[error("wallet connection failed: {0}")]
    WalletConnectionFailed(String),

    /// Payment was initiated without a connected wallet.
    #[error("wallet is not connected")]
    WalletNotConnected,

    /// The merchant address is missing from the configuration.
    #[error("merchant address is not configured")]
    ConfigurationError,

    /// The sender or merchant address failed validation.
    #[error("{role} address is invalid: {source}")]
    InvalidAddress {
        /// Which address failed.
        role: AddressRole,
        /// The underlying parse failure.
        #[source]
        source: AddressError,
    },

    /// An asset transfer was requested but a party has not opted in.
    #[error("{party} is not opted in to asset {asset_id}")]
    AssetNotOptedIn {
        /// Which party is missing the opt-in.
        party: OptInParty,
        /// The asset in question.
        asset_id: u64,
    },

    /// An external module load exceeded its timeout guard.
    #[error("external module load timed out")]
    ExternalLoadTimeout,

    /// Transaction construction failed on malformed numeric input.
    #[error("transaction build failed: {0}")]
    TransactionBuild(String),

    /// The wallet returned no signature or the user cancelled.
    #[error("signing rejected: {0}")]
    SigningRejected(String),

    /// The network rejected the broadcast.
    #[error("broadcast failed: {message}")]
    Broadcast {
        /// The node's error text, surfaced verbatim.
        message: String,
        /// Whether the node reported an overspend.
        insufficient_funds: bool,
    },

    /// The merchant backend rejected the payment report.
    #[error("payment reconciliation failed: {0}")]
    ReconciliationFailed(String),

    /// A payment attempt is already in flight; re-initiate once it settles.
    #[error("another payment attempt is already in progress")]
    AttemptInProgress,
}

impl CheckoutError {
    /// Creates a [`CheckoutError::Broadcast`], classifying overspend errors.
    #[must_use]
    pub fn broadcast(message: impl Into<String>) -> Self {
        let message = message.into();
        let insufficient_funds = message.to_lowercase().contains("overspend");
        Self::Broadcast {
            message,
            insufficient_funds,
        }
    }
}
