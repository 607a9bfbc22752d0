//! Canonical network transaction parameters.
//!
//! The node's transaction-parameters endpoint has shipped several field-name
//! generations (`first-round` vs `firstValid` and so on). The node client
//! normalizes whatever it receives into this one canonical struct at the
//! fetch boundary; nothing deeper in the pipeline branches on field names.
//!
//! Parameters are fetched fresh for every transaction attempt. The validity
//! window expires after roughly a thousand rounds, so reusing a prior
//! attempt's parameters would produce a dead transaction.

use serde::{Deserialize, Serialize};

/// Minimum flat fee accepted by the network, in microalgos.
pub const MIN_TXN_FEE: u64 = 1000;

/// Errors produced when validating fetched parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamsError {
    /// The validity window is inverted.
    #[error("invalid validity window: first {first_valid} > last {last_valid}")]
    InvalidWindow {
        /// First round the transaction would be valid in.
        first_valid: u64,
        /// Last round the transaction would be valid in.
        last_valid: u64,
    },
    /// The genesis hash is missing or has the wrong length.
    #[error("genesis hash must be 32 bytes, got {0}")]
    BadGenesisHash(usize),
}

/// Chain parameters required to construct a valid transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParameters {
    /// Flat fee in microalgos, already floored at the network minimum.
    pub fee: u64,
    /// First round the transaction is valid in.
    pub first_valid: u64,
    /// Last round the transaction is valid in.
    pub last_valid: u64,
    /// Genesis id string (e.g. `testnet-v1.0`).
    pub genesis_id: String,
    /// Raw 32-byte genesis hash.
    #[serde(with = "crate::encoding::base64_bytes")]
    pub genesis_hash: Vec<u8>,
}

impl NetworkParameters {
    /// Checks the window ordering and genesis-hash shape invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError`] if an invariant is violated.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.first_valid > self.last_valid {
            return Err(ParamsError::InvalidWindow {
                first_valid: self.first_valid,
                last_valid: self.last_valid,
            });
        }
        if self.genesis_hash.len() != 32 {
            return Err(ParamsError::BadGenesisHash(self.genesis_hash.len()));
        }
        Ok(())
    }
}
