//! Asset opt-in verification.
//!
//! An account can only hold an asset it has opted in to, so checkout blocks
//! asset payments until both the sender and the merchant show the asset in
//! their holdings. Query failures fail soft: absence of an opt-in is the safe
//! default, so an unreachable node degrades to "not opted in" with a warning
//! instead of aborting the caller.

use serde::{Deserialize, Serialize};

use crate::client::AlgodApi;

/// Opt-in status of both payment parties for one asset.
///
/// Recomputed after every wallet connect and after an opt-in submission;
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetOptInState {
    /// Whether the paying wallet holds the asset.
    pub sender_opted_in: bool,
    /// Whether the merchant account holds the asset.
    pub merchant_opted_in: bool,
}

impl AssetOptInState {
    /// Whether an asset payment can proceed.
    #[must_use]
    pub const fn ready(&self) -> bool {
        self.sender_opted_in && self.merchant_opted_in
    }
}

/// Returns whether `address` holds `asset_id`.
///
/// Asset ids are compared as integers regardless of how the node spelled the
/// field. On a query failure this logs a warning and returns `false`.
pub async fn is_opted_in<A: AlgodApi + ?Sized>(algod: &A, address: &str, asset_id: u64) -> bool {
    match algod.account_assets(address).await {
        Ok(assets) => assets.iter().any(|a| a.asset_id == asset_id),
        Err(e) => {
            tracing::warn!(address, asset_id, error = %e, "asset opt-in check failed");
            false
        }
    }
}

/// Recomputes the opt-in state of both parties for `asset_id`.
pub async fn check_parties<A: AlgodApi + ?Sized>(
    algod: &A,
    sender: &str,
    merchant: &str,
    asset_id: u64,
) -> AssetOptInState {
    AssetOptInState {
        sender_opted_in: is_opted_in(algod, sender, asset_id).await,
        merchant_opted_in: is_opted_in(algod, merchant, asset_id).await,
    }
}
