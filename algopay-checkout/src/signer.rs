//! Cooperative signing and single-shot broadcast.
//!
//! Signing hands the transaction to the connected wallet as a one-element
//! group and normalizes whatever shape comes back into a single signed blob.
//! Broadcast submits that blob to the network exactly once per record:
//! duplicate-submission semantics on the node side make blind retries unsafe,
//! so a failed broadcast is terminal for the attempt.

use algopay::error::CheckoutError;
use algopay::txn::{TransactionRecord, UnsignedTransaction};
use algopay_node::client::AlgodApi;
use algopay_node::error::NodeError;

use crate::wallet::{SignedPayload, SigningGroup, WalletConnector, WalletError};

/// Flattens a wallet's signed result into a list of blobs.
///
/// A nested result contributes its first group (checkout only ever signs
/// one-element groups); a single buffer becomes a one-element list.
fn normalize(payload: SignedPayload) -> Vec<Vec<u8>> {
    match payload {
        SignedPayload::Nested(groups) => groups.into_iter().next().unwrap_or_default(),
        SignedPayload::Flat(blobs) => blobs,
        SignedPayload::Single(blob) => vec![blob],
    }
}

/// Signs `txn` with the connected wallet.
///
/// Returns the single signed blob of the one-transaction group.
///
/// # Errors
///
/// Returns [`CheckoutError::SigningRejected`] if the user cancels or the
/// wallet returns no signed bytes.
pub async fn sign_transaction(
    wallet: &dyn WalletConnector,
    txn: UnsignedTransaction,
) -> Result<Vec<u8>, CheckoutError> {
    let group = SigningGroup::single(txn);
    let payload = wallet.sign_transactions(group).await.map_err(|e| match e {
        WalletError::Cancelled => CheckoutError::SigningRejected("cancelled by user".to_owned()),
        other => CheckoutError::SigningRejected(other.to_string()),
    })?;

    let blob = normalize(payload).into_iter().next().unwrap_or_default();
    if blob.is_empty() {
        return Err(CheckoutError::SigningRejected(
            "wallet returned no signed bytes".to_owned(),
        ));
    }
    tracing::debug!(signed_len = blob.len(), "wallet signed transaction");
    Ok(blob)
}

/// Broadcasts the record's signed payload. Never retried.
///
/// # Errors
///
/// Returns [`CheckoutError::Broadcast`] on node rejection (overspend is
/// classified as insufficient funds) or if the record is not in a
/// broadcastable state.
pub async fn broadcast<A: AlgodApi + ?Sized>(
    algod: &A,
    record: &mut TransactionRecord,
) -> Result<String, CheckoutError> {
    if record.tx_id().is_some() {
        return Err(CheckoutError::broadcast("transaction was already broadcast"));
    }
    let signed = record
        .signed()
        .ok_or_else(|| CheckoutError::broadcast("transaction is not signed"))?
        .to_vec();

    let tx_id = algod.submit_raw(&signed).await.map_err(|e| match &e {
        NodeError::Api { message, .. } => CheckoutError::broadcast(message.clone()),
        NodeError::Transport(_) | NodeError::Parse(_) => CheckoutError::broadcast(e.to_string()),
    })?;

    record
        .mark_broadcast(&tx_id)
        .map_err(|e| CheckoutError::broadcast(e.to_string()))?;
    tracing::info!(tx_id = %tx_id, "transaction broadcast");
    Ok(tx_id)
}

/// Signs and broadcasts as one logical step.
///
/// A signing failure never reaches broadcast.
///
/// # Errors
///
/// Propagates [`CheckoutError::SigningRejected`] and
/// [`CheckoutError::Broadcast`].
pub async fn sign_and_broadcast<A: AlgodApi + ?Sized>(
    wallet: &dyn WalletConnector,
    algod: &A,
    record: &mut TransactionRecord,
) -> Result<String, CheckoutError> {
    let signed = sign_transaction(wallet, record.unsigned().clone()).await?;
    record
        .attach_signature(signed)
        .map_err(|e| CheckoutError::SigningRejected(e.to_string()))?;
    broadcast(algod, record).await
}
