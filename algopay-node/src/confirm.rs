//! Bounded, best-effort confirmation polling.
//!
//! Used for opt-in transactions only: the payment transaction itself is
//! reconciled with the backend by transaction id and needs no on-chain
//! confirmation first. Polling advances round by round up to a bound and
//! reports an explicit outcome; exhausting the bound is not an error, and a
//! caller that needs a hard guarantee must re-check independently.

use crate::client::AlgodApi;

/// Default number of rounds to wait for confirmation.
pub const DEFAULT_MAX_ROUNDS: u64 = 8;

/// Outcome of a confirmation poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    /// Whether the transaction was observed in a block.
    pub confirmed: bool,
    /// The confirming round, when observed.
    pub round: Option<u64>,
}

impl Confirmation {
    const fn unconfirmed() -> Self {
        Self {
            confirmed: false,
            round: None,
        }
    }
}

/// Polls for inclusion of `tx_id`, advancing at most `max_rounds` rounds.
///
/// Stops early on the round that reports confirmation. Node errors during
/// polling are logged and soft-fail to an unconfirmed outcome.
pub async fn wait_for_confirmation<A: AlgodApi + ?Sized>(
    algod: &A,
    tx_id: &str,
    max_rounds: u64,
) -> Confirmation {
    let mut round = match algod.last_round().await {
        Ok(round) => round,
        Err(e) => {
            tracing::warn!(tx_id, error = %e, "confirmation poll could not read node status");
            return Confirmation::unconfirmed();
        }
    };

    for _ in 0..max_rounds {
        round += 1;
        if let Err(e) = algod.wait_for_round_after(round).await {
            tracing::warn!(tx_id, round, error = %e, "confirmation poll stopped on wait error");
            return Confirmation::unconfirmed();
        }
        match algod.pending_info(tx_id).await {
            Ok(pending) if pending.is_confirmed() => {
                tracing::debug!(tx_id, round = ?pending.confirmed_round, "transaction confirmed");
                return Confirmation {
                    confirmed: true,
                    round: pending.confirmed_round,
                };
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(tx_id, error = %e, "confirmation poll stopped on status error");
                return Confirmation::unconfirmed();
            }
        }
    }
    Confirmation::unconfirmed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{AssetHolding, BoxFuture, PendingTransaction};
    use crate::error::NodeError;
    use algopay::params::NetworkParameters;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Stub node that confirms on a scripted poll iteration (0 = never).
    struct ScriptedNode {
        confirm_on: u64,
        polls: AtomicU64,
    }

    impl ScriptedNode {
        fn new(confirm_on: u64) -> Self {
            Self {
                confirm_on,
                polls: AtomicU64::new(0),
            }
        }
    }

    impl AlgodApi for ScriptedNode {
        fn transaction_params(&self) -> BoxFuture<'_, Result<NetworkParameters, NodeError>> {
            unreachable!("not used by the poller")
        }

        fn account_assets<'a>(
            &'a self,
            _address: &'a str,
        ) -> BoxFuture<'a, Result<Vec<AssetHolding>, NodeError>> {
            unreachable!("not used by the poller")
        }

        fn submit_raw<'a>(&'a self, _signed: &'a [u8]) -> BoxFuture<'a, Result<String, NodeError>> {
            unreachable!("not used by the poller")
        }

        fn pending_info<'a>(
            &'a self,
            _tx_id: &'a str,
        ) -> BoxFuture<'a, Result<PendingTransaction, NodeError>> {
            let poll = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            let confirmed = self.confirm_on != 0 && poll >= self.confirm_on;
            Box::pin(async move {
                Ok(PendingTransaction {
                    confirmed_round: confirmed.then_some(9000),
                    pool_error: None,
                })
            })
        }

        fn last_round(&self) -> BoxFuture<'_, Result<u64, NodeError>> {
            Box::pin(async move { Ok(100) })
        }

        fn wait_for_round_after(&self, round: u64) -> BoxFuture<'_, Result<u64, NodeError>> {
            Box::pin(async move { Ok(round) })
        }
    }

    #[tokio::test]
    async fn polls_exactly_max_rounds_when_never_confirmed() {
        let node = ScriptedNode::new(0);
        let outcome = wait_for_confirmation(&node, "TX", 8).await;
        assert!(!outcome.confirmed);
        assert_eq!(node.polls.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn stops_on_the_confirming_round() {
        let node = ScriptedNode::new(3);
        let outcome = wait_for_confirmation(&node, "TX", 8).await;
        assert!(outcome.confirmed);
        assert_eq!(outcome.round, Some(9000));
        assert_eq!(node.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_bound_never_polls() {
        let node = ScriptedNode::new(1);
        let outcome = wait_for_confirmation(&node, "TX", 0).await;
        assert!(!outcome.confirmed);
        assert_eq!(node.polls.load(Ordering::SeqCst), 0);
    }
}
