//! Wallet session lifecycle over an abstract wallet-connection protocol.
//!
//! The wallet itself is an external collaborator (a browser extension or
//! mobile app speaking a WalletConnect-style protocol); this module owns the
//! session around it. [`SessionManager`] drives connect, reconnect, and
//! disconnect, and is the only writer of the shared [`WalletSession`] state;
//! everything else reads snapshots.
//!
//! Provider modules load dynamically in the hosting page, so acquisition is
//! raced against a timeout: a stalled load fails the attempt with
//! [`CheckoutError::ExternalLoadTimeout`] instead of hanging the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use algopay::error::CheckoutError;
use algopay::networks::Network;
use algopay::txn::UnsignedTransaction;
use algopay_node::client::BoxFuture;

/// Errors reported by a wallet provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// No previously authorized session exists.
    #[error("no active wallet session")]
    NoSession,
    /// The user dismissed the wallet prompt.
    #[error("request cancelled by user")]
    Cancelled,
    /// Any other provider-side failure.
    #[error("wallet provider error: {0}")]
    Provider(String),
}

/// One entry of a signing group: the `{txn}` wrapper the protocol expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerTransaction {
    /// The transaction to sign.
    pub txn: UnsignedTransaction,
}

/// A two-level signing group: a group of transactions, each wrapped.
///
/// The protocol always takes this shape; even a single payment is sent as a
/// one-element group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningGroup(pub Vec<Vec<SignerTransaction>>);

impl SigningGroup {
    /// Wraps one transaction as a one-element group.
    #[must_use]
    pub fn single(txn: UnsignedTransaction) -> Self {
        Self(vec![vec![SignerTransaction { txn }]])
    }
}

/// The shapes a wallet may hand back from a sign request.
///
/// Providers disagree on this: some return the group-of-groups they were
/// given, some a flat list, some a single buffer. The signing client
/// normalizes all three.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignedPayload {
    /// One blob list per group.
    Nested(Vec<Vec<Vec<u8>>>),
    /// A flat list of blobs.
    Flat(Vec<Vec<u8>>),
    /// A single signed blob.
    Single(Vec<u8>),
}

/// The wallet-connection protocol consumed by checkout.
pub trait WalletConnector: Send + Sync {
    /// Attempts silent reconnection to a previously authorized session.
    fn reconnect_session(&self) -> BoxFuture<'_, Result<Vec<String>, WalletError>>;

    /// Interactive connect; prompts the user to authorize accounts.
    fn connect(&self) -> BoxFuture<'_, Result<Vec<String>, WalletError>>;

    /// Tears down the current session.
    fn disconnect(&self) -> BoxFuture<'_, Result<(), WalletError>>;

    /// Whether the provider believes a session is active.
    fn is_connected(&self) -> bool;

    /// Asks the wallet to sign a transaction group.
    fn sign_transactions(
        &self,
        group: SigningGroup,
    ) -> BoxFuture<'_, Result<SignedPayload, WalletError>>;
}

/// Loads the wallet provider for a network.
///
/// In a browser host this is a dynamic module import; it may stall
/// indefinitely, which is why [`SessionManager`] races it against a timeout.
pub trait ProviderLoader: Send + Sync {
    /// Resolves the provider handle.
    fn load(&self, network: Network)
    -> BoxFuture<'_, Result<Arc<dyn WalletConnector>, WalletError>>;
}

/// Shared wallet session state.
///
/// Lives for the page lifetime or until explicit disconnect. Only
/// [`SessionManager`] mutates it; other components read snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
    /// First authorized account address, when connected.
    pub address: Option<String>,
    /// Whether a session is currently active.
    pub connected: bool,
}

impl WalletSession {
    /// Derived pay-button affordance: a payment can be initiated.
    #[must_use]
    pub const fn pay_enabled(&self) -> bool {
        self.connected && self.address.is_some()
    }
}

/// Owns the wallet connect/reconnect/disconnect lifecycle.
pub struct SessionManager {
    loader: Box<dyn ProviderLoader>,
    network: Network,
    load_timeout: Duration,
    provider: Mutex<Option<Arc<dyn WalletConnector>>>,
    session: Arc<Mutex<WalletSession>>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("network", &self.network)
            .field("load_timeout", &self.load_timeout)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a manager for `network` with the given provider loader.
    #[must_use]
    pub fn new(loader: Box<dyn ProviderLoader>, network: Network, load_timeout: Duration) -> Self {
        Self {
            loader,
            network,
            load_timeout,
            provider: Mutex::new(None),
            session: Arc::new(Mutex::new(WalletSession::default())),
        }
    }

    /// Returns the shared session handle (read-only by convention).
    #[must_use]
    pub fn session_handle(&self) -> Arc<Mutex<WalletSession>> {
        Arc::clone(&self.session)
    }

    /// Returns a snapshot of the current session.
    pub async fn snapshot(&self) -> WalletSession {
        self.session.lock().await.clone()
    }

    /// Returns the connected address, if any.
    pub async fn connected_address(&self) -> Option<String> {
        self.session.lock().await.address.clone()
    }

    /// Resolves the provider handle, loading it on first use.
    ///
    /// The load is raced against the configured timeout; `tokio`'s timeout
    /// drops its timer on completion, so nothing is left scheduled.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::ExternalLoadTimeout`] if the load stalls, or
    /// [`CheckoutError::WalletConnectionFailed`] if the loader fails.
    pub async fn provider(&self) -> Result<Arc<dyn WalletConnector>, CheckoutError> {
        let mut cached = self.provider.lock().await;
        if let Some(provider) = &*cached {
            return Ok(Arc::clone(provider));
        }
        let loaded = tokio::time::timeout(self.load_timeout, self.loader.load(self.network))
            .await
            .map_err(|_| CheckoutError::ExternalLoadTimeout)?
            .map_err(|e| CheckoutError::WalletConnectionFailed(e.to_string()))?;
        *cached = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Connects to the wallet, preferring silent reconnection.
    ///
    /// A failed or empty silent reconnect forces a full interactive connect,
    /// first disconnecting any stale handle so the provider cannot end up
    /// with a split-brain session. Returns the first authorized address.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::WalletConnectionFailed`] if no account is
    /// authorized, plus the load errors of [`Self::provider`].
    pub async fn connect(&self) -> Result<String, CheckoutError> {
        let provider = self.provider().await?;

        let mut accounts = match provider.reconnect_session().await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::debug!(error = %e, "silent reconnect failed, falling back");
                Vec::new()
            }
        };

        if accounts.is_empty() {
            if provider.is_connected() {
                if let Err(e) = provider.disconnect().await {
                    tracing::warn!(error = %e, "stale session disconnect failed");
                }
            }
            accounts = provider
                .connect()
                .await
                .map_err(|e| CheckoutError::WalletConnectionFailed(e.to_string()))?;
        }

        let address = accounts.into_iter().next().ok_or_else(|| {
            CheckoutError::WalletConnectionFailed("no account authorized".to_owned())
        })?;

        let mut session = self.session.lock().await;
        session.address = Some(address.clone());
        session.connected = true;
        tracing::info!(address = %address, "wallet connected");
        Ok(address)
    }

    /// Disconnects and clears the session.
    ///
    /// Best-effort: succeeds even if the provider reports no active session.
    pub async fn disconnect(&self) {
        let cached = self.provider.lock().await;
        if let Some(provider) = &*cached
            && provider.is_connected()
            && let Err(e) = provider.disconnect().await
        {
            tracing::warn!(error = %e, "wallet disconnect failed");
        }
        drop(cached);

        let mut session = self.session.lock().await;
        session.address = None;
        session.connected = false;
        tracing::info!("wallet disconnected");
    }
}
