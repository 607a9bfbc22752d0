//! The payment orchestration state machine.
//!
//! Sequences one payment attempt across the independently-failing external
//! systems: wallet provider, node, and merchant backend. Steps run strictly
//! in order (precondition checks, fresh parameter fetch and transaction
//! construction, cooperative signing, single-shot broadcast, backend
//! reconciliation) and every failure lands in a terminal `Failed` state with
//! a user-visible notice. A failed or succeeded attempt is never resumed;
//! re-initiation starts from `Idle` and re-validates everything against
//! freshly fetched parameters.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};

use algopay::error::{CheckoutError, OptInParty};
use algopay::intent::PaymentIntent;
use algopay::note::TxNote;
use algopay::txn::{self, TransactionRecord};
use algopay::{Address, Network};
use algopay_node::client::AlgodApi;
use algopay_node::confirm::{self, DEFAULT_MAX_ROUNDS};
use algopay_node::optin::{self, AssetOptInState};

use crate::events::{Notice, PaymentState, UiEvent, UiUpdate, UpdateSender};
use crate::reconcile::{PaymentReport, Reconcile};
use crate::signer;
use crate::wallet::{ProviderLoader, SessionManager, WalletSession};

/// Default timeout for external wallet-module loads.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(7);

/// Configuration for [`CheckoutOrchestrator`].
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Host name embedded in transaction notes.
    pub host: String,
    /// Network the checkout page targets.
    pub network: Network,
    /// Timeout guard for wallet provider loading.
    pub load_timeout: Duration,
    /// Confirmation poll bound for opt-in transactions.
    pub max_confirm_rounds: u64,
}

impl CheckoutConfig {
    /// Creates a config for `host` on `network` with default timeouts.
    #[must_use]
    pub fn new(host: impl Into<String>, network: Network) -> Self {
        Self {
            host: host.into(),
            network,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            max_confirm_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Sets the wallet-module load timeout.
    #[must_use]
    pub const fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Sets the opt-in confirmation poll bound.
    #[must_use]
    pub const fn with_max_confirm_rounds(mut self, rounds: u64) -> Self {
        self.max_confirm_rounds = rounds;
        self
    }
}

/// Drives payment attempts end to end.
///
/// There is exactly one in-flight attempt at a time; initiating while an
/// attempt is running is rejected with [`CheckoutError::AttemptInProgress`].
pub struct CheckoutOrchestrator {
    algod: Arc<dyn AlgodApi>,
    sessions: SessionManager,
    reconciler: Box<dyn Reconcile>,
    config: CheckoutConfig,
    updates: UpdateSender,
    state: Mutex<PaymentState>,
}

impl std::fmt::Debug for CheckoutOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutOrchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CheckoutOrchestrator {
    /// Creates an orchestrator and the update stream the rendering layer
    /// subscribes to.
    #[must_use]
    pub fn new(
        algod: Arc<dyn AlgodApi>,
        loader: Box<dyn ProviderLoader>,
        reconciler: Box<dyn Reconcile>,
        config: CheckoutConfig,
    ) -> (Self, mpsc::UnboundedReceiver<UiUpdate>) {
        let (updates, receiver) = UpdateSender::channel();
        let sessions = SessionManager::new(loader, config.network, config.load_timeout);
        (
            Self {
                algod,
                sessions,
                reconciler,
                config,
                updates,
                state: Mutex::new(PaymentState::Idle),
            },
            receiver,
        )
    }

    /// Returns the current attempt state.
    pub async fn state(&self) -> PaymentState {
        self.state.lock().await.clone()
    }

    /// Returns a snapshot of the wallet session.
    pub async fn session(&self) -> WalletSession {
        self.sessions.snapshot().await
    }

    /// Dispatches an abstract UI event.
    ///
    /// All failures are surfaced through the update stream; the return value
    /// exists so hosts that want to inspect outcomes can.
    pub async fn handle_event(&self, event: UiEvent) -> Result<(), CheckoutError> {
        match event {
            UiEvent::ConnectRequested(intent) => self.connect_wallet(&intent).await.map(|_| ()),
            UiEvent::DisconnectRequested => {
                self.disconnect_wallet().await;
                Ok(())
            }
            UiEvent::OptInRequested(intent) => self.opt_in(&intent).await.map(|_| ()),
            UiEvent::PaymentSubmitted(intent) => self.submit_payment(&intent).await.map(|_| ()),
        }
    }

    /// Connects the wallet and recomputes the asset opt-in state.
    ///
    /// # Errors
    ///
    /// Returns connection and load-timeout errors; each is also emitted as a
    /// notice.
    pub async fn connect_wallet(&self, intent: &PaymentIntent) -> Result<String, CheckoutError> {
        match self.sessions.connect().await {
            Ok(address) => {
                self.updates
                    .emit(UiUpdate::SessionChanged(self.sessions.snapshot().await));
                self.refresh_opt_in(intent, &address).await;
                Ok(address)
            }
            Err(e) => {
                self.updates
                    .emit(UiUpdate::Notice(Notice::error(format!(
                        "Wallet connect failed: {e}"
                    ))));
                Err(e)
            }
        }
    }

    /// Disconnects the wallet and resets the opt-in state.
    pub async fn disconnect_wallet(&self) {
        self.sessions.disconnect().await;
        self.updates
            .emit(UiUpdate::SessionChanged(self.sessions.snapshot().await));
        self.updates
            .emit(UiUpdate::OptInStateChanged(AssetOptInState::default()));
    }

    /// Submits one payment attempt; returns the broadcast transaction id.
    ///
    /// # Errors
    ///
    /// Returns the terminal [`CheckoutError`] of the attempt; each failure is
    /// also emitted as a `Failed` state plus a notice.
    pub async fn submit_payment(&self, intent: &PaymentIntent) -> Result<String, CheckoutError> {
        self.begin_attempt().await?;

        match self.run_attempt(intent).await {
            Ok(tx_id) => {
                self.set_state(PaymentState::Succeeded).await;
                self.updates.emit(UiUpdate::NavigateToStatus);
                tracing::info!(tx_id = %tx_id, "payment attempt succeeded");
                Ok(tx_id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "payment attempt failed");
                self.updates.emit(UiUpdate::Notice(failure_notice(
                    &e,
                    &intent.currency_display_name,
                )));
                self.set_state(PaymentState::Failed(e.clone())).await;
                Err(e)
            }
        }
    }

    /// Opts the connected wallet in to the intent's asset.
    ///
    /// Builds a zero-amount self-transfer, signs and broadcasts it, polls for
    /// confirmation (best-effort), and recomputes the opt-in state.
    ///
    /// # Errors
    ///
    /// Returns the failure, which is also emitted as a warning notice.
    pub async fn opt_in(&self, intent: &PaymentIntent) -> Result<String, CheckoutError> {
        match self.run_opt_in(intent).await {
            Ok(tx_id) => {
                self.updates.emit(UiUpdate::Notice(Notice::info(format!(
                    "Opt-in sent, tx: {tx_id}"
                ))));
                Ok(tx_id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "asset opt-in failed");
                self.updates.emit(UiUpdate::Notice(Notice::warning(
                    "Opt-in failed. Please try again.",
                )));
                Err(e)
            }
        }
    }

    /// Rejects initiation unless the state machine is settled, then enters
    /// `PreconditionCheck`.
    async fn begin_attempt(&self) -> Result<(), CheckoutError> {
        let mut state = self.state.lock().await;
        if !state.accepts_initiation() {
            self.updates.emit(UiUpdate::Notice(Notice::warning(
                "A payment is already in progress.",
            )));
            return Err(CheckoutError::AttemptInProgress);
        }
        *state = PaymentState::PreconditionCheck;
        self.updates
            .emit(UiUpdate::PaymentStateChanged(PaymentState::PreconditionCheck));
        Ok(())
    }

    async fn set_state(&self, next: PaymentState) {
        *self.state.lock().await = next.clone();
        self.updates.emit(UiUpdate::PaymentStateChanged(next));
    }

    /// One attempt, strictly ordered. Any error is terminal for the attempt.
    async fn run_attempt(&self, intent: &PaymentIntent) -> Result<String, CheckoutError> {
        // PreconditionCheck: wallet, then configuration, then opt-ins,
        // all before any transaction construction.
        let sender = self
            .sessions
            .connected_address()
            .await
            .ok_or(CheckoutError::WalletNotConnected)?;
        let merchant = intent.merchant_address.trim();
        if merchant.is_empty() {
            return Err(CheckoutError::ConfigurationError);
        }
        if intent.is_asset_transfer {
            let asset_id = intent.asset_id.ok_or_else(|| {
                CheckoutError::TransactionBuild("asset transfer without an asset id".to_owned())
            })?;
            let opt_ins = optin::check_parties(&*self.algod, &sender, merchant, asset_id).await;
            self.updates.emit(UiUpdate::OptInStateChanged(opt_ins));
            if !opt_ins.sender_opted_in {
                return Err(CheckoutError::AssetNotOptedIn {
                    party: OptInParty::Sender,
                    asset_id,
                });
            }
            if !opt_ins.merchant_opted_in {
                return Err(CheckoutError::AssetNotOptedIn {
                    party: OptInParty::Merchant,
                    asset_id,
                });
            }
        }

        // BuildingTransaction: fresh parameters every attempt; validity
        // windows expire, so nothing from a prior attempt is reusable.
        self.set_state(PaymentState::BuildingTransaction).await;
        let params = self
            .algod
            .transaction_params()
            .await
            .map_err(|e| CheckoutError::TransactionBuild(e.to_string()))?;
        let note = TxNote::for_intent(&self.config.host, intent)
            .to_bytes()
            .map_err(|e| CheckoutError::TransactionBuild(e.to_string()))?;
        let unsigned = txn::build_payment(intent, &sender, &params, note)?;
        let mut record = TransactionRecord::new(unsigned);

        // AwaitingSignature → Broadcasting: one logical step; a signing
        // failure never reaches broadcast.
        self.set_state(PaymentState::AwaitingSignature).await;
        let provider = self.sessions.provider().await?;
        let signed = signer::sign_transaction(provider.as_ref(), record.unsigned().clone()).await?;
        record
            .attach_signature(signed)
            .map_err(|e| CheckoutError::SigningRejected(e.to_string()))?;

        self.set_state(PaymentState::Broadcasting).await;
        let tx_id = signer::broadcast(&*self.algod, &mut record).await?;

        // Reconciling: the transaction id alone is sufficient; the payment
        // needs no on-chain confirmation before the backend is told.
        self.set_state(PaymentState::Reconciling).await;
        let report = PaymentReport {
            tx_reference: intent.backend_tx_reference.clone(),
            tx_hash: tx_id.clone(),
            sender_address: sender,
        };
        self.reconciler.report_payment(&report).await?;
        Ok(tx_id)
    }

    async fn run_opt_in(&self, intent: &PaymentIntent) -> Result<String, CheckoutError> {
        let sender = self
            .sessions
            .connected_address()
            .await
            .ok_or(CheckoutError::WalletNotConnected)?;
        let asset_id = intent.asset_id.ok_or_else(|| {
            CheckoutError::TransactionBuild("opt-in requested without an asset id".to_owned())
        })?;
        let sender_address: Address =
            sender
                .trim()
                .parse()
                .map_err(|source| CheckoutError::InvalidAddress {
                    role: algopay::error::AddressRole::Sender,
                    source,
                })?;

        let params = self
            .algod
            .transaction_params()
            .await
            .map_err(|e| CheckoutError::TransactionBuild(e.to_string()))?;
        let unsigned = txn::build_opt_in(sender_address, asset_id, &params)?;
        let mut record = TransactionRecord::new(unsigned);

        let provider = self.sessions.provider().await?;
        let tx_id = signer::sign_and_broadcast(provider.as_ref(), &*self.algod, &mut record).await?;

        // Opt-ins are polled for confirmation (unlike payments) so the
        // recheck below sees the new holding.
        let confirmation =
            confirm::wait_for_confirmation(&*self.algod, &tx_id, self.config.max_confirm_rounds)
                .await;
        if let Some(round) = confirmation.round {
            record.mark_confirmed(round);
        }
        tracing::info!(
            tx_id = %tx_id,
            confirmed = confirmation.confirmed,
            "asset opt-in broadcast"
        );

        self.refresh_opt_in(intent, &sender).await;
        Ok(tx_id)
    }

    /// Recomputes and emits the opt-in state for the intent's asset.
    async fn refresh_opt_in(&self, intent: &PaymentIntent, sender: &str) -> AssetOptInState {
        let state = match intent.asset_id {
            Some(asset_id) if intent.is_asset_transfer => {
                optin::check_parties(
                    &*self.algod,
                    sender,
                    intent.merchant_address.trim(),
                    asset_id,
                )
                .await
            }
            // Native payments need no opt-in.
            _ => AssetOptInState {
                sender_opted_in: true,
                merchant_opted_in: true,
            },
        };
        self.updates.emit(UiUpdate::OptInStateChanged(state));
        state
    }
}

/// Maps a terminal failure to its user-visible notice.
fn failure_notice(error: &CheckoutError, currency: &str) -> Notice {
    match error {
        CheckoutError::WalletNotConnected => Notice::warning(
            "Wallet not connected: please connect your wallet before proceeding with payment.",
        ),
        CheckoutError::ConfigurationError => {
            Notice::error("Merchant address is not configured. Please contact support.")
        }
        CheckoutError::AssetNotOptedIn { party, .. } => match party {
            OptInParty::Sender => {
                Notice::warning(format!("Please opt in to {currency} in your wallet."))
            }
            OptInParty::Merchant => {
                Notice::warning(format!("Merchant is not opted in to {currency}."))
            }
        },
        CheckoutError::Broadcast {
            insufficient_funds: true,
            ..
        } => Notice::error(format!(
            "Insufficient funds. Please add more {currency} to your wallet to complete this payment."
        )),
        other => Notice::error(format!("Payment failed: {other}")),
    }
}
