//! Stub collaborators shared by the crate's tests.
//!
//! Each stub records its calls; a [`SharedLog`] can be threaded through all
//! of them to assert cross-collaborator call ordering.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use algopay::address::Address;
use algopay::error::CheckoutError;
use algopay::networks::Network;
use algopay::params::NetworkParameters;
use algopay::txn::{self, TransactionRecord};
use algopay_node::client::{AlgodApi, AssetHolding, BoxFuture, PendingTransaction};
use algopay_node::error::NodeError;

use crate::reconcile::{PaymentReport, Reconcile};
use crate::wallet::{ProviderLoader, SignedPayload, SigningGroup, WalletConnector, WalletError};

/// Call log shared across stub collaborators.
pub type SharedLog = Arc<StdMutex<Vec<&'static str>>>;

/// A fixed valid sender address.
pub fn sender() -> Address {
    Address::from_public_key([1u8; 32])
}

/// A fixed valid merchant address.
pub fn merchant() -> Address {
    Address::from_public_key([2u8; 32])
}

/// Valid parameters for building test transactions.
pub fn test_params() -> NetworkParameters {
    NetworkParameters {
        fee: 1000,
        first_valid: 100,
        last_valid: 1100,
        genesis_id: "testnet-v1.0".to_owned(),
        genesis_hash: vec![7u8; 32],
    }
}

/// A fresh record around a small opt-in transaction.
pub fn opt_in_record() -> TransactionRecord {
    let unsigned =
        txn::build_opt_in(sender(), 7, &test_params()).expect("test transaction builds");
    TransactionRecord::new(unsigned)
}

/// Scriptable wallet connector.
pub struct StubWallet {
    reconnect_accounts: Vec<String>,
    connect_accounts: Vec<String>,
    active: AtomicBool,
    sign_payload: SignedPayload,
    sign_error: Option<WalletError>,
    sign_gate: Option<Arc<tokio::sync::Notify>>,
    calls: StdMutex<Vec<&'static str>>,
    log: SharedLog,
}

impl StubWallet {
    pub fn new() -> Self {
        Self {
            reconnect_accounts: Vec::new(),
            connect_accounts: Vec::new(),
            active: AtomicBool::new(false),
            sign_payload: SignedPayload::Nested(vec![vec![vec![9, 9, 9]]]),
            sign_error: None,
            sign_gate: None,
            calls: StdMutex::new(Vec::new()),
            log: SharedLog::default(),
        }
    }

    pub fn with_reconnect_accounts(mut self, accounts: Vec<String>) -> Self {
        self.reconnect_accounts = accounts;
        self
    }

    pub fn with_connect_accounts(mut self, accounts: Vec<String>) -> Self {
        self.connect_accounts = accounts;
        self
    }

    /// Makes the provider report a dangling session before connect.
    pub fn with_stale_session(self) -> Self {
        self.active.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_sign_payload(mut self, payload: SignedPayload) -> Self {
        self.sign_payload = payload;
        self
    }

    pub fn with_sign_error(mut self, error: WalletError) -> Self {
        self.sign_error = Some(error);
        self
    }

    /// Parks sign calls until the gate is notified.
    pub fn with_sign_gate(mut self, gate: Arc<tokio::sync::Notify>) -> Self {
        self.sign_gate = Some(gate);
        self
    }

    pub fn with_log(mut self, log: SharedLog) -> Self {
        self.log = log;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("lock").clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().expect("lock").push(call);
    }
}

impl WalletConnector for StubWallet {
    fn reconnect_session(&self) -> BoxFuture<'_, Result<Vec<String>, WalletError>> {
        self.record("reconnect");
        let accounts = self.reconnect_accounts.clone();
        if !accounts.is_empty() {
            self.active.store(true, Ordering::SeqCst);
        }
        Box::pin(async move { Ok(accounts) })
    }

    fn connect(&self) -> BoxFuture<'_, Result<Vec<String>, WalletError>> {
        self.record("connect");
        let accounts = self.connect_accounts.clone();
        if !accounts.is_empty() {
            self.active.store(true, Ordering::SeqCst);
        }
        Box::pin(async move { Ok(accounts) })
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<(), WalletError>> {
        self.record("disconnect");
        self.active.store(false, Ordering::SeqCst);
        Box::pin(async move { Ok(()) })
    }

    fn is_connected(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn sign_transactions(
        &self,
        _group: SigningGroup,
    ) -> BoxFuture<'_, Result<SignedPayload, WalletError>> {
        let gate = self.sign_gate.clone();
        let result = match &self.sign_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.sign_payload.clone()),
        };
        Box::pin(async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            self.record("sign");
            self.log.lock().expect("lock").push("sign");
            result
        })
    }
}

/// Loader handing out a pre-built stub wallet.
pub struct StubLoader {
    wallet: Arc<StubWallet>,
}

impl StubLoader {
    pub fn new(wallet: Arc<StubWallet>) -> Self {
        Self { wallet }
    }
}

impl ProviderLoader for StubLoader {
    fn load(
        &self,
        _network: Network,
    ) -> BoxFuture<'_, Result<Arc<dyn WalletConnector>, WalletError>> {
        let wallet = Arc::clone(&self.wallet);
        Box::pin(async move { Ok(wallet as Arc<dyn WalletConnector>) })
    }
}

/// Scriptable node.
pub struct StubAlgod {
    params_calls: AtomicU64,
    submit_calls: AtomicU64,
    pending_calls: AtomicU64,
    submit_error: Option<String>,
    accounts: StdMutex<HashMap<String, Vec<u64>>>,
    log: SharedLog,
}

impl StubAlgod {
    pub fn new() -> Self {
        Self {
            params_calls: AtomicU64::new(0),
            submit_calls: AtomicU64::new(0),
            pending_calls: AtomicU64::new(0),
            submit_error: None,
            accounts: StdMutex::new(HashMap::new()),
            log: SharedLog::default(),
        }
    }

    /// Makes every submit fail with the given node message.
    pub fn with_submit_error(mut self, message: impl Into<String>) -> Self {
        self.submit_error = Some(message.into());
        self
    }

    /// Registers an asset holding for an account.
    pub fn with_account_asset(self, address: &str, asset_id: u64) -> Self {
        self.accounts
            .lock()
            .expect("lock")
            .entry(address.to_owned())
            .or_default()
            .push(asset_id);
        self
    }

    pub fn with_log(mut self, log: SharedLog) -> Self {
        self.log = log;
        self
    }

    pub fn params_count(&self) -> u64 {
        self.params_calls.load(Ordering::SeqCst)
    }

    pub fn submit_count(&self) -> u64 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn pending_count(&self) -> u64 {
        self.pending_calls.load(Ordering::SeqCst)
    }

    pub fn shared_log(&self) -> Vec<&'static str> {
        self.log.lock().expect("lock").clone()
    }
}

impl AlgodApi for StubAlgod {
    fn transaction_params(&self) -> BoxFuture<'_, Result<NetworkParameters, NodeError>> {
        self.params_calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().expect("lock").push("params");
        Box::pin(async move { Ok(test_params()) })
    }

    fn account_assets<'a>(
        &'a self,
        address: &'a str,
    ) -> BoxFuture<'a, Result<Vec<AssetHolding>, NodeError>> {
        let holdings = self
            .accounts
            .lock()
            .expect("lock")
            .get(address)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|asset_id| AssetHolding {
                asset_id,
                amount: 1,
            })
            .collect::<Vec<_>>();
        Box::pin(async move { Ok(holdings) })
    }

    fn submit_raw<'a>(&'a self, _signed: &'a [u8]) -> BoxFuture<'a, Result<String, NodeError>> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().expect("lock").push("submit");
        let error = self.submit_error.clone();
        Box::pin(async move {
            match error {
                Some(message) => Err(NodeError::Api {
                    status: 400,
                    message,
                }),
                None => Ok("STUB-TX-ID".to_owned()),
            }
        })
    }

    fn pending_info<'a>(
        &'a self,
        _tx_id: &'a str,
    ) -> BoxFuture<'a, Result<PendingTransaction, NodeError>> {
        self.pending_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            Ok(PendingTransaction {
                confirmed_round: Some(42),
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

/// Scriptable backend reconciler.
pub struct StubReconciler {
    result: Result<(), CheckoutError>,
    reports: StdMutex<Vec<PaymentReport>>,
    log: SharedLog,
}

impl StubReconciler {
    /// Backend that accepts every report.
    pub fn accepting() -> Self {
        Self {
            result: Ok(()),
            reports: StdMutex::new(Vec::new()),
            log: SharedLog::default(),
        }
    }

    /// Backend that rejects every report with a message.
    pub fn rejecting(message: impl Into<String>) -> Self {
        Self {
            result: Err(CheckoutError::ReconciliationFailed(message.into())),
            reports: StdMutex::new(Vec::new()),
            log: SharedLog::default(),
        }
    }

    pub fn with_log(mut self, log: SharedLog) -> Self {
        self.log = log;
        self
    }

    pub fn report_count(&self) -> usize {
        self.reports.lock().expect("lock").len()
    }

    pub fn last_report(&self) -> Option<PaymentReport> {
        self.reports.lock().expect("lock").last().cloned()
    }
}

impl Reconcile for StubReconciler {
    fn report_payment<'a>(
        &'a self,
        report: &'a PaymentReport,
    ) -> BoxFuture<'a, Result<(), CheckoutError>> {
        self.log.lock().expect("lock").push("reconcile");
        self.reports.lock().expect("lock").push(report.clone());
        let result = self.result.clone();
        Box::pin(async move { result })
    }
}
