//! Payment orchestration for Algorand merchant checkout.
//!
//! This crate sequences one browser-initiated payment across three
//! independently-failing external systems (the wallet provider, the node,
//! and the merchant backend) under strict ordering and idempotence rules:
//! sign before broadcast, broadcast at most once, reconcile only with a real
//! transaction id, and never resume a half-built attempt.
//!
//! # Overview
//!
//! The rendering layer feeds [`events::UiEvent`]s into a
//! [`orchestrator::CheckoutOrchestrator`] and subscribes to the
//! [`events::UiUpdate`] stream coming back. The orchestrator owns a
//! [`wallet::SessionManager`] (the only writer of the shared wallet session),
//! talks to the chain through `algopay-node`'s `AlgodApi`, and reports the
//! result through a [`reconcile::Reconcile`] implementation.
//!
//! # Modules
//!
//! - [`events`] - Abstract UI events, state updates, and notices
//! - [`orchestrator`] - The payment state machine
//! - [`qr`] - Client for the QR/session-initiation endpoint
//! - [`reconcile`] - Backend reconciliation client
//! - [`signer`] - Cooperative signing and single-shot broadcast
//! - [`wallet`] - Wallet session lifecycle and the connector protocol

pub mod events;
pub mod orchestrator;
pub mod qr;
pub mod reconcile;
pub mod signer;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use events::{Notice, PaymentState, UiEvent, UiUpdate};
pub use orchestrator::{CheckoutConfig, CheckoutOrchestrator};
pub use reconcile::{HttpReconciler, PaymentReport, Reconcile, ReconcilerConfig};
pub use wallet::{ProviderLoader, SessionManager, WalletConnector, WalletSession};
