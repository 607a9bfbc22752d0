//! Async Algorand node (algod) client for checkout payments.
//!
//! This crate covers every node interaction a payment attempt needs:
//!
//! - [`client`] - The REST client and the [`client::AlgodApi`] trait it
//!   implements: transaction-parameter fetch (normalized at the boundary),
//!   account asset holdings, raw-transaction submission, pending-transaction
//!   status, and round waiting
//! - [`optin`] - The asset opt-in checker (fail-soft on query errors)
//! - [`confirm`] - The bounded, best-effort confirmation poller
//!
//! All operations are suspend points; nothing blocks the calling thread.

pub mod client;
pub mod confirm;
pub mod error;
pub mod optin;

pub use client::{AlgodApi, AlgodClient, NodeConfig};
pub use confirm::{Confirmation, wait_for_confirmation};
pub use error::NodeError;
pub use optin::{AssetOptInState, is_opted_in};
