//! Core types for Algorand merchant checkout payments.
//!
//! This crate provides the foundational, I/O-free types used throughout the
//! algopay workspace: address parsing and checksum validation, exact
//! decimal-to-base-unit amount conversion, unsigned transaction construction,
//! and the error taxonomy shared by the node client and the checkout
//! orchestrator.
//!
//! # Overview
//!
//! A payment attempt starts from a [`intent::PaymentIntent`] read once from
//! the merchant form. The [`txn`] module turns a validated intent plus fresh
//! [`params::NetworkParameters`] into an [`txn::UnsignedTransaction`] (a
//! native microalgo payment or an asset transfer) embedding a structured
//! JSON [`note::TxNote`]. Signing, broadcast, and reconciliation live in the
//! `algopay-checkout` crate; node RPC access lives in `algopay-node`.
//!
//! # Modules
//!
//! - [`address`] - Algorand address parsing with checksum verification
//! - [`amount`] - Decimal to microalgo/asset-unit conversion
//! - [`encoding`] - Base64 byte-wrapper helpers
//! - [`error`] - The checkout error taxonomy
//! - [`intent`] - The immutable per-attempt payment intent
//! - [`networks`] - MainNet/TestNet registry with well-known asset ids
//! - [`note`] - The structured transaction note payload
//! - [`params`] - Canonical network (suggested) transaction parameters
//! - [`txn`] - Unsigned transaction construction
//! - [`uri`] - `algorand://pay` payment URIs for the QR flow

pub mod address;
pub mod amount;
pub mod encoding;
pub mod error;
pub mod intent;
pub mod networks;
pub mod note;
pub mod params;
pub mod txn;
pub mod uri;

pub use address::Address;
pub use error::CheckoutError;
pub use intent::PaymentIntent;
pub use networks::Network;
pub use params::NetworkParameters;
pub use txn::{TransactionRecord, UnsignedTransaction};
