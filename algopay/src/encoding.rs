//! Base64 helpers for binary transaction fields.
//!
//! Genesis hashes, note payloads, and signed transaction blobs cross JSON
//! boundaries as standard base64 strings. This module provides the encode
//! and decode helpers plus a serde adapter for byte-vector struct fields.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;

/// Encodes raw bytes as a standard base64 string.
#[must_use]
pub fn encode<T: AsRef<[u8]>>(input: T) -> String {
    b64.encode(input.as_ref())
}

/// Decodes a standard base64 string into raw bytes.
///
/// # Errors
///
/// Returns an error if the input is not valid base64.
pub fn decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    b64.decode(input)
}

/// Serde adapter serializing a `Vec<u8>` field as a base64 string.
///
/// Use with `#[serde(with = "algopay::encoding::base64_bytes")]`.
pub mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes bytes as base64.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode(bytes))
    }

    /// Deserializes base64 into bytes.
    ///
    /// # Errors
    ///
    /// Fails on invalid base64 input.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::decode(&s).map_err(serde::de::Error::custom)
    }
}
