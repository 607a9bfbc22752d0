//! Algorand address parsing and checksum validation.
//!
//! An Algorand address is the RFC 4648 base32 encoding (upper-case alphabet,
//! no padding) of a 32-byte Ed25519 public key followed by a 4-byte checksum.
//! The checksum is the last four bytes of the SHA-512/256 digest of the
//! public key, so any single-character mutation of a well-formed address is
//! rejected at parse time.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512_256};
use std::fmt;
use std::str::FromStr;

/// Length of the raw public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length of the trailing checksum in bytes.
pub const CHECKSUM_LEN: usize = 4;

/// Length of the base32 string form.
pub const ENCODED_LEN: usize = 58;

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Errors produced when parsing an address string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// The string is not exactly 58 characters long.
    #[error("address must be {ENCODED_LEN} characters, got {0}")]
    WrongLength(usize),
    /// The string contains a character outside the base32 alphabet.
    #[error("address contains an invalid base32 character")]
    InvalidCharacter,
    /// The embedded checksum does not match the public key.
    #[error("address checksum mismatch")]
    ChecksumMismatch,
}

/// A validated Algorand account address.
///
/// Holds the raw 32-byte public key; [`fmt::Display`] re-encodes the
/// canonical 58-character string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; PUBLIC_KEY_LEN]);

impl Address {
    /// The zero address (all-zero public key), useful as a sentinel.
    pub const ZERO: Self = Self([0u8; PUBLIC_KEY_LEN]);

    /// Creates an address from a raw public key.
    #[must_use]
    pub const fn from_public_key(key: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(key)
    }

    /// Returns the raw public key bytes.
    #[must_use]
    pub const fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Computes the 4-byte checksum for this address's public key.
    fn checksum(&self) -> [u8; CHECKSUM_LEN] {
        let digest = Sha512_256::digest(self.0);
        let mut checksum = [0u8; CHECKSUM_LEN];
        checksum.copy_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
        checksum
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut data = [0u8; PUBLIC_KEY_LEN + CHECKSUM_LEN];
        data[..PUBLIC_KEY_LEN].copy_from_slice(&self.0);
        data[PUBLIC_KEY_LEN..].copy_from_slice(&self.checksum());
        f.write_str(&base32_encode(&data))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ENCODED_LEN {
            return Err(AddressError::WrongLength(s.len()));
        }
        let decoded = base32_decode(s).ok_or(AddressError::InvalidCharacter)?;
        if decoded.len() != PUBLIC_KEY_LEN + CHECKSUM_LEN {
            return Err(AddressError::WrongLength(s.len()));
        }

        let mut key = [0u8; PUBLIC_KEY_LEN];
        key.copy_from_slice(&decoded[..PUBLIC_KEY_LEN]);
        let address = Self(key);
        if address.checksum() != decoded[PUBLIC_KEY_LEN..] {
            return Err(AddressError::ChecksumMismatch);
        }
        Ok(address)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Encodes bytes as RFC 4648 base32 without padding.
fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(5) * 8);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    for &byte in data {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

/// Decodes an RFC 4648 base32 string without padding.
///
/// Returns `None` on characters outside the alphabet or non-zero trailing
/// bits (which would make the encoding non-canonical).
fn base32_decode(s: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(s.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    for c in s.bytes() {
        let value = match c {
            b'A'..=b'Z' => c - b'A',
            b'2'..=b'7' => c - b'2' + 26,
            _ => return None,
        };
        buffer = (buffer << 5) | u32::from(value);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xff) as u8);
        }
    }
    if bits > 0 && buffer & ((1 << bits) - 1) != 0 {
        return None;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_ADDRESS: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ";

    #[test]
    fn zero_address_round_trips() {
        let address = Address::ZERO;
        assert_eq!(address.to_string(), ZERO_ADDRESS);
        assert_eq!(ZERO_ADDRESS.parse::<Address>().unwrap(), address);
    }

    #[test]
    fn sequential_key_encodes_known_vector() {
        let mut key = [0u8; PUBLIC_KEY_LEN];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        let address = Address::from_public_key(key);
        assert_eq!(
            address.to_string(),
            "AAAQEAYEAUDAOCAJBIFQYDIOB4IBCEQTCQKRMFYYDENBWHA5DYP7MUPJQE"
        );
        assert_eq!(address.to_string().parse::<Address>().unwrap(), address);
    }

    #[test]
    fn single_character_mutation_is_rejected() {
        let valid = Address::from_public_key([7u8; PUBLIC_KEY_LEN]).to_string();
        for (i, original) in valid.char_indices() {
            let replacement = if original == 'A' { 'B' } else { 'A' };
            let mut mutated = valid.clone();
            mutated.replace_range(i..=i, &replacement.to_string());
            assert!(
                mutated.parse::<Address>().is_err(),
                "mutation at {i} was accepted"
            );
        }
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert_eq!(
            "ABC".parse::<Address>(),
            Err(AddressError::WrongLength(3))
        );
        let long = "A".repeat(ENCODED_LEN + 1);
        assert_eq!(
            long.parse::<Address>(),
            Err(AddressError::WrongLength(ENCODED_LEN + 1))
        );
    }

    #[test]
    fn invalid_characters_are_rejected() {
        let mut s = ZERO_ADDRESS.to_string();
        s.replace_range(0..1, "0");
        assert_eq!(s.parse::<Address>(), Err(AddressError::InvalidCharacter));
        let mut lower = ZERO_ADDRESS.to_string();
        lower.replace_range(0..1, "a");
        assert_eq!(
            lower.parse::<Address>(),
            Err(AddressError::InvalidCharacter)
        );
    }

    #[test]
    fn serde_round_trips_as_string() {
        let address = Address::from_public_key([9u8; PUBLIC_KEY_LEN]);
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{address}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}
