//! `algorand://pay` payment URIs for the point-of-sale QR flow.
//!
//! A mobile wallet scanning the QR code receives the receiver, the amount in
//! base units, an optional asset id, and a free-form note identifying the
//! order.

use url::Url;

use crate::address::Address;

/// Builder for an `algorand://pay` URI.
#[derive(Debug, Clone)]
pub struct PaymentUri {
    receiver: Address,
    amount: u64,
    asset_id: Option<u64>,
    note: Option<String>,
}

impl PaymentUri {
    /// Creates a URI paying `amount` base units to `receiver`.
    #[must_use]
    pub const fn new(receiver: Address, amount: u64) -> Self {
        Self {
            receiver,
            amount,
            asset_id: None,
            note: None,
        }
    }

    /// Marks the payment as an asset transfer.
    #[must_use]
    pub const fn with_asset(mut self, asset_id: u64) -> Self {
        self.asset_id = Some(asset_id);
        self
    }

    /// Attaches an order note (URL-encoded into the URI).
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Renders the URI string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut url = Url::parse("algorand://pay").expect("static scheme parses");
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("receiver", &self.receiver.to_string());
            query.append_pair("amount", &self.amount.to_string());
            if let Some(note) = &self.note {
                query.append_pair("note", note);
            }
            if let Some(asset_id) = self.asset_id {
                query.append_pair("asset", &asset_id.to_string());
            }
        }
        url.to_string()
    }
}

impl std::fmt::Display for PaymentUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_uri_has_receiver_and_amount() {
        let receiver = Address::from_public_key([3u8; 32]);
        let uri = PaymentUri::new(receiver, 1_000_000).render();
        assert!(uri.starts_with("algorand://pay?"));
        assert!(uri.contains(&format!("receiver={receiver}")));
        assert!(uri.contains("amount=1000000"));
        assert!(!uri.contains("asset="));
    }

    #[test]
    fn asset_uri_appends_asset_id_and_encodes_note() {
        let receiver = Address::from_public_key([3u8; 32]);
        let uri = PaymentUri::new(receiver, 250)
            .with_note("POS Order: S-0042")
            .with_asset(31_566_704)
            .render();
        assert!(uri.contains("asset=31566704"));
        assert!(uri.contains("note=POS+Order%3A+S-0042"));
    }
}
