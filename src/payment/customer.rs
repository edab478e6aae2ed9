//! Payment customer and card entities.
//!
//! These mirror the payment backend's JSON contract. A [`Card`] is a
//! tokenized payment method reference usable for one customer; only the
//! token id is required, the display fields are optional.

use serde::{Deserialize, Serialize};

/// A tokenized payment method reference (card).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Opaque source token, e.g. `src_...` or `card_...`.
    pub id: String,

    /// Card brand for display ("Visa", "Mastercard", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    /// Last four digits for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last4: Option<String>,

    /// Expiry month (1-12).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_month: Option<u32>,

    /// Expiry year (four digits).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_year: Option<u32>,
}

impl Card {
    /// Create a card from a source token with no display fields.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            brand: None,
            last4: None,
            exp_month: None,
            exp_year: None,
        }
    }
}

/// A payment customer as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Backend customer id.
    pub id: String,

    /// The source charged when none is specified explicitly.
    #[serde(default)]
    pub default_source: Option<Card>,

    /// All sources attached to this customer.
    #[serde(default)]
    pub sources: Vec<Card>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_customer() {
        let customer: Customer = serde_json::from_str(
            r#"{
                "id": "cus_123",
                "default_source": {"id": "card_1", "brand": "Visa", "last4": "4242"},
                "sources": [{"id": "card_1", "brand": "Visa", "last4": "4242"}]
            }"#,
        )
        .unwrap();
        assert_eq!(customer.id, "cus_123");
        assert_eq!(customer.default_source.unwrap().last4.as_deref(), Some("4242"));
        assert_eq!(customer.sources.len(), 1);
    }

    #[test]
    fn test_decode_minimal_customer() {
        // default_source and sources are optional on the wire
        let customer: Customer = serde_json::from_str(r#"{"id": "cus_min"}"#).unwrap();
        assert!(customer.default_source.is_none());
        assert!(customer.sources.is_empty());
    }

    #[test]
    fn test_decode_rejects_missing_id() {
        let result: Result<Customer, _> = serde_json::from_str(r#"{"sources": []}"#);
        assert!(result.is_err());
    }
}
