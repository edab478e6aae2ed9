//! Payment gateway adapter.
//!
//! Every operation has two branches selected by `base_url` presence:
//! configured (delegate to the payment backend over HTTP) and unconfigured
//! (delegate to local mutable state). Requests are single-attempt with a
//! fixed timeout; callers retry explicitly.

use crate::config::GatewayConfig;
use crate::error::{Error, PaymentFailure, Result};
use crate::payment::customer::{Card, Customer};
use parking_lot::Mutex;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Customer id served by [`PaymentGateway::retrieve_customer`] in fallback mode.
pub const DEMO_CUSTOMER_ID: &str = "cus_test";

/// Marker character identifying a publishable key that was never set.
const PLACEHOLDER_MARKER: char = '#';

/// Local customer state backing the unconfigured branch.
#[derive(Debug, Default)]
struct DemoState {
    default_source: Option<Card>,
    sources: Vec<Card>,
}

/// Adapter between application checkout actions and the payment backend.
///
/// Construct one per composition root and share by reference; the demo
/// state is owned by the instance and mutated only through the defined
/// operations.
pub struct PaymentGateway {
    config: GatewayConfig,
    http: reqwest::Client,
    timeout: Duration,
    demo: Mutex<DemoState>,
}

impl PaymentGateway {
    /// Create a gateway from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        if config.base_url.is_none() {
            info!("payment gateway running in fallback mode (no base_url)");
        }

        Ok(Self {
            config,
            http,
            timeout,
            demo: Mutex::new(DemoState::default()),
        })
    }

    /// Whether a payment backend is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.config.base_url.is_some()
    }

    /// Charge `amount` (in the backend's minor currency unit) against a
    /// source token.
    ///
    /// Single attempt, no retry; the request fails after the configured
    /// timeout.
    ///
    /// # Errors
    ///
    /// `Error::Config` when no `base_url` is configured, `Error::Payment`
    /// on transport failure, timeout or a non-200 response.
    pub async fn complete_charge(&self, source_id: &str, amount: i64) -> Result<()> {
        let Some(base) = self.config.base_url.clone() else {
            return Err(Error::Config(
                "base_url is not set - point the gateway at your payment backend".to_string(),
            ));
        };

        self.post(
            "complete_charge",
            &base,
            "charge",
            Some(json!({ "source": source_id, "amount": amount })),
        )
        .await?;

        info!(amount, "charge completed");
        Ok(())
    }

    /// Retrieve the current customer.
    ///
    /// In fallback mode this returns a synthetic demo customer built from
    /// locally-held state and never contacts the network.
    ///
    /// # Errors
    ///
    /// `Error::Config` when the publishable key is missing or still a
    /// placeholder, `Error::Payment` on transport/backend failure,
    /// `Error::Decode` when the response body does not parse as a customer.
    pub async fn retrieve_customer(&self) -> Result<Customer> {
        let key = &self.config.publishable_key;
        if key.is_empty() || key.contains(PLACEHOLDER_MARKER) {
            return Err(Error::Config(
                "publishable key is not set (placeholder marker found)".to_string(),
            ));
        }

        let Some(base) = self.config.base_url.clone() else {
            // Demo fixture so checkout flows work without a backend.
            let demo = self.demo.lock();
            debug!("serving demo customer ({} sources)", demo.sources.len());
            return Ok(Customer {
                id: DEMO_CUSTOMER_ID.to_string(),
                default_source: demo.default_source.clone(),
                sources: demo.sources.clone(),
            });
        };

        let response = self.post("retrieve_customer", &base, "customer", None).await?;
        let body = response
            .text()
            .await
            .map_err(|e| self.classify("retrieve_customer", e))?;
        serde_json::from_str(&body).map_err(|e| Error::Decode(format!("customer response: {e}")))
    }

    /// Make `source` the customer's default.
    ///
    /// # Errors
    ///
    /// `Error::Payment` on transport/backend failure. Never fails in
    /// fallback mode.
    pub async fn select_default_customer_source(&self, source: &Card) -> Result<()> {
        let Some(base) = self.config.base_url.clone() else {
            self.demo.lock().default_source = Some(source.clone());
            debug!(source = %source.id, "default source updated locally");
            return Ok(());
        };

        self.post(
            "select_default_customer_source",
            &base,
            "customer/default_source",
            Some(json!({ "source": source.id })),
        )
        .await?;
        Ok(())
    }

    /// Attach `source` to the customer and make it the default.
    ///
    /// # Errors
    ///
    /// `Error::Payment` on transport/backend failure. Never fails in
    /// fallback mode.
    pub async fn attach_source_to_customer(&self, source: &Card) -> Result<()> {
        let Some(base) = self.config.base_url.clone() else {
            let mut demo = self.demo.lock();
            demo.sources.push(source.clone());
            demo.default_source = Some(source.clone());
            debug!(source = %source.id, "source attached locally");
            return Ok(());
        };

        self.post(
            "attach_source_to_customer",
            &base,
            "customer/sources",
            Some(json!({ "source": source.id })),
        )
        .await?;
        Ok(())
    }

    /// POST to `{base}/{path}`, enforcing the 200-only success contract.
    async fn post(
        &self,
        operation: &'static str,
        base: &str,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}/{path}", base.trim_end_matches('/'));
        debug!(%url, operation, "posting to payment backend");

        let mut request = self.http.post(&url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.classify(operation, e))?;

        let status = response.status().as_u16();
        if status != 200 {
            warn!(operation, status, "payment backend rejected request");
            return Err(Error::payment(operation, PaymentFailure::Status(status)));
        }
        Ok(response)
    }

    /// Wrap a transport error, distinguishing timeouts for retry logic.
    fn classify(&self, operation: &'static str, err: reqwest::Error) -> Error {
        let kind = if err.is_timeout() {
            PaymentFailure::Timeout(self.timeout)
        } else {
            PaymentFailure::Transport(err)
        };
        Error::payment(operation, kind)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn fallback_gateway() -> PaymentGateway {
        let config = GatewayConfig {
            base_url: None,
            publishable_key: "pk_test_abc123".to_string(),
            timeout_secs: 5,
        };
        PaymentGateway::new(config).expect("should create")
    }

    #[tokio::test]
    async fn test_first_retrieve_returns_empty_demo_customer() {
        let gateway = fallback_gateway();

        let customer = gateway.retrieve_customer().await.unwrap();
        assert_eq!(customer.id, DEMO_CUSTOMER_ID);
        assert!(customer.default_source.is_none());
        assert!(customer.sources.is_empty());
    }

    #[tokio::test]
    async fn test_attach_then_retrieve_round_trip() {
        let gateway = fallback_gateway();
        let card = Card::new("card_visa");

        let before = gateway.retrieve_customer().await.unwrap().sources.len();
        gateway.attach_source_to_customer(&card).await.unwrap();

        let customer = gateway.retrieve_customer().await.unwrap();
        assert_eq!(customer.default_source, Some(card.clone()));
        assert_eq!(
            customer.sources.iter().filter(|s| **s == card).count(),
            before + 1
        );
    }

    #[tokio::test]
    async fn test_select_default_source_locally() {
        let gateway = fallback_gateway();
        let first = Card::new("card_first");
        let second = Card::new("card_second");

        gateway.attach_source_to_customer(&first).await.unwrap();
        gateway.attach_source_to_customer(&second).await.unwrap();
        gateway.select_default_customer_source(&first).await.unwrap();

        let customer = gateway.retrieve_customer().await.unwrap();
        assert_eq!(customer.default_source, Some(first));
        assert_eq!(customer.sources.len(), 2);
    }

    #[tokio::test]
    async fn test_charge_requires_base_url() {
        let gateway = fallback_gateway();

        let err = gateway.complete_charge("src_123", 500).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_placeholder_key_rejected() {
        let config = GatewayConfig::default();
        let gateway = PaymentGateway::new(config).expect("should create");

        let err = gateway.retrieve_customer().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let config = GatewayConfig {
            publishable_key: String::new(),
            ..GatewayConfig::default()
        };
        let gateway = PaymentGateway::new(config).expect("should create");

        let err = gateway.retrieve_customer().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_is_configured() {
        assert!(!fallback_gateway().is_configured());

        let config = GatewayConfig {
            base_url: Some("https://pay.example.com".to_string()),
            ..GatewayConfig::default()
        };
        let gateway = PaymentGateway::new(config).expect("should create");
        assert!(gateway.is_configured());
    }
}
