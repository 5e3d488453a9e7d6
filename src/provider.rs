use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::config::PayPalConfig;
use crate::error::Result;
use crate::orders::{OrderBuilder, ProviderResponse};
use crate::payments::{Payment, PaymentBuilder};
use crate::token::TokenAcquirer;
use crate::transport::Transport;

/// Everything the HTTP layer needs from a payment provider.
///
/// Orders v2 (`create_order`, `capture_order`) and the Payments v1 `sale`
/// flow (`create_payment`, `execute_payment`) sit behind one trait so
/// handlers do not depend on which integration serves them.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a `CAPTURE` checkout order
    /// # Arguments
    /// * `amount` - Order total in the configured currency
    /// # Return
    /// The provider's order document, unmodified
    async fn create_order(&self, amount: Decimal) -> Result<ProviderResponse>;

    /// Capture an approved checkout order
    async fn capture_order(&self, order_id: &str) -> Result<ProviderResponse>;

    /// Register a `sale` payment and get its approval link
    /// # Arguments
    /// * `total` - Payment total
    /// * `currency` - 3-letter currency code
    /// * `description` - Transaction description shown to the buyer, omitted when `None`
    async fn create_payment(
        &self,
        total: Decimal,
        currency: &str,
        description: Option<&str>,
    ) -> Result<Payment>;

    /// Finalize a `sale` payment after the buyer approved it
    /// # Arguments
    /// * `payment_id` - `paymentId` query parameter of the return redirect
    /// * `payer_id` - `PayerID` query parameter of the return redirect
    async fn execute_payment(&self, payment_id: &str, payer_id: &str) -> Result<Payment>;

    /// Currency used when a caller does not name one
    fn default_currency(&self) -> &str;
}

/// PayPal REST client; acquires a fresh token for every call.
#[derive(Clone, Debug)]
pub struct PayPalClient {
    config: Arc<PayPalConfig>,
    orders: OrderBuilder,
    payments: PaymentBuilder,
}

impl PayPalClient {
    /// Create a new instance of PayPalClient
    /// # Arguments
    /// * `config` - Credentials, environment and redirect settings
    /// # Example
    /// ```rust
    /// use paypal_axum::config::{Environment, PayPalConfig};
    /// use paypal_axum::provider::PayPalClient;
    ///
    /// let client = PayPalClient::new(PayPalConfig::new(
    ///     "CLIENT_ID".to_string(),
    ///     "CLIENT_SECRET".to_string(),
    ///     Environment::Sandbox,
    /// ))
    /// .unwrap();
    /// ```
    pub fn new(config: PayPalConfig) -> Result<Self> {
        let config = Arc::new(config);
        let transport = Transport::new(&config)?;
        let tokens = TokenAcquirer::new(&config, transport.clone())?;

        Ok(PayPalClient {
            orders: OrderBuilder::new(Arc::clone(&config), tokens.clone(), transport.clone()),
            payments: PaymentBuilder::new(Arc::clone(&config), tokens, transport),
            config,
        })
    }
}

#[async_trait]
impl PaymentProvider for PayPalClient {
    async fn create_order(&self, amount: Decimal) -> Result<ProviderResponse> {
        self.orders.create_order(amount).await
    }

    async fn capture_order(&self, order_id: &str) -> Result<ProviderResponse> {
        self.orders.capture_order(order_id).await
    }

    async fn create_payment(
        &self,
        total: Decimal,
        currency: &str,
        description: Option<&str>,
    ) -> Result<Payment> {
        self.payments.create_payment(total, currency, description).await
    }

    async fn execute_payment(&self, payment_id: &str, payer_id: &str) -> Result<Payment> {
        self.payments.execute_payment(payment_id, payer_id).await
    }

    fn default_currency(&self) -> &str {
        &self.config.currency
    }
}
