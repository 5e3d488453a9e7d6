//! Orders v2: create a `CAPTURE` checkout order and capture it once approved.

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::PayPalConfig;
use crate::error::{PayPalError, Result};
use crate::token::TokenAcquirer;
use crate::transport::Transport;

/// Provider answer passed back to the caller untouched.
pub type ProviderResponse = Map<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderIntent {
    Capture,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub currency_code: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseUnit {
    pub amount: Money,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LandingPage {
    Login,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserAction {
    PayNow,
}

/// Buyer-experience settings shown on the PayPal approval page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationContext {
    pub return_url: String,
    pub cancel_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    pub landing_page: LandingPage,
    pub user_action: UserAction,
}

/// Body of `POST /v2/checkout/orders`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub intent: OrderIntent,
    pub purchase_units: Vec<PurchaseUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_context: Option<ApplicationContext>,
}

impl OrderRequest {
    /// Single purchase unit order for `amount` in `currency_code`
    /// # Arguments
    /// * `amount` - Must be positive once rounded to cents
    /// * `currency_code` - 3-letter code, sent as is
    pub fn capture(amount: Decimal, currency_code: &str) -> Result<Self> {
        Ok(OrderRequest {
            intent: OrderIntent::Capture,
            purchase_units: vec![PurchaseUnit {
                amount: Money {
                    currency_code: currency_code.to_string(),
                    value: format_amount(amount)?,
                },
            }],
            application_context: None,
        })
    }

    pub fn with_application_context(mut self, context: ApplicationContext) -> Self {
        self.application_context = Some(context);
        self
    }
}

/// Rounds half away from zero to cents and renders exactly two fractional digits.
/// Zero and negative results are rejected.
pub fn format_amount(amount: Decimal) -> Result<String> {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded <= Decimal::ZERO {
        return Err(PayPalError::InvalidAmount(amount));
    }
    rounded.rescale(2);
    Ok(rounded.to_string())
}

/// Builds checkout orders and submits them with a fresh token each time.
#[derive(Clone, Debug)]
pub struct OrderBuilder {
    config: Arc<PayPalConfig>,
    tokens: TokenAcquirer,
    transport: Transport,
}

impl OrderBuilder {
    pub fn new(config: Arc<PayPalConfig>, tokens: TokenAcquirer, transport: Transport) -> Self {
        OrderBuilder {
            config,
            tokens,
            transport,
        }
    }

    /// The request `create_order` would submit for `amount`
    pub fn build_request(&self, amount: Decimal) -> Result<OrderRequest> {
        let context = ApplicationContext {
            return_url: self.config.order_return_url()?.to_string(),
            cancel_url: self.config.order_cancel_url()?.to_string(),
            brand_name: self.config.brand_name.clone(),
            landing_page: LandingPage::Login,
            user_action: UserAction::PayNow,
        };
        Ok(OrderRequest::capture(amount, &self.config.currency)?.with_application_context(context))
    }

    /// Create a `CAPTURE` order
    /// # Arguments
    /// * `amount` - Order total in the configured currency
    /// # Return
    /// PayPal's order document (`id`, `status`, `links`) as received
    #[tracing::instrument(skip(self), fields(currency = %self.config.currency))]
    pub async fn create_order(&self, amount: Decimal) -> Result<ProviderResponse> {
        let request = self.build_request(amount)?;
        let token = self.tokens.acquire().await?;
        let url = self.config.endpoint(&["v2", "checkout", "orders"])?;

        let order: ProviderResponse = self.transport.post_json(url, &token, &request).await?;
        tracing::info!(
            order_id = order.get("id").and_then(serde_json::Value::as_str).unwrap_or_default(),
            "created PayPal order"
        );
        Ok(order)
    }

    /// Capture the funds of an order the buyer approved
    /// # Arguments
    /// * `order_id` - The `id` returned by `create_order`
    #[tracing::instrument(skip(self))]
    pub async fn capture_order(&self, order_id: &str) -> Result<ProviderResponse> {
        if order_id.trim().is_empty() {
            return Err(PayPalError::MissingIdentifier("order id"));
        }

        let token = self.tokens.acquire().await?;
        let url = self
            .config
            .endpoint(&["v2", "checkout", "orders", order_id, "capture"])?;

        let capture: ProviderResponse = self.transport.post_json(url, &token, &Map::new()).await?;
        tracing::info!(
            status = capture.get("status").and_then(serde_json::Value::as_str).unwrap_or_default(),
            "captured PayPal order"
        );
        Ok(capture)
    }
}
