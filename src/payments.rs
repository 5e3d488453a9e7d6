//! Payments v1 `sale` flow, modelled as the typed object graph PayPal's SDKs expose.
//!
//! The flow has two phases. [`PaymentBuilder::create_payment`] registers the
//! payment and returns an approval link; the buyer approves it on PayPal and
//! is redirected back with `paymentId` and `PayerID`, which
//! [`PaymentBuilder::execute_payment`] forwards to finalize the sale. The
//! payment state is never tracked here, only read from PayPal's answers.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{normalize_currency, PayPalConfig};
use crate::error::{PayPalError, Result};
use crate::orders::format_amount;
use crate::token::TokenAcquirer;
use crate::transport::Transport;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentIntent {
    Sale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Paypal,
}

/// Payment state as reported by PayPal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Created,
    Approved,
    Failed,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payer {
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_info: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub currency: String,
    pub total: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Sales and refunds PayPal attaches once the payment is executed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_resources: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectUrls {
    pub return_url: String,
    pub cancel_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// A Payments v1 resource, both as sent on create and as returned by PayPal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub intent: PaymentIntent,
    pub payer: Payer,
    pub transactions: Vec<Transaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_urls: Option<RedirectUrls>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<PaymentState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    /// Fields this model does not name (`create_time`, `cart`, ...), kept as received
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Payment {
    /// A `sale` paid from a PayPal account
    pub fn sale(transaction: Transaction, redirect_urls: RedirectUrls) -> Self {
        Payment {
            id: None,
            intent: PaymentIntent::Sale,
            payer: Payer {
                payment_method: PaymentMethod::Paypal,
                payer_info: None,
            },
            transactions: vec![transaction],
            redirect_urls: Some(redirect_urls),
            state: None,
            links: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Link the buyer must visit to approve the payment
    pub fn approval_url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.rel == "approval_url")
            .map(|link| link.href.as_str())
    }
}

/// Second phase of the flow: the identifiers PayPal put on the return redirect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentExecution {
    /// Goes in the URL path, not the body
    #[serde(skip)]
    pub payment_id: String,
    pub payer_id: String,
}

impl PaymentExecution {
    pub fn new(payment_id: String, payer_id: String) -> Result<Self> {
        if payment_id.trim().is_empty() {
            return Err(PayPalError::MissingIdentifier("payment id"));
        }
        if payer_id.trim().is_empty() {
            return Err(PayPalError::MissingIdentifier("payer id"));
        }
        Ok(PaymentExecution {
            payment_id,
            payer_id,
        })
    }
}

#[derive(Clone, Debug)]
pub struct PaymentBuilder {
    config: Arc<PayPalConfig>,
    tokens: TokenAcquirer,
    transport: Transport,
}

impl PaymentBuilder {
    pub fn new(config: Arc<PayPalConfig>, tokens: TokenAcquirer, transport: Transport) -> Self {
        PaymentBuilder {
            config,
            tokens,
            transport,
        }
    }

    /// The `sale` payment `create_payment` would submit
    /// # Arguments
    /// * `total` - Payment total, rounded to cents
    /// * `currency` - 3-letter currency code
    /// * `description` - Shown to the buyer on the approval page, left out when `None`
    pub fn build_payment(
        &self,
        total: Decimal,
        currency: &str,
        description: Option<&str>,
    ) -> Result<Payment> {
        let amount = Amount {
            currency: normalize_currency(currency)?,
            total: format_amount(total)?,
            details: None,
        };
        let transaction = Transaction {
            amount,
            description: description.map(str::to_string),
            related_resources: Vec::new(),
        };
        let redirect_urls = RedirectUrls {
            return_url: self.config.payment_return_url()?.to_string(),
            cancel_url: self.config.payment_cancel_url()?.to_string(),
        };
        Ok(Payment::sale(transaction, redirect_urls))
    }

    /// Register a `sale` payment with PayPal
    /// # Return
    /// The created payment, in state `created`, with its approval link
    #[tracing::instrument(skip(self, description))]
    pub async fn create_payment(
        &self,
        total: Decimal,
        currency: &str,
        description: Option<&str>,
    ) -> Result<Payment> {
        let payment = self.build_payment(total, currency, description)?;
        let token = self.tokens.acquire().await?;
        let url = self.config.endpoint(&["v1", "payments", "payment"])?;

        let created: Payment = self.transport.post_json(url, &token, &payment).await?;
        tracing::info!(
            payment_id = created.id.as_deref().unwrap_or_default(),
            state = ?created.state,
            "created PayPal payment"
        );
        Ok(created)
    }

    /// Finalize a payment the buyer approved
    /// # Arguments
    /// * `payment_id` - `paymentId` from the return redirect, forwarded unmodified
    /// * `payer_id` - `PayerID` from the return redirect, forwarded unmodified
    #[tracing::instrument(skip(self))]
    pub async fn execute_payment(&self, payment_id: &str, payer_id: &str) -> Result<Payment> {
        let execution = PaymentExecution::new(payment_id.to_string(), payer_id.to_string())?;
        let token = self.tokens.acquire().await?;
        let url = self.config.endpoint(&[
            "v1",
            "payments",
            "payment",
            execution.payment_id.as_str(),
            "execute",
        ])?;

        let executed: Payment = self.transport.post_json(url, &token, &execution).await?;
        tracing::info!(state = ?executed.state, "executed PayPal payment");
        Ok(executed)
    }
}
