//! Error types returned by every PayPal operation in this crate.
//!
//! Failures are never recovered locally: each variant is surfaced to the
//! caller, and [`crate::server`] maps it onto an HTTP status.

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, PayPalError>;

#[derive(Debug, Error)]
pub enum PayPalError {
    /// The client-credentials exchange failed, or the token response had no
    /// usable `access_token`. `source` is set when the exchange never got an answer.
    #[error("PayPal authentication failed: {reason}")]
    Authentication {
        reason: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// An order or payment call failed after a token was obtained.
    #[error(transparent)]
    ProviderRequest(#[from] ProviderRequestError),

    /// Missing or invalid settings, detected before any call is made.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("amount {0} must be greater than zero once rounded to cents")]
    InvalidAmount(Decimal),

    /// A provider identifier (order, payment or payer id) was blank.
    #[error("{0} must not be blank")]
    MissingIdentifier(&'static str),

    #[error("currency `{0}` is not a 3-letter code")]
    InvalidCurrency(String),
}

/// Failure of an order/payment request against the provider.
#[derive(Debug, Error)]
pub enum ProviderRequestError {
    /// PayPal answered with a non-2xx status. `body` is the provider's error
    /// document, or its raw text wrapped in a JSON string.
    #[error("PayPal rejected the request with status {status}")]
    Rejected { status: u16, body: Value },

    /// The request never produced a response (connect failure, timeout).
    #[error("request to PayPal failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 2xx response whose body could not be decoded.
    #[error("malformed response from PayPal: {0}")]
    Malformed(String),
}

impl PayPalError {
    /// Status code PayPal returned, when the failure was a provider rejection.
    pub fn provider_status(&self) -> Option<u16> {
        match self {
            PayPalError::ProviderRequest(ProviderRequestError::Rejected { status, .. }) => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, PayPalError::Authentication { .. })
    }

    /// True when a call to PayPal, token exchange included, ran out of time.
    pub fn is_timeout(&self) -> bool {
        match self {
            PayPalError::Authentication {
                source: Some(source),
                ..
            }
            | PayPalError::ProviderRequest(ProviderRequestError::Transport(source)) => {
                source.is_timeout()
            }
            _ => false,
        }
    }
}
