//! # paypal-axum crate
//!
//! This crate is a thin backend in front of the PayPal REST API, ready to mount in your Axum project.
//! It gets an OAuth2 token with the client-credentials grant (using the oauth2 lib), and then creates the payment with it.
//!
//! # Usage
//!
//! Create a `PayPalConfig` with the client_id and client_secret of your PayPal REST app, build a `PayPalClient` from it and hand it to the router.
//! Every call asks PayPal for a new token, nothing is cached or saved between requests.
//!
//! The crate has two ways to take a payment:
//!
//! ### 1. Checkout order (Orders v2)
//!
//! `POST /api/paypal/create?amount=100.5` sends this body to `/v2/checkout/orders` and returns the answer of PayPal as it is:
//!
//! ```json
//! {
//!   "intent": "CAPTURE",
//!   "purchase_units": [{ "amount": { "currency_code": "PHP", "value": "100.50" } }],
//!   "application_context": { "return_url": "...", "cancel_url": "...", "landing_page": "LOGIN", "user_action": "PAY_NOW" }
//! }
//! ```
//!
//! The answer has the order `id` and a `links` list; the link with `rel = approve` is where the user must go.
//! After the user approves, `POST /api/paypal/capture-order/{id}` takes the money.
//!
//! ### 2. Sale payment (Payments v1)
//!
//! This is the same flow that the PayPal SDKs have, with the `Payment`, `Payer`, `Transaction`, `Amount` and `RedirectUrls` objects.
//! `POST /api/payments/create` creates the payment and returns it with an `approval_url` link.
//! After the approval, PayPal redirects the user to `/api/payments/success?paymentId=...&PayerID=...`, and that route executes the payment with those two values.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use paypal_axum::config::PayPalConfig;
//! use paypal_axum::provider::PayPalClient;
//! use paypal_axum::server::router;
//!
//! #[tokio::main]
//! async fn main() {
//!     // PAYPAL_CLIENT_ID, PAYPAL_CLIENT_SECRET and PAYPAL_MODE come from the env or a .env file
//!     dotenv::dotenv().ok();
//!     let config = PayPalConfig::from_env().unwrap();
//!     let client = PayPalClient::new(config).unwrap();
//!
//!     let app = router(Arc::new(client));
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080")
//!         .await
//!         .unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```
//!
//! You can use the client without the router too:
//!
//! ```rust,no_run
//! use paypal_axum::config::{Environment, PayPalConfig};
//! use paypal_axum::provider::{PayPalClient, PaymentProvider};
//! use rust_decimal::Decimal;
//!
//! # async fn run() -> paypal_axum::error::Result<()> {
//! let client = PayPalClient::new(PayPalConfig::new(
//!     "CLIENT_ID".to_string(),
//!     "CLIENT_SECRET".to_string(),
//!     Environment::Sandbox,
//! ))?;
//!
//! let order = client.create_order(Decimal::new(1005, 1)).await?;
//! println!("{:?}", order.get("id"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod observability;
pub mod orders;
pub mod payments;
pub mod provider;
pub mod server;
pub mod token;
pub mod transport;

pub use config::{Environment, PayPalConfig};
pub use error::{PayPalError, Result};
pub use provider::{PayPalClient, PaymentProvider};
