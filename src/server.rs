//! Inbound HTTP surface.
//!
//! `POST /api/paypal/create?amount=` is the main entry point; the other routes
//! cover order capture, the `sale` payment flow and the pages PayPal redirects
//! the buyer to.

use std::sync::Arc;

use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{PayPalError, ProviderRequestError};
use crate::orders::ProviderResponse;
use crate::payments::Payment;
use crate::provider::PaymentProvider;

#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn PaymentProvider>,
}

#[derive(Debug, Deserialize)]
pub struct AmountParams {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentBody {
    pub total: Decimal,
    pub currency: Option<String>,
    pub description: Option<String>,
}

/// Query PayPal appends to the return URL after the buyer approves a payment
#[derive(Debug, Deserialize)]
pub struct ExecuteParams {
    #[serde(rename = "paymentId")]
    pub payment_id: String,
    #[serde(rename = "PayerID", alias = "payerId")]
    pub payer_id: String,
}

/// Build the router, open to any origin
/// # Arguments
/// * `provider` - Integration serving the payment routes
pub fn router(provider: Arc<dyn PaymentProvider>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/paypal/create", post(create_order))
        .route("/api/paypal/capture-order/:order_id", post(capture_order))
        .route("/api/payments/create", post(create_payment))
        .route("/api/payments/success", get(execute_payment))
        .route("/api/payments/cancel", get(payment_cancelled))
        .route("/success", get(order_approved))
        .route("/cancel", get(order_cancelled))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { provider })
}

async fn create_order(
    State(state): State<AppState>,
    query: Option<Query<AmountParams>>,
    form: Option<Form<AmountParams>>,
) -> Result<Json<ProviderResponse>, ApiError> {
    let amount = query
        .map(|Query(params)| params.amount)
        .or_else(|| form.map(|Form(params)| params.amount))
        .ok_or_else(|| ApiError::bad_request("Valid amount is required"))?;

    let order = state.provider.create_order(amount).await?;
    Ok(Json(order))
}

async fn capture_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<ProviderResponse>, ApiError> {
    let capture = state.provider.capture_order(&order_id).await?;
    Ok(Json(capture))
}

async fn create_payment(
    State(state): State<AppState>,
    Json(body): Json<CreatePaymentBody>,
) -> Result<Json<Payment>, ApiError> {
    let currency = body
        .currency
        .unwrap_or_else(|| state.provider.default_currency().to_string());

    let payment = state
        .provider
        .create_payment(body.total, &currency, body.description.as_deref())
        .await?;
    Ok(Json(payment))
}

async fn execute_payment(
    State(state): State<AppState>,
    Query(params): Query<ExecuteParams>,
) -> Result<Json<Payment>, ApiError> {
    let payment = state
        .provider
        .execute_payment(&params.payment_id, &params.payer_id)
        .await?;
    Ok(Json(payment))
}

async fn order_approved() -> Html<&'static str> {
    Html("<h2>Payment Successful</h2><p>You may now return to the app.</p>")
}

async fn order_cancelled() -> Html<&'static str> {
    Html("<h2>Payment Cancelled</h2><p>You cancelled the PayPal payment.</p>")
}

async fn payment_cancelled() -> Html<&'static str> {
    Html("<h2>Payment Cancelled</h2><p>The payment was not executed.</p>")
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Failed inbound request: a status plus a JSON body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: Value,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            body: json!({ "error": message }),
        }
    }

    fn with_message(status: StatusCode, err: &PayPalError) -> Self {
        ApiError {
            status,
            body: json!({ "error": err.to_string() }),
        }
    }
}

impl From<PayPalError> for ApiError {
    fn from(err: PayPalError) -> Self {
        let api_error = match &err {
            PayPalError::InvalidAmount(_)
            | PayPalError::MissingIdentifier(_)
            | PayPalError::InvalidCurrency(_) => ApiError::with_message(StatusCode::BAD_REQUEST, &err),
            PayPalError::Authentication { .. }
            | PayPalError::ProviderRequest(ProviderRequestError::Transport(_)) => {
                let status = if err.is_timeout() {
                    StatusCode::GATEWAY_TIMEOUT
                } else {
                    StatusCode::BAD_GATEWAY
                };
                ApiError::with_message(status, &err)
            }
            PayPalError::Configuration(_) => {
                ApiError::with_message(StatusCode::INTERNAL_SERVER_ERROR, &err)
            }
            PayPalError::ProviderRequest(ProviderRequestError::Rejected { status, body }) => {
                let status = StatusCode::from_u16(*status)
                    .ok()
                    .filter(|status| status.is_client_error() || status.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                ApiError {
                    status,
                    body: body.clone(),
                }
            }
            PayPalError::ProviderRequest(ProviderRequestError::Malformed(_)) => {
                ApiError::with_message(StatusCode::BAD_GATEWAY, &err)
            }
        };

        if api_error.status.is_server_error() {
            tracing::error!(status = api_error.status.as_u16(), error = %err, "PayPal request failed");
        } else {
            tracing::warn!(status = api_error.status.as_u16(), error = %err, "rejected request");
        }
        api_error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
