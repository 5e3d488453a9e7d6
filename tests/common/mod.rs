#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Form, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use paypal_axum::config::{Environment, PayPalConfig};
use paypal_axum::provider::PaymentProvider;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use url::Url;

pub const TOKEN: &str = "A21AAFEpH4PsADK7qSS7pSRsgzfENtu-Q1ysgEDVDESseMHBYXVJYE8ovjj68elIDy8nF26AwPhfXTIeWAZHSLIsQkSYz9ifg";

/// How the stub answers each endpoint.
#[derive(Clone)]
pub struct Behavior {
    pub token_status: StatusCode,
    pub token_body: Value,
    pub token_delay: Option<Duration>,
    pub order_status: StatusCode,
    pub order_body: Value,
    pub order_delay: Option<Duration>,
    /// Replaces the echoed payment when set
    pub payment_response: Option<(StatusCode, Value)>,
    /// Replaces the approved payment when set
    pub execute_response: Option<(StatusCode, Value)>,
}

impl Default for Behavior {
    fn default() -> Self {
        Behavior {
            token_status: StatusCode::OK,
            token_body: json!({
                "scope": "https://uri.paypal.com/services/payments/payment",
                "access_token": TOKEN,
                "token_type": "Bearer",
                "app_id": "APP-80W284485P519543T",
                "expires_in": 32400,
                "nonce": "2024-05-01T10:00:00Z"
            }),
            token_delay: None,
            order_status: StatusCode::CREATED,
            order_body: json!({
                "id": "5O190127TN364715T",
                "status": "CREATED",
                "links": [
                    { "href": "https://api-m.paypal.com/v2/checkout/orders/5O190127TN364715T", "rel": "self", "method": "GET" },
                    { "href": "https://www.paypal.com/checkoutnow?token=5O190127TN364715T", "rel": "approve", "method": "GET" }
                ]
            }),
            order_delay: None,
            payment_response: None,
            execute_response: None,
        }
    }
}

#[derive(Default)]
pub struct Recorded {
    pub token_auth: Option<String>,
    pub token_form: Option<HashMap<String, String>>,
    pub bearer: Option<String>,
    pub body: Option<Value>,
    pub path_id: Option<String>,
}

pub struct StubState {
    behavior: Behavior,
    pub token_calls: AtomicUsize,
    pub order_calls: AtomicUsize,
    pub capture_calls: AtomicUsize,
    pub payment_calls: AtomicUsize,
    pub execute_calls: AtomicUsize,
    pub recorded: Mutex<Recorded>,
}

impl StubState {
    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn order_calls(&self) -> usize {
        self.order_calls.load(Ordering::SeqCst)
    }

    pub fn last_body(&self) -> Value {
        self.recorded.lock().unwrap().body.clone().unwrap_or(Value::Null)
    }

    fn record_call(&self, headers: &HeaderMap, body: Value, path_id: Option<String>) {
        let mut recorded = self.recorded.lock().unwrap();
        recorded.bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        recorded.body = Some(body);
        recorded.path_id = path_id;
    }
}

/// A fake PayPal REST API listening on an ephemeral port.
pub struct StubPayPal {
    pub base_url: Url,
    pub state: Arc<StubState>,
}

impl StubPayPal {
    pub async fn start() -> Self {
        Self::start_with(Behavior::default()).await
    }

    pub async fn start_with(behavior: Behavior) -> Self {
        let state = Arc::new(StubState {
            behavior,
            token_calls: AtomicUsize::new(0),
            order_calls: AtomicUsize::new(0),
            capture_calls: AtomicUsize::new(0),
            payment_calls: AtomicUsize::new(0),
            execute_calls: AtomicUsize::new(0),
            recorded: Mutex::new(Recorded::default()),
        });

        let app = Router::new()
            .route("/v1/oauth2/token", post(token))
            .route("/v2/checkout/orders", post(create_order))
            .route("/v2/checkout/orders/:id/capture", post(capture_order))
            .route("/v1/payments/payment", post(create_payment))
            .route("/v1/payments/payment/:id/execute", post(execute_payment))
            .with_state(Arc::clone(&state));

        let base_url = serve(app).await;
        StubPayPal { base_url, state }
    }

    pub fn config(&self) -> PayPalConfig {
        PayPalConfig::new(
            "client-id".to_string(),
            "client-secret".to_string(),
            Environment::Sandbox,
        )
        .set_base_url(self.base_url.clone())
        .set_public_url(Url::parse("https://shop.example.com").unwrap())
    }
}

/// Serve `app` on 127.0.0.1 and return its base URL.
pub async fn serve(app: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/")).unwrap()
}

/// Serve the crate's own router in front of `provider`.
pub async fn spawn_app(provider: Arc<dyn PaymentProvider>) -> Url {
    serve(paypal_axum::server::router(provider)).await
}

async fn token(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    state.token_calls.fetch_add(1, Ordering::SeqCst);
    {
        let mut recorded = state.recorded.lock().unwrap();
        recorded.token_auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        recorded.token_form = Some(form);
    }
    if let Some(delay) = state.behavior.token_delay {
        tokio::time::sleep(delay).await;
    }
    (state.behavior.token_status, Json(state.behavior.token_body.clone()))
}

async fn create_order(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.order_calls.fetch_add(1, Ordering::SeqCst);
    state.record_call(&headers, body, None);
    if let Some(delay) = state.behavior.order_delay {
        tokio::time::sleep(delay).await;
    }
    (state.behavior.order_status, Json(state.behavior.order_body.clone()))
}

async fn capture_order(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.capture_calls.fetch_add(1, Ordering::SeqCst);
    state.record_call(&headers, body, Some(id.clone()));
    (
        StatusCode::CREATED,
        Json(json!({ "id": id, "status": "COMPLETED" })),
    )
}

async fn create_payment(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.payment_calls.fetch_add(1, Ordering::SeqCst);
    state.record_call(&headers, body.clone(), None);
    if let Some((status, body)) = &state.behavior.payment_response {
        return (*status, Json(body.clone()));
    }

    let mut created = body;
    created["id"] = json!("PAYID-MYXGB4Y5LJ00");
    created["state"] = json!("created");
    created["create_time"] = json!("2024-05-01T10:00:00Z");
    created["links"] = json!([
        { "href": "https://api-m.sandbox.paypal.com/v1/payments/payment/PAYID-MYXGB4Y5LJ00", "rel": "self", "method": "GET" },
        { "href": "https://www.sandbox.paypal.com/cgi-bin/webscr?cmd=_express-checkout&token=EC-60385559L1062554J", "rel": "approval_url", "method": "REDIRECT" },
        { "href": "https://api-m.sandbox.paypal.com/v1/payments/payment/PAYID-MYXGB4Y5LJ00/execute", "rel": "execute", "method": "POST" }
    ]);
    (StatusCode::CREATED, Json(created))
}

async fn execute_payment(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.execute_calls.fetch_add(1, Ordering::SeqCst);
    state.record_call(&headers, body.clone(), Some(id.clone()));
    if let Some((status, body)) = &state.behavior.execute_response {
        return (*status, Json(body.clone()));
    }
    (
        StatusCode::OK,
        Json(json!({
            "id": id,
            "intent": "sale",
            "state": "approved",
            "payer": {
                "payment_method": "paypal",
                "payer_info": { "payer_id": body["payer_id"] }
            },
            "transactions": [{
                "amount": { "currency": "USD", "total": "12.00" },
                "related_resources": [{ "sale": { "id": "36C38912MN9658832", "state": "completed" } }]
            }]
        })),
    )
}
