//! Outbound HTTP to PayPal.
//!
//! A single [`reqwest::Client`] carries the configured timeouts for both the
//! OAuth exchange and the order/payment calls, so an unresponsive provider
//! cannot hold a request open forever.

use oauth2::{HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::PayPalConfig;
use crate::error::{PayPalError, ProviderRequestError, Result};
use crate::token::AccessToken;

#[derive(Clone, Debug)]
pub struct Transport {
    http: reqwest::Client,
}

impl Transport {
    /// Build the shared HTTP client
    /// # Arguments
    /// * `config` - Supplies the request and connect timeouts
    pub fn new(config: &PayPalConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| {
                PayPalError::Configuration(format!("cannot build the HTTP client: {err}"))
            })?;
        Ok(Transport { http })
    }

    /// Execute a request prepared by the `oauth2` crate
    pub async fn send_oauth(
        &self,
        request: HttpRequest,
    ) -> std::result::Result<HttpResponse, reqwest::Error> {
        let response = self
            .http
            .request(request.method, request.url.as_str())
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        let status_code = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status_code,
            headers,
            body,
        })
    }

    /// POST a JSON body with bearer auth and decode the JSON answer
    /// # Arguments
    /// * `url` - Absolute PayPal endpoint
    /// * `token` - Bearer token from the client-credentials exchange
    /// * `body` - Anything serializable as JSON
    /// # Return
    /// The decoded response, or `ProviderRequestError::Rejected` carrying the
    /// provider's status and error body for non-2xx answers
    pub async fn post_json<B, R>(&self, url: Url, token: &AccessToken, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        tracing::debug!(%url, "calling PayPal");

        let response = self
            .http
            .post(url)
            .bearer_auth(token.secret())
            .json(body)
            .send()
            .await
            .map_err(ProviderRequestError::from)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(ProviderRequestError::from)?;

        if !status.is_success() {
            let body = serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
            tracing::warn!(status = status.as_u16(), error = %body, "PayPal rejected the request");
            return Err(ProviderRequestError::Rejected {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        serde_json::from_slice(&bytes)
            .map_err(|err| ProviderRequestError::Malformed(err.to_string()).into())
    }
}
