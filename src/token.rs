use oauth2::basic::{BasicClient, BasicErrorResponse};
use oauth2::{AuthUrl, RequestTokenError, TokenResponse, TokenUrl};

use crate::config::PayPalConfig;
use crate::error::{PayPalError, Result};
use crate::transport::Transport;

/// Bearer token for one provider call. Never cached, and `Debug` keeps the value out of logs.
#[derive(Clone, Debug)]
pub struct AccessToken(oauth2::AccessToken);

impl AccessToken {
    pub fn secret(&self) -> &str {
        self.0.secret()
    }
}

/// Exchanges the app credentials for an access token with the client-credentials grant.
#[derive(Clone, Debug)]
pub struct TokenAcquirer {
    oauth: BasicClient,
    transport: Transport,
}

impl TokenAcquirer {
    /// Create a new instance of TokenAcquirer
    /// # Arguments
    /// * `config` - Credentials and API base; the token endpoint is `{base}/v1/oauth2/token`
    /// * `transport` - HTTP client the exchange runs on
    pub fn new(config: &PayPalConfig, transport: Transport) -> Result<Self> {
        let auth_url = AuthUrl::new(config.environment.authorize_url().to_string())
            .map_err(|err| PayPalError::Configuration(format!("invalid authorize URL: {err}")))?;
        let token_url = TokenUrl::from_url(config.endpoint(&["v1", "oauth2", "token"])?);

        let oauth = BasicClient::new(
            config.client_id.clone(),
            Some(config.client_secret.clone()),
            auth_url,
            Some(token_url),
        );

        Ok(TokenAcquirer { oauth, transport })
    }

    /// POST `grant_type=client_credentials` with HTTP Basic auth
    /// # Return
    /// The `access_token` of the answer, or `PayPalError::Authentication` if
    /// the exchange fails or the token is missing
    #[tracing::instrument(skip(self))]
    pub async fn acquire(&self) -> Result<AccessToken> {
        let response = self
            .oauth
            .exchange_client_credentials()
            .request_async(|request| self.transport.send_oauth(request))
            .await
            .map_err(authentication_error)?;

        let token = response.access_token().clone();
        if token.secret().trim().is_empty() {
            return Err(PayPalError::Authentication {
                reason: "token response carried an empty access_token".to_string(),
                source: None,
            });
        }

        tracing::debug!(expires_in = ?response.expires_in(), "obtained PayPal access token");
        Ok(AccessToken(token))
    }
}

fn authentication_error(err: RequestTokenError<reqwest::Error, BasicErrorResponse>) -> PayPalError {
    let (reason, source) = match err {
        RequestTokenError::ServerResponse(response) => (response.to_string(), None),
        RequestTokenError::Request(err) => (format!("token request failed: {err}"), Some(err)),
        RequestTokenError::Parse(err, _) => (format!("unexpected token response: {err}"), None),
        RequestTokenError::Other(reason) => (reason, None),
    };
    tracing::warn!(%reason, "PayPal token exchange failed");
    PayPalError::Authentication { reason, source }
}
