use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use oauth2::{ClientId, ClientSecret};
use url::Url;

use crate::error::{PayPalError, Result};

const DEFAULT_CURRENCY: &str = "PHP";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// PayPal environment the credentials belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Sandbox,
    Live,
}

impl Environment {
    /// REST API base for this environment
    pub fn api_base(&self) -> &'static str {
        match self {
            Environment::Sandbox => "https://api-m.sandbox.paypal.com/",
            Environment::Live => "https://api-m.paypal.com/",
        }
    }

    /// Buyer-facing authorize page, only needed to satisfy the OAuth client shape
    pub fn authorize_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => "https://www.sandbox.paypal.com/signin/authorize",
            Environment::Live => "https://www.paypal.com/signin/authorize",
        }
    }
}

impl FromStr for Environment {
    type Err = PayPalError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Environment::Sandbox),
            "live" => Ok(Environment::Live),
            other => Err(PayPalError::Configuration(format!(
                "PAYPAL_MODE must be `sandbox` or `live`, got `{other}`"
            ))),
        }
    }
}

/// Everything the PayPal components need, passed to each of them at construction.
#[derive(Clone, Debug)]
pub struct PayPalConfig {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub environment: Environment,
    pub base_url: Url,
    pub currency: String,
    pub brand_name: Option<String>,
    pub public_url: Url,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl PayPalConfig {
    /// Create a new config with defaults for everything but the credentials
    /// # Arguments
    /// * `client_id` - Client ID of the PayPal REST app
    /// * `client_secret` - Secret of the PayPal REST app
    /// * `environment` - Sandbox or Live, selects the API base URL
    /// # Example
    /// ```rust
    /// use paypal_axum::config::{Environment, PayPalConfig};
    /// let config = PayPalConfig::new(
    ///     "CLIENT_ID".to_string(),
    ///     "CLIENT_SECRET".to_string(),
    ///     Environment::Sandbox,
    /// );
    /// assert_eq!(config.currency, "PHP");
    /// ```
    pub fn new(client_id: String, client_secret: String, environment: Environment) -> Self {
        PayPalConfig {
            client_id: ClientId::new(client_id),
            client_secret: ClientSecret::new(client_secret),
            environment,
            base_url: Url::parse(environment.api_base()).expect("static API base is a valid URL"),
            currency: DEFAULT_CURRENCY.to_string(),
            brand_name: None,
            public_url: Url::parse(DEFAULT_PUBLIC_URL).expect("static public URL is valid"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    /// Read the config from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup
    /// # Arguments
    /// * `lookup` - Returns the value for a variable name such as `PAYPAL_CLIENT_ID`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let client_id = get("PAYPAL_CLIENT_ID")
            .ok_or_else(|| PayPalError::Configuration("PAYPAL_CLIENT_ID must be set".into()))?;
        let client_secret = get("PAYPAL_CLIENT_SECRET")
            .ok_or_else(|| PayPalError::Configuration("PAYPAL_CLIENT_SECRET must be set".into()))?;
        let environment = match get("PAYPAL_MODE") {
            Some(mode) => mode.parse()?,
            None => Environment::default(),
        };

        let mut config = PayPalConfig::new(client_id, client_secret, environment);

        if let Some(base_url) = get("PAYPAL_BASE_URL") {
            config = config.set_base_url(parse_url("PAYPAL_BASE_URL", &base_url)?);
        }
        if let Some(currency) = get("PAYPAL_CURRENCY") {
            config.currency = normalize_currency(&currency)
                .map_err(|err| PayPalError::Configuration(err.to_string()))?;
        }
        if let Some(public_url) = get("PUBLIC_URL") {
            config.public_url = parse_url("PUBLIC_URL", &public_url)?;
        }
        if let Some(secs) = get("PAYPAL_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().ok().filter(|secs| *secs > 0).ok_or_else(|| {
                PayPalError::Configuration(format!(
                    "PAYPAL_TIMEOUT_SECS must be a positive integer, got `{secs}`"
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        config.brand_name = get("PAYPAL_BRAND_NAME");

        Ok(config)
    }

    /// Point the client at another API base, e.g. a local stub
    pub fn set_base_url(mut self, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        self.base_url = base_url;
        self
    }

    pub fn set_currency(mut self, currency: String) -> Self {
        self.currency = currency;
        self
    }

    pub fn set_public_url(mut self, public_url: Url) -> Self {
        self.public_url = public_url;
        self
    }

    pub fn set_brand_name(mut self, brand_name: Option<String>) -> Self {
        self.brand_name = brand_name;
        self
    }

    pub fn set_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// API endpoint below the base URL; every segment is percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        join_segments(&self.base_url, segments)
    }

    /// Where PayPal sends the buyer after approving a checkout order
    pub fn order_return_url(&self) -> Result<Url> {
        join_segments(&self.public_url, &["success"])
    }

    pub fn order_cancel_url(&self) -> Result<Url> {
        join_segments(&self.public_url, &["cancel"])
    }

    /// Where PayPal sends the buyer after approving a `sale` payment
    pub fn payment_return_url(&self) -> Result<Url> {
        join_segments(&self.public_url, &["api", "payments", "success"])
    }

    pub fn payment_cancel_url(&self) -> Result<Url> {
        join_segments(&self.public_url, &["api", "payments", "cancel"])
    }
}

/// Listen address of the inbound HTTP server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = match lookup("HOST") {
            Some(host) => host.trim().parse().map_err(|_| {
                PayPalError::Configuration(format!("HOST must be an IP address, got `{host}`"))
            })?,
            None => IpAddr::from([0, 0, 0, 0]),
        };
        let port = match lookup("PORT") {
            Some(port) => port.trim().parse().map_err(|_| {
                PayPalError::Configuration(format!("PORT must be a port number, got `{port}`"))
            })?,
            None => 8080,
        };
        Ok(ServerConfig { host, port })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Upper-cases a currency code and checks it is three ASCII letters.
pub fn normalize_currency(code: &str) -> Result<String> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(PayPalError::InvalidCurrency(code.to_string()))
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url> {
    Url::parse(value)
        .map_err(|err| PayPalError::Configuration(format!("{key} is not a valid URL: {err}")))
}

fn join_segments(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| PayPalError::Configuration(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_sandbox_and_php() {
        let config = PayPalConfig::from_lookup(lookup(&[
            ("PAYPAL_CLIENT_ID", "id"),
            ("PAYPAL_CLIENT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.environment, Environment::Sandbox);
        assert_eq!(config.base_url.as_str(), "https://api-m.sandbox.paypal.com/");
        assert_eq!(config.currency, "PHP");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.brand_name.is_none());
    }

    #[test]
    fn live_mode_selects_live_api() {
        let config = PayPalConfig::from_lookup(lookup(&[
            ("PAYPAL_CLIENT_ID", "id"),
            ("PAYPAL_CLIENT_SECRET", "secret"),
            ("PAYPAL_MODE", "LIVE"),
        ]))
        .unwrap();

        assert_eq!(config.environment, Environment::Live);
        assert_eq!(
            config.endpoint(&["v2", "checkout", "orders"]).unwrap().as_str(),
            "https://api-m.paypal.com/v2/checkout/orders"
        );
    }

    #[test]
    fn missing_credentials_is_a_configuration_error() {
        let err = PayPalConfig::from_lookup(lookup(&[("PAYPAL_CLIENT_SECRET", "secret")]))
            .unwrap_err();
        assert!(matches!(err, PayPalError::Configuration(msg) if msg.contains("PAYPAL_CLIENT_ID")));

        let err = PayPalConfig::from_lookup(lookup(&[
            ("PAYPAL_CLIENT_ID", "id"),
            ("PAYPAL_CLIENT_SECRET", "  "),
        ]))
        .unwrap_err();
        assert!(matches!(err, PayPalError::Configuration(msg) if msg.contains("PAYPAL_CLIENT_SECRET")));
    }

    #[test]
    fn rejects_unknown_mode_and_bad_currency() {
        let err = PayPalConfig::from_lookup(lookup(&[
            ("PAYPAL_CLIENT_ID", "id"),
            ("PAYPAL_CLIENT_SECRET", "secret"),
            ("PAYPAL_MODE", "staging"),
        ]))
        .unwrap_err();
        assert!(matches!(err, PayPalError::Configuration(_)));

        let err = PayPalConfig::from_lookup(lookup(&[
            ("PAYPAL_CLIENT_ID", "id"),
            ("PAYPAL_CLIENT_SECRET", "secret"),
            ("PAYPAL_CURRENCY", "PESO"),
        ]))
        .unwrap_err();
        assert!(matches!(err, PayPalError::Configuration(_)));
    }

    #[test]
    fn redirect_urls_follow_public_url() {
        let config = PayPalConfig::from_lookup(lookup(&[
            ("PAYPAL_CLIENT_ID", "id"),
            ("PAYPAL_CLIENT_SECRET", "secret"),
            ("PUBLIC_URL", "https://shop.example.com/"),
        ]))
        .unwrap();

        assert_eq!(
            config.order_return_url().unwrap().as_str(),
            "https://shop.example.com/success"
        );
        assert_eq!(
            config.payment_cancel_url().unwrap().as_str(),
            "https://shop.example.com/api/payments/cancel"
        );
    }

    #[test]
    fn base_url_override_keeps_sub_path_and_encodes_segments() {
        let config = PayPalConfig::new("id".into(), "secret".into(), Environment::Sandbox)
            .set_base_url(Url::parse("http://127.0.0.1:9000/paypal").unwrap());

        assert_eq!(
            config.endpoint(&["v2", "checkout", "orders", "A/B", "capture"]).unwrap().as_str(),
            "http://127.0.0.1:9000/paypal/v2/checkout/orders/A%2FB/capture"
        );
    }

    #[test]
    fn secret_is_not_printed() {
        let config = PayPalConfig::new("id".into(), "super-secret".into(), Environment::Sandbox);
        assert!(!format!("{config:?}").contains("super-secret"));
    }

    #[test]
    fn server_config_defaults_and_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");

        let config =
            ServerConfig::from_lookup(lookup(&[("HOST", "127.0.0.1"), ("PORT", "3000")])).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");

        assert!(ServerConfig::from_lookup(lookup(&[("PORT", "http")])).is_err());
    }
}
