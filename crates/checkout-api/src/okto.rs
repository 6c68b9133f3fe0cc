//! # Okto Wallet Proxy
//!
//! Forwards merchant sign-in, logout and portfolio requests to the Okto
//! wallet API so the API key never reaches the browser.

use checkout_core::{CheckoutError, CheckoutResult};
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use std::env;
use tracing::{error, info, instrument};

const SERVICE: &str = "okto";

pub const DEFAULT_OKTO_BASE_URL: &str = "https://sandbox-api.okto.tech";

#[derive(Debug, Clone)]
pub struct OktoConfig {
    pub base_url: String,
    /// `None` makes `authenticate` fail with a configuration error
    pub api_key: Option<SecretString>,
}

impl OktoConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `OKTO_API_SECRET`
    /// - `OKTO_BASE_URL`
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            base_url: env::var("OKTO_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OKTO_BASE_URL.to_string()),
            api_key: env::var("OKTO_API_SECRET")
                .ok()
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
        }
    }

    pub fn new(base_url: impl Into<String>, api_key: Option<&str>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.map(|k| SecretString::from(k.to_string())),
        }
    }
}

/// What an upstream failure is reported as when Okto gives no message or
/// cannot be reached
struct Fallback {
    message: &'static str,
    status: StatusCode,
}

#[derive(Clone)]
pub struct OktoClient {
    config: OktoConfig,
    client: Client,
}

impl OktoClient {
    pub fn new(config: OktoConfig) -> CheckoutResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| {
                CheckoutError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    pub fn from_env() -> CheckoutResult<Self> {
        Self::new(OktoConfig::from_env())
    }

    /// True when an API key is available for `authenticate`
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Send a request, passing Okto's status and `message` through on failure
    async fn send(
        &self,
        request: RequestBuilder,
        fallback: Fallback,
    ) -> CheckoutResult<(StatusCode, Value)> {
        let rejected = |status: StatusCode, message: Option<String>| CheckoutError::Rejected {
            service: SERVICE.to_string(),
            status: status.as_u16(),
            message: message.unwrap_or_else(|| fallback.message.to_string()),
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Okto request failed: {}", e);
                return Err(rejected(fallback.status, None));
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            error!("Okto error: status={}, body={}", status, body);
            let message = serde_json::from_str::<OktoErrorBody>(&body)
                .ok()
                .and_then(|b| b.message);
            return Err(rejected(status, message));
        }

        let value = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| {
                CheckoutError::Serialization(format!("Failed to parse Okto response: {}", e))
            })?
        };
        Ok((status, value))
    }

    /// Exchange a Google id token for Okto auth tokens
    #[instrument(skip(self, id_token))]
    pub async fn authenticate(&self, id_token: &str) -> CheckoutResult<Value> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| CheckoutError::Configuration("Missing API key".to_string()))?;

        let request = self
            .client
            .post(self.url("/api/v2/authenticate"))
            .header("x-api-key", api_key.expose_secret())
            .json(&json!({ "id_token": id_token }));

        let (_, body) = self
            .send(
                request,
                Fallback {
                    message: "Authentication failed",
                    status: StatusCode::BAD_REQUEST,
                },
            )
            .await?;

        info!("Okto authentication succeeded");
        Ok(body)
    }

    /// End the session behind `authorization`, returning Okto's status
    #[instrument(skip(self, authorization))]
    pub async fn logout(&self, authorization: &str) -> CheckoutResult<StatusCode> {
        let request = self
            .client
            .post(self.url("/api/v1/logout"))
            .header(reqwest::header::AUTHORIZATION, authorization)
            .json(&json!({}));

        let (status, _) = self
            .send(
                request,
                Fallback {
                    message: "Logout failed",
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                },
            )
            .await?;
        Ok(status)
    }

    #[instrument(skip(self, authorization))]
    pub async fn portfolio(&self, authorization: &str) -> CheckoutResult<Value> {
        let request = self
            .client
            .get(self.url("/api/v1/portfolio"))
            .header(reqwest::header::AUTHORIZATION, authorization);

        let (_, body) = self
            .send(
                request,
                Fallback {
                    message: "Failed to fetch portfolio information",
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                },
            )
            .await?;
        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct OktoErrorBody {
    #[serde(default)]
    message: Option<String>,
}
