use std::time::Duration;
use std::{env, fs};

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::auth::fetch::FetchToken;
use crate::config::service::{AuthConfig, GenericSourceValue};
use crate::utils::constants::GRANT_TYPE_CLIENT_CREDENTIALS;

/// OAuth2 client-credentials token source.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub token_url: String,
    pub client_id: String,
    client_secret: String,
    pub scope: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

impl ClientCredentials {
    /// Resolve secrets once at startup; a missing env var or file is a config error.
    pub fn from_config(cfg: &AuthConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .context("failed to build OAuth2 HTTP client")?;

        Ok(Self {
            token_url: cfg.token_url.to_owned(),
            client_id: resolve_source_value(&cfg.client_id).context("auth.client_id")?,
            client_secret: resolve_source_value(&cfg.client_secret).context("auth.client_secret")?,
            scope: cfg.scope.to_owned(),
            client,
        })
    }

    fn form(&self) -> [(&'static str, &str); 4] {
        [
            ("client_id", self.client_id.as_str()),
            ("grant_type", GRANT_TYPE_CLIENT_CREDENTIALS),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ]
    }
}

impl FetchToken for ClientCredentials {
    async fn fetch_token(&self) -> Result<String> {
        debug!("requesting client-credentials token from {}", self.token_url);
        let response = self
            .client
            .post(&self.token_url)
            .form(&self.form())
            .send()
            .await
            .with_context(|| format!("token request to {} failed", self.token_url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("OAuth2 token request failed: {}", status));
        }

        let body: TokenResponse = response
            .json()
            .await
            .context("OAuth2 token response is not valid JSON")?;

        body.access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| anyhow!("OAuth2 token response has no access_token"))
    }
}

pub fn resolve_source_value(value: &GenericSourceValue) -> Result<String> {
    match value {
        GenericSourceValue::Plain(value) => Ok(value.to_owned()),
        GenericSourceValue::Literal { value } => Ok(value.to_owned()),
        GenericSourceValue::FromEnv { from_env } => {
            env::var(from_env).map_err(|err| anyhow!("env var '{}': {}", from_env, err))
        }
        GenericSourceValue::FromFile { path } => fs::read_to_string(path)
            .map_err(|err| anyhow!("file '{}': {}", path, err))
            .map(|res| res.trim().to_string()),
    }
}
