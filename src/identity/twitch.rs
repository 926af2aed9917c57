//! OAuth against the Twitch identity service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{IdentityProvider, PlatformIdentity};
use crate::error::AppError;

/// Default identity service base URL.
pub const TWITCH_AUTH_BASE: &str = "https://id.twitch.tv";

/// OAuth application credentials.
#[derive(Debug, Clone, Default)]
pub struct TwitchCredentials {
    /// Application client ID.
    pub client_id: String,
    /// Application client secret.
    pub client_secret: String,
    /// Redirect URI registered with the application.
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    user_id: String,
    login: String,
}

/// Twitch OAuth client.
#[derive(Debug, Clone)]
pub struct TwitchClient {
    http_client: reqwest::Client,
    auth_base: String,
    credentials: TwitchCredentials,
}

impl TwitchClient {
    /// Creates a client for the given application.
    #[must_use]
    pub fn new(credentials: TwitchCredentials, timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            auth_base: TWITCH_AUTH_BASE.to_string(),
            credentials,
        }
    }

    /// Points the client at a different identity service base URL.
    #[must_use]
    pub fn with_auth_base(mut self, auth_base: impl Into<String>) -> Self {
        self.auth_base = auth_base.into();
        self
    }

    async fn exchange_code(&self, code: &str) -> Result<Option<String>, AppError> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.credentials.redirect_uri.as_str()),
        ];
        let response = self
            .http_client
            .post(format!("{}/oauth2/token", self.auth_base))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "access token request rejected");
            return Ok(None);
        }
        let token: TokenResponse = response.json().await?;
        Ok(Some(token.access_token))
    }

    async fn validate(&self, access_token: &str) -> Result<Option<PlatformIdentity>, AppError> {
        let response = self
            .http_client
            .get(format!("{}/oauth2/validate", self.auth_base))
            .header(reqwest::header::AUTHORIZATION, format!("OAuth {access_token}"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "access token validation rejected");
            return Ok(None);
        }
        let validated: ValidateResponse = response.json().await?;
        Ok(Some(PlatformIdentity {
            user_id: validated.user_id,
            login: validated.login,
        }))
    }
}

#[async_trait]
impl IdentityProvider for TwitchClient {
    async fn resolve(&self, code: &str) -> Result<Option<PlatformIdentity>, AppError> {
        let Some(access_token) = self.exchange_code(code).await? else {
            return Ok(None);
        };
        self.validate(&access_token).await
    }
}
