use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::ExternalProfile;
use crate::domain::auth::models::ProviderConfig;
use crate::domain::auth::ports::OAuthProviderClient;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::ExternalId;

const AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: String,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
    picture: Option<String>,
}

/// Google sign-in through the OpenID Connect authorization-code flow.
pub struct GoogleOAuthClient {
    provider: ProviderConfig,
    http_client: Client,
    token_endpoint: String,
    userinfo_endpoint: String,
}

impl GoogleOAuthClient {
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            http_client: Client::new(),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
            userinfo_endpoint: USERINFO_ENDPOINT.to_string(),
        }
    }

    /// Point the client at other token and userinfo endpoints.
    pub fn with_endpoints(mut self, token_endpoint: String, userinfo_endpoint: String) -> Self {
        self.token_endpoint = token_endpoint;
        self.userinfo_endpoint = userinfo_endpoint;
        self
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        let response = self
            .http_client
            .post(&self.token_endpoint)
            .form(&[
                ("client_id", self.provider.client_id.as_str()),
                ("client_secret", self.provider.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.provider.callback_url.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Google token request failed: {}", e);
                AuthError::Unavailable(format!("Token exchange failed: {}", e))
            })?;

        if response.status().is_client_error() {
            tracing::warn!(status = %response.status(), "Google rejected authorization code");
            return Err(AuthError::Unauthorized);
        }
        if !response.status().is_success() {
            tracing::error!(status = %response.status(), "Google token endpoint error");
            return Err(AuthError::Unavailable(format!(
                "Token endpoint returned {}",
                response.status()
            )));
        }

        let token = response.json::<GoogleTokenResponse>().await.map_err(|e| {
            AuthError::Unavailable(format!("Malformed token response: {}", e))
        })?;

        Ok(token.access_token)
    }
}

#[async_trait]
impl OAuthProviderClient for GoogleOAuthClient {
    fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope=openid%20email%20profile&state={}",
            AUTHORIZATION_ENDPOINT,
            urlencoding::encode(&self.provider.client_id),
            urlencoding::encode(&self.provider.callback_url),
            urlencoding::encode(state)
        )
    }

    async fn fetch_profile(&self, code: &str) -> Result<ExternalProfile, AuthError> {
        let access_token = self.exchange_code(code).await?;

        let user_info = self
            .http_client
            .get(&self.userinfo_endpoint)
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Google userinfo request failed: {}", e);
                AuthError::Unavailable(format!("Userinfo fetch failed: {}", e))
            })?
            .error_for_status()
            .map_err(|e| AuthError::Unavailable(format!("Userinfo fetch failed: {}", e)))?
            .json::<GoogleUserInfo>()
            .await
            .map_err(|e| AuthError::Unavailable(format!("Malformed userinfo: {}", e)))?;

        if !user_info.email_verified {
            tracing::warn!("Google account email is not verified");
            return Err(AuthError::Unauthorized);
        }

        let email = EmailAddress::new(user_info.email)
            .map_err(|e| AuthError::Unavailable(format!("Malformed userinfo email: {}", e)))?;
        let external_id = ExternalId::new(user_info.sub)
            .map_err(|e| AuthError::Unavailable(format!("Malformed userinfo subject: {}", e)))?;
        let display_name = user_info.name.unwrap_or_default();

        Ok(ExternalProfile {
            external_id,
            email,
            display_name,
            picture_url: user_info.picture,
        })
    }
}
