use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::HashingCost;
use auth::PasswordHasher;
use auth::TokenCodec;
use auth::TokenCodecConfig;
use identity_service::domain::auth::errors::AuthError;
use identity_service::domain::auth::linker::IdentityLinker;
use identity_service::domain::auth::models::ExternalProfile;
use identity_service::domain::auth::models::ProviderConfig;
use identity_service::domain::auth::ports::OAuthProviderClient;
use identity_service::domain::auth::registry::RefreshTokenRegistry;
use identity_service::domain::auth::service::AuthService;
use identity_service::domain::user::models::CompanyId;
use identity_service::domain::user::models::EmailAddress;
use identity_service::domain::user::models::ExternalId;
use identity_service::domain::user::models::UserId;
use identity_service::inbound::http::router::create_router;
use identity_service::inbound::http::router::AppState;
use identity_service::inbound::http::router::OAuthState;
use identity_service::outbound::exchange_codes::InMemoryExchangeCodeStore;
use identity_service::outbound::repositories::InMemoryMembershipChecker;
use identity_service::outbound::repositories::InMemoryRefreshTokenStore;
use identity_service::outbound::repositories::InMemoryUserRepository;
use serde_json::json;
use serde_json::Value;

pub const FRONTEND_URL: &str = "http://frontend.test";
pub const PROVIDER_AUTH_URL: &str = "https://provider.test/auth";

/// Identity provider stand-in: each authorization code maps to a profile.
pub struct FakeOAuthProvider {
    profiles: HashMap<String, ExternalProfile>,
}

impl FakeOAuthProvider {
    fn new() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(
            "code-ada".to_string(),
            ExternalProfile {
                external_id: ExternalId::new("google-ada".to_string()).unwrap(),
                email: EmailAddress::new("ada@example.com".to_string()).unwrap(),
                display_name: "Ada Lovelace".to_string(),
                picture_url: Some("https://img.test/ada.png".to_string()),
            },
        );
        profiles.insert(
            "code-ada-other".to_string(),
            ExternalProfile {
                external_id: ExternalId::new("google-impostor".to_string()).unwrap(),
                email: EmailAddress::new("ada@example.com".to_string()).unwrap(),
                display_name: "Not Ada".to_string(),
                picture_url: None,
            },
        );
        Self { profiles }
    }
}

#[async_trait]
impl OAuthProviderClient for FakeOAuthProvider {
    fn authorization_url(&self, state: &str) -> String {
        format!("{}?state={}", PROVIDER_AUTH_URL, urlencoding::encode(state))
    }

    async fn fetch_profile(&self, code: &str) -> Result<ExternalProfile, AuthError> {
        self.profiles
            .get(code)
            .cloned()
            .ok_or(AuthError::Unauthorized)
    }
}

/// Test application that spawns a real server on the in-memory backend
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub membership: Arc<InMemoryMembershipChecker>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let users = Arc::new(InMemoryUserRepository::new());
        let codec = Arc::new(
            TokenCodec::new(TokenCodecConfig::new(
                b"test-access-secret-at-least-32-bytes-long".to_vec(),
                b"test-refresh-secret-at-least-32-bytes-long".to_vec(),
            ))
            .expect("Failed to create token codec"),
        );
        let hasher = PasswordHasher::with_cost(HashingCost {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .expect("Failed to create password hasher");
        let provider = ProviderConfig {
            name: "google".to_string(),
            client_id: "test-client".to_string(),
            client_secret: "test-secret".to_string(),
            callback_url: format!("{}/api/auth/google/callback", address),
        };

        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&users),
            RefreshTokenRegistry::new(Arc::new(InMemoryRefreshTokenStore::new()), None),
            IdentityLinker::new(provider, Arc::clone(&users)),
            codec,
            hasher,
        ));
        let membership = Arc::new(InMemoryMembershipChecker::new());

        let state = AppState {
            auth_service,
            membership: membership.clone(),
            exchange_codes: Arc::new(InMemoryExchangeCodeStore::new(Duration::from_secs(60))),
            oauth: Some(OAuthState {
                client: Arc::new(FakeOAuthProvider::new()),
                state_secret: b"test-state-secret-at-least-32-bytes-long".to_vec(),
                frontend_url: FRONTEND_URL.to_string(),
                secure_cookies: false,
            }),
        };

        let router = create_router(state);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("Failed to create reqwest client"),
            membership,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Register an account and return the response body
    pub async fn register(&self, email: &str, password: &str) -> Value {
        let response = self
            .post("/api/auth/register")
            .json(&json!({
                "name": "Ada",
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.expect("Failed to parse response")
    }

    /// Log in and return the response body
    pub async fn login(&self, email: &str, password: &str) -> Value {
        let response = self
            .post("/api/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Failed to parse response")
    }

    pub async fn add_member(&self, user_id: &str, company_id: &str) {
        self.membership
            .add_member(
                UserId::from_string(user_id).unwrap(),
                CompanyId::from_string(company_id).unwrap(),
            )
            .await;
    }

    /// Start the OAuth flow and return the signed state from the provider redirect
    pub async fn oauth_state(&self) -> String {
        let response = self
            .get("/api/auth/google")
            .send()
            .await
            .expect("Failed to execute request");
        assert!(response.status().is_redirection());

        let location = location(&response);
        let encoded = location
            .strip_prefix(&format!("{}?state=", PROVIDER_AUTH_URL))
            .expect("Unexpected provider URL");
        let state = urlencoding::decode(encoded).unwrap().into_owned();

        let cookie = response
            .headers()
            .get(reqwest::header::SET_COOKIE)
            .expect("Missing state cookie")
            .to_str()
            .unwrap();
        assert!(cookie.starts_with(&format!("oauth_state={}", state)));
        assert!(cookie.contains("HttpOnly"));

        state
    }

    /// Hit the OAuth callback from the browser holding `cookie_state`
    pub async fn oauth_callback(
        &self,
        code: &str,
        state: &str,
        cookie_state: Option<&str>,
    ) -> reqwest::Response {
        let mut request = self
            .get("/api/auth/google/callback")
            .query(&[("code", code), ("state", state)]);
        if let Some(cookie_state) = cookie_state {
            request = request.header(
                reqwest::header::COOKIE,
                format!("oauth_state={}", cookie_state),
            );
        }
        request.send().await.expect("Failed to execute request")
    }
}

pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .expect("Missing Location header")
        .to_str()
        .unwrap()
        .to_string()
}
