use std::env;

use auth::HashingCost;
use auth::TokenCodecConfig;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::auth::models::ProviderConfig;

const MIN_SECRET_LENGTH: usize = 32;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password: PasswordConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub oauth: OAuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    pub grpc_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    #[serde(default = "default_access_ttl_minutes")]
    pub access_ttl_minutes: i64,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_ttl_days: i64,
}

/// Argon2 cost parameters.
#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SessionsConfig {
    /// Oldest refresh tokens are evicted beyond this many per user
    pub max_per_user: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OAuthConfig {
    pub enabled: bool,
    pub provider: String,
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    pub frontend_url: String,
    pub state_secret: String,
    pub exchange_code_ttl_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

fn default_max_connections() -> u32 {
    5
}

fn default_access_ttl_minutes() -> i64 {
    15
}

fn default_refresh_ttl_days() -> i64 {
    7
}

impl Default for PasswordConfig {
    fn default() -> Self {
        let cost = HashingCost::default();
        Self {
            memory_kib: cost.memory_kib,
            iterations: cost.iterations,
            parallelism: cost.parallelism,
        }
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "google".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: String::new(),
            frontend_url: "http://localhost:5173".to_string(),
            state_secret: String::new(),
            exchange_code_ttl_seconds: 60,
        }
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__ACCESS_SECRET, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__ACCESS_SECRET=... overrides jwt.access_secret
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject settings the service must not start with.
    ///
    /// # Errors
    /// * `ConfigError::Message` - Token lifetimes out of order, weak or shared
    ///   secrets, or incomplete OAuth settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.access_ttl_minutes <= 0
            || self.jwt.access_ttl_minutes >= self.jwt.refresh_ttl_days * 24 * 60
        {
            return Err(ConfigError::Message(
                "jwt.access_ttl_minutes must be positive and shorter than jwt.refresh_ttl_days"
                    .to_string(),
            ));
        }

        for (key, secret) in [
            ("jwt.access_secret", &self.jwt.access_secret),
            ("jwt.refresh_secret", &self.jwt.refresh_secret),
        ] {
            if secret.len() < MIN_SECRET_LENGTH {
                return Err(ConfigError::Message(format!(
                    "{} must be at least {} bytes",
                    key, MIN_SECRET_LENGTH
                )));
            }
        }

        if self.jwt.access_secret == self.jwt.refresh_secret {
            return Err(ConfigError::Message(
                "jwt.access_secret and jwt.refresh_secret must differ".to_string(),
            ));
        }

        if self.sessions.max_per_user == Some(0) {
            return Err(ConfigError::Message(
                "sessions.max_per_user must be at least 1".to_string(),
            ));
        }

        if self.oauth.enabled {
            if self.oauth.client_id.is_empty()
                || self.oauth.client_secret.is_empty()
                || self.oauth.callback_url.is_empty()
            {
                return Err(ConfigError::Message(
                    "oauth.client_id, oauth.client_secret and oauth.callback_url are required"
                        .to_string(),
                ));
            }
            if self.oauth.state_secret.len() < MIN_SECRET_LENGTH {
                return Err(ConfigError::Message(format!(
                    "oauth.state_secret must be at least {} bytes",
                    MIN_SECRET_LENGTH
                )));
            }
        }

        Ok(())
    }

    pub fn token_codec_config(&self) -> TokenCodecConfig {
        TokenCodecConfig::new(
            self.jwt.access_secret.as_bytes().to_vec(),
            self.jwt.refresh_secret.as_bytes().to_vec(),
        )
        .with_access_ttl(chrono::Duration::minutes(self.jwt.access_ttl_minutes))
        .with_refresh_ttl(chrono::Duration::days(self.jwt.refresh_ttl_days))
    }

    pub fn hashing_cost(&self) -> HashingCost {
        HashingCost {
            memory_kib: self.password.memory_kib,
            iterations: self.password.iterations,
            parallelism: self.password.parallelism,
        }
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            name: self.oauth.provider.clone(),
            client_id: self.oauth.client_id.clone(),
            client_secret: self.oauth.client_secret.clone(),
            callback_url: self.oauth.callback_url.clone(),
        }
    }
}
