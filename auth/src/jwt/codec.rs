use chrono::Duration;

use super::claims::TokenClaims;
use super::claims::TokenKind;
use super::errors::JwtError;
use super::handler::JwtHandler;

const MIN_SECRET_LENGTH: usize = 32;

/// Settings for a [`TokenCodec`].
#[derive(Debug, Clone)]
pub struct TokenCodecConfig {
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenCodecConfig {
    /// Secrets with the default lifetimes (15 minutes / 7 days).
    pub fn new(access_secret: impl Into<Vec<u8>>, refresh_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
        }
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }
}

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

/// Signs and verifies access and refresh tokens.
///
/// Each kind has its own secret, so rotating the refresh secret leaves access
/// tokens valid and vice versa. Verification is pure: no I/O, no shared state.
pub struct TokenCodec {
    access: JwtHandler,
    refresh: JwtHandler,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    /// Build a codec from its configuration.
    ///
    /// # Errors
    /// * `InvalidTtl` - Access lifetime is not positive or not shorter than refresh lifetime
    /// * `WeakSecret` - A secret is shorter than 32 bytes, or both secrets are equal
    pub fn new(config: TokenCodecConfig) -> Result<Self, JwtError> {
        if config.access_ttl <= Duration::zero() || config.access_ttl >= config.refresh_ttl {
            return Err(JwtError::InvalidTtl);
        }

        for (kind, secret) in [
            (TokenKind::Access, &config.access_secret),
            (TokenKind::Refresh, &config.refresh_secret),
        ] {
            if secret.len() < MIN_SECRET_LENGTH {
                return Err(JwtError::WeakSecret(format!(
                    "{} secret must be at least {} bytes",
                    kind, MIN_SECRET_LENGTH
                )));
            }
        }

        if config.access_secret == config.refresh_secret {
            return Err(JwtError::WeakSecret(
                "access and refresh secrets must differ".to_string(),
            ));
        }

        Ok(Self {
            access: JwtHandler::new(&config.access_secret),
            refresh: JwtHandler::new(&config.refresh_secret),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        })
    }

    /// Configured lifetime for a token kind.
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Issue a token of `kind` for `user_id` with the configured lifetime.
    pub fn issue(&self, user_id: impl ToString, kind: TokenKind) -> Result<IssuedToken, JwtError> {
        self.issue_with_ttl(user_id, kind, self.ttl(kind))
    }

    /// Issue a token with an explicit lifetime.
    ///
    /// # Errors
    /// * `EncodingFailed` - Signing failed
    pub fn issue_with_ttl(
        &self,
        user_id: impl ToString,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<IssuedToken, JwtError> {
        let claims = TokenClaims::for_user(user_id, kind, ttl);
        let token = self.handler(kind).encode(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    /// Verify a token that must be of `expected` kind.
    ///
    /// # Errors
    /// * `TokenExpired` - Signature is valid but `exp` has passed
    /// * `WrongTokenKind` - The token is a genuine token of the other kind
    /// * `TokenInvalid` - Anything else: bad signature, malformed token or payload
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<TokenClaims, JwtError> {
        match self.handler(expected).decode::<TokenClaims>(token) {
            Ok(claims) if claims.kind != expected => Err(JwtError::WrongTokenKind {
                expected,
                actual: claims.kind,
            }),
            Ok(claims) => Ok(claims),
            Err(JwtError::TokenInvalid(reason)) => {
                // A token signed with the other secret is a kind mix-up, not a forgery.
                match self.handler(expected.other()).decode::<TokenClaims>(token) {
                    Ok(_) | Err(JwtError::TokenExpired) => Err(JwtError::WrongTokenKind {
                        expected,
                        actual: expected.other(),
                    }),
                    Err(_) => Err(JwtError::TokenInvalid(reason)),
                }
            }
            Err(e) => Err(e),
        }
    }

    fn handler(&self, kind: TokenKind) -> &JwtHandler {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }
}
