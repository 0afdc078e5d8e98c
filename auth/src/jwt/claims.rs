use std::fmt;

use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Which verifier a token belongs to.
///
/// Access and refresh tokens are signed with independent secrets; the kind is
/// also carried in the payload so it can be checked after signature
/// verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }

    /// The kind signed with the other secret.
    pub fn other(&self) -> TokenKind {
        match self {
            TokenKind::Access => TokenKind::Refresh,
            TokenKind::Refresh => TokenKind::Access,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of an access or refresh token.
///
/// `sub`, `kind` and `exp` are the contract with other services. `iat` and
/// `jti` make every issued token a distinct string, even when two tokens are
/// minted for the same user within one second.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject (user identifier)
    pub sub: String,

    /// Token kind (access or refresh)
    pub kind: TokenKind,

    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,

    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,

    /// Unique token identifier
    pub jti: String,
}

impl TokenClaims {
    /// Create claims for a user that expire `ttl` from now.
    ///
    /// # Arguments
    /// * `user_id` - Unique user identifier
    /// * `kind` - Access or refresh
    /// * `ttl` - Lifetime of the token
    pub fn for_user(user_id: impl ToString, kind: TokenKind, ttl: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + ttl;

        Self {
            sub: user_id.to_string(),
            kind,
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Expiration in milliseconds since the Unix epoch.
    pub fn expires_at_millis(&self) -> i64 {
        self.exp * 1000
    }

    /// Check if token is expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_user() {
        let claims = TokenClaims::for_user("user123", TokenKind::Refresh, Duration::days(7));

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_jti_is_unique() {
        let first = TokenClaims::for_user("user123", TokenKind::Access, Duration::minutes(15));
        let second = TokenClaims::for_user("user123", TokenKind::Access, Duration::minutes(15));

        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let claims = TokenClaims::for_user("u", TokenKind::Access, Duration::minutes(1));
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["kind"], "access");
        assert_eq!(json["sub"], "u");
    }

    #[test]
    fn test_is_expired() {
        let mut claims = TokenClaims::for_user("u", TokenKind::Access, Duration::minutes(1));
        claims.exp = 1000;

        assert!(!claims.is_expired(999));
        assert!(!claims.is_expired(1000));
        assert!(claims.is_expired(1001));
    }

    #[test]
    fn test_expires_at_millis() {
        let mut claims = TokenClaims::for_user("u", TokenKind::Access, Duration::minutes(1));
        claims.exp = 1_700_000_000;

        assert_eq!(claims.expires_at_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_other_kind() {
        assert_eq!(TokenKind::Access.other(), TokenKind::Refresh);
        assert_eq!(TokenKind::Refresh.other(), TokenKind::Access);
    }
}
