use chrono::DateTime;
use chrono::Utc;

use crate::domain::user::models::DisplayName;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::ExternalId;
use crate::domain::user::models::Password;
use crate::domain::user::models::UserProfile;

/// Access and refresh token issued together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry, milliseconds since the Unix epoch
    pub expires_at: i64,
}

/// Result of a successful register, login or external sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

/// Stored form of one outstanding refresh token.
///
/// Only the SHA-256 digest of the token is kept, never the token itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Identity asserted by an external provider after it has verified the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProfile {
    pub external_id: ExternalId,
    pub email: EmailAddress,
    pub display_name: String,
    pub picture_url: Option<String>,
}

/// Configuration of the external identity provider accounts are linked with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

/// Command to register a password account with validated fields
#[derive(Debug)]
pub struct RegisterCommand {
    pub name: DisplayName,
    pub email: EmailAddress,
    pub password: Password,
}

impl RegisterCommand {
    pub fn new(name: DisplayName, email: EmailAddress, password: Password) -> Self {
        Self {
            name,
            email,
            password,
        }
    }
}

/// Command to log in with email and password.
///
/// The email is kept raw: a malformed address must fail exactly like an
/// unknown one.
#[derive(Debug)]
pub struct LoginCommand {
    pub email: String,
    pub password: Password,
}

/// Command to change (or, for external-only accounts, set) a password.
#[derive(Debug)]
pub struct ChangePasswordCommand {
    pub current_password: Option<Password>,
    pub new_password: Password,
}
