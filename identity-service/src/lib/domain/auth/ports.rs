use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::AuthSession;
use crate::domain::auth::models::ChangePasswordCommand;
use crate::domain::auth::models::ExternalProfile;
use crate::domain::auth::models::LoginCommand;
use crate::domain::auth::models::RefreshTokenRecord;
use crate::domain::auth::models::RegisterCommand;
use crate::domain::auth::models::TokenPair;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;

/// Port for authentication service operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a password account and open a first session.
    ///
    /// # Errors
    /// * `UserAlreadyExists` - Email is already registered
    /// * `Unavailable` - Storage or hashing failed
    async fn register(&self, command: RegisterCommand) -> Result<AuthSession, AuthError>;

    /// Authenticate by email and password.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email, wrong password, no password set
    ///   or inactive account; the caller cannot tell which
    async fn login(&self, command: LoginCommand) -> Result<AuthSession, AuthError>;

    /// Exchange a refresh token for a brand-new pair; the old token is consumed.
    ///
    /// # Errors
    /// * `TokenInvalid` / `TokenExpired` / `WrongTokenKind` - Verification failed
    /// * `TokenReplayed` - Token was already rotated out or revoked
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Revoke a single refresh token. Succeeds when it is already gone.
    async fn logout(&self, user_id: &UserId, refresh_token: &str) -> Result<(), AuthError>;

    /// Revoke every refresh token of the user.
    async fn logout_all(&self, user_id: &UserId) -> Result<(), AuthError>;

    /// Sanitized profile of the user.
    ///
    /// # Errors
    /// * `UserNotFound` - User does not exist
    async fn get_profile(&self, user_id: &UserId) -> Result<UserProfile, AuthError>;

    /// Change the password, revoke every session and open a new one.
    ///
    /// # Errors
    /// * `UserNotFound` - User does not exist
    /// * `InvalidCredentials` - Current password missing or wrong
    async fn change_password(
        &self,
        user_id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<TokenPair, AuthError>;

    /// Sign in with a provider-verified profile, linking or creating the account.
    ///
    /// # Errors
    /// * `IdentityConflict` - Email belongs to an account linked to another identity
    /// * `InvalidCredentials` - Account is inactive
    async fn resolve_external_identity(
        &self,
        profile: ExternalProfile,
    ) -> Result<AuthSession, AuthError>;

    /// Verify an access token and return its subject.
    ///
    /// # Errors
    /// * `TokenInvalid` / `TokenExpired` / `WrongTokenKind` - Verification failed
    async fn verify_access_token(&self, access_token: &str) -> Result<UserId, AuthError>;
}

/// Per-user set of outstanding refresh-token digests.
///
/// Each method must be one atomic operation on the backing store.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync + 'static {
    /// Add a digest to the user's set; adding an existing digest is a no-op.
    async fn insert(&self, user_id: &UserId, record: RefreshTokenRecord) -> Result<(), AuthError>;

    /// Delete the digest if present.
    ///
    /// # Returns
    /// Whether this call removed it. Of two concurrent calls for the same
    /// digest exactly one observes `true`.
    async fn remove(&self, user_id: &UserId, token_hash: &str) -> Result<bool, AuthError>;

    /// Delete the user's whole set, returning how many entries were removed.
    async fn remove_all(&self, user_id: &UserId) -> Result<u64, AuthError>;

    async fn contains(&self, user_id: &UserId, token_hash: &str) -> Result<bool, AuthError>;

    /// Delete entries whose expiry is strictly before `now`.
    ///
    /// A token is still accepted during its `exp` second, so it stays listed too.
    async fn prune_expired(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<u64, AuthError>;

    /// Keep only the `keep` newest entries, deleting the rest.
    async fn evict_oldest_beyond(&self, user_id: &UserId, keep: usize) -> Result<u64, AuthError>;
}

/// External identity provider client (authorization-code flow).
#[async_trait]
pub trait OAuthProviderClient: Send + Sync + 'static {
    /// URL of the provider consent screen carrying `state`.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange an authorization code for the verified profile of the user.
    ///
    /// # Errors
    /// * `Unauthorized` - Code rejected or email not verified by the provider
    /// * `Unavailable` - Provider unreachable or returned garbage
    async fn fetch_profile(&self, code: &str) -> Result<ExternalProfile, AuthError>;
}

/// Short-lived, single-use codes handed to the browser instead of tokens.
#[async_trait]
pub trait ExchangeCodeStore: Send + Sync + 'static {
    /// Park a token pair and return the code that redeems it.
    async fn issue(&self, tokens: TokenPair) -> Result<String, AuthError>;

    /// Take the pair parked under `code`; None when unknown, used or expired.
    async fn redeem(&self, code: &str) -> Result<Option<TokenPair>, AuthError>;
}
