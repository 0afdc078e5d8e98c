use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use auth::TokenCodec;
use auth::TokenKind;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::OnceCell;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::linker::IdentityLinker;
use crate::domain::auth::models::AuthSession;
use crate::domain::auth::models::ChangePasswordCommand;
use crate::domain::auth::models::ExternalProfile;
use crate::domain::auth::models::LoginCommand;
use crate::domain::auth::models::RegisterCommand;
use crate::domain::auth::models::TokenPair;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::auth::ports::RefreshTokenStore;
use crate::domain::auth::registry::RefreshTokenRegistry;
use crate::domain::user::models::Credentials;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;
use crate::domain::user::ports::UserRepository;

/// Hashed once per process and verified against when a login names an
/// account without a usable password.
const DUMMY_PASSWORD: &str = "identity-service-timing-equalizer";

/// Domain service implementation for authentication operations.
///
/// Concrete implementation of AuthServicePort with dependency injection.
pub struct AuthService<UR, RS>
where
    UR: UserRepository,
    RS: RefreshTokenStore,
{
    users: Arc<UR>,
    registry: RefreshTokenRegistry<RS>,
    linker: IdentityLinker<UR>,
    codec: Arc<TokenCodec>,
    hasher: PasswordHasher,
    dummy_hash: OnceCell<String>,
}

impl<UR, RS> AuthService<UR, RS>
where
    UR: UserRepository,
    RS: RefreshTokenStore,
{
    /// Create a new authentication service with injected dependencies.
    ///
    /// # Arguments
    /// * `users` - User persistence implementation
    /// * `registry` - Outstanding refresh tokens
    /// * `linker` - External identity resolution, sharing `users`
    /// * `codec` - Token signing and verification
    /// * `hasher` - Password hashing
    pub fn new(
        users: Arc<UR>,
        registry: RefreshTokenRegistry<RS>,
        linker: IdentityLinker<UR>,
        codec: Arc<TokenCodec>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            users,
            registry,
            linker,
            codec,
            hasher,
            dummy_hash: OnceCell::new(),
        }
    }

    async fn hash_password(&self, plaintext: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let plaintext = plaintext.to_string();

        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AuthError::Unavailable(format!("Hashing task failed: {}", e)))?
            .map_err(|e| {
                tracing::error!("Password hashing failed: {}", e);
                AuthError::from(e)
            })
    }

    async fn verify_password(&self, plaintext: &str, digest: &str) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let plaintext = plaintext.to_string();
        let digest = digest.to_string();

        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &digest))
            .await
            .map_err(|e| AuthError::Unavailable(format!("Hashing task failed: {}", e)))?
            .map_err(|e| {
                tracing::error!("Password verification failed: {}", e);
                AuthError::from(e)
            })
    }

    /// Burn the same CPU a real verification would, then fail.
    async fn reject_login(&self, plaintext: &str) -> AuthError {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD))
            .await;

        if let Ok(dummy) = dummy {
            let _ = self.verify_password(plaintext, dummy).await;
        }

        AuthError::InvalidCredentials
    }

    /// Sign a new access/refresh pair and register the refresh half.
    async fn issue_pair(&self, user_id: &UserId) -> Result<TokenPair, AuthError> {
        let access = self.codec.issue(user_id, TokenKind::Access)?;
        let refresh = self.codec.issue(user_id, TokenKind::Refresh)?;

        let refresh_expires_at = DateTime::<Utc>::from_timestamp(refresh.claims.exp, 0)
            .ok_or_else(|| AuthError::Unavailable("Refresh expiry out of range".to_string()))?;

        self.registry
            .add(user_id, &refresh.token, refresh_expires_at)
            .await?;

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            expires_at: access.claims.expires_at_millis(),
        })
    }

    async fn require_user(&self, user_id: &UserId) -> Result<User, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

#[async_trait]
impl<UR, RS> AuthServicePort for AuthService<UR, RS>
where
    UR: UserRepository,
    RS: RefreshTokenStore,
{
    async fn register(&self, command: RegisterCommand) -> Result<AuthSession, AuthError> {
        if self.users.find_by_email(&command.email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = self.hash_password(command.password.expose()).await?;
        let user = User::new(
            command.name,
            command.email,
            Credentials::Password { password_hash },
            None,
        );

        // The unique index still catches a concurrent registration of the same email
        let user = self.users.create(user).await?;
        let tokens = self.issue_pair(&user.id).await?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(AuthSession {
            user: user.profile(),
            tokens,
        })
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthSession, AuthError> {
        let password = command.password.expose();

        let Ok(email) = EmailAddress::new(command.email) else {
            return Err(self.reject_login(password).await);
        };

        let Some(user) = self.users.find_by_email(&email).await? else {
            tracing::debug!("Login for unknown email");
            return Err(self.reject_login(password).await);
        };

        let Some(digest) = user.password_hash() else {
            tracing::debug!(user_id = %user.id, "Password login on external-only account");
            return Err(self.reject_login(password).await);
        };

        if !self.verify_password(password, digest).await? {
            tracing::warn!(user_id = %user.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "Login on inactive account");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_pair(&user.id).await?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(AuthSession {
            user: user.profile(),
            tokens,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .codec
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|e| {
                tracing::warn!("Refresh token rejected: {}", e);
                AuthError::from(e)
            })?;

        let user_id = UserId::from_string(&claims.sub).map_err(|_| AuthError::TokenInvalid)?;

        if !self.registry.remove(&user_id, refresh_token).await? {
            tracing::warn!(user_id = %user_id, "Refresh token replayed or revoked");
            return Err(AuthError::TokenReplayed);
        }

        match self.users.find_by_id(&user_id).await? {
            Some(user) if user.is_active => {}
            _ => return Err(AuthError::TokenInvalid),
        }

        let tokens = self.issue_pair(&user_id).await?;

        tracing::info!(user_id = %user_id, "Refresh token rotated");

        Ok(tokens)
    }

    async fn logout(&self, user_id: &UserId, refresh_token: &str) -> Result<(), AuthError> {
        let removed = self.registry.remove(user_id, refresh_token).await?;

        tracing::info!(user_id = %user_id, removed, "User logged out");

        Ok(())
    }

    async fn logout_all(&self, user_id: &UserId) -> Result<(), AuthError> {
        let removed = self.registry.remove_all(user_id).await?;

        tracing::info!(user_id = %user_id, removed, "User logged out of all sessions");

        Ok(())
    }

    async fn get_profile(&self, user_id: &UserId) -> Result<UserProfile, AuthError> {
        Ok(self.require_user(user_id).await?.profile())
    }

    async fn change_password(
        &self,
        user_id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<TokenPair, AuthError> {
        let user = self.require_user(user_id).await?;

        // External-only accounts may set a first password without one
        if let Some(digest) = user.password_hash() {
            let current = command
                .current_password
                .as_ref()
                .ok_or(AuthError::InvalidCredentials)?;

            if !self.verify_password(current.expose(), digest).await? {
                tracing::warn!(user_id = %user.id, "Password change with wrong current password");
                return Err(AuthError::InvalidCredentials);
            }
        }

        let password_hash = self.hash_password(command.new_password.expose()).await?;
        self.users
            .update_password_hash(&user.id, &password_hash)
            .await?;

        self.registry.remove_all(&user.id).await?;
        let tokens = self.issue_pair(&user.id).await?;

        tracing::info!(user_id = %user.id, "Password changed, sessions revoked");

        Ok(tokens)
    }

    async fn resolve_external_identity(
        &self,
        profile: ExternalProfile,
    ) -> Result<AuthSession, AuthError> {
        let user = self.linker.resolve(profile).await?;

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "External sign-in on inactive account");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_pair(&user.id).await?;

        tracing::info!(
            user_id = %user.id,
            provider = %self.linker.provider().name,
            "User signed in with external identity"
        );

        Ok(AuthSession {
            user: user.profile(),
            tokens,
        })
    }

    async fn verify_access_token(&self, access_token: &str) -> Result<UserId, AuthError> {
        let claims = self
            .codec
            .verify(access_token, TokenKind::Access)
            .map_err(|e| {
                tracing::debug!("Access token rejected: {}", e);
                AuthError::from(e)
            })?;

        UserId::from_string(&claims.sub).map_err(|_| AuthError::TokenInvalid)
    }
}

#[cfg(test)]
mod tests {
    use auth::HashingCost;
    use auth::TokenCodecConfig;
    use chrono::Duration;
    use mockall::mock;

    use super::*;
    use crate::domain::auth::models::ProviderConfig;
    use crate::domain::user::models::DisplayName;
    use crate::domain::user::models::ExternalId;
    use crate::domain::user::models::Password;
    use crate::domain::user::models::ProfileFields;
    use crate::outbound::repositories::memory::InMemoryRefreshTokenStore;
    use crate::outbound::repositories::memory::InMemoryUserRepository;

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: User) -> Result<User, AuthError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError>;
            async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, AuthError>;
            async fn find_by_external_id(&self, external_id: &ExternalId) -> Result<Option<User>, AuthError>;
            async fn link_external_identity(&self, id: &UserId, external_id: &ExternalId) -> Result<Option<User>, AuthError>;
            async fn update_password_hash(&self, id: &UserId, password_hash: &str) -> Result<User, AuthError>;
            async fn update_profile_fields(&self, id: &UserId, fields: ProfileFields) -> Result<User, AuthError>;
        }
    }

    type MemoryService = AuthService<InMemoryUserRepository, InMemoryRefreshTokenStore>;

    fn codec() -> Arc<TokenCodec> {
        Arc::new(
            TokenCodec::new(TokenCodecConfig::new(
                b"access_secret_key_at_least_32_bytes!".to_vec(),
                b"refresh_secret_key_at_least_32_bytes".to_vec(),
            ))
            .unwrap(),
        )
    }

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::with_cost(HashingCost {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    fn provider() -> ProviderConfig {
        ProviderConfig {
            name: "google".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            callback_url: "http://localhost/api/auth/google/callback".to_string(),
        }
    }

    fn service_with<UR: UserRepository>(users: Arc<UR>) -> AuthService<UR, InMemoryRefreshTokenStore> {
        AuthService::new(
            users.clone(),
            RefreshTokenRegistry::new(Arc::new(InMemoryRefreshTokenStore::new()), None),
            IdentityLinker::new(provider(), users),
            codec(),
            fast_hasher(),
        )
    }

    fn service() -> MemoryService {
        service_with(Arc::new(InMemoryUserRepository::new()))
    }

    fn register_command(email: &str, password: &str) -> RegisterCommand {
        RegisterCommand::new(
            DisplayName::new("Ada".to_string()).unwrap(),
            EmailAddress::new(email.to_string()).unwrap(),
            Password::new(password.to_string()).unwrap(),
        )
    }

    fn login_command(email: &str, password: &str) -> LoginCommand {
        LoginCommand {
            email: email.to_string(),
            password: Password::for_verification(password.to_string()),
        }
    }

    fn google_profile(external_id: &str, email: &str) -> ExternalProfile {
        ExternalProfile {
            external_id: ExternalId::new(external_id.to_string()).unwrap(),
            email: EmailAddress::new(email.to_string()).unwrap(),
            display_name: "Ada Lovelace".to_string(),
            picture_url: None,
        }
    }

    #[tokio::test]
    async fn test_register_returns_session() {
        let service = service();

        let session = service
            .register(register_command("ada@example.com", "secret123"))
            .await
            .unwrap();

        assert_eq!(session.user.email, "ada@example.com");
        assert!(session.user.has_password);
        assert!(!session.user.has_external_identity);
        assert_ne!(session.tokens.access_token, session.tokens.refresh_token);
        assert!(session.tokens.expires_at > Utc::now().timestamp_millis());
        assert!(service
            .registry
            .contains(&session.user.id, &session.tokens.refresh_token)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_register_stores_digest_not_plaintext() {
        let users = Arc::new(InMemoryUserRepository::new());
        let service = service_with(users.clone());

        let session = service
            .register(register_command("ada@example.com", "secret123"))
            .await
            .unwrap();

        let stored = users.find_by_id(&session.user.id).await.unwrap().unwrap();
        let digest = stored.password_hash().unwrap();
        assert_ne!(digest, "secret123");
        assert!(fast_hasher().verify("secret123", digest).unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_register_is_rejected() {
        let service = service();
        let first = service
            .register(register_command("ada@example.com", "secret123"))
            .await
            .unwrap();

        let result = service
            .register(register_command("ADA@example.com", "other-pass"))
            .await;
        assert_eq!(result.unwrap_err(), AuthError::UserAlreadyExists);

        let login = service
            .login(login_command("ada@example.com", "secret123"))
            .await
            .unwrap();
        assert_eq!(login.user.id, first.user.id);
    }

    #[tokio::test]
    async fn test_register_race_maps_unique_violation() {
        let mut users = MockTestUserRepository::new();
        users.expect_find_by_email().times(1).returning(|_| Ok(None));
        users
            .expect_create()
            .times(1)
            .returning(|_| Err(AuthError::UserAlreadyExists));

        let service = service_with(Arc::new(users));
        let result = service
            .register(register_command("ada@example.com", "secret123"))
            .await;

        assert_eq!(result.unwrap_err(), AuthError::UserAlreadyExists);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service();
        service
            .register(register_command("a@x.com", "secret123"))
            .await
            .unwrap();

        let wrong_password = service.login(login_command("a@x.com", "wrong")).await;
        let unknown_email = service.login(login_command("nobody@x.com", "x")).await;
        let malformed_email = service.login(login_command("not-an-email", "x")).await;

        assert_eq!(wrong_password.unwrap_err(), AuthError::InvalidCredentials);
        assert_eq!(unknown_email.unwrap_err(), AuthError::InvalidCredentials);
        assert_eq!(malformed_email.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_login_on_external_only_account_fails() {
        let service = service();
        service
            .resolve_external_identity(google_profile("g-1", "ada@example.com"))
            .await
            .unwrap();

        let result = service
            .login(login_command("ada@example.com", "anything"))
            .await;

        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_login_on_inactive_account_fails() {
        let users = Arc::new(InMemoryUserRepository::new());
        let service = service_with(users.clone());
        let session = service
            .register(register_command("ada@example.com", "secret123"))
            .await
            .unwrap();
        users.set_active(&session.user.id, false).await;

        let result = service
            .login(login_command("ada@example.com", "secret123"))
            .await;

        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_login_is_case_insensitive_on_email() {
        let service = service();
        service
            .register(register_command("ada@example.com", "secret123"))
            .await
            .unwrap();

        assert!(service
            .login(login_command("Ada@Example.com", "secret123"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_token_kinds_are_not_interchangeable() {
        let service = service();
        let session = service
            .register(register_command("ada@example.com", "secret123"))
            .await
            .unwrap();

        assert_eq!(
            service
                .verify_access_token(&session.tokens.refresh_token)
                .await
                .unwrap_err(),
            AuthError::WrongTokenKind
        );
        assert_eq!(
            service
                .refresh(&session.tokens.access_token)
                .await
                .unwrap_err(),
            AuthError::WrongTokenKind
        );
        assert_eq!(
            service
                .verify_access_token(&session.tokens.access_token)
                .await
                .unwrap(),
            session.user.id
        );
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_rejects_replay() {
        let service = service();
        let session = service
            .register(register_command("ada@example.com", "secret123"))
            .await
            .unwrap();
        let old = session.tokens.refresh_token;

        let rotated = service.refresh(&old).await.unwrap();
        assert_ne!(rotated.refresh_token, old);
        assert_eq!(
            service
                .verify_access_token(&rotated.access_token)
                .await
                .unwrap(),
            session.user.id
        );

        assert_eq!(
            service.refresh(&old).await.unwrap_err(),
            AuthError::TokenReplayed
        );
        assert!(service.refresh(&rotated.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_refresh_token() {
        let service = service();
        let session = service
            .register(register_command("ada@example.com", "secret123"))
            .await
            .unwrap();

        let expired = service
            .codec
            .issue_with_ttl(session.user.id, TokenKind::Refresh, Duration::seconds(-10))
            .unwrap();

        assert_eq!(
            service.refresh(&expired.token).await.unwrap_err(),
            AuthError::TokenExpired
        );
    }

    #[tokio::test]
    async fn test_garbage_refresh_token_is_invalid() {
        let service = service();

        assert_eq!(
            service.refresh("not.a.jwt").await.unwrap_err(),
            AuthError::TokenInvalid
        );
    }

    #[tokio::test]
    async fn test_concurrent_refresh_has_single_winner() {
        let service = Arc::new(service());
        let session = service
            .register(register_command("ada@example.com", "secret123"))
            .await
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let service = service.clone();
                let token = session.tokens.refresh_token.clone();
                tokio::spawn(async move { service.refresh(&token).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(err) => assert_eq!(err, AuthError::TokenReplayed),
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn test_logout_revokes_only_that_session() {
        let service = service();
        let a = service
            .register(register_command("ada@example.com", "secret123"))
            .await
            .unwrap();
        let b = service
            .login(login_command("ada@example.com", "secret123"))
            .await
            .unwrap();

        service
            .logout(&a.user.id, &a.tokens.refresh_token)
            .await
            .unwrap();
        service
            .logout(&a.user.id, &a.tokens.refresh_token)
            .await
            .unwrap();

        assert_eq!(
            service.refresh(&a.tokens.refresh_token).await.unwrap_err(),
            AuthError::TokenReplayed
        );
        assert!(service.refresh(&b.tokens.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_logout_all_revokes_every_session() {
        let service = service();
        let a = service
            .register(register_command("ada@example.com", "secret123"))
            .await
            .unwrap();
        let b = service
            .login(login_command("ada@example.com", "secret123"))
            .await
            .unwrap();

        service.logout_all(&a.user.id).await.unwrap();

        for token in [a.tokens.refresh_token, b.tokens.refresh_token] {
            assert_eq!(
                service.refresh(&token).await.unwrap_err(),
                AuthError::TokenReplayed
            );
        }
    }

    #[tokio::test]
    async fn test_get_profile() {
        let service = service();
        let session = service
            .register(register_command("ada@example.com", "secret123"))
            .await
            .unwrap();

        assert_eq!(
            service.get_profile(&session.user.id).await.unwrap(),
            session.user
        );
        assert_eq!(
            service.get_profile(&UserId::new()).await.unwrap_err(),
            AuthError::UserNotFound
        );
    }

    #[tokio::test]
    async fn test_change_password_revokes_sessions() {
        let service = service();
        let session = service
            .register(register_command("ada@example.com", "secret123"))
            .await
            .unwrap();

        let fresh = service
            .change_password(
                &session.user.id,
                ChangePasswordCommand {
                    current_password: Some(Password::for_verification("secret123".to_string())),
                    new_password: Password::new("new-secret".to_string()).unwrap(),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            service
                .refresh(&session.tokens.refresh_token)
                .await
                .unwrap_err(),
            AuthError::TokenReplayed
        );
        assert!(service.refresh(&fresh.refresh_token).await.is_ok());
        assert_eq!(
            service
                .login(login_command("ada@example.com", "secret123"))
                .await
                .unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert!(service
            .login(login_command("ada@example.com", "new-secret"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_change_password_requires_current() {
        let service = service();
        let session = service
            .register(register_command("ada@example.com", "secret123"))
            .await
            .unwrap();

        for current in [None, Some("wrong-one")] {
            let result = service
                .change_password(
                    &session.user.id,
                    ChangePasswordCommand {
                        current_password: current
                            .map(|p| Password::for_verification(p.to_string())),
                        new_password: Password::new("new-secret".to_string()).unwrap(),
                    },
                )
                .await;
            assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
        }
    }

    #[tokio::test]
    async fn test_external_account_can_set_first_password() {
        let service = service();
        let session = service
            .resolve_external_identity(google_profile("g-1", "ada@example.com"))
            .await
            .unwrap();

        service
            .change_password(
                &session.user.id,
                ChangePasswordCommand {
                    current_password: None,
                    new_password: Password::new("first-pass".to_string()).unwrap(),
                },
            )
            .await
            .unwrap();

        let profile = service.get_profile(&session.user.id).await.unwrap();
        assert!(profile.has_password);
        assert!(profile.has_external_identity);
        assert!(service
            .login(login_command("ada@example.com", "first-pass"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_external_identity_links_existing_account() {
        let users = Arc::new(InMemoryUserRepository::new());
        let service = service_with(users.clone());
        let registered = service
            .register(register_command("ada@example.com", "secret123"))
            .await
            .unwrap();
        let digest_before = users
            .find_by_id(&registered.user.id)
            .await
            .unwrap()
            .unwrap()
            .password_hash()
            .map(str::to_string);

        let first = service
            .resolve_external_identity(google_profile("g-1", "ada@example.com"))
            .await
            .unwrap();
        let second = service
            .resolve_external_identity(google_profile("g-1", "ada@example.com"))
            .await
            .unwrap();

        assert_eq!(first.user.id, registered.user.id);
        assert_eq!(second.user.id, registered.user.id);
        assert!(first.user.has_password && first.user.has_external_identity);

        let stored = users
            .find_by_id(&registered.user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.password_hash().map(str::to_string), digest_before);
        assert!(service
            .login(login_command("ada@example.com", "secret123"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_external_identity_conflict() {
        let service = service();
        service
            .resolve_external_identity(google_profile("g-1", "ada@example.com"))
            .await
            .unwrap();

        let result = service
            .resolve_external_identity(google_profile("g-2", "ada@example.com"))
            .await;

        assert_eq!(result.unwrap_err(), AuthError::IdentityConflict);
    }

    #[tokio::test]
    async fn test_storage_failure_is_unavailable() {
        let mut users = MockTestUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|_| Err(AuthError::Unavailable("db down".to_string())));

        let service = service_with(Arc::new(users));
        let result = service
            .login(login_command("ada@example.com", "secret123"))
            .await;

        assert!(matches!(result, Err(AuthError::Unavailable(_))));
    }
}
