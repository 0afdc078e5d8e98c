use async_trait::async_trait;

use crate::domain::auth::errors::AuthError;
use crate::domain::user::models::CompanyId;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::ExternalId;
use crate::domain::user::models::ProfileFields;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Persistence operations for the user aggregate.
///
/// Every mutating operation is a single atomic statement against one user
/// record; callers never read a record, modify it and write it back.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `UserAlreadyExists` - Email is already registered (case-insensitive)
    /// * `IdentityConflict` - External identity is already attached to another user
    /// * `Unavailable` - Storage operation failed
    async fn create(&self, user: User) -> Result<User, AuthError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError>;

    /// Retrieve user by email address (case-insensitive).
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, AuthError>;

    /// Retrieve user by external provider subject.
    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<User>, AuthError>;

    /// Attach an external identity if the user has none yet.
    ///
    /// Conditional update: succeeds only while the user's external identity
    /// is empty. The password digest is never touched.
    ///
    /// # Returns
    /// Updated user, or None when the user does not exist or already carries
    /// an external identity
    ///
    /// # Errors
    /// * `IdentityConflict` - External identity is attached to another user
    async fn link_external_identity(
        &self,
        id: &UserId,
        external_id: &ExternalId,
    ) -> Result<Option<User>, AuthError>;

    /// Replace the stored password digest.
    ///
    /// # Errors
    /// * `UserNotFound` - User does not exist
    async fn update_password_hash(&self, id: &UserId, password_hash: &str)
        -> Result<User, AuthError>;

    /// Update non-credential profile fields; `None` fields are left unchanged.
    ///
    /// # Errors
    /// * `UserNotFound` - User does not exist
    async fn update_profile_fields(
        &self,
        id: &UserId,
        fields: ProfileFields,
    ) -> Result<User, AuthError>;
}

/// Company membership predicate, owned by the company service.
#[async_trait]
pub trait MembershipChecker: Send + Sync + 'static {
    async fn is_member(&self, user_id: &UserId, company_id: &CompanyId) -> Result<bool, AuthError>;
}
