use std::collections::HashMap;
use std::collections::HashSet;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::sync::RwLock;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::RefreshTokenRecord;
use crate::domain::auth::ports::RefreshTokenStore;
use crate::domain::user::models::CompanyId;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::ExternalId;
use crate::domain::user::models::ProfileFields;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::MembershipChecker;
use crate::domain::user::ports::UserRepository;

/// Process-local user store for development and tests.
///
/// A single write lock covers each mutation, which gives the same
/// uniqueness guarantees as the database indexes.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate or deactivate an account.
    pub async fn set_active(&self, id: &UserId, is_active: bool) {
        if let Some(user) = self.users.write().await.get_mut(id) {
            user.is_active = is_active;
            user.updated_at = Utc::now();
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, AuthError> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == user.email) {
            return Err(AuthError::UserAlreadyExists);
        }
        if let Some(external_id) = user.external_id() {
            if users.values().any(|u| u.external_id() == Some(external_id)) {
                return Err(AuthError::IdentityConflict);
            }
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, AuthError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, AuthError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn find_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<Option<User>, AuthError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.external_id() == Some(external_id))
            .cloned())
    }

    async fn link_external_identity(
        &self,
        id: &UserId,
        external_id: &ExternalId,
    ) -> Result<Option<User>, AuthError> {
        let mut users = self.users.write().await;

        if users
            .values()
            .any(|u| u.id != *id && u.external_id() == Some(external_id))
        {
            return Err(AuthError::IdentityConflict);
        }

        let Some(user) = users.get_mut(id) else {
            return Ok(None);
        };
        if user.external_id().is_some() {
            return Ok(None);
        }

        user.credentials = user.credentials.clone().with_external_id(external_id.clone());
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &str,
    ) -> Result<User, AuthError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(id).ok_or(AuthError::UserNotFound)?;

        user.credentials = user
            .credentials
            .clone()
            .with_password_hash(password_hash.to_string());
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_profile_fields(
        &self,
        id: &UserId,
        fields: ProfileFields,
    ) -> Result<User, AuthError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(id).ok_or(AuthError::UserNotFound)?;

        if let Some(name) = fields.name {
            user.name = name;
        }
        if let Some(picture) = fields.profile_picture {
            user.profile_picture = Some(picture);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

/// Process-local refresh-token store.
///
/// One mutex over the whole map: every trait call is one critical section.
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStore {
    tokens: Mutex<HashMap<UserId, Vec<RefreshTokenRecord>>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn insert(&self, user_id: &UserId, record: RefreshTokenRecord) -> Result<(), AuthError> {
        let mut tokens = self.tokens.lock().await;
        let set = tokens.entry(*user_id).or_default();

        if !set.iter().any(|r| r.token_hash == record.token_hash) {
            set.push(record);
        }
        Ok(())
    }

    async fn remove(&self, user_id: &UserId, token_hash: &str) -> Result<bool, AuthError> {
        let mut tokens = self.tokens.lock().await;
        let Some(set) = tokens.get_mut(user_id) else {
            return Ok(false);
        };

        let before = set.len();
        set.retain(|r| r.token_hash != token_hash);
        Ok(set.len() < before)
    }

    async fn remove_all(&self, user_id: &UserId) -> Result<u64, AuthError> {
        Ok(self
            .tokens
            .lock()
            .await
            .remove(user_id)
            .map(|set| set.len() as u64)
            .unwrap_or(0))
    }

    async fn contains(&self, user_id: &UserId, token_hash: &str) -> Result<bool, AuthError> {
        Ok(self
            .tokens
            .lock()
            .await
            .get(user_id)
            .is_some_and(|set| set.iter().any(|r| r.token_hash == token_hash)))
    }

    async fn prune_expired(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let mut tokens = self.tokens.lock().await;
        let Some(set) = tokens.get_mut(user_id) else {
            return Ok(0);
        };

        let before = set.len();
        set.retain(|r| r.expires_at >= now);
        Ok((before - set.len()) as u64)
    }

    async fn evict_oldest_beyond(&self, user_id: &UserId, keep: usize) -> Result<u64, AuthError> {
        let mut tokens = self.tokens.lock().await;
        let Some(set) = tokens.get_mut(user_id) else {
            return Ok(0);
        };
        if set.len() <= keep {
            return Ok(0);
        }

        set.sort_by_key(|r| r.created_at);
        let excess = set.len() - keep;
        set.drain(..excess);
        Ok(excess as u64)
    }
}

/// Fixed membership table for development and tests.
#[derive(Debug, Default)]
pub struct InMemoryMembershipChecker {
    members: RwLock<HashSet<(UserId, CompanyId)>>,
}

impl InMemoryMembershipChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_member(&self, user_id: UserId, company_id: CompanyId) {
        self.members.write().await.insert((user_id, company_id));
    }
}

#[async_trait]
impl MembershipChecker for InMemoryMembershipChecker {
    async fn is_member(&self, user_id: &UserId, company_id: &CompanyId) -> Result<bool, AuthError> {
        Ok(self
            .members
            .read()
            .await
            .contains(&(*user_id, *company_id)))
    }
}
