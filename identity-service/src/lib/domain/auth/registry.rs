use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use sha2::Digest;
use sha2::Sha256;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::RefreshTokenRecord;
use crate::domain::auth::ports::RefreshTokenStore;
use crate::domain::user::models::UserId;

/// Hex-encoded SHA-256 digest of a refresh token.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Tracks which refresh tokens of each user are still live.
///
/// Tokens are hashed before they reach the store. Every method maps to a
/// single store call so concurrent callers never interleave inside one.
pub struct RefreshTokenRegistry<RS>
where
    RS: RefreshTokenStore,
{
    store: Arc<RS>,
    max_sessions_per_user: Option<usize>,
}

impl<RS> RefreshTokenRegistry<RS>
where
    RS: RefreshTokenStore,
{
    /// # Arguments
    /// * `store` - Backing store for token digests
    /// * `max_sessions_per_user` - Optional cap; oldest sessions are evicted past it
    pub fn new(store: Arc<RS>, max_sessions_per_user: Option<usize>) -> Self {
        Self {
            store,
            max_sessions_per_user,
        }
    }

    /// Record a freshly issued refresh token.
    ///
    /// Sweeps the user's expired entries first, then inserts, then enforces
    /// the session cap when one is configured.
    pub async fn add(
        &self,
        user_id: &UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let now = Utc::now();

        let pruned = self.store.prune_expired(user_id, now).await?;
        if pruned > 0 {
            tracing::debug!(user_id = %user_id, pruned, "Pruned expired refresh tokens");
        }

        let record = RefreshTokenRecord {
            token_hash: hash_token(token),
            expires_at,
            created_at: now,
        };
        self.store.insert(user_id, record).await?;

        if let Some(cap) = self.max_sessions_per_user {
            let evicted = self.store.evict_oldest_beyond(user_id, cap).await?;
            if evicted > 0 {
                tracing::info!(user_id = %user_id, evicted, cap, "Evicted oldest sessions");
            }
        }

        Ok(())
    }

    /// Remove a token if present.
    ///
    /// # Returns
    /// `true` only for the caller that actually removed it
    pub async fn remove(&self, user_id: &UserId, token: &str) -> Result<bool, AuthError> {
        self.store.remove(user_id, &hash_token(token)).await
    }

    /// Remove every token of the user.
    pub async fn remove_all(&self, user_id: &UserId) -> Result<u64, AuthError> {
        self.store.remove_all(user_id).await
    }

    pub async fn contains(&self, user_id: &UserId, token: &str) -> Result<bool, AuthError> {
        self.store.contains(user_id, &hash_token(token)).await
    }
}
