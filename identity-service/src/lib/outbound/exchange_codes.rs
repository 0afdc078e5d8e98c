use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::rand_core::RngCore;
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tokio::sync::Mutex;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::TokenPair;
use crate::domain::auth::ports::ExchangeCodeStore;

const CODE_BYTES: usize = 32;

/// One-time codes held in process memory.
///
/// A code is removed on its first redemption, expired or not.
pub struct InMemoryExchangeCodeStore {
    ttl: Duration,
    codes: Mutex<HashMap<String, (TokenPair, Instant)>>,
}

impl InMemoryExchangeCodeStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            codes: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ExchangeCodeStore for InMemoryExchangeCodeStore {
    async fn issue(&self, tokens: TokenPair) -> Result<String, AuthError> {
        let mut bytes = [0u8; CODE_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| AuthError::Unavailable(format!("Random source failed: {}", e)))?;
        let code = URL_SAFE_NO_PAD.encode(bytes);

        let now = Instant::now();
        let mut codes = self.codes.lock().await;
        codes.retain(|_, (_, issued_at)| now.duration_since(*issued_at) < self.ttl);
        codes.insert(code.clone(), (tokens, now));

        Ok(code)
    }

    async fn redeem(&self, code: &str) -> Result<Option<TokenPair>, AuthError> {
        let entry = self.codes.lock().await.remove(code);

        Ok(entry
            .filter(|(_, issued_at)| issued_at.elapsed() < self.ttl)
            .map(|(tokens, _)| tokens))
    }
}
