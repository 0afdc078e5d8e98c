//! Authentication utilities library
//!
//! Provides the credential primitives used by the identity service:
//! - Password hashing (Argon2id)
//! - Access/refresh token signing and verification, one secret per token kind
//!
//! Nothing here performs I/O; storage of refresh tokens and user records lives
//! in the service that uses these primitives.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Access and Refresh Tokens
//! ```
//! use auth::{JwtError, TokenCodec, TokenCodecConfig, TokenKind};
//!
//! let codec = TokenCodec::new(TokenCodecConfig::new(
//!     b"access_secret_key_at_least_32_bytes!".to_vec(),
//!     b"refresh_secret_key_at_least_32_bytes".to_vec(),
//! ))
//! .unwrap();
//!
//! let refresh = codec.issue("user123", TokenKind::Refresh).unwrap();
//! let claims = codec.verify(&refresh.token, TokenKind::Refresh).unwrap();
//! assert_eq!(claims.sub, "user123");
//!
//! // A refresh token never passes where an access token is required.
//! assert!(matches!(
//!     codec.verify(&refresh.token, TokenKind::Access),
//!     Err(JwtError::WrongTokenKind { .. })
//! ));
//! ```

pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use jwt::IssuedToken;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenClaims;
pub use jwt::TokenCodec;
pub use jwt::TokenCodecConfig;
pub use jwt::TokenKind;
pub use password::HashingCost;
pub use password::PasswordError;
pub use password::PasswordHasher;
