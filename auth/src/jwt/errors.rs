use thiserror::Error;

use super::claims::TokenKind;

/// Error type for JWT operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is expired")]
    TokenExpired,

    #[error("Token is invalid: {0}")]
    TokenInvalid(String),

    #[error("Wrong token kind: expected {expected}, got {actual}")]
    WrongTokenKind {
        expected: TokenKind,
        actual: TokenKind,
    },

    #[error("Access token lifetime must be positive and shorter than refresh token lifetime")]
    InvalidTtl,

    #[error("Signing secret rejected: {0}")]
    WeakSecret(String),
}
