use thiserror::Error;

use crate::domain::user::errors::DisplayNameError;
use crate::domain::user::errors::EmailError;
use crate::domain::user::errors::ExternalIdError;
use crate::domain::user::errors::PasswordPolicyError;
use crate::domain::user::errors::UserIdError;

/// Transport-agnostic classification of a failure.
///
/// Inbound adapters map this to HTTP status codes or gRPC codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Unauthorized,
    Conflict,
    NotFound,
    Forbidden,
    InvalidInput,
    Unavailable,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Unauthorized => "unauthorized",
            ErrorClass::Conflict => "conflict",
            ErrorClass::NotFound => "not_found",
            ErrorClass::Forbidden => "forbidden",
            ErrorClass::InvalidInput => "invalid_input",
            ErrorClass::Unavailable => "unavailable",
        }
    }
}

/// Every failure an authentication operation can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Wrong token kind")]
    WrongTokenKind,

    #[error("Refresh token has already been used or revoked")]
    TokenReplayed,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    #[error("Account is linked to a different external identity")]
    IdentityConflict,

    // Value object validation errors (automatically converted via #[from])
    #[error("Invalid user ID: {0}")]
    InvalidUserId(#[from] UserIdError),

    #[error("Invalid name: {0}")]
    InvalidName(#[from] DisplayNameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid external identity: {0}")]
    InvalidExternalId(#[from] ExternalIdError),

    #[error("Invalid password: {0}")]
    WeakPassword(#[from] PasswordPolicyError),

    // Infrastructure errors
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::UserAlreadyExists => "user_already_exists",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::UserNotFound => "user_not_found",
            AuthError::TokenInvalid => "token_invalid",
            AuthError::TokenExpired => "token_expired",
            AuthError::WrongTokenKind => "wrong_token_kind",
            AuthError::TokenReplayed => "token_replayed",
            AuthError::Unauthorized => "unauthorized",
            AuthError::Forbidden => "forbidden",
            AuthError::IdentityConflict => "identity_conflict",
            AuthError::InvalidUserId(_) => "invalid_user_id",
            AuthError::InvalidName(_) => "invalid_name",
            AuthError::InvalidEmail(_) => "invalid_email",
            AuthError::InvalidExternalId(_) => "invalid_external_id",
            AuthError::WeakPassword(_) => "weak_password",
            AuthError::Unavailable(_) => "unavailable",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            AuthError::InvalidCredentials
            | AuthError::TokenInvalid
            | AuthError::TokenExpired
            | AuthError::WrongTokenKind
            | AuthError::TokenReplayed
            | AuthError::Unauthorized => ErrorClass::Unauthorized,
            AuthError::UserAlreadyExists | AuthError::IdentityConflict => ErrorClass::Conflict,
            AuthError::UserNotFound => ErrorClass::NotFound,
            AuthError::Forbidden => ErrorClass::Forbidden,
            AuthError::InvalidUserId(_)
            | AuthError::InvalidName(_)
            | AuthError::InvalidEmail(_)
            | AuthError::InvalidExternalId(_)
            | AuthError::WeakPassword(_) => ErrorClass::InvalidInput,
            AuthError::Unavailable(_) => ErrorClass::Unavailable,
        }
    }
}

impl From<auth::JwtError> for AuthError {
    fn from(err: auth::JwtError) -> Self {
        match err {
            auth::JwtError::TokenExpired => AuthError::TokenExpired,
            auth::JwtError::TokenInvalid(_) => AuthError::TokenInvalid,
            auth::JwtError::WrongTokenKind { .. } => AuthError::WrongTokenKind,
            auth::JwtError::EncodingFailed(_)
            | auth::JwtError::InvalidTtl
            | auth::JwtError::WeakSecret(_) => AuthError::Unavailable(err.to_string()),
        }
    }
}

impl From<auth::PasswordError> for AuthError {
    fn from(err: auth::PasswordError) -> Self {
        AuthError::Unavailable(err.to_string())
    }
}
