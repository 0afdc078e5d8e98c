use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use thiserror::Error;

use super::ApiError;
use super::ApiSuccess;
use super::AuthSessionData;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::RegisterCommand;
use crate::domain::user::errors::DisplayNameError;
use crate::domain::user::errors::EmailError;
use crate::domain::user::errors::PasswordPolicyError;
use crate::domain::user::models::DisplayName;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Password;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<ApiSuccess<AuthSessionData>, ApiError> {
    let session = state
        .auth_service
        .register(body.try_into_command()?)
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::CREATED,
        AuthSessionData {
            user: session.user.into(),
            tokens: session.tokens.into(),
        },
    ))
}

/// HTTP request body for registering an account (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Clone, Error)]
enum ParseRegisterRequestError {
    #[error("Invalid name: {0}")]
    Name(#[from] DisplayNameError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid password: {0}")]
    Password(#[from] PasswordPolicyError),
}

impl RegisterRequest {
    fn try_into_command(self) -> Result<RegisterCommand, ParseRegisterRequestError> {
        let name = DisplayName::new(self.name)?;
        let email = EmailAddress::new(self.email)?;
        let password = Password::new(self.password)?;
        Ok(RegisterCommand::new(name, email, password))
    }
}

impl From<ParseRegisterRequestError> for ApiError {
    fn from(err: ParseRegisterRequestError) -> Self {
        let err = match err {
            ParseRegisterRequestError::Name(e) => AuthError::InvalidName(e),
            ParseRegisterRequestError::Email(e) => AuthError::InvalidEmail(e),
            ParseRegisterRequestError::Password(e) => AuthError::WeakPassword(e),
        };
        ApiError::from(err)
    }
}
