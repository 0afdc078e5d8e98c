use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::TokenPairData;
use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::ChangePasswordCommand;
use crate::domain::user::errors::PasswordPolicyError;
use crate::domain::user::models::Password;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

/// Change the caller's password; every other session is signed out.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<ApiSuccess<TokenPairData>, ApiError> {
    let command = body.try_into_command()?;

    state
        .auth_service
        .change_password(&authenticated.user_id, command)
        .await
        .map_err(ApiError::from)
        .map(|tokens| ApiSuccess::new(StatusCode::OK, tokens.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    current_password: Option<String>,
    new_password: String,
}

impl ChangePasswordRequest {
    fn try_into_command(self) -> Result<ChangePasswordCommand, PasswordPolicyError> {
        Ok(ChangePasswordCommand {
            current_password: self.current_password.map(Password::for_verification),
            new_password: Password::new(self.new_password)?,
        })
    }
}

impl From<PasswordPolicyError> for ApiError {
    fn from(err: PasswordPolicyError) -> Self {
        ApiError::from(AuthError::WeakPassword(err))
    }
}
