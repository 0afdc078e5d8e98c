use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::AuthSessionData;
use crate::domain::auth::models::LoginCommand;
use crate::domain::user::models::Password;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<ApiSuccess<AuthSessionData>, ApiError> {
    // No format checks here: every bad input must look like wrong credentials
    let command = LoginCommand {
        email: body.email,
        password: Password::for_verification(body.password),
    };

    let session = state.auth_service.login(command).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        AuthSessionData {
            user: session.user.into(),
            tokens: session.tokens.into(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}
