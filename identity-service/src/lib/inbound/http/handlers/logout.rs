use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn logout(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
    Json(body): Json<LogoutRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    state
        .auth_service
        .logout(&authenticated.user_id, &body.refresh_token)
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData {
            message: "Logged out".to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogoutRequest {
    refresh_token: String,
}
