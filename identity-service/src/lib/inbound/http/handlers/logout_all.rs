use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn logout_all(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    state
        .auth_service
        .logout_all(&authenticated.user_id)
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData {
            message: "Logged out of all sessions".to_string(),
        },
    ))
}
