use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use super::ProfileData;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn get_me(
    State(state): State<AppState>,
    Extension(authenticated): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<ProfileData>, ApiError> {
    state
        .auth_service
        .get_profile(&authenticated.user_id)
        .await
        .map_err(ApiError::from)
        .map(|profile| ApiSuccess::new(StatusCode::OK, profile.into()))
}
