use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::TokenPairData;
use crate::inbound::http::router::AppState;

pub async fn refresh_tokens(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokensRequest>,
) -> Result<ApiSuccess<TokenPairData>, ApiError> {
    state
        .auth_service
        .refresh(&body.refresh_token)
        .await
        .map_err(ApiError::from)
        .map(|tokens| ApiSuccess::new(StatusCode::OK, tokens.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshTokensRequest {
    refresh_token: String,
}
