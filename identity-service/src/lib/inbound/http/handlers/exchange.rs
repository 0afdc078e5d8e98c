use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::TokenPairData;
use crate::domain::auth::errors::AuthError;
use crate::inbound::http::router::AppState;

/// Redeem the one-time code handed out by the OAuth callback.
pub async fn exchange(
    State(state): State<AppState>,
    Json(body): Json<ExchangeRequest>,
) -> Result<ApiSuccess<TokenPairData>, ApiError> {
    let tokens = state
        .exchange_codes
        .redeem(&body.code)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Unknown, used or expired exchange code");
            AuthError::TokenInvalid
        })?;

    Ok(ApiSuccess::new(StatusCode::OK, tokens.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExchangeRequest {
    code: String,
}
