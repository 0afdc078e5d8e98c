use axum::extract::Path;
use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::domain::auth::errors::AuthError;
use crate::domain::user::models::CompanyId;
use crate::domain::user::models::UserId;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Extension type to store authenticated user ID in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Middleware that validates access tokens and adds the caller to request extensions
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token_from_header(&req)?;

    let user_id = state
        .auth_service
        .verify_access_token(token)
        .await
        .map_err(|e| {
            tracing::warn!("Access token validation failed: {}", e);
            ApiError::from(e).into_response()
        })?;

    req.extensions_mut().insert(AuthenticatedUser { user_id });

    Ok(next.run(req).await)
}

/// Middleware that lets only members of the `:company_id` in the path through.
///
/// Must run after [`authenticate`].
pub async fn require_company_member(
    State(state): State<AppState>,
    Path(company_id): Path<String>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    let user_id = req
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|authenticated| authenticated.user_id)
        .ok_or_else(|| ApiError::from(AuthError::Unauthorized).into_response())?;

    let company_id = CompanyId::from_string(&company_id).map_err(|e| {
        ApiError::UnprocessableEntity(format!("Invalid company ID: {}", e)).into_response()
    })?;

    let is_member = state
        .membership
        .is_member(&user_id, &company_id)
        .await
        .map_err(|e| ApiError::from(e).into_response())?;

    if !is_member {
        tracing::warn!(user_id = %user_id, company_id = %company_id, "Not a company member");
        return Err(ApiError::from(AuthError::Forbidden).into_response());
    }

    Ok(next.run(req).await)
}

fn extract_token_from_header(req: &Request) -> Result<&str, Response> {
    let rejected = |reason: &str| {
        tracing::debug!("Rejected Authorization header: {}", reason);
        ApiError::from(AuthError::Unauthorized).into_response()
    };

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| rejected("missing"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| rejected("not valid ASCII"))?;

    auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| rejected("expected Bearer <token>"))
}
