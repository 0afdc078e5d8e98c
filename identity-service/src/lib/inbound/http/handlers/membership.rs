use axum::extract::Path;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;

/// Reached only through the membership middleware, so the caller is a member.
pub async fn membership(
    Extension(authenticated): Extension<AuthenticatedUser>,
    Path(company_id): Path<String>,
) -> Result<ApiSuccess<MembershipData>, ApiError> {
    Ok(ApiSuccess::new(
        StatusCode::OK,
        MembershipData {
            company_id,
            user_id: authenticated.user_id.to_string(),
            is_member: true,
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipData {
    pub company_id: String,
    pub user_id: String,
    pub is_member: bool,
}
