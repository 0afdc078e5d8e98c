use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::errors::ErrorClass;
use crate::domain::auth::models::TokenPair;
use crate::domain::user::models::UserProfile;

pub mod change_password;
pub mod exchange;
pub mod get_me;
pub mod health;
pub mod login;
pub mod logout;
pub mod logout_all;
pub mod membership;
pub mod oauth;
pub mod refresh_tokens;
pub mod register;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    NotFound(String),
    /// Domain failure, reported with its stable kind
    Auth(AuthError),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

fn status_for(class: ErrorClass) -> StatusCode {
    match class {
        ErrorClass::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorClass::Conflict => StatusCode::CONFLICT,
        ErrorClass::NotFound => StatusCode::NOT_FOUND,
        ErrorClass::Forbidden => StatusCode::FORBIDDEN,
        ErrorClass::InvalidInput => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorClass::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, kind) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, None),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Auth(err) => {
                let class = err.class();
                let message = match &err {
                    // Storage and provider details stay in the logs
                    AuthError::Unavailable(detail) => {
                        tracing::error!("Request failed: {}", detail);
                        "Service temporarily unavailable".to_string()
                    }
                    other => other.to_string(),
                };
                (status_for(class), message, Some(err.kind()))
            }
        };

        (
            status,
            Json(ApiResponseBody::new_error(status, message, kind)),
        )
            .into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String, kind: Option<&'static str>) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message, kind },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

/// Token pair as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPairData {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry, milliseconds since the Unix epoch
    pub expires_at: i64,
}

impl From<TokenPair> for TokenPairData {
    fn from(tokens: TokenPair) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at: tokens.expires_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileData {
    pub id: String,
    pub name: String,
    pub email: String,
    pub profile_picture: Option<String>,
    pub is_active: bool,
    pub has_password: bool,
    pub has_external_identity: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfile> for ProfileData {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id.to_string(),
            name: profile.name,
            email: profile.email,
            profile_picture: profile.profile_picture,
            is_active: profile.is_active,
            has_password: profile.has_password,
            has_external_identity: profile.has_external_identity,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

/// Body of register, login and external sign-in responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSessionData {
    pub user: ProfileData,
    pub tokens: TokenPairData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageData {
    pub message: String,
}
