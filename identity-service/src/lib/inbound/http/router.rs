use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::change_password::change_password;
use super::handlers::exchange::exchange;
use super::handlers::get_me::get_me;
use super::handlers::health::health;
use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::logout_all::logout_all;
use super::handlers::membership::membership;
use super::handlers::oauth::oauth_callback;
use super::handlers::oauth::oauth_start;
use super::handlers::refresh_tokens::refresh_tokens;
use super::handlers::register::register;
use super::middleware::authenticate as auth_middleware;
use super::middleware::require_company_member;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::auth::ports::ExchangeCodeStore;
use crate::domain::auth::ports::OAuthProviderClient;
use crate::domain::user::ports::MembershipChecker;

/// External sign-in wiring; absent when the provider is not configured.
#[derive(Clone)]
pub struct OAuthState {
    pub client: Arc<dyn OAuthProviderClient>,
    pub state_secret: Vec<u8>,
    pub frontend_url: String,
    /// Mark the state cookie `Secure`; set when the callback is served over https
    pub secure_cookies: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServicePort>,
    pub membership: Arc<dyn MembershipChecker>,
    pub exchange_codes: Arc<dyn ExchangeCodeStore>,
    pub oauth: Option<OAuthState>,
}

pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh-tokens", post(refresh_tokens))
        .route("/api/auth/exchange", post(exchange))
        .route("/api/auth/google", get(oauth_start))
        .route("/api/auth/google/callback", get(oauth_callback));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(get_me))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/logout-all", post(logout_all))
        .route("/api/auth/change-password", post(change_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Layers run outermost-first: authenticate, then the membership check
    let member_routes = Router::new()
        .route("/api/companies/:company_id/membership", get(membership))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_company_member,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri().path(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri().path(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(member_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
