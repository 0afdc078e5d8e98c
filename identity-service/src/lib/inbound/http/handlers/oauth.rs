use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::rand_core::RngCore;
use axum::extract::Query;
use axum::extract::State;
use axum::response::Redirect;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::extract::cookie::SameSite;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::Hmac;
use hmac::Mac;
use serde::Deserialize;
use sha2::Sha256;

use super::ApiError;
use crate::domain::auth::errors::AuthError;
use crate::inbound::http::router::AppState;
use crate::inbound::http::router::OAuthState;

type HmacSha256 = Hmac<Sha256>;

/// How long a consent round-trip may take.
const STATE_VALIDITY_MS: i64 = 10 * 60 * 1000;

/// Cookie carrying the state back to the callback in the starting browser.
pub const STATE_COOKIE: &str = "oauth_state";
const STATE_COOKIE_PATH: &str = "/api/auth/google";

/// Start external sign-in: redirect to the provider consent screen.
///
/// The signed state is also set as an HttpOnly cookie so the callback only
/// accepts it from the browser that started the flow.
pub async fn oauth_start(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    let oauth = enabled(&state)?;

    let signed_state = sign_state(&oauth.state_secret, Utc::now().timestamp_millis())?;
    let url = oauth.client.authorization_url(&signed_state);

    let cookie = Cookie::build((STATE_COOKIE, signed_state))
        .path(STATE_COOKIE_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(oauth.secure_cookies);

    tracing::info!("Starting OAuth flow, redirecting to provider");

    Ok((jar.add(cookie), Redirect::temporary(&url)))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Finish external sign-in.
///
/// The browser is sent back to the frontend with a one-time exchange code;
/// tokens never appear in the URL. The state cookie is cleared on every outcome.
pub async fn oauth_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect), ApiError> {
    let oauth = enabled(&state)?;

    let bound_state = jar.get(STATE_COOKIE).map(|cookie| cookie.value().to_string());
    let jar = jar.remove(Cookie::build(STATE_COOKIE).path(STATE_COOKIE_PATH));

    let redirect = finish_sign_in(&state, oauth, params, bound_state).await?;

    Ok((jar, redirect))
}

async fn finish_sign_in(
    state: &AppState,
    oauth: &OAuthState,
    params: CallbackParams,
    bound_state: Option<String>,
) -> Result<Redirect, ApiError> {
    let failure = |reason: &str| {
        Redirect::temporary(&format!(
            "{}/login?error={}",
            oauth.frontend_url,
            urlencoding::encode(reason)
        ))
    };

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "Provider returned an error");
        return Ok(failure("access_denied"));
    }

    let state_valid = match (params.state.as_deref(), bound_state.as_deref()) {
        (Some(signed), Some(bound)) => {
            signed == bound
                && verify_state(&oauth.state_secret, signed, Utc::now().timestamp_millis())
        }
        _ => false,
    };
    if !state_valid {
        tracing::warn!("OAuth state missing, forged, expired or not bound to this browser");
        return Ok(failure("invalid_state"));
    }

    let Some(code) = params.code else {
        return Ok(failure("missing_code"));
    };

    let profile = match oauth.client.fetch_profile(&code).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!("Provider profile fetch failed: {}", e);
            return Ok(failure(e.kind()));
        }
    };

    let session = match state.auth_service.resolve_external_identity(profile).await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("External sign-in rejected: {}", e);
            return Ok(failure(e.kind()));
        }
    };

    let exchange_code = state.exchange_codes.issue(session.tokens).await?;

    Ok(Redirect::temporary(&format!(
        "{}/auth/callback?code={}",
        oauth.frontend_url,
        urlencoding::encode(&exchange_code)
    )))
}

fn enabled(state: &AppState) -> Result<&OAuthState, ApiError> {
    state
        .oauth
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("External sign-in is not configured".to_string()))
}

fn signature(secret: &[u8], payload: &str) -> Result<HmacSha256, AuthError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AuthError::Unavailable(format!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(mac)
}

/// Build a state value: `base64url("{issued_at_hex}|{nonce_hex}|{hmac_hex}")`.
pub fn sign_state(secret: &[u8], issued_at_ms: i64) -> Result<String, AuthError> {
    let mut nonce = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| AuthError::Unavailable(format!("Random source failed: {}", e)))?;

    let payload = format!("{:x}|{}", issued_at_ms, hex::encode(nonce));
    let tag = signature(secret, &payload)?.finalize().into_bytes();

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, hex::encode(tag))))
}

/// Check the signature and the validity window of a state value.
pub fn verify_state(secret: &[u8], signed: &str, now_ms: i64) -> bool {
    let Some(decoded) = URL_SAFE_NO_PAD
        .decode(signed)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    else {
        return false;
    };

    let Some((payload, tag_hex)) = decoded.rsplit_once('|') else {
        return false;
    };
    let Some((issued_hex, _nonce)) = payload.split_once('|') else {
        return false;
    };
    let (Ok(tag), Ok(issued_at_ms)) = (hex::decode(tag_hex), i64::from_str_radix(issued_hex, 16))
    else {
        return false;
    };

    let Ok(mac) = signature(secret, payload) else {
        return false;
    };
    if mac.verify_slice(&tag).is_err() {
        return false;
    }

    let age = now_ms - issued_at_ms;
    (0..=STATE_VALIDITY_MS).contains(&age)
}
