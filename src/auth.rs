//! Single-password admin sessions kept in a signed cookie.

use std::{num::NonZeroU32, sync::Arc};

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::SignedCookieJar;
use cookie::{Cookie, Key, SameSite};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

use crate::AppState;

pub const SESSION_COOKIE: &str = "cinematheque_admin";
const SESSION_TTL_SECS: i64 = 12 * 60 * 60;

pub fn session_key(secret: Option<&str>) -> Key {
    match secret {
        Some(secret) => Key::derive_from(secret.as_bytes()),
        None => {
            tracing::warn!("no SESSION_SECRET set; admin sessions will not survive a restart");
            Key::generate()
        },
    }
}

pub fn login_limiter(per_minute: u32) -> Arc<DefaultDirectRateLimiter> {
    let quota = Quota::per_minute(NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    Accepted,
    Rejected,
    Throttled,
    Disabled,
}

/// Checks a login attempt against the configured password and the rate
/// limit. Throttled attempts never reach the comparison.
pub fn check_login(state: &AppState, password: &str) -> LoginOutcome {
    let Some(expected) = state.config.admin_password.as_deref() else {
        return LoginOutcome::Disabled;
    };
    if state.login_limiter.check().is_err() {
        return LoginOutcome::Throttled;
    }
    if constant_time_eq(expected.as_bytes(), password.as_bytes()) {
        LoginOutcome::Accepted
    } else {
        LoginOutcome::Rejected
    }
}

pub fn start_session(jar: SignedCookieJar) -> SignedCookieJar {
    let issued = jiff::Timestamp::now().as_second().to_string();
    jar.add(
        Cookie::build((SESSION_COOKIE, issued))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(SESSION_TTL_SECS)),
    )
}

pub fn end_session(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

fn session_valid(jar: &SignedCookieJar, now: i64) -> bool {
    jar.get(SESSION_COOKIE)
        .and_then(|c| c.value().parse::<i64>().ok())
        .is_some_and(|issued| issued <= now && now - issued < SESSION_TTL_SECS)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// The request's cookies, verified against the session key.
pub fn session_jar(headers: &HeaderMap, state: &AppState) -> SignedCookieJar {
    SignedCookieJar::from_headers(headers, state.key.clone())
}

/// Whoever is looking at the page; only used to tailor the navigation.
#[derive(Clone, Copy, Debug)]
pub struct Viewer {
    pub is_admin: bool,
}

impl FromRequestParts<Arc<AppState>> for Viewer {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let now = jiff::Timestamp::now().as_second();
        Ok(Self { is_admin: session_valid(&session_jar(&parts.headers, state), now) })
    }
}

/// Guard for admin-only handlers; anyone else is sent to the login page.
#[derive(Clone, Copy, Debug)]
pub struct Admin;

impl FromRequestParts<Arc<AppState>> for Admin {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let now = jiff::Timestamp::now().as_second();
        if session_valid(&session_jar(&parts.headers, state), now) {
            Ok(Admin)
        } else {
            Err(Redirect::to("/login").into_response())
        }
    }
}
