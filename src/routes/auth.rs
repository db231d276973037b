//! Auth routes — OAuth callback, current-user lookup, sign-out, auth stream.

use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use futures::Stream;
use serde::Deserialize;
use time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::services::context::{self, AuthContext, SessionChange};
use crate::state::AppState;

pub(crate) const SESSION_COOKIE: &str = "session_token";

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

pub(crate) fn cookie_secure() -> bool {
    if let Some(value) = env_bool("COOKIE_SECURE") {
        return value;
    }

    std::env::var("SITE_URL")
        .map(|url| url.starts_with("https://"))
        .unwrap_or(false)
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cookie_secure())
        .build()
}

fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cookie_secure())
        .max_age(Duration::ZERO)
        .build()
}

// =============================================================================
// POST-LOGIN REDIRECT
// =============================================================================

/// Accept only same-origin relative paths as post-login redirect targets.
/// Absolute URLs, protocol-relative `//` forms, and backslash variants are
/// rejected so the callback can never be abused as an open redirect.
#[must_use]
pub(crate) fn sanitize_redirect(raw: Option<&str>) -> Option<&str> {
    let candidate = raw?.trim();
    if candidate.starts_with('/') && !candidate.starts_with("//") && !candidate.contains('\\') {
        Some(candidate)
    } else {
        None
    }
}

/// Post-login landing: a safe explicit `redirect` wins regardless of role;
/// otherwise hosts land on the dashboard and guests on search.
#[must_use]
pub(crate) fn post_login_target(redirect: Option<&str>, is_host: bool) -> String {
    if let Some(path) = sanitize_redirect(redirect) {
        return path.to_owned();
    }
    if is_host { "/dashboard".to_owned() } else { "/search".to_owned() }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub(crate) code: Option<String>,
    pub(crate) redirect: Option<String>,
}

/// `GET /auth/callback` — exchange the one-time code for a session, resolve
/// the role, set the session cookie, redirect. Failures stay silent toward
/// the user: a bad or missing code lands back on the site root.
pub async fn oauth_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Response {
    let Some(provider) = &state.identity else {
        warn!("oauth callback hit while identity service is unconfigured");
        return Redirect::temporary("/").into_response();
    };

    let Some(code) = params.code.as_deref().filter(|code| !code.is_empty()) else {
        return Redirect::temporary("/").into_response();
    };

    let session = match provider.exchange_code(code).await {
        Ok(session) => session,
        Err(e) => {
            warn!(error = %e, "code exchange failed; returning to landing page");
            return Redirect::temporary("/").into_response();
        }
    };

    let is_host = match state.profiles.ensure(&session.identity).await {
        Ok(profile) => profile.is_host,
        Err(e) => {
            warn!(error = %e, id = %session.identity.id, "profile upsert failed after login; defaulting to guest");
            false
        }
    };

    let _ = state
        .session_events
        .send(SessionChange::SignedIn { access_token: session.access_token.clone() });

    let target = post_login_target(params.redirect.as_deref(), is_host);
    let jar = jar.add(session_cookie(session.access_token));
    (jar, Redirect::temporary(&target)).into_response()
}

#[derive(serde::Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub is_host: bool,
}

/// `GET /api/auth/me` — current identity and role, 401 when signed out.
pub async fn me(State(state): State<AppState>, jar: CookieJar) -> Response {
    let token = jar.get(SESSION_COOKIE).map(Cookie::value);
    let snapshot = context::resolve(state.identity.as_ref(), &state.profiles, token).await;

    match snapshot.identity {
        Some(identity) => Json(MeResponse {
            id: identity.id,
            email: identity.email,
            is_host: snapshot.is_host,
        })
        .into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

/// `POST /api/auth/logout` — revoke the session, clear the cookie, notify
/// mounted contexts.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let (Some(provider), Some(token)) = (&state.identity, jar.get(SESSION_COOKIE).map(Cookie::value)) {
        if !token.is_empty() {
            if let Err(e) = provider.sign_out(token).await {
                warn!(error = %e, "sign-out call failed; clearing cookie anyway");
            }
        }
    }

    let _ = state.session_events.send(SessionChange::SignedOut);
    let jar = jar.add(clear_session_cookie());
    (jar, StatusCode::NO_CONTENT)
}

/// `GET /api/auth/stream` — server-sent auth snapshots: the settled state on
/// connect, then one event per session change. The mounted context is torn
/// down (subscription released) when the client disconnects.
pub async fn session_stream(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let token = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_owned());
    let context = AuthContext::mount(&state, token);
    let rx = context.watch();

    let stream = futures::stream::unfold((rx, context), |(mut rx, context)| async move {
        // Skip the initial loading snapshot so connected clients never see a
        // half-derived state.
        loop {
            if rx.changed().await.is_err() {
                return None;
            }
            let snapshot = rx.borrow_and_update().clone();
            if snapshot.loading {
                continue;
            }
            let event = Event::default().event("auth").json_data(&snapshot).ok()?;
            return Some((Ok(event), (rx, context)));
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
