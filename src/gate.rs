//! Route gate — request-level access control run before page rendering.
//!
//! DESIGN
//! ======
//! A static prefix table partitions paths into protected, auth-only, and
//! public. The middleware resolves session validity once per gated request
//! (the identity backend renews the token as a side effect of the check) and
//! then redirects or passes through. API and asset paths bypass the gate
//! entirely; API handlers enforce their own auth.
//!
//! ERROR HANDLING
//! ==============
//! When the session check itself fails, the gate counts the session as
//! absent: protected routes fail closed to the login redirect instead of
//! rendering with unknown auth state.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::warn;

use crate::routes::auth::SESSION_COOKIE;
use crate::services::context::SessionChange;
use crate::state::AppState;

/// Paths the gate never inspects.
const EXEMPT_PREFIXES: &[&str] = &["/api", "/assets", "/images", "/favicon.ico"];

/// Prefixes that require a live session.
const PROTECTED_PREFIXES: &[&str] = &["/dashboard", "/add-listing", "/profile", "/messages", "/favorites"];

/// Login/signup pages; a signed-in user is bounced to the dashboard.
const AUTH_ONLY_PREFIXES: &[&str] = &["/login", "/signup"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Protected,
    AuthOnly,
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    Redirect(String),
}

#[must_use]
pub fn is_exempt(path: &str) -> bool {
    EXEMPT_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Classify a request path by exact, case-sensitive prefix match against the
/// path's start.
#[must_use]
pub fn classify(path: &str) -> RouteClass {
    if PROTECTED_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        RouteClass::Protected
    } else if AUTH_ONLY_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        RouteClass::AuthOnly
    } else {
        RouteClass::Public
    }
}

/// Pure gate decision for a classified path. The original path rides along on
/// the root redirect so login can restore it afterwards.
#[must_use]
pub fn decide(path: &str, class: RouteClass, has_session: bool) -> GateDecision {
    match class {
        RouteClass::Protected if !has_session => GateDecision::Redirect(format!("/?redirect={path}")),
        RouteClass::AuthOnly if has_session => GateDecision::Redirect("/dashboard".to_owned()),
        _ => GateDecision::Pass,
    }
}

/// Axum middleware applying the gate to every non-exempt request.
pub async fn route_gate(State(state): State<AppState>, jar: CookieJar, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    if is_exempt(&path) {
        return next.run(request).await;
    }

    let session_token = resolve_session(&state, &jar).await;
    // The check renews the token backend-side; let mounted auth contexts
    // pick up the refreshed session state.
    if let Some(token) = &session_token {
        let _ = state
            .session_events
            .send(SessionChange::Refreshed { access_token: token.clone() });
    }

    match decide(&path, classify(&path), session_token.is_some()) {
        GateDecision::Pass => next.run(request).await,
        GateDecision::Redirect(target) => Redirect::temporary(&target).into_response(),
    }
}

/// The validated session token for the request, if any. Check failures count
/// as signed out.
async fn resolve_session(state: &AppState, jar: &CookieJar) -> Option<String> {
    let provider = state.identity.as_ref()?;
    let token = jar.get(SESSION_COOKIE).map(Cookie::value).unwrap_or_default();
    if token.is_empty() {
        return None;
    }

    match provider.current_session(token).await {
        Ok(Some(session)) => Some(session.access_token),
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "session check failed during route gating; failing closed");
            None
        }
    }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
