//! Dashboard shell — role-keyed sidebar navigation model.
//!
//! Pure presentation data: menu contents branch on the host flag and the
//! active entry is matched by exact path equality. The `/api` prefix bypasses
//! the route gate, so the signed-out redirect here is the route's own check.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};

use super::auth::SESSION_COOKIE;
use crate::services::context;
use crate::state::AppState;

const DEFAULT_PATH: &str = "/dashboard";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub label: &'static str,
    pub href: &'static str,
    pub active: bool,
}

const fn item(label: &'static str, href: &'static str) -> MenuItem {
    MenuItem { label, href, active: false }
}

/// Sidebar entries for hosts managing listings and bookings.
#[must_use]
pub fn host_menu() -> Vec<MenuItem> {
    vec![
        item("Overview", "/dashboard"),
        item("My listings", "/dashboard/listings"),
        item("Bookings", "/dashboard/bookings"),
        item("Add listing", "/add-listing"),
        item("Messages", "/messages"),
        item("Profile", "/profile"),
    ]
}

/// Sidebar entries for buyers and guests.
#[must_use]
pub fn guest_menu() -> Vec<MenuItem> {
    vec![
        item("Overview", "/dashboard"),
        item("Search homes", "/search"),
        item("Favorites", "/favorites"),
        item("Messages", "/messages"),
        item("Profile", "/profile"),
    ]
}

/// Menu for the role, with the current path highlighted. Highlighting is
/// exact string equality, so `/dashboard/listings` lights up its own entry
/// and not the overview.
#[must_use]
pub fn menu_for(is_host: bool, current_path: &str) -> Vec<MenuItem> {
    let mut items = if is_host { host_menu() } else { guest_menu() };
    for entry in &mut items {
        entry.active = entry.href == current_path;
    }
    items
}

#[derive(Deserialize)]
pub struct NavQuery {
    pub(crate) path: Option<String>,
}

#[derive(Serialize)]
pub struct NavResponse {
    pub email: String,
    pub is_host: bool,
    pub items: Vec<MenuItem>,
}

/// `GET /api/dashboard/nav?path=<p>` — sidebar model for the signed-in user.
/// Signed-out callers are bounced to the login page with a back-pointer to
/// the page they were on.
pub async fn nav(State(state): State<AppState>, jar: CookieJar, Query(query): Query<NavQuery>) -> Response {
    let path = query.path.as_deref().unwrap_or(DEFAULT_PATH);
    let token = jar.get(SESSION_COOKIE).map(Cookie::value);
    let snapshot = context::resolve(state.identity.as_ref(), &state.profiles, token).await;

    let Some(identity) = snapshot.identity else {
        return Redirect::temporary(&format!("/login?redirect={path}")).into_response();
    };

    Json(NavResponse {
        email: identity.email,
        is_host: snapshot.is_host,
        items: menu_for(snapshot.is_host, path),
    })
    .into_response()
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
