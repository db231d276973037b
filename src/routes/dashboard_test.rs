use std::sync::Arc;

use super::*;
use axum::http::StatusCode;
use crate::state::test_helpers::{self, MockIdentity, MockProfiles};

// =============================================================================
// menu contents
// =============================================================================

#[test]
fn host_menu_includes_listing_management() {
    let hrefs: Vec<&str> = host_menu().iter().map(|m| m.href).collect();
    assert!(hrefs.contains(&"/add-listing"));
    assert!(hrefs.contains(&"/dashboard/listings"));
    assert!(hrefs.contains(&"/dashboard/bookings"));
    assert!(!hrefs.contains(&"/favorites"));
}

#[test]
fn guest_menu_includes_search_and_favorites() {
    let hrefs: Vec<&str> = guest_menu().iter().map(|m| m.href).collect();
    assert!(hrefs.contains(&"/search"));
    assert!(hrefs.contains(&"/favorites"));
    assert!(!hrefs.contains(&"/add-listing"));
}

#[test]
fn both_menus_share_common_entries() {
    for menu in [host_menu(), guest_menu()] {
        let hrefs: Vec<&str> = menu.iter().map(|m| m.href).collect();
        assert!(hrefs.contains(&"/dashboard"));
        assert!(hrefs.contains(&"/messages"));
        assert!(hrefs.contains(&"/profile"));
    }
}

// =============================================================================
// active highlighting
// =============================================================================

#[test]
fn active_entry_matches_path_exactly() {
    let items = menu_for(true, "/dashboard/listings");
    let active: Vec<&str> = items.iter().filter(|m| m.active).map(|m| m.href).collect();
    assert_eq!(active, vec!["/dashboard/listings"]);
}

#[test]
fn overview_is_not_highlighted_for_subpaths() {
    let items = menu_for(true, "/dashboard/bookings");
    let overview = items.iter().find(|m| m.href == "/dashboard").unwrap();
    assert!(!overview.active);
}

#[test]
fn unknown_path_highlights_nothing() {
    let items = menu_for(false, "/listing/42");
    assert!(items.iter().all(|m| !m.active));
}

#[test]
fn trailing_slash_does_not_match() {
    let items = menu_for(false, "/dashboard/");
    assert!(items.iter().all(|m| !m.active));
}

// =============================================================================
// nav handler
// =============================================================================

#[tokio::test]
async fn nav_signed_out_redirects_to_login_with_backpointer() {
    let state = test_helpers::test_app_state();
    let response = nav(State(state), CookieJar::new(), Query(NavQuery { path: Some("/favorites".into()) })).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get("location").and_then(|v| v.to_str().ok()),
        Some("/login?redirect=/favorites")
    );
}

#[tokio::test]
async fn nav_defaults_backpointer_to_dashboard() {
    let state = test_helpers::test_app_state();
    let response = nav(State(state), CookieJar::new(), Query(NavQuery { path: None })).await;
    assert_eq!(
        response.headers().get("location").and_then(|v| v.to_str().ok()),
        Some("/login?redirect=/dashboard")
    );
}

#[tokio::test]
async fn nav_returns_host_model_for_hosts() {
    let session = test_helpers::session_for("host@example.com");
    let profile = test_helpers::host_profile(&session.identity);
    let state = test_helpers::test_app_state_with(
        Some(Arc::new(MockIdentity::Session(session))),
        Arc::new(MockProfiles::with(vec![profile])),
    );
    let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "test-token"));

    let response = nav(State(state), jar, Query(NavQuery { path: Some("/dashboard".into()) })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["is_host"], true);
    assert_eq!(body["email"], "host@example.com");

    let items = body["items"].as_array().unwrap();
    assert!(items.iter().any(|m| m["href"] == "/add-listing"));
    let active: Vec<&str> = items
        .iter()
        .filter(|m| m["active"] == true)
        .filter_map(|m| m["href"].as_str())
        .collect();
    assert_eq!(active, vec!["/dashboard"]);
}

#[tokio::test]
async fn nav_returns_guest_model_without_profile_row() {
    let session = test_helpers::session_for("guest@example.com");
    let state = test_helpers::test_app_state_with(
        Some(Arc::new(MockIdentity::Session(session))),
        Arc::new(MockProfiles::empty()),
    );
    let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "test-token"));

    let response = nav(State(state), jar, Query(NavQuery { path: Some("/favorites".into()) })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["is_host"], false);
    let items = body["items"].as_array().unwrap();
    assert!(items.iter().any(|m| m["href"] == "/favorites"));
    assert!(items.iter().all(|m| m["href"] != "/add-listing"));
}
