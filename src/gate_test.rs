use std::sync::Arc;

use super::*;
use crate::state::test_helpers::{self, MockIdentity, MockProfiles};

// =============================================================================
// is_exempt
// =============================================================================

#[test]
fn api_and_asset_paths_are_exempt() {
    for path in ["/api/auth/me", "/api/dashboard/nav", "/assets/app.css", "/images/hero.jpg", "/favicon.ico"] {
        assert!(is_exempt(path), "expected {path} to be exempt");
    }
}

#[test]
fn page_paths_are_not_exempt() {
    for path in ["/", "/dashboard", "/login", "/search", "/listing/42"] {
        assert!(!is_exempt(path), "expected {path} to be gated");
    }
}

// =============================================================================
// classify
// =============================================================================

#[test]
fn protected_prefixes_classify_as_protected() {
    for path in [
        "/dashboard",
        "/dashboard/listings",
        "/add-listing",
        "/profile",
        "/profile/settings",
        "/messages",
        "/favorites/42",
    ] {
        assert_eq!(classify(path), RouteClass::Protected, "path {path}");
    }
}

#[test]
fn auth_only_prefixes_classify_as_auth_only() {
    for path in ["/login", "/login/reset", "/signup"] {
        assert_eq!(classify(path), RouteClass::AuthOnly, "path {path}");
    }
}

#[test]
fn everything_else_is_public() {
    for path in ["/", "/search", "/listing/42", "/about", "/auth/callback"] {
        assert_eq!(classify(path), RouteClass::Public, "path {path}");
    }
}

#[test]
fn classification_is_case_sensitive() {
    assert_eq!(classify("/Dashboard"), RouteClass::Public);
    assert_eq!(classify("/LOGIN"), RouteClass::Public);
}

// =============================================================================
// decide
// =============================================================================

#[test]
fn protected_without_session_redirects_to_root_with_backpointer() {
    let decision = decide("/dashboard/listings", RouteClass::Protected, false);
    assert_eq!(decision, GateDecision::Redirect("/?redirect=/dashboard/listings".into()));
}

#[test]
fn every_protected_prefix_redirects_when_signed_out() {
    for path in ["/dashboard", "/add-listing", "/profile", "/messages", "/favorites"] {
        let decision = decide(path, classify(path), false);
        assert_eq!(decision, GateDecision::Redirect(format!("/?redirect={path}")), "path {path}");
    }
}

#[test]
fn protected_with_session_passes() {
    assert_eq!(decide("/dashboard", RouteClass::Protected, true), GateDecision::Pass);
}

#[test]
fn auth_only_with_session_redirects_to_dashboard() {
    for path in ["/login", "/signup"] {
        let decision = decide(path, classify(path), true);
        assert_eq!(decision, GateDecision::Redirect("/dashboard".into()), "path {path}");
    }
}

#[test]
fn auth_only_without_session_passes() {
    assert_eq!(decide("/login", RouteClass::AuthOnly, false), GateDecision::Pass);
}

#[test]
fn public_passes_regardless_of_session() {
    assert_eq!(decide("/search", RouteClass::Public, false), GateDecision::Pass);
    assert_eq!(decide("/search", RouteClass::Public, true), GateDecision::Pass);
}

// =============================================================================
// resolve_session — fail-closed behavior
// =============================================================================

fn jar_with_token(token: &str) -> CookieJar {
    CookieJar::new().add(Cookie::new(SESSION_COOKIE, token.to_owned()))
}

#[tokio::test]
async fn no_provider_means_no_session() {
    let state = test_helpers::test_app_state();
    assert!(resolve_session(&state, &jar_with_token("test-token")).await.is_none());
}

#[tokio::test]
async fn missing_cookie_means_no_session() {
    let session = test_helpers::session_for("a@example.com");
    let state = test_helpers::test_app_state_with(
        Some(Arc::new(MockIdentity::Session(session))),
        Arc::new(MockProfiles::empty()),
    );
    assert!(resolve_session(&state, &CookieJar::new()).await.is_none());
}

#[tokio::test]
async fn valid_token_resolves_session() {
    let session = test_helpers::session_for("a@example.com");
    let state = test_helpers::test_app_state_with(
        Some(Arc::new(MockIdentity::Session(session))),
        Arc::new(MockProfiles::empty()),
    );
    let token = resolve_session(&state, &jar_with_token("test-token")).await;
    assert_eq!(token.as_deref(), Some("test-token"));
}

#[tokio::test]
async fn expired_token_resolves_signed_out() {
    let state = test_helpers::test_app_state_with(
        Some(Arc::new(MockIdentity::SignedOut)),
        Arc::new(MockProfiles::empty()),
    );
    assert!(resolve_session(&state, &jar_with_token("stale-token")).await.is_none());
}

#[tokio::test]
async fn session_check_error_fails_closed() {
    let state = test_helpers::test_app_state_with(
        Some(Arc::new(MockIdentity::Failing)),
        Arc::new(MockProfiles::empty()),
    );
    assert!(resolve_session(&state, &jar_with_token("test-token")).await.is_none());
}
