//! Auth context — reactive `{identity, role, loading}` state.
//!
//! DESIGN
//! ======
//! No global singleton: a context is mounted per consumer from the provider
//! and store injected through `AppState`. The derivation rule is a one-shot
//! `resolve` (session check, then conditional profile lookup); mounting wraps
//! it in a watch channel plus a background task that re-derives on every
//! session-change broadcast.
//!
//! ORDERING
//! ========
//! A snapshot with `loading: false` is published only after both the identity
//! check and the profile lookup have settled. Consumers polling the watch
//! side can rely on that to avoid flashing the wrong menu.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::warn;

use super::identity::{Identity, IdentityProvider};
use super::profile::ProfileStore;
use crate::state::AppState;

/// Session lifecycle notifications fanned out to mounted contexts.
#[derive(Debug, Clone)]
pub enum SessionChange {
    SignedIn { access_token: String },
    Refreshed { access_token: String },
    SignedOut,
}

/// What the component tree reads: the cached identity, the resolved role
/// flag, and whether derivation is still in flight.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuthSnapshot {
    pub identity: Option<Identity>,
    pub is_host: bool,
    pub loading: bool,
}

impl AuthSnapshot {
    #[must_use]
    pub fn loading() -> Self {
        Self { identity: None, is_host: false, loading: true }
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self { identity: None, is_host: false, loading: false }
    }
}

/// One-shot auth derivation. Every failure mode degrades to the lesser
/// privilege: a failed session check reads as signed out, a failed or empty
/// profile lookup reads as guest. The returned snapshot is always settled.
pub async fn resolve(
    identity: Option<&Arc<dyn IdentityProvider>>,
    profiles: &Arc<dyn ProfileStore>,
    access_token: Option<&str>,
) -> AuthSnapshot {
    let (Some(provider), Some(token)) = (identity, access_token) else {
        return AuthSnapshot::signed_out();
    };
    if token.is_empty() {
        return AuthSnapshot::signed_out();
    }

    let session = match provider.current_session(token).await {
        Ok(Some(session)) => session,
        Ok(None) => return AuthSnapshot::signed_out(),
        Err(e) => {
            warn!(error = %e, "session check failed; treating as signed out");
            return AuthSnapshot::signed_out();
        }
    };

    let is_host = match profiles.fetch(session.identity.id).await {
        Ok(Some(profile)) => profile.is_host,
        Ok(None) => false,
        Err(e) => {
            warn!(error = %e, id = %session.identity.id, "profile lookup failed; defaulting to guest");
            false
        }
    };

    AuthSnapshot { identity: Some(session.identity), is_host, loading: false }
}

/// A mounted auth context: the watch side of the snapshot plus the task
/// driving it. Dropping the context aborts the task, which releases its
/// session-events subscription on every exit path.
pub struct AuthContext {
    rx: watch::Receiver<AuthSnapshot>,
    task: JoinHandle<()>,
}

impl AuthContext {
    /// Mount a context for the given access token. The initial snapshot is
    /// `loading: true`; the settled state follows once derivation completes.
    #[must_use]
    pub fn mount(state: &AppState, access_token: Option<String>) -> Self {
        let (tx, rx) = watch::channel(AuthSnapshot::loading());
        // Subscribe before spawning so no event published after mount returns
        // can be missed.
        let mut events = state.session_events.subscribe();
        let identity = state.identity.clone();
        let profiles = state.profiles.clone();

        let task = tokio::spawn(async move {
            let mut token = access_token;
            let snapshot = resolve(identity.as_ref(), &profiles, token.as_deref()).await;
            if tx.send(snapshot).is_err() {
                return;
            }

            loop {
                let change = match events.recv().await {
                    Ok(change) => change,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "auth context lagged behind session events; re-deriving");
                        let snapshot = resolve(identity.as_ref(), &profiles, token.as_deref()).await;
                        if tx.send(snapshot).is_err() {
                            return;
                        }
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                };

                let snapshot = match change {
                    // Sign-out needs no round-trip: identity and role clear
                    // immediately.
                    SessionChange::SignedOut => {
                        token = None;
                        AuthSnapshot::signed_out()
                    }
                    SessionChange::SignedIn { access_token } | SessionChange::Refreshed { access_token } => {
                        token = Some(access_token);
                        resolve(identity.as_ref(), &profiles, token.as_deref()).await
                    }
                };

                if tx.send(snapshot).is_err() {
                    return;
                }
            }
        });

        Self { rx, task }
    }

    /// Watch side for consumers reacting to snapshot changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<AuthSnapshot> {
        self.rx.clone()
    }
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
