//! Route guarding for protected views.
//!
//! SYSTEM CONTEXT
//! ==============
//! Protected views must not mount until the session store has hydrated and
//! produced a definitive verdict. While the verdict is pending the guard shows
//! a neutral loading state and never navigates; afterwards it renders or sends
//! the user to the login route. The guard re-evaluates on every change of the
//! hydration flag or token, not only once at mount.

#[cfg(test)]
#[path = "route_guard_test.rs"]
mod route_guard_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::state::auth::AuthSession;
use crate::state::session::AuthStatus;

/// Routes reachable without a session.
pub const PUBLIC_ROUTES: &[&str] = &["/login"];

/// Hard navigation surface of the embedding front end.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn navigate(&self, path: &str);
}

/// In-process navigator that records where it was sent.
#[derive(Debug)]
pub struct MemoryNavigator {
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new(start: impl Into<String>) -> Self {
        Self { history: Mutex::new(vec![start.into()]) }
    }

    /// Every path visited, starting with the initial one.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Number of navigations performed after the initial path.
    #[must_use]
    pub fn navigations(&self) -> usize {
        self.lock().len().saturating_sub(1)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.lock().last().cloned().unwrap_or_default()
    }

    fn navigate(&self, path: &str) {
        self.lock().push(path.to_owned());
    }
}

/// What a protected view should do right now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Verdict pending: show a neutral loading state, do not navigate.
    Loading,
    /// No session: go to the contained login route.
    Redirect(String),
    Render,
}

/// Pure decision table from authentication status.
#[must_use]
pub fn decide(status: AuthStatus, login_route: &str) -> GuardDecision {
    match status {
        AuthStatus::Pending => GuardDecision::Loading,
        AuthStatus::Unauthenticated => GuardDecision::Redirect(login_route.to_owned()),
        AuthStatus::Authenticated => GuardDecision::Render,
    }
}

/// `true` for paths under a public route prefix.
#[must_use]
pub fn is_public_route(path: &str) -> bool {
    PUBLIC_ROUTES.iter().any(|route| path.starts_with(route))
}

/// Layout-level gate over the shared auth session.
#[derive(Clone)]
pub struct RouteGuard {
    auth: AuthSession,
    navigator: Arc<dyn Navigator>,
    login_route: String,
}

impl RouteGuard {
    pub fn new(auth: AuthSession, navigator: Arc<dyn Navigator>, login_route: impl Into<String>) -> Self {
        Self { auth, navigator, login_route: login_route.into() }
    }

    /// Decide for the navigator's current path and perform any redirect.
    pub fn evaluate(&self) -> GuardDecision {
        let path = self.navigator.current_path();
        if is_public_route(&path) || path.starts_with(&self.login_route) {
            return GuardDecision::Render;
        }

        let decision = decide(self.auth.status(), &self.login_route);
        if let GuardDecision::Redirect(target) = &decision {
            tracing::info!(from = %path, to = %target, "redirecting unauthenticated user");
            self.navigator.navigate(target);
        }
        decision
    }

    /// Wait until hydration has produced a verdict, then evaluate once.
    pub async fn wait_for_verdict(&self) -> GuardDecision {
        let mut rx = self.auth.subscribe();
        // An error means the session store is gone; evaluate whatever state we last saw.
        let _ = rx.wait_for(|snap| snap.hydrated).await;
        self.evaluate()
    }

    /// Evaluate now and again after every session change, reporting each
    /// decision to `on_decision`. Runs for as long as the session lives; drop
    /// the future to stop watching.
    pub async fn watch<F>(&self, mut on_decision: F)
    where
        F: FnMut(&GuardDecision),
    {
        let mut rx = self.auth.subscribe();
        loop {
            rx.borrow_and_update();
            on_decision(&self.evaluate());
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}
