// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication collaborator boundary.
//!
//! The sync core never talks to a vendor auth SDK directly. It consumes an
//! [`AuthService`] handle that answers "who is signed in right now" and
//! notifies on sign-in/sign-out, so the real provider can be swapped for an
//! in-memory handle in tests.

use tokio::sync::watch;

/// The authenticated user identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Opaque user id assigned by the auth provider
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Principal {
    /// Principal with only an id, the common case in tests and tooling.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            display_name: None,
        }
    }
}

/// Current-principal query plus change notifications.
pub trait AuthService: Send + Sync {
    /// The currently signed-in principal, if any.
    fn current_principal(&self) -> Option<Principal>;

    /// A receiver that holds the current principal and wakes on every
    /// sign-in/sign-out transition.
    fn watch_principal(&self) -> watch::Receiver<Option<Principal>>;
}

/// Watch-channel backed [`AuthService`] implementation.
///
/// The embedding host wires this to its auth provider's state callbacks via
/// [`sign_in`](AuthHandle::sign_in) / [`sign_out`](AuthHandle::sign_out).
pub struct AuthHandle {
    tx: watch::Sender<Option<Principal>>,
}

impl AuthHandle {
    /// Create a handle with no signed-in principal.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Record a sign-in (or account switch) and notify observers.
    pub fn sign_in(&self, principal: Principal) {
        tracing::debug!(user_id = %principal.id, "Principal signed in");
        self.tx.send_replace(Some(principal));
    }

    /// Record a sign-out and notify observers.
    pub fn sign_out(&self) {
        tracing::debug!("Principal signed out");
        self.tx.send_replace(None);
    }
}

impl Default for AuthHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthService for AuthHandle {
    fn current_principal(&self) -> Option<Principal> {
        self.tx.borrow().clone()
    }

    fn watch_principal(&self) -> watch::Receiver<Option<Principal>> {
        self.tx.subscribe()
    }
}
