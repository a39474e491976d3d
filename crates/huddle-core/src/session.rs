//! Injectable session state.
//!
//! Credential and signed-in user live behind [`SessionStore`] rather than in
//! process-wide storage, so the HTTP layer, the chat session and tests all
//! depend on an interface. Changes are broadcast over a
//! [`tokio::sync::watch`] channel; subscribers always observe the latest
//! value and never a backlog.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::{ChatUser, UserId};

/// Account role of the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Job seeker.
    Candidate,
    /// Hiring company.
    Employer,
    /// Site administrator.
    Admin,
}

/// Signed-in user as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Account role, if assigned.
    #[serde(default)]
    pub role: Option<Role>,
}

impl SessionUser {
    /// Author descriptor used for messages this user sends.
    pub fn as_author(&self) -> ChatUser {
        ChatUser::new(self.id, self.name.clone())
    }
}

/// Bearer credential plus the user it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token.
    pub token: String,
    /// User the token was issued for. `None` if unknown.
    #[serde(default)]
    pub user: Option<SessionUser>,
}

impl Credential {
    /// Credential with no user information.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self { token: token.into(), user: None }
    }
}

/// Process-wide session state behind an interface.
pub trait SessionStore: Send + Sync {
    /// Current credential. `None` if signed out.
    fn credential(&self) -> Option<Credential>;

    /// Replace the credential and notify subscribers.
    fn set_credential(&self, credential: Credential);

    /// Remove the credential and notify subscribers.
    fn clear_credential(&self);

    /// Subscribe to credential changes.
    fn subscribe(&self) -> watch::Receiver<Option<Credential>>;

    /// Current bearer token. `None` if signed out.
    fn token(&self) -> Option<String> {
        self.credential().map(|c| c.token)
    }

    /// Current signed-in user. `None` if signed out or unknown.
    fn user(&self) -> Option<SessionUser> {
        self.credential().and_then(|c| c.user)
    }
}

/// In-memory [`SessionStore`].
#[derive(Debug)]
pub struct MemorySession {
    tx: watch::Sender<Option<Credential>>,
}

impl MemorySession {
    /// Create a signed-out session.
    pub fn new() -> Self {
        Self::with_credential(None)
    }

    /// Create a session holding the given credential.
    pub fn with_credential(credential: Option<Credential>) -> Self {
        let (tx, _rx) = watch::channel(credential);
        Self { tx }
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySession {
    fn credential(&self) -> Option<Credential> {
        self.tx.borrow().clone()
    }

    fn set_credential(&self, credential: Credential) {
        self.tx.send_replace(Some(credential));
    }

    fn clear_credential(&self) {
        // Skip the notification when already signed out.
        self.tx.send_if_modified(|current| current.take().is_some());
    }

    fn subscribe(&self) -> watch::Receiver<Option<Credential>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> SessionUser {
        SessionUser {
            id: UserId(5),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            role: Some(Role::Candidate),
        }
    }

    #[test]
    fn set_and_clear_credential() {
        let session = MemorySession::new();
        assert!(session.token().is_none());

        session.set_credential(Credential { token: "t1".into(), user: Some(alice()) });
        assert_eq!(session.token().as_deref(), Some("t1"));
        assert_eq!(session.user().map(|u| u.name), Some("Alice".into()));

        session.clear_credential();
        assert!(session.credential().is_none());
    }

    #[test]
    fn subscribers_observe_changes() {
        let session = MemorySession::new();
        let mut rx = session.subscribe();
        assert!(!rx.has_changed().unwrap());

        session.set_credential(Credential::bearer("t2"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().map(|c| c.token.as_str()), Some("t2"));

        session.clear_credential();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
    }

    #[test]
    fn clearing_signed_out_session_does_not_notify() {
        let session = MemorySession::new();
        let rx = session.subscribe();

        session.clear_credential();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn role_uses_lowercase_names() {
        let user: SessionUser = serde_json::from_str(
            r#"{"id": 1, "name": "Acme HR", "email": "hr@acme.test", "role": "employer"}"#,
        )
        .unwrap();
        assert_eq!(user.role, Some(Role::Employer));
        assert_eq!(user.as_author(), ChatUser::new(1, "Acme HR"));
    }
}
