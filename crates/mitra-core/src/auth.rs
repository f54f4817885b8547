//! Read-only view of the auth collaborator.
//!
//! The conversation core never logs users in or out; it only asks whether
//! someone is signed in and signals "require re-authentication" upward when
//! the backend rejects the session.

use mitra_types::auth::UserId;

/// Query side of the auth service.
///
/// Implementations live in mitra-infra (e.g., `LocalAuthService`).
pub trait AuthProvider: Send + Sync {
    fn current_user_id(&self) -> Option<UserId>;

    fn is_authenticated(&self) -> bool {
        self.current_user_id().is_some()
    }
}

impl<T: AuthProvider + ?Sized> AuthProvider for std::sync::Arc<T> {
    fn current_user_id(&self) -> Option<UserId> {
        (**self).current_user_id()
    }
}

/// Fixed auth state, for tests and single-user embeddings.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticAuth(pub Option<UserId>);

impl StaticAuth {
    pub fn signed_in() -> Self {
        Self(Some(UserId::new()))
    }

    pub fn signed_out() -> Self {
        Self(None)
    }
}

impl AuthProvider for StaticAuth {
    fn current_user_id(&self) -> Option<UserId> {
        self.0
    }
}
