use catalog_core::model::UserId;

use crate::error::ServiceError;

/// Who is signed in for the current client.
///
/// Set on login/logout by the composition root and passed by reference to
/// every operation that needs a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthContext {
    user: Option<UserId>,
}

impl AuthContext {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn signed_in(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    pub fn login(&mut self, user: UserId) {
        tracing::info!(user = %user, "user signed in");
        self.user = Some(user);
    }

    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            tracing::info!(user = %user, "user signed out");
        }
    }

    #[must_use]
    pub fn current_user(&self) -> Option<UserId> {
        self.user
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Unauthenticated` when nobody is signed in.
    pub fn require_user(&self) -> Result<UserId, ServiceError> {
        self.user.ok_or(ServiceError::Unauthenticated)
    }
}
