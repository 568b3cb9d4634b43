use async_trait::async_trait;
use thiserror::Error;

use lesson_core::model::UserId;

/// Errors from session bootstrap.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("session bootstrap failed: {0}")]
    Bootstrap(String),
}

/// Identity collaborator.
///
/// The real implementation lives outside this core (anonymous sign-in,
/// token refresh, and the rest of the auth surface); the progression engine
/// only ever asks who is acting right now.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Identity of the acting user, if a session exists.
    async fn current_user(&self) -> Option<UserId>;

    /// Ensure a session exists, performing anonymous bootstrap if needed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if no session can be established.
    async fn ensure_session(&self) -> Result<UserId, AuthError>;
}

/// Fixed-identity provider for tests and prototyping.
#[derive(Debug, Clone, Copy)]
pub struct StaticAuth {
    user: UserId,
}

impl StaticAuth {
    #[must_use]
    pub fn new(user: UserId) -> Self {
        Self { user }
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn current_user(&self) -> Option<UserId> {
        Some(self.user)
    }

    async fn ensure_session(&self) -> Result<UserId, AuthError> {
        Ok(self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_auth_always_has_a_session() {
        let user = UserId::random();
        let auth = StaticAuth::new(user);
        assert_eq!(auth.current_user().await, Some(user));
        assert_eq!(auth.ensure_session().await.unwrap(), user);
    }
}
