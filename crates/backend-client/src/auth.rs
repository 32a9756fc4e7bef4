//! Authentication backend seam

use crate::types::{Credential, Persistence};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Callback invoked whenever the signed-in user changes
///
/// Receives the new credential, or `None` after a sign-out.
pub type AuthStateCallback = Arc<dyn Fn(Option<&Credential>) + Send + Sync>;

/// Authentication operations provided by the backend
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Start an anonymous (guest) session
    ///
    /// # Errors
    ///
    /// Returns an API error with `ErrorCode::OperationNotAllowed` when
    /// anonymous sign-in is disabled for the project.
    async fn sign_in_anonymously(&self) -> Result<Credential>;

    /// End the current session on the backend
    async fn sign_out(&self) -> Result<()>;

    /// The currently signed-in user, if any
    fn current_user(&self) -> Option<Credential>;

    /// Choose how long the backend keeps the session
    async fn set_persistence(&self, persistence: Persistence) -> Result<()>;

    /// Register an observer for sign-in and sign-out events
    fn on_auth_state_changed(&self, callback: AuthStateCallback);
}
