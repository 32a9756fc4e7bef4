//! Session state management
//!
//! [`SessionManager`] is the single writer of [`SessionState`]: who is using
//! the app and how (anonymously, with a registered account, or not at all).
//! Screens never mutate the state themselves; they hold a reference to the
//! manager and either read a snapshot or subscribe to transitions.
//!
//! # State machine
//!
//! ```text
//! LoggedOut ──login*──▶ Loading ──ok──▶ Authenticated | Anonymous
//!     ▲                    │
//!     └──────── error ─────┘          (any) ──sign_out──▶ LoggedOut
//! ```
//!
//! Every operation resolves to a `Result`; a failed login settles back in
//! `LoggedOut` instead of leaving the state in `Loading`.

use backend_client::{
    AuthBackend, Credential, DocumentStore, FederatedLogin, FederatedOutcome, GoogleAuthConfig,
    Uid, UserDocument, USERS_COLLECTION,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{KvError, LocalStore};
use tokio::sync::watch;

/// Session-related errors
#[derive(Debug, thiserror::Error)]
pub enum SessionStateError {
    /// Backend error
    #[error("Backend error: {0}")]
    Backend(#[from] backend_client::Error),

    /// Local storage error
    #[error("Local storage error: {0}")]
    Storage(#[from] KvError),

    /// The signed-in user has no profile document
    #[error("Profile not found for user {0}")]
    ProfileNotFound(Uid),

    /// Anonymous sign-in is disabled on the backend
    #[error("Anonymous sign-in is disabled")]
    AnonymousSignInDisabled,

    /// The federated login flow failed
    #[error("Federated login failed: {0}")]
    Federated(#[source] backend_client::Error),
}

/// Result type for session state operations
pub type Result<T> = std::result::Result<T, SessionStateError>;

/// Identity of a registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable user id
    pub uid: Uid,
    /// Display name
    pub user_name: String,
    /// Four-digit discriminator assigned at registration
    pub tag: String,
    /// Avatar download URL
    pub avatar: Option<String>,
}

impl UserIdentity {
    /// Build an identity from a validated profile document
    pub fn from_document(uid: Uid, doc: UserDocument) -> Self {
        Self { uid, user_name: doc.user_name, tag: doc.tag, avatar: doc.user_image }
    }
}

/// Coarse session phase derived from [`SessionState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Nobody is signed in
    LoggedOut,
    /// A sign-in is in flight
    Loading,
    /// Signed in as a guest
    Anonymous,
    /// Signed in with a registered account
    Authenticated,
}

/// Process-wide session record
///
/// Fields are private so a value can only be built through the constructors
/// below, which keep `signed` implying `is_anonymous || user.is_some()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    signed: bool,
    user: Option<UserIdentity>,
    loading: bool,
    is_anonymous: bool,
}

impl SessionState {
    /// State at process start: logged out, waiting for the first auth check
    pub fn starting() -> Self {
        Self { signed: false, user: None, loading: true, is_anonymous: false }
    }

    /// Logged out and idle
    pub fn logged_out() -> Self {
        Self { signed: false, user: None, loading: false, is_anonymous: false }
    }

    /// A sign-in is in flight
    pub fn loading(is_anonymous: bool) -> Self {
        Self { signed: false, user: None, loading: true, is_anonymous }
    }

    /// Signed in as a guest
    pub fn anonymous() -> Self {
        Self { signed: true, user: None, loading: false, is_anonymous: true }
    }

    /// Signed in with a registered account
    pub fn authenticated(user: UserIdentity) -> Self {
        Self { signed: true, user: Some(user), loading: false, is_anonymous: false }
    }

    /// Whether someone is signed in
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// The signed-in registered user
    pub fn user(&self) -> Option<&UserIdentity> {
        self.user.as_ref()
    }

    /// Whether a sign-in is in flight
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the session is (or is becoming) anonymous
    pub fn is_anonymous(&self) -> bool {
        self.is_anonymous
    }

    /// Current phase
    pub fn phase(&self) -> SessionPhase {
        match (self.signed, self.is_anonymous, self.loading) {
            (true, true, _) => SessionPhase::Anonymous,
            (true, false, _) => SessionPhase::Authenticated,
            (false, _, true) => SessionPhase::Loading,
            (false, _, false) => SessionPhase::LoggedOut,
        }
    }
}

/// External collaborators the session manager talks to
#[derive(Clone)]
pub struct SessionServices {
    /// Authentication backend
    pub auth: Arc<dyn AuthBackend>,
    /// Document store holding user profiles
    pub documents: Arc<dyn DocumentStore>,
    /// Federated (Google) login flow
    pub federated: Arc<dyn FederatedLogin>,
    /// On-device storage cleared on sign-out
    pub local: Arc<dyn LocalStore>,
}

impl SessionServices {
    /// Use one backend object for auth, documents and federated login
    pub fn from_backend<B>(backend: Arc<B>, local: Arc<dyn LocalStore>) -> Self
    where
        B: AuthBackend + DocumentStore + FederatedLogin + 'static,
    {
        Self {
            auth: Arc::clone(&backend) as Arc<dyn AuthBackend>,
            documents: Arc::clone(&backend) as Arc<dyn DocumentStore>,
            federated: backend as Arc<dyn FederatedLogin>,
            local,
        }
    }
}

/// Owner of the session lifecycle
///
/// Create one per process and hand it (usually behind an `Arc`) to every
/// screen that needs to know who is signed in.
pub struct SessionManager {
    services: SessionServices,
    google: GoogleAuthConfig,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Create a new session manager in the starting state
    ///
    /// # Arguments
    ///
    /// * `services` - Backend collaborators
    /// * `google` - OAuth configuration for [`SessionManager::sign_in_with_google`]
    pub fn new(services: SessionServices, google: GoogleAuthConfig) -> Self {
        let (state, _) = watch::channel(SessionState::starting());
        Self { services, google, state }
    }

    /// Current session state
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// The signed-in registered user, if any
    pub fn current_user(&self) -> Option<UserIdentity> {
        self.state.borrow().user.clone()
    }

    /// Receive every subsequent state transition
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn transition(&self, next: SessionState) -> SessionState {
        tracing::debug!(phase = ?next.phase(), "session transition");
        self.state.send_replace(next.clone());
        next
    }

    /// Settle the starting state from whatever session the backend remembers
    ///
    /// If the backend reports a signed-in user, this runs [`SessionManager::login`]
    /// with it; otherwise the state becomes `LoggedOut`.
    pub async fn restore(&self) -> Result<SessionState> {
        match self.services.auth.current_user() {
            Some(credential) => self.login(credential).await,
            None => Ok(self.transition(SessionState::logged_out())),
        }
    }

    /// Sign in with a credential produced by the auth backend
    ///
    /// Anonymous credentials (or any credential while the manager is already in
    /// anonymous mode) sign in without touching the document store. Otherwise
    /// exactly one profile read is made for the credential's uid.
    ///
    /// # Errors
    ///
    /// - `SessionStateError::ProfileNotFound` - the user has no profile document
    /// - `SessionStateError::Backend` - the read failed or the document is malformed
    ///
    /// On error the state is `LoggedOut`.
    pub async fn login(&self, credential: Credential) -> Result<SessionState> {
        let anonymous_mode = self.state.borrow().is_anonymous;

        if credential.is_anonymous || anonymous_mode {
            self.transition(SessionState::loading(true));
            tracing::info!(uid = %credential.uid, "signed in anonymously");
            return Ok(self.transition(SessionState::anonymous()));
        }

        self.transition(SessionState::loading(false));

        match self.fetch_identity(&credential.uid).await {
            Ok(user) => {
                tracing::info!(uid = %user.uid, user_name = %user.user_name, "signed in");
                Ok(self.transition(SessionState::authenticated(user)))
            }
            Err(err) => {
                tracing::warn!(uid = %credential.uid, error = %err, "login failed");
                self.transition(SessionState::logged_out());
                Err(err)
            }
        }
    }

    async fn fetch_identity(&self, uid: &Uid) -> Result<UserIdentity> {
        let fields = self
            .services
            .documents
            .get_document(USERS_COLLECTION, uid.as_str())
            .await?
            .ok_or_else(|| SessionStateError::ProfileNotFound(uid.clone()))?;

        let doc = UserDocument::from_fields(uid.as_str(), &fields)?;
        Ok(UserIdentity::from_document(uid.clone(), doc))
    }

    /// Start a guest session
    ///
    /// # Errors
    ///
    /// - `SessionStateError::AnonymousSignInDisabled` - the backend has anonymous sign-in turned off
    /// - `SessionStateError::Backend` - any other backend failure
    ///
    /// On error the previous state is restored unchanged.
    pub async fn login_anonymously(&self) -> Result<SessionState> {
        let previous = self.snapshot();
        self.transition(SessionState::loading(true));

        match self.services.auth.sign_in_anonymously().await {
            Ok(credential) => self.login(credential).await,
            Err(err) if err.is_operation_not_allowed() => {
                tracing::warn!("anonymous sign-in is disabled on the backend");
                self.transition(previous);
                Err(SessionStateError::AnonymousSignInDisabled)
            }
            Err(err) => {
                tracing::warn!(error = %err, "anonymous sign-in failed");
                self.transition(previous);
                Err(err.into())
            }
        }
    }

    /// Sign out locally and on the backend
    ///
    /// The local store is cleared first, then the state is reset to
    /// `LoggedOut`, then the backend session is ended. The state is reset even
    /// if either call fails; the first failure is returned.
    pub async fn sign_out(&self) -> Result<()> {
        let cleared = self.services.local.clear().await;
        if let Err(err) = &cleared {
            tracing::warn!(error = %err, "failed to clear local store");
        }

        self.transition(SessionState::logged_out());

        let remote = self.services.auth.sign_out().await;
        if let Err(err) = &remote {
            tracing::warn!(error = %err, "backend sign-out failed");
        }

        cleared?;
        remote?;
        Ok(())
    }

    /// Run the interactive Google login flow
    ///
    /// This does not touch the session state; feed the resulting credential
    /// into [`SessionManager::login`] once the backend has exchanged the token.
    pub async fn sign_in_with_google(&self) -> Result<FederatedOutcome> {
        self.services.federated.log_in(&self.google).await.map_err(|err| {
            tracing::warn!(error = %err, "google login failed");
            SessionStateError::Federated(err)
        })
    }
}
