//! Account registration flow
//!
//! Registration happens in two steps:
//!
//! 1. [`AccountDraft`] collects an email and username and caches them on the
//!    device so the next step can pick them up.
//! 2. [`ProfileSetup`] picks the public username and an optional avatar,
//!    writes the user's profile document and signs the user in.

use app_state::{SessionManager, SessionStateError, UserIdentity};
use backend_client::{
    avatar_path, AuthBackend, DocumentStore, FileStorage, Persistence, Uid, UserDocument,
    USERS_COLLECTION,
};
use rand::Rng;
use std::sync::Arc;
use storage::{keys, KvError, LocalStore};
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

/// Maximum username length, in grapheme clusters
pub const MAX_USER_NAME_LEN: usize = 10;

/// Registration error types
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A form field is missing or invalid
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Local storage error
    #[error("Storage error: {0}")]
    Storage(#[from] KvError),

    /// Backend error
    #[error("Backend error: {0}")]
    Backend(#[from] backend_client::Error),

    /// Session error
    #[error("Session error: {0}")]
    Session(#[from] SessionStateError),

    /// The backend has no signed-in user to attach the profile to
    #[error("No authenticated user")]
    NoAuthenticatedUser,

    /// Guest sessions cannot create a profile
    #[error("Anonymous sessions cannot register a profile")]
    AnonymousAccount,
}

/// Result type for registration operations
pub type Result<T> = std::result::Result<T, RegistrationError>;

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RegistrationError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

/// First registration step: email and username
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountDraft {
    /// Email address
    pub email: String,
    /// Username
    pub user_name: String,
}

impl AccountDraft {
    /// Create a draft
    pub fn new(email: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self { email: email.into(), user_name: user_name.into() }
    }

    /// Check that both fields are filled in
    pub fn validate(&self) -> Result<()> {
        require(&self.email, "email")?;
        require(&self.user_name, "username")
    }

    /// Validate the draft and cache it on the device
    ///
    /// # Errors
    ///
    /// - `RegistrationError::InvalidInput` - email or username is empty
    /// - `RegistrationError::Storage` - the values could not be saved
    pub async fn confirm(&self, store: &dyn LocalStore) -> Result<()> {
        self.validate()?;

        store.set_item(keys::REGISTRATION_EMAIL, &self.email).await?;
        store.set_item(keys::REGISTRATION_USER, &self.user_name).await?;

        tracing::debug!("registration draft cached");
        Ok(())
    }

    /// Load a previously cached draft
    pub async fn load(store: &dyn LocalStore) -> Result<Option<Self>> {
        let email = store.get_item(keys::REGISTRATION_EMAIL).await?;
        let user_name = store.get_item(keys::REGISTRATION_USER).await?;

        Ok(match (email, user_name) {
            (Some(email), Some(user_name)) => Some(Self { email, user_name }),
            _ => None,
        })
    }
}

/// Avatar picked from the device gallery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarImage {
    /// Encoded image bytes
    pub bytes: Vec<u8>,
    /// MIME type of the bytes
    pub content_type: String,
}

impl AvatarImage {
    /// Create an avatar image
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self { bytes, content_type: content_type.into() }
    }

    /// JPEG image
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/jpeg")
    }
}

/// Backend collaborators needed to finish registration
#[derive(Clone)]
pub struct RegistrationServices {
    /// Authentication backend
    pub auth: Arc<dyn AuthBackend>,
    /// Document store for the profile document
    pub documents: Arc<dyn DocumentStore>,
    /// File storage for the avatar
    pub files: Arc<dyn FileStorage>,
}

impl RegistrationServices {
    /// Use one backend object for every collaborator
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: AuthBackend + DocumentStore + FileStorage + 'static,
    {
        Self {
            auth: Arc::clone(&backend) as Arc<dyn AuthBackend>,
            documents: Arc::clone(&backend) as Arc<dyn DocumentStore>,
            files: backend as Arc<dyn FileStorage>,
        }
    }
}

/// Random four-digit discriminator, zero padded ("0000" to "9999")
///
/// Collisions are not checked.
pub fn generate_tag<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{:04}", rng.gen_range(0..10_000u32))
}

/// Second registration step: public profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSetup {
    /// Public username
    pub user_name: String,
    /// Optional avatar
    pub avatar: Option<AvatarImage>,
}

impl ProfileSetup {
    /// Create a profile setup without an avatar
    pub fn new(user_name: impl Into<String>) -> Self {
        Self { user_name: user_name.into(), avatar: None }
    }

    /// Attach an avatar
    pub fn with_avatar(mut self, avatar: AvatarImage) -> Self {
        self.avatar = Some(avatar);
        self
    }

    /// Check the username
    pub fn validate(&self) -> Result<()> {
        require(&self.user_name, "username")?;

        let len = self.user_name.trim().graphemes(true).count();
        if len > MAX_USER_NAME_LEN {
            return Err(RegistrationError::InvalidInput(format!(
                "username must be at most {} characters, got {}",
                MAX_USER_NAME_LEN, len
            )));
        }
        Ok(())
    }

    /// Write the profile document and sign the user in
    ///
    /// If the backend has no signed-in user the session is signed out and
    /// `RegistrationError::NoAuthenticatedUser` is returned so the caller can
    /// send the user back to the welcome screen.
    ///
    /// # Returns
    ///
    /// The identity of the freshly signed-in user
    pub async fn complete(
        &self,
        services: &RegistrationServices,
        session: &SessionManager,
    ) -> Result<UserIdentity> {
        self.validate()?;

        let Some(credential) = services.auth.current_user() else {
            tracing::warn!("registration finished without a signed-in user");
            if let Err(err) = session.sign_out().await {
                tracing::warn!(error = %err, "sign-out after failed registration also failed");
            }
            return Err(RegistrationError::NoAuthenticatedUser);
        };
        if credential.is_anonymous {
            return Err(RegistrationError::AnonymousAccount);
        }

        let tag = generate_tag(&mut rand::thread_rng());
        let mut doc = UserDocument::new(&credential.uid, self.user_name.trim(), tag);

        if let Some(url) = self.upload_avatar(services, &credential.uid).await? {
            doc = doc.with_image(url);
        }

        services
            .documents
            .set_document(USERS_COLLECTION, credential.uid.as_str(), doc.to_fields()?)
            .await?;
        services.auth.set_persistence(Persistence::Local).await?;

        tracing::info!(uid = %credential.uid, tag = %doc.tag, "profile created");

        let state = session.login(credential).await?;
        state.user().cloned().ok_or(RegistrationError::AnonymousAccount)
    }

    async fn upload_avatar(
        &self,
        services: &RegistrationServices,
        uid: &Uid,
    ) -> Result<Option<String>> {
        let Some(avatar) = &self.avatar else {
            return Ok(None);
        };
        if avatar.bytes.is_empty() {
            tracing::warn!("ignoring empty avatar image");
            return Ok(None);
        }

        let path = avatar_path(uid.as_str(), &format!("{}-avatar", self.user_name.trim()));
        services
            .files
            .put(&path, avatar.bytes.clone(), &avatar.content_type)
            .await?;
        Ok(Some(services.files.download_url(&path).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_state::{SessionPhase, SessionServices};
    use backend_client::{Credential, GoogleAuthConfig, MemoryBackend};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use storage::KvStore;

    struct Harness {
        backend: Arc<MemoryBackend>,
        local: Arc<KvStore>,
        session: SessionManager,
        services: RegistrationServices,
    }

    fn harness() -> Harness {
        let backend = Arc::new(MemoryBackend::new());
        let local = Arc::new(KvStore::in_memory().unwrap());
        let session = SessionManager::new(
            SessionServices::from_backend(Arc::clone(&backend), Arc::clone(&local) as Arc<dyn LocalStore>),
            GoogleAuthConfig::default(),
        );
        let services = RegistrationServices::from_backend(Arc::clone(&backend));
        Harness { backend, local, session, services }
    }

    fn sign_in(backend: &MemoryBackend, uid: &str) {
        backend.set_current_user(Some(Credential::registered(Uid::new(uid).unwrap())));
    }

    #[tokio::test]
    async fn test_draft_requires_both_fields() {
        let h = harness();

        for draft in [
            AccountDraft::new("", "memeiro"),
            AccountDraft::new("a@b.c", ""),
            AccountDraft::new("  ", "memeiro"),
        ] {
            let err = draft.confirm(h.local.as_ref()).await.unwrap_err();
            assert!(matches!(err, RegistrationError::InvalidInput(_)));
        }
        assert!(h.local.is_empty());
    }

    #[tokio::test]
    async fn test_draft_is_cached_and_loaded() {
        let h = harness();
        let draft = AccountDraft::new("a@b.c", "memeiro");

        draft.confirm(h.local.as_ref()).await.unwrap();

        assert_eq!(AccountDraft::load(h.local.as_ref()).await.unwrap(), Some(draft));
    }

    #[tokio::test]
    async fn test_draft_load_missing() {
        let h = harness();
        assert!(AccountDraft::load(h.local.as_ref()).await.unwrap().is_none());
    }

    #[test]
    fn test_generate_tag_is_four_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let tag = generate_tag(&mut rng);
            assert_eq!(tag.len(), 4);
            assert!(tag.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_user_name_length() {
        assert!(ProfileSetup::new("memeiro").validate().is_ok());
        assert!(ProfileSetup::new("😂😂😂😂😂😂😂😂😂😂").validate().is_ok());
        assert!(ProfileSetup::new("robertomemeiro").validate().is_err());
        assert!(ProfileSetup::new("").validate().is_err());
    }

    #[test]
    fn test_user_name_length_ignores_padding() {
        assert!(ProfileSetup::new("  abcdefghij ").validate().is_ok());
        assert!(ProfileSetup::new("  abcdefghijk ").validate().is_err());
    }

    #[tokio::test]
    async fn test_complete_padded_name_is_stored_trimmed() {
        let h = harness();
        sign_in(&h.backend, "u1");

        let user = ProfileSetup::new("  abcdefghij ").complete(&h.services, &h.session).await.unwrap();

        assert_eq!(user.user_name, "abcdefghij");
    }

    #[tokio::test]
    async fn test_complete_without_avatar() {
        let h = harness();
        sign_in(&h.backend, "u1");

        let user = ProfileSetup::new("memeiro").complete(&h.services, &h.session).await.unwrap();

        assert_eq!(user.user_name, "memeiro");
        assert_eq!(user.tag.len(), 4);
        assert!(user.avatar.is_none());

        let doc = h.backend.document("users", "u1").unwrap();
        assert_eq!(doc.get("userId").and_then(|v| v.as_str()), Some("u1"));
        assert!(!doc.contains_key("userImage"));
        assert_eq!(h.backend.persistence(), Persistence::Local);
        assert_eq!(h.session.snapshot().phase(), SessionPhase::Authenticated);
    }

    #[tokio::test]
    async fn test_complete_with_avatar() {
        let h = harness();
        sign_in(&h.backend, "u1");

        let user = ProfileSetup::new("memeiro")
            .with_avatar(AvatarImage::jpeg(vec![0xff, 0xd8]))
            .complete(&h.services, &h.session)
            .await
            .unwrap();

        assert_eq!(user.avatar.as_deref(), Some("memory://users/u1/memeiro-avatar"));
        let (bytes, content_type) = h.backend.file("users/u1/memeiro-avatar").unwrap();
        assert_eq!(bytes, vec![0xff, 0xd8]);
        assert_eq!(content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_complete_ignores_empty_avatar() {
        let h = harness();
        sign_in(&h.backend, "u1");

        let user = ProfileSetup::new("memeiro")
            .with_avatar(AvatarImage::jpeg(Vec::new()))
            .complete(&h.services, &h.session)
            .await
            .unwrap();

        assert!(user.avatar.is_none());
        assert!(h.backend.file("users/u1/memeiro-avatar").is_none());
    }

    #[tokio::test]
    async fn test_complete_without_user_signs_out() {
        let h = harness();
        h.local.set_item(keys::REGISTRATION_EMAIL, "a@b.c").await.unwrap();

        let err = ProfileSetup::new("memeiro").complete(&h.services, &h.session).await.unwrap_err();

        assert!(matches!(err, RegistrationError::NoAuthenticatedUser));
        assert_eq!(h.backend.sign_out_count(), 1);
        assert!(h.local.is_empty());
    }

    #[tokio::test]
    async fn test_complete_without_user_when_sign_out_fails() {
        let h = harness();
        h.backend.fail_next_auth_op(backend_client::ErrorCode::Unavailable);

        let err = ProfileSetup::new("memeiro").complete(&h.services, &h.session).await.unwrap_err();

        assert!(matches!(err, RegistrationError::NoAuthenticatedUser));
        assert!(!h.session.snapshot().is_signed());
    }

    #[tokio::test]
    async fn test_complete_rejects_anonymous() {
        let h = harness();
        h.backend.set_current_user(Some(Credential::anonymous(Uid::new("anon").unwrap())));

        let err = ProfileSetup::new("memeiro").complete(&h.services, &h.session).await.unwrap_err();

        assert!(matches!(err, RegistrationError::AnonymousAccount));
        assert!(h.backend.document("users", "anon").is_none());
    }

    #[tokio::test]
    async fn test_complete_write_failure() {
        let h = harness();
        sign_in(&h.backend, "u1");
        h.backend.fail_next_document_op(backend_client::ErrorCode::PermissionDenied);

        let err = ProfileSetup::new("memeiro").complete(&h.services, &h.session).await.unwrap_err();

        assert!(matches!(err, RegistrationError::Backend(_)));
        assert!(!h.session.snapshot().is_signed());
    }
}
