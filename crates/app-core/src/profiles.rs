//! User profiles and follows
//!
//! Profiles live in the `users` collection of the document store. The
//! profile screen shows either the signed-in user (no lookup needed, the
//! session already holds the identity) or a foreign user fetched by uid.

use app_state::UserIdentity;
use backend_client::{DocumentStore, ErrorCode, Fields, Uid, UserDocument, USERS_COLLECTION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Profile error types
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Backend error
    #[error("Backend error: {0}")]
    Backend(#[from] backend_client::Error),

    /// Profile not found
    #[error("Profile not found: {0}")]
    NotFound(String),

    /// Invalid user identifier
    #[error("Invalid user: {0}")]
    InvalidUser(String),

    /// No signed-in user to show or act for
    #[error("No signed-in user")]
    NoViewer,

    /// The operation is not available yet
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// Result type for profile operations
pub type Result<T> = std::result::Result<T, ProfileError>;

/// Profile as displayed on the profile screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
    /// User id
    pub uid: String,
    /// Display name
    pub user_name: String,
    /// Avatar download URL
    pub avatar: Option<String>,
    /// Four-digit discriminator
    pub tag: String,
    /// Whether this is someone other than the viewer
    pub is_foreign: bool,
}

impl ProfileView {
    /// Handle shown under the name, e.g. `memeiro#0420`
    pub fn handle(&self) -> String {
        format!("{}#{}", self.user_name, self.tag)
    }

    fn own(user: &UserIdentity) -> Self {
        Self {
            uid: user.uid.to_string(),
            user_name: user.user_name.clone(),
            avatar: user.avatar.clone(),
            tag: user.tag.clone(),
            is_foreign: false,
        }
    }

    fn foreign(uid: &str, doc: UserDocument) -> Self {
        Self {
            uid: uid.to_string(),
            user_name: doc.user_name,
            avatar: doc.user_image,
            tag: doc.tag,
            is_foreign: true,
        }
    }
}

/// Ordered set of followed uids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowedUsers(BTreeSet<String>);

impl FollowedUsers {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `uid` is followed
    pub fn contains(&self, uid: &str) -> bool {
        self.0.contains(uid)
    }

    /// Number of followed users
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nobody is followed
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in uid order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("following".to_string(), serde_json::json!(self.0));
        fields
    }
}

impl FromIterator<String> for FollowedUsers {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Profile lookups and follow management
pub struct ProfileService {
    documents: Arc<dyn DocumentStore>,
}

impl ProfileService {
    /// Create a new profile service
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    async fn fetch_document(&self, uid: &str) -> Result<Option<UserDocument>> {
        let Some(fields) = self.documents.get_document(USERS_COLLECTION, uid).await? else {
            return Ok(None);
        };
        Ok(Some(UserDocument::from_fields(uid, &fields)?))
    }

    /// Resolve the profile to display
    ///
    /// # Arguments
    ///
    /// * `viewer` - The signed-in user, if any
    /// * `target` - Uid of the profile to open; `None` opens the viewer's own
    ///
    /// # Errors
    ///
    /// - `ProfileError::NoViewer` - no target and nobody signed in
    /// - `ProfileError::NotFound` - the target has no profile document
    /// - `ProfileError::Backend` - the read failed or the document is malformed
    pub async fn load(
        &self,
        viewer: Option<&UserIdentity>,
        target: Option<&str>,
    ) -> Result<ProfileView> {
        let foreign = target.filter(|t| viewer.map_or(true, |v| v.uid.as_str() != *t));

        match (foreign, viewer) {
            (Some(target), _) => {
                let doc = self
                    .fetch_document(target)
                    .await?
                    .ok_or_else(|| ProfileError::NotFound(target.to_string()))?;
                tracing::debug!(uid = target, "loaded foreign profile");
                Ok(ProfileView::foreign(target, doc))
            }
            (None, Some(viewer)) => Ok(ProfileView::own(viewer)),
            (None, None) => Err(ProfileError::NoViewer),
        }
    }

    /// Read the set of users `viewer` follows
    ///
    /// A missing document or a missing `following` field yields an empty set.
    pub async fn fetch_following(&self, viewer: &Uid) -> Result<FollowedUsers> {
        Ok(self
            .fetch_document(viewer.as_str())
            .await?
            .map(|doc| doc.following.into_iter().collect())
            .unwrap_or_default())
    }

    /// Follow `target`
    ///
    /// The whole set is written back to the viewer's document, and `following`
    /// is only updated once the write succeeds.
    ///
    /// # Returns
    ///
    /// `true` if the target was newly followed, `false` if already followed
    ///
    /// # Errors
    ///
    /// - `ProfileError::InvalidUser` - empty target or self-follow
    /// - `ProfileError::NotFound` - the viewer has no profile document
    /// - `ProfileError::Backend` - the write failed
    pub async fn follow(
        &self,
        viewer: &Uid,
        target: &str,
        following: &mut FollowedUsers,
    ) -> Result<bool> {
        if target.trim().is_empty() {
            return Err(ProfileError::InvalidUser("target cannot be empty".to_string()));
        }
        if viewer.as_str() == target {
            return Err(ProfileError::InvalidUser("cannot follow yourself".to_string()));
        }
        if following.contains(target) {
            return Ok(false);
        }

        let mut next = following.clone();
        next.0.insert(target.to_string());

        match self
            .documents
            .update_document(USERS_COLLECTION, viewer.as_str(), next.to_fields())
            .await
        {
            Ok(()) => {}
            Err(err) if err.code() == Some(&ErrorCode::NotFound) => {
                return Err(ProfileError::NotFound(viewer.to_string()));
            }
            Err(err) => {
                tracing::warn!(viewer = %viewer, followed = target, error = %err, "follow failed");
                return Err(err.into());
            }
        }

        *following = next;
        tracing::info!(viewer = %viewer, followed = target, "followed user");
        Ok(true)
    }

    /// Stop following `target`
    ///
    /// Not available yet; always returns `ProfileError::Unsupported`.
    pub async fn unfollow(
        &self,
        _viewer: &Uid,
        _target: &str,
        _following: &mut FollowedUsers,
    ) -> Result<bool> {
        Err(ProfileError::Unsupported("unfollow"))
    }
}
