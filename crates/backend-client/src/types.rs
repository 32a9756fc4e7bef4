//! Typed payloads exchanged with the backend
//!
//! Everything the backend hands back is validated here, at the boundary,
//! so the rest of the workspace never sees half-populated records.

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Collection holding one document per registered user
pub const USERS_COLLECTION: &str = "users";

/// Document fields as returned by the document store
pub type Fields = serde_json::Map<String, Value>;

/// Stable user identifier assigned by the auth backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uid(String);

impl Uid {
    /// Create a uid, rejecting empty or whitespace-containing values
    pub fn new(uid: impl Into<String>) -> Result<Self> {
        let uid = uid.into();
        if uid.is_empty() {
            return Err(Error::InvalidInput("uid cannot be empty".to_string()));
        }
        if uid.chars().any(char::is_whitespace) {
            return Err(Error::InvalidInput(format!("uid contains whitespace: {:?}", uid)));
        }
        Ok(Self(uid))
    }

    /// Borrow the uid as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Uid {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Uid::new(value)
    }
}

impl From<Uid> for String {
    fn from(uid: Uid) -> Self {
        uid.0
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Credential produced by the auth backend after a successful sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// User id
    pub uid: Uid,
    /// Whether this is an anonymous (guest) session
    #[serde(default)]
    pub is_anonymous: bool,
    /// Email address, when the account has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Credential {
    /// Credential for a registered account
    pub fn registered(uid: Uid) -> Self {
        Self { uid, is_anonymous: false, email: None }
    }

    /// Credential for an anonymous session
    pub fn anonymous(uid: Uid) -> Self {
        Self { uid, is_anonymous: true, email: None }
    }

    /// Attach an email address
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// How long the backend keeps a signed-in session around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persistence {
    /// Survives app restarts
    Local,
    /// Cleared when the app process ends
    #[default]
    Session,
    /// Kept in memory only
    None,
}

/// Profile document stored under `users/{uid}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    /// Display name
    pub user_name: String,
    /// Four-digit discriminator
    pub tag: String,
    /// Owner uid, duplicated into the document at registration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Download URL of the avatar image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_image: Option<String>,
    /// Uids this user follows
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub following: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl UserDocument {
    /// Build a fresh document for a newly registered user
    pub fn new(uid: &Uid, user_name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            tag: tag.into(),
            user_id: Some(uid.to_string()),
            user_image: None,
            following: Vec::new(),
        }
    }

    /// Set the avatar download URL
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.user_image = Some(url.into());
        self
    }

    /// Parse and validate raw document fields
    ///
    /// # Errors
    ///
    /// - `Error::MalformedDocument` - a required field is missing or has the wrong type
    pub fn from_fields(id: &str, fields: &Fields) -> Result<Self> {
        let doc: UserDocument = serde_json::from_value(Value::Object(fields.clone())).map_err(
            |e| Error::MalformedDocument { id: id.to_string(), reason: e.to_string() },
        )?;

        if doc.user_name.is_empty() {
            return Err(Error::MalformedDocument {
                id: id.to_string(),
                reason: "userName is empty".to_string(),
            });
        }

        Ok(doc)
    }

    /// Serialize into document fields
    pub fn to_fields(&self) -> Result<Fields> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            other => Err(Error::InvalidInput(format!("expected an object, got {}", other))),
        }
    }
}
