//! File storage seam

use crate::Result;
use async_trait::async_trait;

/// Blob storage provided by the backend
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Upload bytes to `path`, replacing any existing object
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// Resolve a public download URL for an uploaded object
    async fn download_url(&self, path: &str) -> Result<String>;
}

/// Storage path of a user's avatar
pub fn avatar_path(uid: &str, file_name: &str) -> String {
    format!("users/{}/{}", uid, file_name)
}
