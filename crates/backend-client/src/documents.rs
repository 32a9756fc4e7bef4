//! Document store seam

use crate::types::Fields;
use crate::Result;
use async_trait::async_trait;

/// Keyed document storage provided by the backend
///
/// Writes either succeed or fail as a whole; there is no partial-write state.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document, returning `None` when it does not exist
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Fields>>;

    /// Create or replace a document
    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;

    /// Merge fields into an existing document
    ///
    /// # Errors
    ///
    /// Returns an API error with `ErrorCode::NotFound` if the document does not exist.
    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> Result<()>;
}
