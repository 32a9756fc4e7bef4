//! In-memory backend
//!
//! Implements every backend seam against process memory. Used by the test
//! suites across the workspace and for running screens without a network.
//! Document reads are counted so callers can assert how many round trips an
//! operation made.

use crate::auth::{AuthBackend, AuthStateCallback};
use crate::documents::DocumentStore;
use crate::federated::{FederatedLogin, FederatedOutcome, GoogleAuthConfig};
use crate::files::FileStorage;
use crate::types::{Credential, Fields, Persistence, Uid};
use crate::{Error, ErrorCode, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

type DocKey = (String, String);

/// Scripted result of the next federated login
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FederatedScript {
    /// Return this outcome
    Outcome(FederatedOutcome),
    /// Fail with this message
    Fail(String),
}

struct Inner {
    documents: HashMap<DocKey, Fields>,
    reads: HashMap<DocKey, usize>,
    files: HashMap<String, (Vec<u8>, String)>,
    current_user: Option<Credential>,
    anonymous_enabled: bool,
    next_anonymous: u64,
    persistence: Persistence,
    fail_next: Option<ErrorCode>,
    fail_next_auth: Option<ErrorCode>,
    federated: FederatedScript,
    sign_outs: usize,
}

/// Backend that keeps all state in memory
pub struct MemoryBackend {
    inner: Mutex<Inner>,
    callbacks: Mutex<Vec<AuthStateCallback>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty backend with anonymous sign-in enabled
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                documents: HashMap::new(),
                reads: HashMap::new(),
                files: HashMap::new(),
                current_user: None,
                anonymous_enabled: true,
                next_anonymous: 1,
                persistence: Persistence::default(),
                fail_next: None,
                fail_next_auth: None,
                federated: FederatedScript::Outcome(FederatedOutcome::Cancelled),
                sign_outs: 0,
            }),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Seed a document
    pub fn with_document(self, collection: &str, id: &str, fields: Fields) -> Self {
        self.insert_document(collection, id, fields);
        self
    }

    /// Seed or replace a document
    pub fn insert_document(&self, collection: &str, id: &str, fields: Fields) {
        self.inner
            .lock()
            .documents
            .insert((collection.to_string(), id.to_string()), fields);
    }

    /// Current contents of a document, without counting a read
    pub fn document(&self, collection: &str, id: &str) -> Option<Fields> {
        self.inner
            .lock()
            .documents
            .get(&(collection.to_string(), id.to_string()))
            .cloned()
    }

    /// Number of reads issued for one document
    pub fn read_count(&self, collection: &str, id: &str) -> usize {
        self.inner
            .lock()
            .reads
            .get(&(collection.to_string(), id.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Number of document reads issued in total
    pub fn total_reads(&self) -> usize {
        self.inner.lock().reads.values().sum()
    }

    /// Enable or disable anonymous sign-in
    pub fn set_anonymous_enabled(&self, enabled: bool) {
        self.inner.lock().anonymous_enabled = enabled;
    }

    /// Make the next document operation fail with `code`
    pub fn fail_next_document_op(&self, code: ErrorCode) {
        self.inner.lock().fail_next = Some(code);
    }

    /// Make the next auth operation (anonymous sign-in, sign-out or
    /// persistence change) fail with `code`
    ///
    /// A failed sign-out still drops the local user, like the REST client.
    pub fn fail_next_auth_op(&self, code: ErrorCode) {
        self.inner.lock().fail_next_auth = Some(code);
    }

    /// Replace the signed-in user without notifying observers
    pub fn set_current_user(&self, credential: Option<Credential>) {
        self.inner.lock().current_user = credential;
    }

    /// Script the result of the next federated login
    pub fn set_federated(&self, script: FederatedScript) {
        self.inner.lock().federated = script;
    }

    /// Persistence mode last requested
    pub fn persistence(&self) -> Persistence {
        self.inner.lock().persistence
    }

    /// Uploaded file bytes and content type
    pub fn file(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.inner.lock().files.get(path).cloned()
    }

    /// Number of backend sign-outs performed
    pub fn sign_out_count(&self) -> usize {
        self.inner.lock().sign_outs
    }

    fn take_failure(&self) -> Result<()> {
        match self.inner.lock().fail_next.take() {
            Some(code) => Err(Error::api(code, "injected failure")),
            None => Ok(()),
        }
    }

    fn take_auth_failure(&self) -> Result<()> {
        match self.inner.lock().fail_next_auth.take() {
            Some(code) => Err(Error::api(code, "injected auth failure")),
            None => Ok(()),
        }
    }

    fn notify(&self, credential: Option<&Credential>) {
        let callbacks = self.callbacks.lock().clone();
        for callback in callbacks {
            callback(credential);
        }
    }
}

#[async_trait]
impl AuthBackend for MemoryBackend {
    async fn sign_in_anonymously(&self) -> Result<Credential> {
        self.take_auth_failure()?;
        let credential = {
            let mut inner = self.inner.lock();
            if !inner.anonymous_enabled {
                return Err(Error::api(
                    ErrorCode::OperationNotAllowed,
                    "anonymous sign-in is disabled",
                ));
            }
            let uid = Uid::new(format!("anon-{}", inner.next_anonymous))?;
            inner.next_anonymous += 1;
            let credential = Credential::anonymous(uid);
            inner.current_user = Some(credential.clone());
            credential
        };

        self.notify(Some(&credential));
        Ok(credential)
    }

    async fn sign_out(&self) -> Result<()> {
        let result = self.take_auth_failure();
        {
            let mut inner = self.inner.lock();
            inner.current_user = None;
            inner.sign_outs += 1;
        }
        self.notify(None);
        result
    }

    fn current_user(&self) -> Option<Credential> {
        self.inner.lock().current_user.clone()
    }

    async fn set_persistence(&self, persistence: Persistence) -> Result<()> {
        self.take_auth_failure()?;
        self.inner.lock().persistence = persistence;
        Ok(())
    }

    fn on_auth_state_changed(&self, callback: AuthStateCallback) {
        self.callbacks.lock().push(callback);
    }
}

#[async_trait]
impl DocumentStore for MemoryBackend {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Fields>> {
        let key = (collection.to_string(), id.to_string());
        *self.inner.lock().reads.entry(key.clone()).or_insert(0) += 1;
        self.take_failure()?;
        Ok(self.inner.lock().documents.get(&key).cloned())
    }

    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        self.take_failure()?;
        self.insert_document(collection, id, fields);
        Ok(())
    }

    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        self.take_failure()?;
        let mut inner = self.inner.lock();
        let existing = inner
            .documents
            .get_mut(&(collection.to_string(), id.to_string()))
            .ok_or_else(|| {
                Error::api(ErrorCode::NotFound, format!("{}/{} does not exist", collection, id))
            })?;
        existing.extend(fields);
        Ok(())
    }
}

#[async_trait]
impl FileStorage for MemoryBackend {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        self.inner
            .lock()
            .files
            .insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String> {
        if self.inner.lock().files.contains_key(path) {
            Ok(format!("memory://{}", path))
        } else {
            Err(Error::api(ErrorCode::NotFound, format!("no file at {}", path)))
        }
    }
}

#[async_trait]
impl FederatedLogin for MemoryBackend {
    async fn log_in(&self, _config: &GoogleAuthConfig) -> Result<FederatedOutcome> {
        match self.inner.lock().federated.clone() {
            FederatedScript::Outcome(outcome) => Ok(outcome),
            FederatedScript::Fail(message) => Err(Error::api(ErrorCode::Other("federated".into()), message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_document_round_trip_counts_reads() {
        let backend = MemoryBackend::new();
        assert!(backend.get_document("users", "u1").await.unwrap().is_none());

        backend
            .set_document("users", "u1", fields(json!({"userName": "a"})))
            .await
            .unwrap();
        let doc = backend.get_document("users", "u1").await.unwrap().unwrap();

        assert_eq!(doc.get("userName"), Some(&json!("a")));
        assert_eq!(backend.read_count("users", "u1"), 2);
        assert_eq!(backend.total_reads(), 2);
    }

    #[tokio::test]
    async fn test_update_merges_and_requires_existing() {
        let backend = MemoryBackend::new()
            .with_document("users", "u1", fields(json!({"userName": "a", "tag": "1"})));

        backend
            .update_document("users", "u1", fields(json!({"tag": "2"})))
            .await
            .unwrap();
        let doc = backend.document("users", "u1").unwrap();
        assert_eq!(doc.get("userName"), Some(&json!("a")));
        assert_eq!(doc.get("tag"), Some(&json!("2")));

        let err = backend
            .update_document("users", "missing", Fields::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(&ErrorCode::NotFound));
    }

    #[tokio::test]
    async fn test_anonymous_sign_in_disabled() {
        let backend = MemoryBackend::new();
        backend.set_anonymous_enabled(false);

        let err = backend.sign_in_anonymously().await.unwrap_err();
        assert!(err.is_operation_not_allowed());
        assert!(backend.current_user().is_none());
    }

    #[tokio::test]
    async fn test_auth_observers_fire() {
        let backend = MemoryBackend::new();
        let events = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&events);
        backend.on_auth_state_changed(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let cred = backend.sign_in_anonymously().await.unwrap();
        assert!(cred.is_anonymous);
        backend.sign_out().await.unwrap();

        assert_eq!(events.load(Ordering::SeqCst), 2);
        assert_eq!(backend.sign_out_count(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_applies_once() {
        let backend = MemoryBackend::new();
        backend.fail_next_document_op(ErrorCode::Unavailable);

        assert!(backend.get_document("users", "u1").await.is_err());
        assert!(backend.get_document("users", "u1").await.is_ok());
    }

    #[tokio::test]
    async fn test_injected_auth_failure() {
        let backend = MemoryBackend::new();
        backend.fail_next_auth_op(ErrorCode::Unavailable);

        let err = backend.sign_in_anonymously().await.unwrap_err();
        assert_eq!(err.code(), Some(&ErrorCode::Unavailable));
        assert!(backend.current_user().is_none());

        backend.sign_in_anonymously().await.unwrap();
        backend.fail_next_auth_op(ErrorCode::Unavailable);

        assert!(backend.sign_out().await.is_err());
        assert!(backend.current_user().is_none());
        assert_eq!(backend.sign_out_count(), 1);
    }

    #[tokio::test]
    async fn test_files() {
        let backend = MemoryBackend::new();
        assert!(backend.download_url("users/u1/a").await.is_err());

        backend.put("users/u1/a", vec![1, 2, 3], "image/jpeg").await.unwrap();
        assert_eq!(backend.download_url("users/u1/a").await.unwrap(), "memory://users/u1/a");
        assert_eq!(backend.file("users/u1/a").unwrap().0, vec![1, 2, 3]);
    }
}
