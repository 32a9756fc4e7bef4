//! REST implementation of the backend seams
//!
//! Talks JSON over HTTP to the hosted backend:
//!
//! | Operation | Request |
//! |---|---|
//! | read document | `GET /v1/documents/{collection}/{id}` |
//! | set document | `PUT /v1/documents/{collection}/{id}` |
//! | update document | `PATCH /v1/documents/{collection}/{id}` |
//! | anonymous sign-in | `POST /v1/accounts:signInAnonymously` |
//! | sign-out | `POST /v1/accounts:signOut` |
//! | persistence | `POST /v1/accounts:setPersistence` |
//! | upload | `PUT /v1/files/{path}` |
//! | download URL | `GET /v1/files/{path}:downloadUrl` |
//!
//! Failures come back as `{"error": {"code": "...", "message": "..."}}`.

use crate::auth::{AuthBackend, AuthStateCallback};
use crate::documents::DocumentStore;
use crate::files::FileStorage;
use crate::types::{Credential, Fields, Persistence};
use crate::{Error, ErrorCode, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the REST client
#[derive(Debug, Clone)]
pub struct RestClientConfig {
    /// Base backend URL (e.g., "https://api.risum.app")
    pub base_url: String,
    /// Project API key, sent as `x-api-key`
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for RestClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.risum.app".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("Risum/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl RestClientConfig {
    /// Create a new config with a base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Default::default() }
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct DocumentBody {
    fields: Fields,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    #[serde(flatten)]
    credential: Credential,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct PersistenceBody {
    persistence: Persistence,
}

#[derive(Debug, Deserialize)]
struct DownloadUrlResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    #[serde(default)]
    message: String,
}

// =============================================================================
// Client
// =============================================================================

/// HTTP client for the hosted backend
pub struct RestClient {
    client: ReqwestClient,
    config: RestClientConfig,
    token: Mutex<Option<String>>,
    current_user: Mutex<Option<Credential>>,
    callbacks: Mutex<Vec<AuthStateCallback>>,
}

impl RestClient {
    /// Create a new REST client
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` if the underlying HTTP client cannot be built.
    pub fn new(config: RestClientConfig) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            config,
            token: Mutex::new(None),
            current_user: Mutex::new(None),
            callbacks: Mutex::new(Vec::new()),
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn encode_segment(segment: &str) -> Result<String> {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(Error::InvalidInput(format!("invalid path segment: {:?}", segment)));
        }
        Ok(urlencoding::encode(segment).into_owned())
    }

    fn document_path(collection: &str, id: &str) -> Result<String> {
        Ok(format!(
            "documents/{}/{}",
            Self::encode_segment(collection)?,
            Self::encode_segment(id)?
        ))
    }

    /// Storage paths keep their `/` separators; every segment is escaped
    fn file_path(path: &str) -> Result<String> {
        let segments = path
            .split('/')
            .map(Self::encode_segment)
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("files/{}", segments.join("/")))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, self.url(path));
        if let Some(api_key) = &self.config.api_key {
            builder = builder.header("x-api-key", api_key);
        }
        if let Some(token) = self.token.lock().clone() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::api_error(response).await)
        }
    }

    async fn api_error(response: Response) -> Error {
        let status = response.status();
        match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => Error::Api {
                status: status.as_u16(),
                code: ErrorCode::parse(&envelope.error.code),
                message: envelope.error.message,
            },
            Err(_) => Error::Api {
                status: status.as_u16(),
                code: Self::code_for_status(status),
                message: status.canonical_reason().unwrap_or("unknown error").to_string(),
            },
        }
    }

    fn code_for_status(status: StatusCode) -> ErrorCode {
        match status {
            StatusCode::NOT_FOUND => ErrorCode::NotFound,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorCode::PermissionDenied,
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => ErrorCode::Unavailable,
            other => ErrorCode::Other(other.as_u16().to_string()),
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
impl AuthBackend for RestClient {
    async fn sign_in_anonymously(&self) -> Result<Credential> {
        let response = self
            .send(self.request(Method::POST, "accounts:signInAnonymously").json(&serde_json::json!({})))
            .await?;
        let body: SignInResponse = response.json().await?;

        tracing::debug!(uid = %body.credential.uid, "anonymous session created");

        *self.token.lock() = body.token;
        *self.current_user.lock() = Some(body.credential.clone());
        self.notify(Some(&body.credential));

        Ok(body.credential)
    }

    async fn sign_out(&self) -> Result<()> {
        let result = self
            .send(self.request(Method::POST, "accounts:signOut").json(&serde_json::json!({})))
            .await;

        // The local session is gone even if the backend call failed.
        *self.token.lock() = None;
        *self.current_user.lock() = None;
        self.notify(None);

        result.map(|_| ())
    }

    fn current_user(&self) -> Option<Credential> {
        self.current_user.lock().clone()
    }

    async fn set_persistence(&self, persistence: Persistence) -> Result<()> {
        self.send(
            self.request(Method::POST, "accounts:setPersistence")
                .json(&PersistenceBody { persistence }),
        )
        .await?;
        Ok(())
    }

    fn on_auth_state_changed(&self, callback: AuthStateCallback) {
        self.callbacks.lock().push(callback);
    }
}

#[async_trait]
impl DocumentStore for RestClient {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Fields>> {
        let path = Self::document_path(collection, id)?;
        let response = self.request(Method::GET, &path).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let body: DocumentBody = response.json().await?;
        Ok(Some(body.fields))
    }

    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let path = Self::document_path(collection, id)?;
        self.send(self.request(Method::PUT, &path).json(&DocumentBody { fields }))
            .await?;
        Ok(())
    }

    async fn update_document(&self, collection: &str, id: &str, fields: Fields) -> Result<()> {
        let path = Self::document_path(collection, id)?;
        self.send(self.request(Method::PATCH, &path).json(&DocumentBody { fields }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl FileStorage for RestClient {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        self.send(
            self.request(Method::PUT, &Self::file_path(path)?)
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(bytes),
        )
        .await?;
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String> {
        let response = self
            .send(self.request(Method::GET, &format!("{}:downloadUrl", Self::file_path(path)?)))
            .await?;
        let body: DownloadUrlResponse = response.json().await?;
        Ok(body.url)
    }
}
