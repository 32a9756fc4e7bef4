//! Federated (Google) login seam
//!
//! The interactive login flow lives in a platform SDK. This module only
//! describes what goes in and what comes out of it.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// OAuth client configuration for the Google login flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleAuthConfig {
    /// OAuth client id used on Android
    pub android_client_id: String,
    /// OAuth client id used on iOS
    pub ios_client_id: String,
    /// Requested scopes
    pub scopes: Vec<String>,
}

impl Default for GoogleAuthConfig {
    fn default() -> Self {
        Self {
            android_client_id: String::new(),
            ios_client_id: String::new(),
            scopes: vec!["profile".to_string(), "email".to_string()],
        }
    }
}

impl GoogleAuthConfig {
    /// Create a config with both platform client ids
    pub fn new(android_client_id: impl Into<String>, ios_client_id: impl Into<String>) -> Self {
        Self {
            android_client_id: android_client_id.into(),
            ios_client_id: ios_client_id.into(),
            ..Default::default()
        }
    }

    /// Replace the requested scopes
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }
}

/// Outcome of an interactive login flow that did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FederatedOutcome {
    /// The user completed the flow
    Success {
        /// OAuth access token
        access_token: String,
    },
    /// The user backed out of the flow
    Cancelled,
}

/// Interactive federated login provided by a platform SDK
#[async_trait]
pub trait FederatedLogin: Send + Sync {
    /// Run the interactive login flow
    async fn log_in(&self, config: &GoogleAuthConfig) -> Result<FederatedOutcome>;
}
