//! vmforge control-plane client
//!
//! HTTP client for an Xen-Orchestra-style control plane.
//!
//! The generation engine only sees the [`ControlPlane`] trait; this crate
//! supplies [`XoClient`], the production implementation speaking the
//! platform's REST surface with cookie-token authentication.
//!
//! # Example
//!
//! ```no_run
//! use vmforge_client::XoClient;
//! use vmforge_core::domain::object::ObjectKind;
//!
//! #[tokio::main]
//! async fn main() -> vmforge_client::Result<()> {
//!     let client = XoClient::new("https://xoa.example.net", "s3cret");
//!
//!     for template in client.find_objects(ObjectKind::Template, None).await? {
//!         println!("{} {}", template.id, template.name_label);
//!     }
//!     Ok(())
//! }
//! ```

pub mod control_plane;
pub mod error;
mod disks;
mod objects;
mod vms;

// Re-export commonly used types
pub use control_plane::ControlPlane;
pub use error::{ClientError, Result};

use std::time::Duration;

use reqwest::header;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Default per-call timeout, suitable for everything except disk upload.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the control-plane REST API
///
/// Covers the narrow surface the generation pipeline needs: object
/// lookup, disk import, VM assembly calls and object deletion.
#[derive(Debug, Clone)]
pub struct XoClient {
    /// Base URL of the control plane (e.g. "https://xoa.example.net")
    base_url: String,
    /// Session token, sent as an authentication cookie on every call
    auth_token: String,
    /// HTTP client instance
    client: Client,
}

impl XoClient {
    /// Create a new client with a default HTTP client.
    ///
    /// The default client applies no timeout; pass a configured
    /// `reqwest::Client` through [`XoClient::with_client`] to set one.
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self::with_client(base_url, auth_token, Client::new())
    }

    /// Create a new client with a custom HTTP client.
    ///
    /// This is how timeouts, proxies and TLS settings are configured.
    pub fn with_client(
        base_url: impl Into<String>,
        auth_token: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: auth_token.into(),
            client,
        }
    }

    /// Get the base URL of the control plane
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.authenticated(self.client.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.authenticated(self.client.post(self.url(path)))
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.authenticated(self.client.delete(self.url(path)))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(
            header::COOKIE,
            format!("authenticationToken={}", self.auth_token),
        )
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    pub(crate) async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content (e.g. DELETE)
    pub(crate) async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
