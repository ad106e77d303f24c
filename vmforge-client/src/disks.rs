//! Disk import endpoint
//!
//! Disk images are uploaded as a raw octet stream straight from the local
//! file; the platform answers with the reference of the created disk.

use std::path::Path;

use reqwest::Body;
use reqwest::header;
use tracing::debug;
use vmforge_core::domain::object::{ObjectRef, PlatformObject};

use crate::XoClient;
use crate::error::{ClientError, Result};

impl XoClient {
    /// Upload a local disk image into a storage repository.
    ///
    /// Streams the file body, so arbitrarily large images work without
    /// buffering. The per-call timeout of the underlying HTTP client
    /// bounds the upload.
    pub async fn import_disk(
        &self,
        sr: &ObjectRef,
        local_path: &Path,
        upload_name: &str,
    ) -> Result<ObjectRef> {
        let metadata = tokio::fs::metadata(local_path)
            .await
            .map_err(|e| ClientError::LocalRead {
                path: local_path.to_path_buf(),
                source: e,
            })?;
        let file = tokio::fs::File::open(local_path)
            .await
            .map_err(|e| ClientError::LocalRead {
                path: local_path.to_path_buf(),
                source: e,
            })?;

        debug!(
            "uploading {} ({} bytes) to SR {}",
            upload_name,
            metadata.len(),
            sr
        );

        let path = format!("/rest/v0/srs/{}/vdis", sr);
        let response = self
            .post(&path)
            .query(&[("raw", ""), ("name_label", upload_name)])
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(header::CONTENT_LENGTH, metadata.len())
            .body(Body::from(file))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(parse_import_failure(status.as_u16(), &body));
        }

        let disk: PlatformObject = self.handle_response(response).await?;
        Ok(disk.id)
    }
}

/// Classify a failed import response.
///
/// When the platform aborts an upload after allocating the disk, the
/// error body names the orphan in a `vdi` field; surface that as
/// [`ClientError::ImportIncomplete`] so the caller can delete it.
fn parse_import_failure(status: u16, body: &str) -> ClientError {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(vdi) = value.get("vdi").and_then(|v| v.as_str()) {
            let message = value
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("import aborted after disk creation")
                .to_string();
            return ClientError::ImportIncomplete {
                disk: ObjectRef::new(vdi),
                message,
            };
        }
    }
    ClientError::api_error(status, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_creation_yields_import_incomplete() {
        let err = parse_import_failure(
            500,
            r#"{"vdi":"vdi-42","message":"stream closed mid-upload"}"#,
        );
        match err {
            ClientError::ImportIncomplete { disk, message } => {
                assert_eq!(disk.as_str(), "vdi-42");
                assert_eq!(message, "stream closed mid-upload");
            }
            other => panic!("expected ImportIncomplete, got {:?}", other),
        }
    }

    #[test]
    fn plain_failure_yields_api_error() {
        let err = parse_import_failure(507, "storage full");
        match err {
            ClientError::ApiError { status, message } => {
                assert_eq!(status, 507);
                assert_eq!(message, "storage full");
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }
}
