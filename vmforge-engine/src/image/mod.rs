//! Image acquisition
//!
//! An image provider turns a source specification into a locally usable
//! disk image file. Distribution implementations supply URL construction
//! and variant naming rules only; the download, verification, conversion
//! and cleanup skeleton is shared.

pub mod debian;
pub mod ubuntu;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};
use vmforge_core::domain::template::SourceSpec;

use crate::error::GenerateError;

pub use debian::DebianNaming;
pub use ubuntu::UbuntuNaming;

/// Upper bound for a single image download.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(1800);

/// Disk formats the pipeline deals in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskFormat {
    Qcow2,
    Vmdk,
    Iso,
}

impl DiskFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DiskFormat::Qcow2 => "qcow2",
            DiskFormat::Vmdk => "vmdk",
            DiskFormat::Iso => "iso",
        }
    }

    /// Format name as understood by `qemu-img`.
    fn qemu_name(&self) -> &'static str {
        match self {
            DiskFormat::Qcow2 => "qcow2",
            DiskFormat::Vmdk => "vmdk",
            DiskFormat::Iso => "raw",
        }
    }
}

/// Distribution-specific naming rules.
pub trait DistroNaming: Send + Sync {
    /// File name of the published artifact.
    fn artifact_name(&self, source: &SourceSpec) -> Result<String, GenerateError>;

    /// Canonical download URL for the artifact.
    fn download_url(&self, source: &SourceSpec) -> Result<String, GenerateError>;

    /// Format the artifact is published in.
    fn source_format(&self) -> DiskFormat;

    /// Format the import step needs. When it equals the source format the
    /// artifact is imported as downloaded.
    fn import_format(&self) -> DiskFormat;
}

/// Contract between the pipeline and image acquisition.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Produce a locally usable disk image under `work_dir`.
    async fn prepare(&self, source: &SourceSpec, work_dir: &Path)
    -> Result<PathBuf, GenerateError>;

    /// Remove everything `prepare` may have left under `work_dir`.
    ///
    /// Must run on every exit path, including after a partial `prepare`.
    async fn cleanup(&self, work_dir: &Path);
}

/// Shared download-and-convert skeleton over distribution naming rules.
pub struct HttpImageProvider<N> {
    naming: N,
    http: reqwest::Client,
}

impl<N: DistroNaming> HttpImageProvider<N> {
    pub fn new(naming: N) -> Self {
        Self {
            naming,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl<N: DistroNaming> ImageProvider for HttpImageProvider<N> {
    async fn prepare(
        &self,
        source: &SourceSpec,
        work_dir: &Path,
    ) -> Result<PathBuf, GenerateError> {
        let artifact = self.naming.artifact_name(source)?;
        let url = self.naming.download_url(source)?;

        let download_path = work_dir.join(&artifact);
        let import_path =
            download_path.with_extension(self.naming.import_format().extension());

        // A complete artifact from an earlier attempt is reused as-is.
        if is_complete_file(&import_path).await {
            debug!("reusing existing image: {}", import_path.display());
            return Ok(import_path);
        }

        info!("downloading {}", url);
        download(&self.http, &url, &download_path).await?;

        if self.naming.source_format() == self.naming.import_format() {
            return Ok(download_path);
        }

        info!(
            "converting {} to {}",
            download_path.display(),
            self.naming.import_format().extension()
        );
        convert(
            &download_path,
            &import_path,
            self.naming.source_format(),
            self.naming.import_format(),
        )
        .await?;
        tokio::fs::remove_file(&download_path).await?;

        Ok(import_path)
    }

    async fn cleanup(&self, work_dir: &Path) {
        if let Err(err) = tokio::fs::remove_dir_all(work_dir).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "failed to remove image work dir {}: {}",
                    work_dir.display(),
                    err
                );
            }
        }
    }
}

async fn is_complete_file(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.is_file() && metadata.len() > 0,
        Err(_) => false,
    }
}

/// Stream a URL to disk, verifying the body against Content-Length.
async fn download(
    http: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<(), GenerateError> {
    let download_error = |reason: String| GenerateError::Download {
        url: url.to_string(),
        reason,
    };

    let response = http
        .get(url)
        .timeout(DOWNLOAD_TIMEOUT)
        .send()
        .await
        .map_err(|e| download_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(download_error(format!("status {}", status)));
    }

    let expected = response.content_length();
    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| download_error(e.to_string()))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    if written == 0 {
        return Err(download_error("server returned an empty body".to_string()));
    }
    if let Some(expected) = expected {
        if written != expected {
            return Err(download_error(format!(
                "truncated download: got {} of {} bytes",
                written, expected
            )));
        }
    }

    debug!("downloaded {} bytes to {}", written, dest.display());
    Ok(())
}

/// Convert between disk formats with the external `qemu-img` utility.
async fn convert(
    input: &Path,
    output: &Path,
    from: DiskFormat,
    to: DiskFormat,
) -> Result<(), GenerateError> {
    let result = Command::new("qemu-img")
        .arg("convert")
        .arg("-f")
        .arg(from.qemu_name())
        .arg("-O")
        .arg(to.qemu_name())
        .arg(input)
        .arg(output)
        .output()
        .await
        .map_err(|e| GenerateError::Conversion(format!("failed to run qemu-img: {}", e)))?;

    if !result.status.success() {
        return Err(GenerateError::Conversion(format!(
            "qemu-img exited with {}: {}",
            result.status,
            String::from_utf8_lossy(&result.stderr).trim()
        )));
    }
    Ok(())
}

/// Explicit mapping from distribution name to image provider.
///
/// Configuration data, not dynamic lookup: the built-in set is assembled
/// once at startup and unknown distributions fail the run.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ImageProvider>>,
}

impl ProviderRegistry {
    /// Registry with no providers; mostly useful in tests.
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Registry with all built-in distributions.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("debian", Arc::new(HttpImageProvider::new(DebianNaming)));
        registry.register("ubuntu", Arc::new(HttpImageProvider::new(UbuntuNaming)));
        registry
    }

    pub fn register(&mut self, distribution: impl Into<String>, provider: Arc<dyn ImageProvider>) {
        self.providers.insert(distribution.into(), provider);
    }

    pub fn get(&self, distribution: &str) -> Option<Arc<dyn ImageProvider>> {
        self.providers.get(distribution).cloned()
    }

    /// Registered distribution names, sorted for stable messages.
    pub fn distributions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_knows_debian_and_ubuntu() {
        let registry = ProviderRegistry::builtin();
        assert!(registry.get("debian").is_some());
        assert!(registry.get("ubuntu").is_some());
        assert!(registry.get("slackware").is_none());
        assert_eq!(registry.distributions(), vec!["debian", "ubuntu"]);
    }

    #[tokio::test]
    async fn cleanup_tolerates_missing_dir() {
        let provider = HttpImageProvider::new(DebianNaming);
        provider
            .cleanup(Path::new("/nonexistent/vmforge-test"))
            .await;
    }

    #[tokio::test]
    async fn cleanup_removes_partial_downloads() {
        let scratch = tempfile::tempdir().unwrap();
        let work_dir = scratch.path().join("run");
        tokio::fs::create_dir_all(&work_dir).await.unwrap();
        tokio::fs::write(work_dir.join("half-an-image.qcow2"), b"partial")
            .await
            .unwrap();

        let provider = HttpImageProvider::new(DebianNaming);
        provider.cleanup(&work_dir).await;

        assert!(!work_dir.exists());
    }
}
