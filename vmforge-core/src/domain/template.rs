//! Template specification types

use serde::{Deserialize, Serialize};

/// Where a template's disk image comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Distribution name, e.g. "debian". Selects the image provider.
    pub distribution: String,
    /// CPU architecture, e.g. "amd64".
    pub architecture: String,
    /// Distribution version, e.g. "12".
    pub version: String,
    /// Image variant, e.g. "genericcloud".
    pub variant: String,
    /// Display name of the platform template to instantiate from.
    pub base_template: String,
}

/// What the finished template should look like.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Display name of the template. Doubles as the run's identity.
    pub name: String,
    /// Number of virtual CPUs.
    pub cpu: u32,
    /// Memory in GiB.
    pub memory_gib: u64,
    /// Display name of the network to attach.
    pub network: String,
    /// Display name of the storage repository the disk is imported into.
    pub sr: String,
}

/// One desired template. Immutable once loaded from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSpec {
    pub source: SourceSpec,
    pub target: TargetSpec,
}

impl TemplateSpec {
    /// The template's logical name, used as its identity everywhere.
    pub fn name(&self) -> &str {
        &self.target.name
    }
}
