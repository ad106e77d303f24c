//! Debian cloud image naming rules
//!
//! Debian publishes cloud images per codename under a fixed directory
//! scheme; the qcow2 artifact is converted to vmdk for import.

use vmforge_core::domain::template::SourceSpec;

use crate::error::GenerateError;
use crate::image::{DiskFormat, DistroNaming};

const CLOUD_IMAGE_BASE: &str = "https://cdimage.debian.org/images/cloud";

/// Naming rules for images published at cdimage.debian.org.
pub struct DebianNaming;

fn codename(version: &str) -> Option<&'static str> {
    match version {
        "13" => Some("trixie"),
        "12" => Some("bookworm"),
        "11" => Some("bullseye"),
        "10" => Some("buster"),
        "9" => Some("stretch"),
        "8" => Some("jessie"),
        "7" => Some("wheezy"),
        _ => None,
    }
}

impl DistroNaming for DebianNaming {
    fn artifact_name(&self, source: &SourceSpec) -> Result<String, GenerateError> {
        Ok(format!(
            "debian-{}-{}-{}.qcow2",
            source.version, source.variant, source.architecture
        ))
    }

    fn download_url(&self, source: &SourceSpec) -> Result<String, GenerateError> {
        let codename =
            codename(&source.version).ok_or_else(|| GenerateError::UnsupportedVersion {
                distribution: "debian".to_string(),
                version: source.version.clone(),
            })?;
        Ok(format!(
            "{}/{}/latest/{}",
            CLOUD_IMAGE_BASE,
            codename,
            self.artifact_name(source)?
        ))
    }

    fn source_format(&self) -> DiskFormat {
        DiskFormat::Qcow2
    }

    fn import_format(&self) -> DiskFormat {
        DiskFormat::Vmdk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(version: &str) -> SourceSpec {
        SourceSpec {
            distribution: "debian".to_string(),
            architecture: "amd64".to_string(),
            version: version.to_string(),
            variant: "genericcloud".to_string(),
            base_template: "Debian Bookworm 12".to_string(),
        }
    }

    #[test]
    fn bookworm_url() {
        let url = DebianNaming.download_url(&source("12")).unwrap();
        assert_eq!(
            url,
            "https://cdimage.debian.org/images/cloud/bookworm/latest/debian-12-genericcloud-amd64.qcow2"
        );
    }

    #[test]
    fn artifact_carries_variant_and_arch() {
        let name = DebianNaming.artifact_name(&source("11")).unwrap();
        assert_eq!(name, "debian-11-genericcloud-amd64.qcow2");
    }

    #[test]
    fn unknown_version_is_rejected() {
        let err = DebianNaming.download_url(&source("6")).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::UnsupportedVersion { ref version, .. } if version == "6"
        ));
    }

    #[test]
    fn debian_images_need_conversion() {
        assert_ne!(DebianNaming.source_format(), DebianNaming.import_format());
    }
}
