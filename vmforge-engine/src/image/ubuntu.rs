//! Ubuntu release image naming rules

use vmforge_core::domain::template::SourceSpec;

use crate::error::GenerateError;
use crate::image::{DiskFormat, DistroNaming};

const RELEASES_BASE: &str = "https://releases.ubuntu.com";

/// Naming rules for images published at releases.ubuntu.com.
///
/// Ubuntu release ISOs are imported as downloaded; no conversion step.
pub struct UbuntuNaming;

impl DistroNaming for UbuntuNaming {
    fn artifact_name(&self, source: &SourceSpec) -> Result<String, GenerateError> {
        Ok(format!(
            "ubuntu-{}-{}-{}.iso",
            source.version, source.variant, source.architecture
        ))
    }

    fn download_url(&self, source: &SourceSpec) -> Result<String, GenerateError> {
        Ok(format!(
            "{}/{}/{}",
            RELEASES_BASE,
            source.version,
            self.artifact_name(source)?
        ))
    }

    fn source_format(&self) -> DiskFormat {
        DiskFormat::Iso
    }

    fn import_format(&self) -> DiskFormat {
        DiskFormat::Iso
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_server_url() {
        let source = SourceSpec {
            distribution: "ubuntu".to_string(),
            architecture: "amd64".to_string(),
            version: "24.04".to_string(),
            variant: "live-server".to_string(),
            base_template: "Ubuntu Noble 24.04".to_string(),
        };
        let url = UbuntuNaming.download_url(&source).unwrap();
        assert_eq!(
            url,
            "https://releases.ubuntu.com/24.04/ubuntu-24.04-live-server-amd64.iso"
        );
    }

    #[test]
    fn isos_are_imported_as_downloaded() {
        assert_eq!(UbuntuNaming.source_format(), UbuntuNaming.import_format());
    }
}
