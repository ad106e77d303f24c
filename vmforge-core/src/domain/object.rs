//! Platform object types
//!
//! The control plane identifies everything it manages by opaque
//! references. The generation engine never inspects a reference, it only
//! passes them back to the platform.

use serde::{Deserialize, Serialize};

/// Kind of a platform-managed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Network,
    StorageRepository,
    Template,
    Vm,
    Disk,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Network => "network",
            ObjectKind::StorageRepository => "storage repository",
            ObjectKind::Template => "template",
            ObjectKind::Vm => "VM",
            ObjectKind::Disk => "disk",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque platform-issued identifier for a network, disk, VM or template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectRef(String);

impl ObjectRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectRef {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A platform object as returned by a lookup.
///
/// Sizing fields are populated for VMs and templates only; other kinds
/// carry just the reference and display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformObject {
    pub id: ObjectRef,
    pub name_label: String,
    #[serde(default)]
    pub cpus: Option<u32>,
    #[serde(default)]
    pub memory_bytes: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ref_is_transparent() {
        let r = ObjectRef::new("4f5a");
        assert_eq!(r.as_str(), "4f5a");
        assert_eq!(r.to_string(), "4f5a");
        assert_eq!(r, ObjectRef::from("4f5a"));
    }

    #[test]
    fn kind_display_names() {
        assert_eq!(ObjectKind::StorageRepository.to_string(), "storage repository");
        assert_eq!(ObjectKind::Network.to_string(), "network");
    }
}
