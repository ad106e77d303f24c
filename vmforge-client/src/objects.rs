//! Object lookup endpoints

use serde::Deserialize;
use vmforge_core::domain::object::{ObjectKind, ObjectRef, PlatformObject};

use crate::XoClient;
use crate::error::Result;

/// REST collection a kind of object lives under.
pub(crate) fn collection(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::Network => "networks",
        ObjectKind::StorageRepository => "srs",
        ObjectKind::Template => "vm-templates",
        ObjectKind::Vm => "vms",
        ObjectKind::Disk => "vdis",
    }
}

/// Wire shape of a platform object record.
#[derive(Debug, Deserialize)]
struct ObjectRecord {
    id: String,
    #[serde(default)]
    name_label: String,
    #[serde(rename = "CPUs", default)]
    cpus: Option<CpuRecord>,
    #[serde(default)]
    memory: Option<MemoryRecord>,
}

#[derive(Debug, Deserialize)]
struct CpuRecord {
    number: u32,
}

#[derive(Debug, Deserialize)]
struct MemoryRecord {
    size: u64,
}

impl From<ObjectRecord> for PlatformObject {
    fn from(record: ObjectRecord) -> Self {
        PlatformObject {
            id: ObjectRef::new(record.id),
            name_label: record.name_label,
            cpus: record.cpus.map(|c| c.number),
            memory_bytes: record.memory.map(|m| m.size),
        }
    }
}

impl XoClient {
    /// Find objects of `kind`, optionally narrowed by display name.
    ///
    /// The name filter is forwarded to the platform and re-applied here as
    /// an exact match, since platform-side filtering is substring-based.
    /// Callers that need uniqueness (the resolver) enforce it themselves.
    pub async fn find_objects(
        &self,
        kind: ObjectKind,
        name: Option<&str>,
    ) -> Result<Vec<PlatformObject>> {
        let path = format!("/rest/v0/{}", collection(kind));
        let mut request = self
            .get(&path)
            .query(&[("fields", "id,name_label,CPUs,memory")]);
        if let Some(name) = name {
            request = request.query(&[("filter", format!("name_label:{}", name))]);
        }

        let response = request.send().await?;
        let records: Vec<ObjectRecord> = self.handle_response(response).await?;

        let objects = records
            .into_iter()
            .map(PlatformObject::from)
            .filter(|o| name.map_or(true, |n| o.name_label == n))
            .collect();
        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_maps_sizing_fields() {
        let record: ObjectRecord = serde_json::from_value(serde_json::json!({
            "id": "t-1",
            "name_label": "debian-12",
            "CPUs": { "number": 2 },
            "memory": { "size": 2147483648u64 },
        }))
        .unwrap();

        let object = PlatformObject::from(record);
        assert_eq!(object.id.as_str(), "t-1");
        assert_eq!(object.cpus, Some(2));
        assert_eq!(object.memory_bytes, Some(2 * 1024 * 1024 * 1024));
    }

    #[test]
    fn record_tolerates_missing_sizing() {
        let record: ObjectRecord =
            serde_json::from_value(serde_json::json!({ "id": "net-1", "name_label": "lan" }))
                .unwrap();

        let object = PlatformObject::from(record);
        assert_eq!(object.cpus, None);
        assert_eq!(object.memory_bytes, None);
    }
}
