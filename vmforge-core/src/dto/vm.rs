//! VM creation DTOs

use serde::{Deserialize, Serialize};

use crate::domain::object::ObjectRef;

/// Parameters for instantiating a VM from a base template.
///
/// The VM is created stopped and without a boot disk; the pipeline
/// attaches the imported disk and network afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVmParams {
    pub name_label: String,
    pub name_description: String,
    pub base_template: ObjectRef,
    pub cpus: u32,
    pub memory_gib: u64,
    #[serde(default)]
    pub tags: Vec<String>,
}
