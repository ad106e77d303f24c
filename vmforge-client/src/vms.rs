//! VM assembly endpoints

use serde::Deserialize;
use serde_json::json;
use vmforge_core::domain::object::{ObjectKind, ObjectRef};
use vmforge_core::dto::vm::CreateVmParams;

use crate::XoClient;
use crate::error::Result;
use crate::objects::collection;

/// Wire shape of a response that carries only a created reference.
#[derive(Debug, Deserialize)]
struct CreatedRef {
    id: String,
}

impl XoClient {
    /// Instantiate a VM from a base template.
    ///
    /// The VM is created halted; disk and network are attached separately.
    pub async fn create_vm(&self, params: &CreateVmParams) -> Result<ObjectRef> {
        let response = self.post("/rest/v0/vms").json(params).send().await?;

        let created: CreatedRef = self.handle_response(response).await?;
        Ok(ObjectRef::new(created.id))
    }

    /// Attach a disk to a VM, read-write and bootable.
    pub async fn attach_disk(&self, vm: &ObjectRef, disk: &ObjectRef) -> Result<()> {
        let path = format!("/rest/v0/vms/{}/actions/attach_vdi", vm);
        let response = self
            .post(&path)
            .json(&json!({ "vdi": disk, "mode": "RW", "bootable": true }))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Attach a VM to a network.
    pub async fn attach_network(&self, vm: &ObjectRef, network: &ObjectRef) -> Result<()> {
        let path = format!("/rest/v0/vms/{}/actions/attach_network", vm);
        let response = self
            .post(&path)
            .json(&json!({ "network": network }))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Set a VM's boot order ('c' disk, 'd' optical, 'n' network).
    pub async fn set_boot_order(&self, vm: &ObjectRef, order: &str) -> Result<()> {
        let path = format!("/rest/v0/vms/{}/actions/set_boot_order", vm);
        let response = self
            .post(&path)
            .json(&json!({ "order": order }))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Promote a configured VM into a template.
    pub async fn convert_to_template(&self, vm: &ObjectRef) -> Result<ObjectRef> {
        let path = format!("/rest/v0/vms/{}/actions/convert_to_template", vm);
        let response = self.post(&path).send().await?;

        let created: CreatedRef = self.handle_response(response).await?;
        Ok(ObjectRef::new(created.id))
    }

    /// Delete a platform object.
    pub async fn delete_object(&self, kind: ObjectKind, target: &ObjectRef) -> Result<()> {
        let path = format!("/rest/v0/{}/{}", collection(kind), target);
        let response = self.delete(&path).send().await?;

        self.handle_empty_response(response).await
    }
}
