//! Control-plane service contract

use std::path::Path;

use async_trait::async_trait;
use vmforge_core::domain::object::{ObjectKind, ObjectRef, PlatformObject};
use vmforge_core::dto::vm::CreateVmParams;

use crate::XoClient;
use crate::error::Result;

/// The narrow contract the generation engine depends on.
///
/// Everything a pipeline does to the platform goes through this trait, so
/// tests can substitute an in-memory implementation. All calls may fail
/// with a transport-level error distinct from an API rejection; see
/// [`crate::ClientError::is_transient`].
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Find objects of `kind`, optionally narrowed to an exact display name.
    async fn find_objects(
        &self,
        kind: ObjectKind,
        name: Option<&str>,
    ) -> Result<Vec<PlatformObject>>;

    /// Upload a local disk image into a storage repository.
    async fn import_disk(
        &self,
        sr: &ObjectRef,
        local_path: &Path,
        upload_name: &str,
    ) -> Result<ObjectRef>;

    /// Instantiate a VM from a base template.
    async fn create_vm(&self, params: &CreateVmParams) -> Result<ObjectRef>;

    /// Attach a disk to a VM.
    async fn attach_disk(&self, vm: &ObjectRef, disk: &ObjectRef) -> Result<()>;

    /// Attach a VM to a network.
    async fn attach_network(&self, vm: &ObjectRef, network: &ObjectRef) -> Result<()>;

    /// Set a VM's boot order.
    async fn set_boot_order(&self, vm: &ObjectRef, order: &str) -> Result<()>;

    /// Promote a configured VM into a template.
    async fn convert_to_template(&self, vm: &ObjectRef) -> Result<ObjectRef>;

    /// Delete a platform object.
    async fn delete_object(&self, kind: ObjectKind, target: &ObjectRef) -> Result<()>;
}

#[async_trait]
impl ControlPlane for XoClient {
    async fn find_objects(
        &self,
        kind: ObjectKind,
        name: Option<&str>,
    ) -> Result<Vec<PlatformObject>> {
        XoClient::find_objects(self, kind, name).await
    }

    async fn import_disk(
        &self,
        sr: &ObjectRef,
        local_path: &Path,
        upload_name: &str,
    ) -> Result<ObjectRef> {
        XoClient::import_disk(self, sr, local_path, upload_name).await
    }

    async fn create_vm(&self, params: &CreateVmParams) -> Result<ObjectRef> {
        XoClient::create_vm(self, params).await
    }

    async fn attach_disk(&self, vm: &ObjectRef, disk: &ObjectRef) -> Result<()> {
        XoClient::attach_disk(self, vm, disk).await
    }

    async fn attach_network(&self, vm: &ObjectRef, network: &ObjectRef) -> Result<()> {
        XoClient::attach_network(self, vm, network).await
    }

    async fn set_boot_order(&self, vm: &ObjectRef, order: &str) -> Result<()> {
        XoClient::set_boot_order(self, vm, order).await
    }

    async fn convert_to_template(&self, vm: &ObjectRef) -> Result<ObjectRef> {
        XoClient::convert_to_template(self, vm).await
    }

    async fn delete_object(&self, kind: ObjectKind, target: &ObjectRef) -> Result<()> {
        XoClient::delete_object(self, kind, target).await
    }
}
