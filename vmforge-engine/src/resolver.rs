//! Name-to-reference resolution with a per-run cache

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;
use vmforge_client::ControlPlane;
use vmforge_core::domain::object::{ObjectKind, ObjectRef};

use crate::error::GenerateError;
use crate::retry::{RetryPolicy, call_with_retry};

/// Resolves display names to platform object references.
///
/// Matching is exact and case-sensitive; zero or multiple matches is an
/// error, never a silent pick. Resolved references are cached for the
/// lifetime of one generation run, since many templates typically share
/// the same network, SR and base template.
///
/// The cache lock is held only around map access, never across a lookup.
/// Two pipelines resolving the same name at the same time may both hit
/// the control plane; the lookup is read-only, so the duplicate is
/// harmless and cheaper than serializing every run behind one lock.
pub struct ResourceResolver {
    client: Arc<dyn ControlPlane>,
    retry: RetryPolicy,
    cache: Mutex<HashMap<(ObjectKind, String), ObjectRef>>,
}

impl ResourceResolver {
    pub fn new(client: Arc<dyn ControlPlane>, retry: RetryPolicy) -> Self {
        Self {
            client,
            retry,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve `name` to the single object of `kind` carrying it.
    pub async fn resolve(&self, kind: ObjectKind, name: &str) -> Result<ObjectRef, GenerateError> {
        let key = (kind, name.to_string());

        if let Some(cached) = self
            .cache
            .lock()
            .expect("resolver cache lock poisoned")
            .get(&key)
        {
            return Ok(cached.clone());
        }

        let matches = call_with_retry(self.retry, "object lookup", || {
            self.client.find_objects(kind, Some(name))
        })
        .await?;

        let mut exact: Vec<ObjectRef> = matches
            .into_iter()
            .filter(|o| o.name_label == name)
            .map(|o| o.id)
            .collect();

        match exact.len() {
            0 => Err(GenerateError::NotFound {
                kind,
                name: name.to_string(),
            }),
            1 => {
                let resolved = exact.remove(0);
                debug!("resolved {} '{}' to {}", kind, name, resolved);
                self.cache
                    .lock()
                    .expect("resolver cache lock poisoned")
                    .insert(key, resolved.clone());
                Ok(resolved)
            }
            count => Err(GenerateError::AmbiguousName {
                kind,
                name: name.to_string(),
                count,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vmforge_client::error::Result as ClientResult;
    use vmforge_core::domain::object::PlatformObject;
    use vmforge_core::dto::vm::CreateVmParams;

    /// Lookup-only control plane; every other call is out of scope here.
    struct LookupOnly {
        objects: Vec<(ObjectKind, PlatformObject)>,
        lookups: AtomicUsize,
    }

    impl LookupOnly {
        fn with(objects: Vec<(ObjectKind, PlatformObject)>) -> Arc<Self> {
            Arc::new(Self {
                objects,
                lookups: AtomicUsize::new(0),
            })
        }
    }

    fn object(id: &str, name: &str) -> PlatformObject {
        PlatformObject {
            id: ObjectRef::new(id),
            name_label: name.to_string(),
            cpus: None,
            memory_bytes: None,
        }
    }

    #[async_trait]
    impl ControlPlane for LookupOnly {
        async fn find_objects(
            &self,
            kind: ObjectKind,
            name: Option<&str>,
        ) -> ClientResult<Vec<PlatformObject>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .objects
                .iter()
                .filter(|(k, o)| *k == kind && name.map_or(true, |n| o.name_label == n))
                .map(|(_, o)| o.clone())
                .collect())
        }

        async fn import_disk(
            &self,
            _sr: &ObjectRef,
            _local_path: &Path,
            _upload_name: &str,
        ) -> ClientResult<ObjectRef> {
            unimplemented!()
        }

        async fn create_vm(&self, _params: &CreateVmParams) -> ClientResult<ObjectRef> {
            unimplemented!()
        }

        async fn attach_disk(&self, _vm: &ObjectRef, _disk: &ObjectRef) -> ClientResult<()> {
            unimplemented!()
        }

        async fn attach_network(&self, _vm: &ObjectRef, _network: &ObjectRef) -> ClientResult<()> {
            unimplemented!()
        }

        async fn set_boot_order(&self, _vm: &ObjectRef, _order: &str) -> ClientResult<()> {
            unimplemented!()
        }

        async fn convert_to_template(&self, _vm: &ObjectRef) -> ClientResult<ObjectRef> {
            unimplemented!()
        }

        async fn delete_object(&self, _kind: ObjectKind, _target: &ObjectRef) -> ClientResult<()> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn unique_match_resolves() {
        let client = LookupOnly::with(vec![(ObjectKind::Network, object("net-1", "lan"))]);
        let resolver = ResourceResolver::new(client, RetryPolicy::default());

        let resolved = resolver.resolve(ObjectKind::Network, "lan").await.unwrap();
        assert_eq!(resolved, ObjectRef::new("net-1"));
    }

    #[tokio::test]
    async fn zero_matches_is_not_found() {
        let client = LookupOnly::with(vec![]);
        let resolver = ResourceResolver::new(client, RetryPolicy::default());

        let err = resolver
            .resolve(ObjectKind::StorageRepository, "missing")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GenerateError::NotFound { kind: ObjectKind::StorageRepository, ref name } if name == "missing"
        ));
    }

    #[tokio::test]
    async fn duplicate_names_are_ambiguous() {
        let client = LookupOnly::with(vec![
            (ObjectKind::StorageRepository, object("sr-1", "local")),
            (ObjectKind::StorageRepository, object("sr-2", "local")),
        ]);
        let resolver = ResourceResolver::new(client, RetryPolicy::default());

        let err = resolver
            .resolve(ObjectKind::StorageRepository, "local")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::AmbiguousName { count: 2, .. }));
    }

    #[tokio::test]
    async fn matching_is_case_sensitive() {
        let client = LookupOnly::with(vec![(ObjectKind::Network, object("net-1", "LAN"))]);
        let resolver = ResourceResolver::new(client, RetryPolicy::default());

        let err = resolver
            .resolve(ObjectKind::Network, "lan")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::NotFound { .. }));
    }

    #[tokio::test]
    async fn second_resolution_hits_the_cache() {
        let client = LookupOnly::with(vec![(ObjectKind::Template, object("t-1", "base"))]);
        let resolver = ResourceResolver::new(client.clone(), RetryPolicy::default());

        resolver.resolve(ObjectKind::Template, "base").await.unwrap();
        resolver.resolve(ObjectKind::Template, "base").await.unwrap();

        assert_eq!(client.lookups.load(Ordering::SeqCst), 1);
    }
}
