//! Retirement of superseded templates

use std::sync::Arc;

use tracing::{info, warn};
use vmforge_client::ControlPlane;
use vmforge_core::domain::object::{ObjectKind, ObjectRef};

/// How existing templates are matched against a logical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupMatch {
    /// Display name equals the logical name. The safe default.
    Exact,
    /// Display name starts with the logical name. For fleets that carry
    /// suffixed names from earlier tooling.
    Prefix,
}

/// Removes stale templates after a successful run.
///
/// Runs strictly after the replacement template exists, so at least one
/// template with the logical name is present at every point of the swap.
pub struct CleanupManager {
    client: Arc<dyn ControlPlane>,
    matching: CleanupMatch,
}

impl CleanupManager {
    pub fn new(client: Arc<dyn ControlPlane>) -> Self {
        Self {
            client,
            matching: CleanupMatch::Exact,
        }
    }

    pub fn with_matching(mut self, matching: CleanupMatch) -> Self {
        self.matching = matching;
        self
    }

    /// Delete templates sharing `logical_name`, keeping `keep`.
    ///
    /// Nothing here can fail the run: the new template already exists and
    /// is usable, so every problem is reported as a warning and the rest
    /// of the candidates are still attempted.
    pub async fn retire_old_templates(&self, logical_name: &str, keep: &ObjectRef) -> Vec<String> {
        let mut warnings = Vec::new();

        let filter = match self.matching {
            CleanupMatch::Exact => Some(logical_name),
            CleanupMatch::Prefix => None,
        };
        let candidates = match self.client.find_objects(ObjectKind::Template, filter).await {
            Ok(candidates) => candidates,
            Err(err) => {
                let message = format!(
                    "could not list templates matching '{}': {}",
                    logical_name, err
                );
                warn!("{}", message);
                warnings.push(message);
                return warnings;
            }
        };

        for candidate in candidates {
            if candidate.id == *keep {
                continue;
            }
            let matched = match self.matching {
                CleanupMatch::Exact => candidate.name_label == logical_name,
                CleanupMatch::Prefix => candidate.name_label.starts_with(logical_name),
            };
            if !matched {
                continue;
            }

            info!(
                "retiring old template '{}' ({})",
                candidate.name_label, candidate.id
            );
            if let Err(err) = self
                .client
                .delete_object(ObjectKind::Template, &candidate.id)
                .await
            {
                let message = format!(
                    "failed to delete old template '{}' ({}): {}",
                    candidate.name_label, candidate.id, err
                );
                warn!("{}", message);
                warnings.push(message);
            }
        }

        warnings
    }
}
