//! Generation report types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::object::ObjectRef;
use crate::domain::stage::Stage;

/// Terminal outcome of one template pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TemplateOutcome {
    Success {
        /// Reference of the freshly promoted template.
        template: ObjectRef,
        /// Non-fatal warnings, e.g. old templates that resisted deletion.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
    },
    Failure {
        /// Stage the pipeline failed in.
        stage: Stage,
        /// Human-readable cause.
        error: String,
        /// Warnings raised while rolling back partially created objects.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        rollback_warnings: Vec<String>,
    },
}

impl TemplateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TemplateOutcome::Success { .. })
    }
}

/// Aggregate result of one generation run, keyed by template name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generated_at: DateTime<Utc>,
    pub outcomes: BTreeMap<String, TemplateOutcome>,
}

impl GenerationReport {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            outcomes: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, name: impl Into<String>, outcome: TemplateOutcome) {
        self.outcomes.insert(name.into(), outcome);
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

impl Default for GenerationReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_follow_outcomes() {
        let mut report = GenerationReport::new();
        report.record(
            "debian-12",
            TemplateOutcome::Success {
                template: ObjectRef::new("t1"),
                warnings: vec![],
            },
        );
        report.record(
            "ubuntu-24",
            TemplateOutcome::Failure {
                stage: Stage::ImportingDisk,
                error: "boom".to_string(),
                rollback_warnings: vec![],
            },
        );

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(report.has_failures());
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let outcome = TemplateOutcome::Failure {
            stage: Stage::ConfiguringVm,
            error: "attach failed".to_string(),
            rollback_warnings: vec!["vm survived deletion".to_string()],
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["result"], "failure");
        assert_eq!(json["stage"], "configuring_vm");
        assert_eq!(json["rollback_warnings"][0], "vm survived deletion");
    }
}
