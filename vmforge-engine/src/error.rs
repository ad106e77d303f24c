//! Error taxonomy for the generation engine

use thiserror::Error;
use vmforge_client::ClientError;
use vmforge_core::domain::object::ObjectKind;
use vmforge_core::domain::report::TemplateOutcome;
use vmforge_core::domain::stage::Stage;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, GenerateError>;

/// Everything that can go wrong while generating one template
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Image download failed or produced an incomplete file
    #[error("download from {url} failed: {reason}")]
    Download { url: String, reason: String },

    /// The external conversion utility failed
    #[error("image conversion failed: {0}")]
    Conversion(String),

    /// A display name matched no platform object
    #[error("no {kind} named '{name}' found")]
    NotFound { kind: ObjectKind, name: String },

    /// A display name matched more than one platform object
    #[error("{count} {kind} objects are named '{name}', expected exactly one")]
    AmbiguousName {
        kind: ObjectKind,
        name: String,
        count: usize,
    },

    /// A control-plane call failed in a way worth retrying
    #[error("transient transport error: {0}")]
    TransientTransport(#[source] ClientError),

    /// A control-plane call failed permanently
    #[error("transport error: {0}")]
    PermanentTransport(#[source] ClientError),

    /// No image provider is registered for the requested distribution
    #[error("no image provider registered for distribution '{0}'")]
    UnsupportedDistribution(String),

    /// The provider has no naming rule for this distribution version
    #[error("unsupported {distribution} version '{version}'")]
    UnsupportedVersion {
        distribution: String,
        version: String,
    },

    /// Local filesystem trouble
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenerateError {
    /// Whether retrying the failed operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerateError::TransientTransport(_))
    }
}

impl From<ClientError> for GenerateError {
    fn from(err: ClientError) -> Self {
        if err.is_transient() {
            GenerateError::TransientTransport(err)
        } else {
            GenerateError::PermanentTransport(err)
        }
    }
}

/// Terminal failure of one pipeline run.
///
/// Raw errors never leave the pipeline executor; they are folded into
/// this record together with the stage they occurred in and any warnings
/// raised while rolling back partially created platform objects.
#[derive(Debug)]
pub struct StageFailure {
    pub stage: Stage,
    pub error: GenerateError,
    pub rollback_warnings: Vec<String>,
}

impl StageFailure {
    pub fn new(stage: Stage, error: GenerateError) -> Self {
        Self {
            stage,
            error,
            rollback_warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.rollback_warnings = warnings;
        self
    }

    pub fn into_outcome(self) -> TemplateOutcome {
        TemplateOutcome::Failure {
            stage: self.stage,
            error: self.error.to_string(),
            rollback_warnings: self.rollback_warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_classification_follows_client_error() {
        let transient: GenerateError = ClientError::api_error(503, "busy").into();
        assert!(transient.is_transient());

        let permanent: GenerateError = ClientError::api_error(422, "bad params").into();
        assert!(!permanent.is_transient());
    }

    #[test]
    fn failure_folds_into_outcome() {
        let failure = StageFailure::new(
            Stage::ResolvingResources,
            GenerateError::NotFound {
                kind: ObjectKind::Network,
                name: "net-A".to_string(),
            },
        );

        match failure.into_outcome() {
            TemplateOutcome::Failure { stage, error, .. } => {
                assert_eq!(stage, Stage::ResolvingResources);
                assert!(error.contains("net-A"));
            }
            _ => panic!("expected a failure outcome"),
        }
    }
}
