//! vmforge Generation Engine
//!
//! Turns desired-template specifications into finished VM templates.
//!
//! Architecture:
//! - Image providers: download and convert distribution cloud images
//! - Resource resolver: display names to platform references, cached per run
//! - Pipeline executor: the per-template state machine
//! - Cleanup manager: retires superseded templates after a successful run
//! - Generation scheduler: runs many pipelines under a concurrency bound
//!
//! The engine never reads configuration files and never talks HTTP
//! directly to the control plane; it works against the
//! [`vmforge_client::ControlPlane`] contract.

pub mod cleanup;
pub mod error;
pub mod image;
pub mod pipeline;
pub mod resolver;
pub mod retry;
pub mod scheduler;

pub use cleanup::{CleanupManager, CleanupMatch};
pub use error::{GenerateError, StageFailure};
pub use retry::RetryPolicy;
pub use scheduler::GenerationScheduler;
