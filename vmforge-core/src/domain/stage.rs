//! Pipeline stages and progress events

use serde::{Deserialize, Serialize};

/// Stages of one template pipeline, in strict execution order.
///
/// A run walks these front to back; any non-terminal stage can fall into
/// the terminal failure recorded in the generation report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Pending,
    PreparingImage,
    ResolvingResources,
    ImportingDisk,
    CreatingVm,
    ConfiguringVm,
    ConvertingToTemplate,
    CleaningUpOld,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Pending => "pending",
            Stage::PreparingImage => "preparing image",
            Stage::ResolvingResources => "resolving resources",
            Stage::ImportingDisk => "importing disk",
            Stage::CreatingVm => "creating VM",
            Stage::ConfiguringVm => "configuring VM",
            Stage::ConvertingToTemplate => "converting to template",
            Stage::CleaningUpOld => "cleaning up old templates",
            Stage::Done => "done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory stage-transition event, emitted as a pipeline advances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    /// Logical name of the template the pipeline is producing.
    pub template: String,
    /// Stage the pipeline just entered.
    pub stage: Stage,
}
