//! The canonical run-completion event.

use super::{Artifact, NamespacedName, PipelineComponent, RunCompletionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event data emitted once per terminal transition of a run.
///
/// Optional identities are `None` rather than empty names, and are left out
/// of the serialised payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCompletionEventData {
    /// The terminal status.
    pub status: RunCompletionStatus,
    /// The pipeline that ran. Never empty.
    pub pipeline_name: NamespacedName,
    /// The run configuration that created the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_configuration_name: Option<NamespacedName>,
    /// The run resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name: Option<NamespacedName>,
    /// The backend run identifier.
    pub run_id: String,
    /// When the run started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_start_time: Option<DateTime<Utc>>,
    /// When the run ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_end_time: Option<DateTime<Utc>>,
    /// Models pushed to serving by the run.
    pub serving_model_artifacts: Vec<Artifact>,
    /// Artifacts selected by the run's artifact definitions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    /// Every component output the backend reported.
    pub pipeline_components: Vec<PipelineComponent>,
    /// The provider that observed the run.
    pub provider: String,
}

impl RunCompletionEventData {
    /// Drops the component tree, producing the downstream event.
    #[must_use]
    pub fn to_run_completion_event(&self) -> RunCompletionEvent {
        RunCompletionEvent {
            status: self.status,
            pipeline_name: self.pipeline_name.clone(),
            run_configuration_name: self.run_configuration_name.clone(),
            run_name: self.run_name.clone(),
            run_id: self.run_id.clone(),
            run_start_time: self.run_start_time,
            run_end_time: self.run_end_time,
            serving_model_artifacts: self.serving_model_artifacts.clone(),
            artifacts: self.artifacts.clone(),
            provider: self.provider.clone(),
        }
    }
}

/// The event published to downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCompletionEvent {
    /// The terminal status.
    pub status: RunCompletionStatus,
    /// The pipeline that ran.
    pub pipeline_name: NamespacedName,
    /// The run configuration that created the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_configuration_name: Option<NamespacedName>,
    /// The run resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name: Option<NamespacedName>,
    /// The backend run identifier.
    pub run_id: String,
    /// When the run started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_start_time: Option<DateTime<Utc>>,
    /// When the run ended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_end_time: Option<DateTime<Utc>>,
    /// Models pushed to serving by the run.
    pub serving_model_artifacts: Vec<Artifact>,
    /// Artifacts selected by the run's artifact definitions.
    pub artifacts: Vec<Artifact>,
    /// The provider that observed the run.
    pub provider: String,
}
