//! Artifacts read from a job's task outputs.

use super::api::PipelineJob;
use crate::core::{Artifact, ComponentArtifact, ComponentArtifactInstance, PipelineComponent};
use serde_json::Value;

/// Schema of artifacts recording a model push.
pub const PUSHED_MODEL_SCHEMA: &str = "tfx.PushedModel";
/// Metadata property set to 1 once the model was pushed.
pub const PUSHED_PROPERTY: &str = "pushed";
/// Metadata property holding where the model was pushed.
pub const PUSHED_DESTINATION_PROPERTY: &str = "pushed_destination";

/// Copies every task's every output into a component tree.
#[must_use]
pub fn pipeline_components(job: &PipelineJob) -> Vec<PipelineComponent> {
    job.task_details
        .iter()
        .map(|task| PipelineComponent {
            name: task.task_name.clone(),
            component_artifacts: task
                .outputs
                .iter()
                .map(|(name, output)| ComponentArtifact {
                    name: name.clone(),
                    artifacts: output
                        .artifacts
                        .iter()
                        .map(|artifact| ComponentArtifactInstance {
                            uri: artifact.uri.clone(),
                            metadata: artifact.metadata.clone(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

/// Pushed models, named after the output that produced them and located at
/// their push destination.
#[must_use]
pub fn serving_model_artifacts(job: &PipelineJob) -> Vec<Artifact> {
    job.task_details
        .iter()
        .flat_map(|task| &task.outputs)
        .flat_map(|(name, output)| output.artifacts.iter().map(move |a| (name, a)))
        .filter(|(_, artifact)| artifact.schema_title == PUSHED_MODEL_SCHEMA)
        .filter(|(_, artifact)| {
            artifact
                .metadata
                .get(PUSHED_PROPERTY)
                .and_then(Value::as_f64)
                .is_some_and(|pushed| (pushed - 1.0).abs() < f64::EPSILON)
        })
        .filter_map(|(name, artifact)| {
            artifact
                .metadata
                .get(PUSHED_DESTINATION_PROPERTY)
                .and_then(Value::as_str)
                .map(|destination| Artifact::new(name.as_str(), destination))
        })
        .collect()
}
