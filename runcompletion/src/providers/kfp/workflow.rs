//! The workflow resource backend A signals completion with.

use crate::assembler::PipelineNameFallback;
use crate::classify::WorkflowPhase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Label carrying the backend run identifier.
pub const RUN_ID_LABEL: &str = "pipeline/runid";
/// Label carrying the workflow phase.
pub const PHASE_LABEL: &str = "workflows.argoproj.io/phase";
/// Annotation carrying the compiled pipeline spec.
pub const PIPELINE_SPEC_ANNOTATION: &str = "pipelines.kubeflow.org/pipeline_spec";

/// Object metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// The resource name.
    #[serde(default)]
    pub name: String,
    /// The resource namespace.
    #[serde(default)]
    pub namespace: String,
    /// Labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Annotations.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

/// The parts of a workflow spec needed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    /// The template the workflow starts from.
    #[serde(default)]
    pub entrypoint: String,
}

/// A workflow resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowResource {
    /// Metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Spec.
    #[serde(default)]
    pub spec: WorkflowSpec,
}

#[derive(Deserialize)]
struct PipelineSpec {
    #[serde(default)]
    name: String,
}

impl WorkflowResource {
    /// Creates a workflow with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta {
                name: name.into(),
                ..ObjectMeta::default()
            },
            ..Self::default()
        }
    }

    /// Sets a label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.labels.insert(key.into(), value.into());
        self
    }

    /// Sets an annotation.
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.annotations.insert(key.into(), value.into());
        self
    }

    /// Sets the entrypoint.
    #[must_use]
    pub fn with_entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.spec.entrypoint = entrypoint.into();
        self
    }

    /// The workflow name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// The phase from the phase label.
    #[must_use]
    pub fn phase(&self) -> WorkflowPhase {
        WorkflowPhase::from_label(self.metadata.labels.get(PHASE_LABEL).map(String::as_str))
    }

    /// The backend run identifier, empty when unlabelled.
    #[must_use]
    pub fn run_id(&self) -> &str {
        self.metadata
            .labels
            .get(RUN_ID_LABEL)
            .map_or("", String::as_str)
    }

    /// Pipeline names to fall back on.
    ///
    /// An unreadable spec annotation contributes no name.
    #[must_use]
    pub fn fallback(&self) -> PipelineNameFallback {
        let annotation = self
            .metadata
            .annotations
            .get(PIPELINE_SPEC_ANNOTATION)
            .map(|spec| match serde_json::from_str::<PipelineSpec>(spec) {
                Ok(spec) => spec.name,
                Err(error) => {
                    debug!(workflow = %self.metadata.name, %error, "unreadable pipeline spec annotation");
                    String::new()
                }
            })
            .unwrap_or_default();

        PipelineNameFallback {
            annotation,
            entrypoint: self.spec.entrypoint.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classification;
    use crate::core::RunCompletionStatus;

    #[test]
    fn test_deserialize_resource() {
        let workflow: WorkflowResource = serde_json::from_str(
            r#"{
                "metadata": {
                    "name": "wf-1",
                    "labels": {"pipeline/runid": "run-1", "workflows.argoproj.io/phase": "Failed"},
                    "annotations": {"pipelines.kubeflow.org/pipeline_spec": "{\"name\": \"p\"}"}
                },
                "spec": {"entrypoint": "main", "templates": []}
            }"#,
        )
        .unwrap();

        assert_eq!(workflow.name(), "wf-1");
        assert_eq!(workflow.run_id(), "run-1");
        assert_eq!(
            workflow.phase().classify(),
            Classification::Terminal(RunCompletionStatus::Failed)
        );
        assert_eq!(
            workflow.fallback(),
            PipelineNameFallback {
                annotation: "p".into(),
                entrypoint: "main".into(),
            }
        );
    }

    #[test]
    fn test_missing_labels() {
        let workflow = WorkflowResource::new("wf-1");
        assert_eq!(workflow.run_id(), "");
        assert_eq!(workflow.phase(), WorkflowPhase::Unset);
    }

    #[test]
    fn test_unreadable_annotation() {
        let workflow = WorkflowResource::new("wf-1")
            .with_annotation(PIPELINE_SPEC_ANNOTATION, "not json")
            .with_entrypoint("main");
        assert_eq!(workflow.fallback().annotation, "");
        assert_eq!(workflow.fallback().entrypoint, "main");
    }
}
