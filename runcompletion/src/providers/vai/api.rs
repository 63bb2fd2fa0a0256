//! Pipeline job API contract.

use crate::classify::PipelineState;
use crate::errors::BackendError;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// An artifact produced by a task output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputArtifact {
    /// Where the artifact lives.
    #[serde(default)]
    pub uri: String,
    /// The artifact's schema, such as `tfx.PushedModel`.
    #[serde(default)]
    pub schema_title: String,
    /// Custom properties.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl OutputArtifact {
    /// Creates an artifact.
    #[must_use]
    pub fn new(uri: impl Into<String>, schema_title: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            schema_title: schema_title.into(),
            metadata: Map::new(),
        }
    }

    /// Sets a metadata property.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// The artifacts of one task output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactList {
    /// The artifacts, in production order.
    #[serde(default)]
    pub artifacts: Vec<OutputArtifact>,
}

/// A task of a pipeline job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTaskDetail {
    /// The task name.
    #[serde(default)]
    pub task_name: String,
    /// Outputs keyed by output name.
    #[serde(default)]
    pub outputs: BTreeMap<String, ArtifactList>,
}

impl PipelineTaskDetail {
    /// Creates a task with no outputs.
    #[must_use]
    pub fn new(task_name: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            outputs: BTreeMap::new(),
        }
    }

    /// Adds an output.
    #[must_use]
    pub fn with_output(mut self, name: impl Into<String>, artifacts: Vec<OutputArtifact>) -> Self {
        self.outputs.insert(name.into(), ArtifactList { artifacts });
        self
    }
}

/// A pipeline job as returned by the job API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineJob {
    /// The fully qualified job name.
    #[serde(default)]
    pub name: String,
    /// The execution state.
    #[serde(default)]
    pub state: PipelineState,
    /// Labels written when the job was submitted.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// When the job started.
    #[serde(default)]
    pub start_time: Option<DateTime<FixedOffset>>,
    /// When the job ended.
    #[serde(default)]
    pub end_time: Option<DateTime<FixedOffset>>,
    /// The job's tasks.
    #[serde(default)]
    pub task_details: Vec<PipelineTaskDetail>,
}

/// Fetches pipeline jobs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PipelineJobClient: Send + Sync {
    /// Fetches a job by fully qualified name.
    async fn get_pipeline_job(&self, name: &str) -> Result<PipelineJob, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_job() {
        let job: PipelineJob = serde_json::from_str(
            r#"{
                "name": "projects/p/locations/l/pipelineJobs/run-1",
                "state": "PIPELINE_STATE_SUCCEEDED",
                "labels": {"pipeline-name": "foo"},
                "startTime": "2024-05-01T14:00:00+02:00",
                "taskDetails": [{
                    "taskName": "pusher",
                    "outputs": {"pushed_model": {"artifacts": [{
                        "uri": "gs://a",
                        "schemaTitle": "tfx.PushedModel",
                        "metadata": {"pushed": 1}
                    }]}}
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(job.state, PipelineState::Succeeded);
        assert_eq!(job.labels["pipeline-name"], "foo");
        assert!(job.start_time.is_some());
        assert_eq!(job.end_time, None);
        let output = &job.task_details[0].outputs["pushed_model"];
        assert_eq!(output.artifacts[0].schema_title, "tfx.PushedModel");
    }
}
