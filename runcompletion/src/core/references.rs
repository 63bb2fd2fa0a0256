//! Resource references resolved for a completed run.

use super::{ArtifactDefinition, NamespacedName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The identities a completed run belongs to.
///
/// The serialised form is the structured reference block written into a
/// run or job description when the run is created. Timestamps never appear
/// in the block; resolvers fill them from the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReferences {
    /// The pipeline the run executed.
    #[serde(default)]
    pub pipeline_name: NamespacedName,
    /// The run configuration that created the run, if any.
    #[serde(default)]
    pub run_configuration_name: NamespacedName,
    /// The run resource, if any.
    #[serde(default)]
    pub run_name: NamespacedName,
    /// Output artifacts requested for the run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<ArtifactDefinition>,
    /// When the run was created.
    #[serde(skip)]
    pub created_at: Option<DateTime<Utc>>,
    /// When the run finished.
    #[serde(skip)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl ResourceReferences {
    /// Decodes a YAML reference block.
    pub fn from_yaml(block: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(block)
    }

    /// Sets the run timestamps.
    #[must_use]
    pub fn with_times(
        mut self,
        created_at: Option<DateTime<Utc>>,
        finished_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_at = created_at;
        self.finished_at = finished_at;
        self
    }
}
