//! Run and job service contracts.

use crate::errors::BackendError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The type of resource a legacy reference points at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    /// Not set.
    #[default]
    UnknownResourceType,
    /// An experiment.
    Experiment,
    /// A recurring job.
    Job,
    /// A pipeline.
    Pipeline,
    /// A pipeline version.
    PipelineVersion,
    /// A namespace.
    Namespace,
}

/// How the referencing run relates to the referenced resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relationship {
    /// Not set.
    #[default]
    UnknownRelationship,
    /// The resource owns the run.
    Owner,
    /// The resource created the run.
    Creator,
}

/// The key of a referenced resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceKey {
    /// The resource type.
    #[serde(rename = "type", default)]
    pub resource_type: ResourceType,
    /// The resource identifier.
    #[serde(default)]
    pub id: String,
}

/// An entry of the legacy resource reference list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReference {
    /// What is referenced.
    #[serde(default)]
    pub key: ResourceKey,
    /// The referenced resource's display name.
    #[serde(default)]
    pub name: String,
    /// How the run relates to it.
    #[serde(default)]
    pub relationship: Relationship,
}

impl ResourceReference {
    /// Creates a reference.
    #[must_use]
    pub fn new(
        resource_type: ResourceType,
        id: impl Into<String>,
        name: impl Into<String>,
        relationship: Relationship,
    ) -> Self {
        Self {
            key: ResourceKey {
                resource_type,
                id: id.into(),
            },
            name: name.into(),
            relationship,
        }
    }

    /// Returns true if this reference has the given type and relationship.
    #[must_use]
    pub fn is(&self, resource_type: ResourceType, relationship: Relationship) -> bool {
        self.key.resource_type == resource_type && self.relationship == relationship
    }
}

/// A run as returned by the run service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDetail {
    /// The run identifier.
    #[serde(default)]
    pub id: String,
    /// The run's display name.
    #[serde(default)]
    pub name: String,
    /// Free text; holds the structured reference block for current runs.
    #[serde(default)]
    pub description: String,
    /// Legacy relationships.
    #[serde(default)]
    pub resource_references: Vec<ResourceReference>,
    /// When the run was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// When the run finished.
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

/// A recurring job as returned by the job service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetail {
    /// The job identifier.
    #[serde(default)]
    pub id: String,
    /// The job's display name.
    #[serde(default)]
    pub name: String,
    /// Free text; holds the structured reference block for current jobs.
    #[serde(default)]
    pub description: String,
}

/// Fetches runs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RunService: Send + Sync {
    /// Fetches a run by identifier.
    async fn get_run(&self, run_id: &str) -> Result<RunDetail, BackendError>;
}

/// Fetches recurring jobs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobService: Send + Sync {
    /// Fetches a job by identifier.
    async fn get_job(&self, job_id: &str) -> Result<JobDetail, BackendError>;
}
