//! Provider configuration.
//!
//! A [`ProviderConfig`] is built once at startup and passed by reference to
//! every resolver and flow. Every field has a default so partial documents
//! are accepted.

use crate::labels::LabelKeys;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when a configuration document is invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML document could not be decoded.
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The JSON document could not be decoded.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A field holds a value outside its domain.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for a run-completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Provider identity stamped on every event.
    #[serde(default = "default_provider_name")]
    pub name: String,
    /// Label keys backend B resources carry.
    #[serde(default)]
    pub labels: LabelKeys,
    /// Backend B parameters.
    #[serde(default)]
    pub vai: VaiParameters,
    /// Backend A parameters.
    #[serde(default)]
    pub kfp: KfpParameters,
    /// Flow stage settings.
    #[serde(default)]
    pub flow: FlowConfig,
}

fn default_provider_name() -> String {
    "default-provider".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            labels: LabelKeys::default(),
            vai: VaiParameters::default(),
            kfp: KfpParameters::default(),
            flow: FlowConfig::default(),
        }
    }
}

impl ProviderConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::default().with_name(name)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks field domains.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid("provider name must not be empty".into()));
        }
        if self.flow.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "flow.channelCapacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Sets the provider name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the label keys.
    #[must_use]
    pub fn with_labels(mut self, labels: LabelKeys) -> Self {
        self.labels = labels;
        self
    }

    /// Sets the backend B parameters.
    #[must_use]
    pub fn with_vai(mut self, vai: VaiParameters) -> Self {
        self.vai = vai;
        self
    }

    /// Sets the backend A parameters.
    #[must_use]
    pub fn with_kfp(mut self, kfp: KfpParameters) -> Self {
        self.kfp = kfp;
        self
    }

    /// Sets the flow settings.
    #[must_use]
    pub fn with_flow(mut self, flow: FlowConfig) -> Self {
        self.flow = flow;
        self
    }
}

/// Backend B project parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaiParameters {
    /// Cloud project.
    #[serde(default)]
    pub project: String,
    /// Cloud region.
    #[serde(default)]
    pub location: String,
}

impl VaiParameters {
    /// Creates parameters for a project and region.
    #[must_use]
    pub fn new(project: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            location: location.into(),
        }
    }

    /// The fully qualified pipeline job name for a run.
    #[must_use]
    pub fn pipeline_job_name(&self, run_id: &str) -> String {
        format!(
            "projects/{}/locations/{}/pipelineJobs/{run_id}",
            self.project, self.location
        )
    }
}

/// Backend A metadata store parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KfpParameters {
    /// Context type that groups a run's artifacts.
    #[serde(default = "default_pipeline_run_context_type")]
    pub pipeline_run_context_type: String,
    /// Artifact type of pushed serving models.
    #[serde(default = "default_pushed_model_type")]
    pub pushed_model_type: String,
}

fn default_pipeline_run_context_type() -> String {
    "pipeline_run".to_string()
}

fn default_pushed_model_type() -> String {
    "PushedModel".to_string()
}

impl Default for KfpParameters {
    fn default() -> Self {
        Self {
            pipeline_run_context_type: default_pipeline_run_context_type(),
            pushed_model_type: default_pushed_model_type(),
        }
    }
}

/// Flow stage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowConfig {
    /// Capacity of the queue between two stages.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    1
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl FlowConfig {
    /// Sets the queue capacity.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// The queue capacity, never below one.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.channel_capacity.max(1)
    }
}
