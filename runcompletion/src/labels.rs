//! Label keys and label generation.
//!
//! Backend B resources carry their identities as labels. [`LabelGen`]
//! writes them when a run or schedule is created and the backend B
//! reference resolver reads them back with the same [`LabelKeys`].

use crate::core::NamespacedName;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static LABEL_VALUE_INVALID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]+").expect("label value pattern compiles"));

/// The label keys used to carry identities on backend resources.
///
/// The defaults are fixed strings that resources created by older versions
/// already carry; changing them breaks resolution of those resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelKeys {
    /// Pipeline name.
    pub pipeline_name: String,
    /// Pipeline namespace.
    pub pipeline_namespace: String,
    /// Pipeline version.
    pub pipeline_version: String,
    /// Run configuration name.
    pub run_configuration_name: String,
    /// Run configuration namespace.
    pub run_configuration_namespace: String,
    /// Run name.
    pub run_name: String,
    /// Run namespace.
    pub run_namespace: String,
    /// Un-namespaced run configuration name written by older versions.
    pub legacy_run_configuration: String,
    /// Provider name.
    pub provider_name: String,
    /// Provider namespace.
    pub provider_namespace: String,
    /// What triggered the run.
    pub trigger_type: String,
    /// The resource that triggered the run.
    pub trigger_source: String,
    /// Namespace of the resource that triggered the run.
    pub trigger_source_namespace: String,
}

impl Default for LabelKeys {
    fn default() -> Self {
        Self {
            pipeline_name: "pipeline-name".into(),
            pipeline_namespace: "pipeline-namespace".into(),
            pipeline_version: "pipeline-version".into(),
            run_configuration_name: "runconfiguration-name".into(),
            run_configuration_namespace: "runconfiguration-namespace".into(),
            run_name: "run-name".into(),
            run_namespace: "run-namespace".into(),
            legacy_run_configuration: "run-configuration".into(),
            provider_name: "provider-name".into(),
            provider_namespace: "provider-namespace".into(),
            trigger_type: "trigger-type".into(),
            trigger_source: "trigger-source".into(),
            trigger_source_namespace: "trigger-source-namespace".into(),
        }
    }
}

impl LabelKeys {
    /// Reads a name/namespace pair from `labels`.
    #[must_use]
    pub fn name_from(
        labels: &BTreeMap<String, String>,
        name_key: &str,
        namespace_key: &str,
    ) -> NamespacedName {
        let get = |key: &str| labels.get(key).cloned().unwrap_or_default();
        NamespacedName::new(get(name_key), get(namespace_key))
    }
}

/// Why a run was started.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerIndicator {
    /// The trigger kind, such as `onChangeRunSpec` or `schedule`.
    #[serde(rename = "type")]
    pub trigger_type: String,
    /// The triggering resource.
    pub source: String,
    /// The triggering resource's namespace.
    pub source_namespace: String,
}

impl TriggerIndicator {
    /// Creates a trigger indicator.
    #[must_use]
    pub fn new(
        trigger_type: impl Into<String>,
        source: impl Into<String>,
        source_namespace: impl Into<String>,
    ) -> Self {
        Self {
            trigger_type: trigger_type.into(),
            source: source.into(),
            source_namespace: source_namespace.into(),
        }
    }

    /// Writes the non-empty fields as sanitised label values.
    pub fn write_labels(&self, keys: &LabelKeys, labels: &mut BTreeMap<String, String>) {
        for (key, value) in [
            (&keys.trigger_type, &self.trigger_type),
            (&keys.trigger_source, &self.source),
            (&keys.trigger_source_namespace, &self.source_namespace),
        ] {
            if !value.is_empty() {
                labels.insert(key.clone(), sanitise(value));
            }
        }
    }

    /// Reads an indicator back from labels. Missing keys yield empty fields.
    #[must_use]
    pub fn from_labels(keys: &LabelKeys, labels: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| labels.get(key).cloned().unwrap_or_default();
        Self {
            trigger_type: get(&keys.trigger_type),
            source: get(&keys.trigger_source),
            source_namespace: get(&keys.trigger_source_namespace),
        }
    }
}

/// Makes a value safe for use as a label: `/` becomes `_` and anything
/// outside `[a-zA-Z0-9_-]` is removed.
#[must_use]
pub fn sanitise(value: &str) -> String {
    LABEL_VALUE_INVALID
        .replace_all(&value.replace('/', "_"), "")
        .into_owned()
}

/// A single run about to be submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunDefinition {
    /// The run resource.
    pub name: NamespacedName,
    /// The pipeline it executes.
    pub pipeline_name: NamespacedName,
    /// The pipeline version.
    pub pipeline_version: String,
    /// The run configuration that owns the run, if any.
    pub run_configuration_name: NamespacedName,
    /// What triggered the run.
    pub trigger: Option<TriggerIndicator>,
}

/// A schedule about to be submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunScheduleDefinition {
    /// The schedule resource.
    pub name: NamespacedName,
    /// The pipeline it executes.
    pub pipeline_name: NamespacedName,
    /// The pipeline version.
    pub pipeline_version: String,
    /// The run configuration that owns the schedule.
    pub run_configuration_name: NamespacedName,
    /// What triggered the schedule.
    pub trigger: TriggerIndicator,
}

/// The resources labels are generated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelSource {
    /// A one-off run.
    Run(RunDefinition),
    /// A recurring schedule.
    Schedule(RunScheduleDefinition),
}

/// How a backend constrains label values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LabelStyle {
    /// Values are written as given, with provider and trigger labels.
    #[default]
    Standard,
    /// Backend B: `.` is not allowed in versions, and only identity labels
    /// are written.
    Vai,
}

/// Generates identity labels for runs and schedules.
#[derive(Debug, Clone, Default)]
pub struct LabelGen {
    keys: LabelKeys,
    provider: NamespacedName,
    style: LabelStyle,
}

impl LabelGen {
    /// Creates a generator using `keys`.
    #[must_use]
    pub fn new(keys: LabelKeys) -> Self {
        Self {
            keys,
            ..Self::default()
        }
    }

    /// Sets the provider written on standard-style labels.
    #[must_use]
    pub fn with_provider(mut self, provider: NamespacedName) -> Self {
        self.provider = provider;
        self
    }

    /// Sets the label style.
    #[must_use]
    pub fn with_style(mut self, style: LabelStyle) -> Self {
        self.style = style;
        self
    }

    /// Generates labels for `source`.
    #[must_use]
    pub fn generate(&self, source: &LabelSource) -> BTreeMap<String, String> {
        let mut labels = match source {
            LabelSource::Run(run) => {
                let mut labels = self.pipeline_labels(&run.pipeline_name, &run.pipeline_version);
                insert_name(
                    &mut labels,
                    &run.run_configuration_name,
                    &self.keys.run_configuration_name,
                    &self.keys.run_configuration_namespace,
                );
                insert_name(
                    &mut labels,
                    &run.name,
                    &self.keys.run_name,
                    &self.keys.run_namespace,
                );
                if let (Some(trigger), LabelStyle::Standard) = (&run.trigger, self.style) {
                    trigger.write_labels(&self.keys, &mut labels);
                }
                labels
            }
            LabelSource::Schedule(schedule) => {
                let mut labels =
                    self.pipeline_labels(&schedule.pipeline_name, &schedule.pipeline_version);
                insert_name(
                    &mut labels,
                    &schedule.run_configuration_name,
                    &self.keys.run_configuration_name,
                    &self.keys.run_configuration_namespace,
                );
                if self.style == LabelStyle::Standard {
                    schedule.trigger.write_labels(&self.keys, &mut labels);
                }
                labels
            }
        };

        if self.style == LabelStyle::Standard {
            labels.insert(self.keys.provider_name.clone(), self.provider.name.clone());
            labels.insert(
                self.keys.provider_namespace.clone(),
                self.provider.namespace.clone(),
            );
        }
        labels
    }

    fn pipeline_labels(&self, pipeline: &NamespacedName, version: &str) -> BTreeMap<String, String> {
        let version = match self.style {
            LabelStyle::Standard => version.to_string(),
            LabelStyle::Vai => version.replace('.', "-"),
        };
        BTreeMap::from([
            (self.keys.pipeline_name.clone(), pipeline.name.clone()),
            (self.keys.pipeline_namespace.clone(), pipeline.namespace.clone()),
            (self.keys.pipeline_version.clone(), version),
        ])
    }

}

fn insert_name(
    labels: &mut BTreeMap<String, String>,
    name: &NamespacedName,
    name_key: &str,
    namespace_key: &str,
) {
    if !name.is_empty() {
        labels.insert(name_key.to_string(), name.name.clone());
        labels.insert(namespace_key.to_string(), name.namespace.clone());
    }
}
