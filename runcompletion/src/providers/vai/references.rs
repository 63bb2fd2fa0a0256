//! Reference resolution from job labels.

use super::api::PipelineJob;
use crate::core::{NamespacedName, ResourceReferences};
use crate::labels::LabelKeys;
use crate::utils::normalize_utc;

/// Reads references back from the labels [`LabelGen`](crate::labels::LabelGen)
/// wrote on submission. No backend call is made.
#[derive(Debug, Clone, Default)]
pub struct VaiReferenceResolver {
    keys: LabelKeys,
}

impl VaiReferenceResolver {
    /// Creates a resolver reading `keys`.
    #[must_use]
    pub fn new(keys: LabelKeys) -> Self {
        Self { keys }
    }

    /// Resolves the job's references and times.
    #[must_use]
    pub fn resolve(&self, job: &PipelineJob) -> ResourceReferences {
        let keys = &self.keys;
        let labels = &job.labels;

        let mut run_configuration_name = LabelKeys::name_from(
            labels,
            &keys.run_configuration_name,
            &keys.run_configuration_namespace,
        );
        if run_configuration_name.is_empty() {
            if let Some(legacy) = labels.get(&keys.legacy_run_configuration) {
                run_configuration_name = NamespacedName::named(legacy.as_str());
            }
        }

        ResourceReferences {
            pipeline_name: LabelKeys::name_from(labels, &keys.pipeline_name, &keys.pipeline_namespace),
            run_configuration_name,
            run_name: LabelKeys::name_from(labels, &keys.run_name, &keys.run_namespace),
            ..ResourceReferences::default()
        }
        .with_times(
            job.start_time.as_ref().and_then(normalize_utc),
            job.end_time.as_ref().and_then(normalize_utc),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{LabelGen, LabelSource, LabelStyle, RunDefinition};
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn job(labels: BTreeMap<String, String>) -> PipelineJob {
        PipelineJob {
            labels,
            ..PipelineJob::default()
        }
    }

    #[test]
    fn test_resolves_generated_labels() {
        let labels = LabelGen::new(LabelKeys::default())
            .with_style(LabelStyle::Vai)
            .generate(&LabelSource::Run(RunDefinition {
                name: NamespacedName::new("run", "team"),
                pipeline_name: NamespacedName::new("pipeline", "team"),
                pipeline_version: "1.2.3".into(),
                run_configuration_name: NamespacedName::new("rc", "team"),
                trigger: None,
            }));

        let references = VaiReferenceResolver::default().resolve(&job(labels));

        assert_eq!(references.pipeline_name, NamespacedName::new("pipeline", "team"));
        assert_eq!(references.run_configuration_name, NamespacedName::new("rc", "team"));
        assert_eq!(references.run_name, NamespacedName::new("run", "team"));
    }

    #[test]
    fn test_legacy_run_configuration_label() {
        let labels = BTreeMap::from([
            ("pipeline-name".to_string(), "foo".to_string()),
            ("run-configuration".to_string(), "old-rc".to_string()),
        ]);

        let references = VaiReferenceResolver::default().resolve(&job(labels));

        assert_eq!(references.run_configuration_name, NamespacedName::named("old-rc"));
        assert!(references.run_name.is_empty());
    }

    #[test]
    fn test_current_labels_take_precedence_over_legacy() {
        let labels = BTreeMap::from([
            ("runconfiguration-name".to_string(), "rc".to_string()),
            ("run-configuration".to_string(), "old-rc".to_string()),
        ]);

        let references = VaiReferenceResolver::default().resolve(&job(labels));

        assert_eq!(references.run_configuration_name, NamespacedName::named("rc"));
    }

    #[test]
    fn test_times_are_normalized() {
        let start = DateTime::parse_from_rfc3339("2024-05-01T14:00:00+02:00").unwrap();
        let job = PipelineJob {
            start_time: Some(start),
            end_time: Some(DateTime::parse_from_rfc3339("1970-01-01T00:00:00Z").unwrap()),
            ..PipelineJob::default()
        };

        let references = VaiReferenceResolver::default().resolve(&job);

        assert_eq!(
            references.created_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(references.finished_at, None);
    }
}
