//! Event assembly.
//!
//! Both backends resolve into an [`AssemblyInput`]; the [`EventAssembler`]
//! turns it into the canonical [`RunCompletionEventData`] or suppresses it.

use crate::cancellation::CancellationToken;
use crate::classify::Classification;
use crate::core::{
    Artifact, ArtifactDefinition, NamespacedName, PipelineComponent, ResourceReferences,
    RunCompletionEventData,
};
use crate::errors::Result;
use crate::filter::Filter;
use crate::streams::Transform;
use async_trait::async_trait;
use tracing::{info, warn};

/// Names to fall back on when the resolved pipeline identity is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineNameFallback {
    /// Name embedded in the signal's pipeline spec annotation.
    pub annotation: String,
    /// The signal's declared entrypoint.
    pub entrypoint: String,
}

impl PipelineNameFallback {
    /// The first non-empty fallback, annotation first.
    #[must_use]
    pub fn resolve(&self) -> Option<NamespacedName> {
        [&self.annotation, &self.entrypoint]
            .into_iter()
            .find(|name| !name.is_empty())
            .map(NamespacedName::named)
    }
}

/// Everything resolved for a run, ready to assemble.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyInput {
    /// The backend run identifier.
    pub run_id: String,
    /// The classified run state.
    pub classification: Classification,
    /// The resolved identities and times.
    pub references: ResourceReferences,
    /// Pipeline names to use when `references` has none.
    pub fallback: PipelineNameFallback,
    /// Models pushed to serving.
    pub serving_model_artifacts: Vec<Artifact>,
    /// Artifacts selected by the run's definitions.
    pub artifacts: Vec<Artifact>,
    /// The run's component tree.
    pub pipeline_components: Vec<PipelineComponent>,
}

impl AssemblyInput {
    /// Creates an input with no artifacts and no fallback.
    #[must_use]
    pub fn new(
        run_id: impl Into<String>,
        classification: Classification,
        references: ResourceReferences,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            classification,
            references,
            fallback: PipelineNameFallback::default(),
            serving_model_artifacts: Vec::new(),
            artifacts: Vec::new(),
            pipeline_components: Vec::new(),
        }
    }
}

/// Builds events stamped with a provider identity.
#[derive(Debug, Clone)]
pub struct EventAssembler {
    provider: String,
}

impl EventAssembler {
    /// Creates an assembler for `provider`.
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }

    /// Assembles the event, or `None` when it must be suppressed.
    #[must_use]
    pub fn assemble(&self, input: AssemblyInput) -> Option<RunCompletionEventData> {
        let status = input.classification.status()?;
        let references = input.references;

        let pipeline_name = if references.pipeline_name.is_empty() {
            let Some(name) = input.fallback.resolve() else {
                info!(run_id = %input.run_id, "pipeline name could not be resolved, skipping event");
                return None;
            };
            name
        } else {
            references.pipeline_name
        };

        Some(RunCompletionEventData {
            status,
            pipeline_name,
            run_configuration_name: references.run_configuration_name.non_empty(),
            run_name: references.run_name.non_empty(),
            run_id: input.run_id,
            run_start_time: references.created_at,
            run_end_time: references.finished_at,
            serving_model_artifacts: input.serving_model_artifacts,
            artifacts: input.artifacts,
            pipeline_components: input.pipeline_components,
            provider: self.provider.clone(),
        })
    }
}

#[async_trait]
impl Transform for EventAssembler {
    type In = AssemblyInput;
    type Out = RunCompletionEventData;

    fn name(&self) -> &'static str {
        "assemble"
    }

    async fn transform(
        &self,
        input: AssemblyInput,
        _cancel: &CancellationToken,
    ) -> Result<Option<RunCompletionEventData>> {
        Ok(self.assemble(input))
    }
}

/// Applies artifact definitions to a component tree.
///
/// For each definition the instance at the locator's index is selected when
/// its URI is set and the filter, if any, accepts its metadata. A definition
/// with an unparsable filter selects nothing.
#[must_use]
pub fn select_artifacts(
    components: &[PipelineComponent],
    definitions: &[ArtifactDefinition],
) -> Vec<Artifact> {
    definitions
        .iter()
        .filter_map(|definition| {
            let filter = match definition.filter().map(Filter::parse).transpose() {
                Ok(filter) => filter,
                Err(error) => {
                    warn!(artifact = %definition.name, %error, "ignoring artifact definition with invalid filter");
                    return None;
                }
            };
            let locator = &definition.path.locator;

            components
                .iter()
                .filter(|component| component.name == locator.component)
                .flat_map(|component| &component.component_artifacts)
                .filter(|output| output.name == locator.artifact)
                .filter_map(|output| output.artifacts.get(locator.index))
                .find(|instance| {
                    !instance.uri.is_empty()
                        && filter.as_ref().map_or(true, |f| f.matches(&instance.metadata))
                })
                .map(|instance| Artifact::new(definition.name.clone(), instance.uri.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ComponentArtifact, ComponentArtifactInstance, RunCompletionStatus};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn references() -> ResourceReferences {
        ResourceReferences {
            pipeline_name: NamespacedName::new("pipeline", "team"),
            run_name: NamespacedName::new("run", "team"),
            ..ResourceReferences::default()
        }
    }

    fn succeeded() -> Classification {
        Classification::Terminal(RunCompletionStatus::Succeeded)
    }

    #[test]
    fn test_not_terminal_is_suppressed() {
        let input = AssemblyInput::new("run-1", Classification::NotTerminal, references());
        assert_eq!(EventAssembler::new("p").assemble(input), None);
    }

    #[test]
    fn test_optional_names_are_absent_when_empty() {
        let event = EventAssembler::new("p")
            .assemble(AssemblyInput::new("run-1", succeeded(), references()))
            .unwrap();

        assert_eq!(event.pipeline_name, NamespacedName::new("pipeline", "team"));
        assert_eq!(event.run_configuration_name, None);
        assert_eq!(event.run_name, Some(NamespacedName::new("run", "team")));
        assert_eq!(event.provider, "p");
    }

    #[test]
    fn test_annotation_fallback_precedes_entrypoint() {
        let mut input = AssemblyInput::new("run-1", succeeded(), ResourceReferences::default());
        input.fallback = PipelineNameFallback {
            annotation: "from-annotation".into(),
            entrypoint: "from-entrypoint".into(),
        };
        let event = EventAssembler::new("p").assemble(input).unwrap();
        assert_eq!(event.pipeline_name, NamespacedName::named("from-annotation"));
    }

    #[test]
    fn test_entrypoint_fallback() {
        let mut input = AssemblyInput::new("run-1", succeeded(), ResourceReferences::default());
        input.fallback.entrypoint = "from-entrypoint".into();
        let event = EventAssembler::new("p").assemble(input).unwrap();
        assert_eq!(event.pipeline_name, NamespacedName::named("from-entrypoint"));
    }

    #[test]
    fn test_unidentifiable_pipeline_is_suppressed() {
        let input = AssemblyInput::new("run-1", succeeded(), ResourceReferences::default());
        assert_eq!(EventAssembler::new("p").assemble(input), None);
    }

    fn components() -> Vec<PipelineComponent> {
        vec![PipelineComponent {
            name: "pusher".into(),
            component_artifacts: vec![ComponentArtifact {
                name: "pushed_model".into(),
                artifacts: vec![
                    ComponentArtifactInstance {
                        uri: "gs://models/1".into(),
                        metadata: json!({"pushed": 1, "x": {"y": 1}}).as_object().cloned().unwrap(),
                    },
                    ComponentArtifactInstance {
                        uri: String::new(),
                        metadata: serde_json::Map::new(),
                    },
                ],
            }],
        }]
    }

    fn definition(name: &str, path: &str) -> ArtifactDefinition {
        ArtifactDefinition::new(name, path.parse().unwrap())
    }

    #[test]
    fn test_select_artifacts() {
        let selected = select_artifacts(
            &components(),
            &[
                definition("serving", "pusher:pushed_model:0[x.y == 1]"),
                definition("filtered-out", "pusher:pushed_model:0[x.y == 2]"),
                definition("missing-property", "pusher:pushed_model:0[z == 1]"),
                definition("empty-uri", "pusher:pushed_model:1"),
                definition("out-of-range", "pusher:pushed_model:5"),
                definition("other-component", "trainer:model"),
            ],
        );
        assert_eq!(selected, vec![Artifact::new("serving", "gs://models/1")]);
    }

    #[test]
    fn test_select_artifacts_skips_invalid_filter() {
        let selected = select_artifacts(
            &components(),
            &[
                definition("broken", "pusher:pushed_model:0[x ===]"),
                definition("plain", "pusher:pushed_model"),
            ],
        );
        assert_eq!(selected, vec![Artifact::new("plain", "gs://models/1")]);
    }

    #[tokio::test]
    async fn test_transform_delegates_to_assemble() {
        let assembler = EventAssembler::new("p");
        let out = assembler
            .transform(
                AssemblyInput::new("run-1", succeeded(), references()),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(out.map(|e| e.run_id), Some("run-1".to_string()));
    }
}
