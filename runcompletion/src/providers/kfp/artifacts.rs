//! Artifact resolution against the lineage store.

use super::metadata::{MetadataArtifact, MetadataStore, INVALID_ID};
use crate::cancellation::CancellationToken;
use crate::config::KfpParameters;
use crate::core::{Artifact, ArtifactDefinition};
use crate::errors::{Result, RunCompletionError};
use crate::filter::Filter;
use std::sync::Arc;
use tracing::{debug, warn};

/// Custom property holding an artifact's qualified name.
pub const ARTIFACT_NAME_PROPERTY: &str = "name";
/// Custom property set to 1 once a model has been pushed.
pub const PUSHED_PROPERTY: &str = "pushed";

/// A run's artifacts, as both views the event carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArtifacts {
    /// Models the run pushed to serving.
    pub serving_model_artifacts: Vec<Artifact>,
    /// Artifacts selected by the run's definitions.
    pub artifacts: Vec<Artifact>,
}

/// Looks up a run's artifacts in the lineage store.
#[derive(Clone)]
pub struct KfpArtifactResolver {
    store: Arc<dyn MetadataStore>,
    parameters: KfpParameters,
}

impl KfpArtifactResolver {
    /// Creates a resolver.
    #[must_use]
    pub fn new(store: Arc<dyn MetadataStore>, parameters: KfpParameters) -> Self {
        Self { store, parameters }
    }

    /// Resolves both artifact views, reading the run context at most once.
    pub async fn run_artifacts(
        &self,
        workflow_name: &str,
        definitions: &[ArtifactDefinition],
        cancel: &CancellationToken,
    ) -> Result<RunArtifacts> {
        let pushed_type = self.pushed_model_type(cancel).await?;
        if pushed_type.is_none() && definitions.is_empty() {
            return Ok(RunArtifacts::default());
        }

        let candidates = self.context_artifacts(workflow_name, cancel).await?;
        Ok(RunArtifacts {
            serving_model_artifacts: pushed_type
                .map(|type_id| pushed_models(&candidates, type_id))
                .unwrap_or_default(),
            artifacts: defined_artifacts(&candidates, definitions),
        })
    }

    /// Models the run pushed to serving.
    ///
    /// A store without the pushed model type has never seen a push and
    /// yields no artifacts.
    pub async fn serving_model_artifacts(
        &self,
        workflow_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Artifact>> {
        let Some(type_id) = self.pushed_model_type(cancel).await? else {
            return Ok(Vec::new());
        };
        let candidates = self.context_artifacts(workflow_name, cancel).await?;
        Ok(pushed_models(&candidates, type_id))
    }

    /// Artifacts selected by `definitions`.
    ///
    /// A candidate matches a definition when its name ends with the
    /// definition's `component:output:index`, its URI is set and the filter,
    /// if any, accepts its custom properties.
    pub async fn artifacts(
        &self,
        workflow_name: &str,
        definitions: &[ArtifactDefinition],
        cancel: &CancellationToken,
    ) -> Result<Vec<Artifact>> {
        if definitions.is_empty() {
            return Ok(Vec::new());
        }
        let candidates = self.context_artifacts(workflow_name, cancel).await?;
        Ok(defined_artifacts(&candidates, definitions))
    }

    async fn pushed_model_type(&self, cancel: &CancellationToken) -> Result<Option<i64>> {
        let type_name = self.parameters.pushed_model_type.as_str();
        let artifact_type = cancel
            .run_until_cancelled(async {
                match self.store.get_artifact_type(type_name).await {
                    Ok(artifact_type) => Ok(Some(artifact_type)),
                    Err(e) if e.is_not_found() => Ok(None),
                    Err(e) => Err(RunCompletionError::backend("GetArtifactType", e)),
                }
            })
            .await?;

        let Some(artifact_type) = artifact_type else {
            debug!(type_name, "pushed model type not registered");
            return Ok(None);
        };
        if artifact_type.id == INVALID_ID {
            return Err(RunCompletionError::InvalidIdentifier("artifact"));
        }
        Ok(Some(artifact_type.id))
    }

    async fn context_artifacts(
        &self,
        workflow_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<MetadataArtifact>> {
        let context_type = self.parameters.pipeline_run_context_type.as_str();
        let context = cancel
            .run_until_cancelled(async {
                self.store
                    .get_context_by_type_and_name(context_type, workflow_name)
                    .await
                    .map_err(|e| RunCompletionError::backend("GetContextByTypeAndName", e))
            })
            .await?;
        if context.id == INVALID_ID {
            return Err(RunCompletionError::InvalidIdentifier("context"));
        }

        cancel
            .run_until_cancelled(async {
                self.store
                    .get_artifacts_by_context(context.id)
                    .await
                    .map_err(|e| RunCompletionError::backend("GetArtifactsByContext", e))
            })
            .await
    }
}

fn pushed_models(candidates: &[MetadataArtifact], type_id: i64) -> Vec<Artifact> {
    candidates
        .iter()
        .filter(|artifact| artifact.type_id == type_id)
        .filter(|artifact| artifact.int_property(PUSHED_PROPERTY) == 1)
        .map(|artifact| {
            Artifact::new(
                artifact.string_property(ARTIFACT_NAME_PROPERTY),
                artifact.uri.as_str(),
            )
        })
        .filter(Artifact::is_real)
        .collect()
}

fn defined_artifacts(
    candidates: &[MetadataArtifact],
    definitions: &[ArtifactDefinition],
) -> Vec<Artifact> {
    let mut results = Vec::new();
    for definition in definitions {
        let filter = match definition.filter().map(Filter::parse).transpose() {
            Ok(filter) => filter,
            Err(error) => {
                warn!(artifact = %definition.name, %error, "ignoring artifact definition with invalid filter");
                continue;
            }
        };
        let matchable_name = definition.matchable_name();

        results.extend(
            candidates
                .iter()
                .filter(|candidate| !candidate.uri.is_empty())
                .filter(|candidate| {
                    candidate
                        .string_property(ARTIFACT_NAME_PROPERTY)
                        .ends_with(&matchable_name)
                })
                .filter(|candidate| {
                    filter
                        .as_ref()
                        .map_or(true, |f| f.matches(&candidate.properties_json()))
                })
                .map(|candidate| Artifact::new(definition.name.clone(), candidate.uri.clone())),
        );
    }
    results
}

impl std::fmt::Debug for KfpArtifactResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KfpArtifactResolver")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}
