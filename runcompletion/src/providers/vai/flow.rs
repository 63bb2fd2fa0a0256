//! Backend B stages and end-to-end resolution.

use super::api::{PipelineJob, PipelineJobClient};
use super::artifacts::{pipeline_components, serving_model_artifacts};
use super::references::VaiReferenceResolver;
use crate::assembler::{select_artifacts, AssemblyInput, EventAssembler};
use crate::cancellation::CancellationToken;
use crate::config::{FlowConfig, ProviderConfig, VaiParameters};
use crate::core::{ArtifactDefinition, RunCompletionEventData};
use crate::errors::{Result, RunCompletionError};
use crate::streams::{Flow, Transform};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// A job fetched for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedJob {
    /// The run identifier the signal carried.
    pub run_id: String,
    /// The job.
    pub job: PipelineJob,
}

/// Fetches the pipeline job for a run identifier.
#[derive(Clone)]
pub struct VaiJobStage {
    client: Arc<dyn PipelineJobClient>,
    parameters: VaiParameters,
}

impl VaiJobStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(client: Arc<dyn PipelineJobClient>, parameters: VaiParameters) -> Self {
        Self { client, parameters }
    }
}

impl std::fmt::Debug for VaiJobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaiJobStage")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transform for VaiJobStage {
    type In = String;
    type Out = FetchedJob;

    fn name(&self) -> &'static str {
        "vai-job"
    }

    async fn transform(
        &self,
        run_id: String,
        cancel: &CancellationToken,
    ) -> Result<Option<FetchedJob>> {
        let name = self.parameters.pipeline_job_name(&run_id);
        let job = cancel
            .run_until_cancelled(async {
                self.client.get_pipeline_job(&name).await.map_err(|e| {
                    RunCompletionError::fetching("GetPipelineJob", format!("pipeline job {name}"), e)
                })
            })
            .await?;
        Ok(Some(FetchedJob { run_id, job }))
    }
}

/// Classifies the job and reads references and artifacts from it.
#[derive(Debug, Clone, Default)]
pub struct VaiResolveStage {
    references: VaiReferenceResolver,
    definitions: Vec<ArtifactDefinition>,
}

impl VaiResolveStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(references: VaiReferenceResolver) -> Self {
        Self {
            references,
            definitions: Vec::new(),
        }
    }

    /// Sets artifact definitions applied to every job.
    #[must_use]
    pub fn with_definitions(mut self, definitions: Vec<ArtifactDefinition>) -> Self {
        self.definitions = definitions;
        self
    }

    /// Builds the assembly input, or `None` for a job still in progress.
    #[must_use]
    pub fn resolve(&self, fetched: FetchedJob) -> Option<AssemblyInput> {
        let FetchedJob { run_id, job } = fetched;
        let classification = job.state.classify();
        if !classification.is_terminal() {
            debug!(%run_id, state = ?job.state, "pipeline job not finished");
            return None;
        }

        let references = self.references.resolve(&job);
        let components = pipeline_components(&job);
        let definitions: Vec<ArtifactDefinition> = self
            .definitions
            .iter()
            .chain(&references.artifacts)
            .cloned()
            .collect();

        let mut input = AssemblyInput::new(run_id, classification, references);
        input.serving_model_artifacts = serving_model_artifacts(&job);
        input.artifacts = select_artifacts(&components, &definitions);
        input.pipeline_components = components;
        Some(input)
    }
}

#[async_trait]
impl Transform for VaiResolveStage {
    type In = FetchedJob;
    type Out = AssemblyInput;

    fn name(&self) -> &'static str {
        "vai-resolve"
    }

    async fn transform(
        &self,
        fetched: FetchedJob,
        _cancel: &CancellationToken,
    ) -> Result<Option<AssemblyInput>> {
        Ok(self.resolve(fetched))
    }
}

/// Resolves backend B run identifiers into events.
#[derive(Debug, Clone)]
pub struct VaiEventResolver {
    job: VaiJobStage,
    resolve: VaiResolveStage,
    assembler: EventAssembler,
}

impl VaiEventResolver {
    /// Creates a resolver over `client`.
    #[must_use]
    pub fn new(config: &ProviderConfig, client: Arc<dyn PipelineJobClient>) -> Self {
        Self {
            job: VaiJobStage::new(client, config.vai.clone()),
            resolve: VaiResolveStage::new(VaiReferenceResolver::new(config.labels.clone())),
            assembler: EventAssembler::new(config.name.clone()),
        }
    }

    /// Sets artifact definitions applied to every job.
    #[must_use]
    pub fn with_artifact_definitions(mut self, definitions: Vec<ArtifactDefinition>) -> Self {
        self.resolve = self.resolve.with_definitions(definitions);
        self
    }

    /// Resolves one run. `Ok(None)` means no event is due.
    pub async fn event_for_run(
        &self,
        run_id: impl Into<String>,
        cancel: &CancellationToken,
    ) -> Result<Option<RunCompletionEventData>> {
        let Some(fetched) = self.job.transform(run_id.into(), cancel).await? else {
            return Ok(None);
        };
        Ok(self
            .resolve
            .resolve(fetched)
            .and_then(|input| self.assembler.assemble(input)))
    }

    /// Wires the three stages into a flow.
    #[must_use]
    pub fn into_flow(
        self,
        cancel: CancellationToken,
        config: &FlowConfig,
    ) -> Flow<String, RunCompletionEventData> {
        Flow::new(self.job, cancel, config)
            .via(self.resolve)
            .via(self.assembler)
    }
}
