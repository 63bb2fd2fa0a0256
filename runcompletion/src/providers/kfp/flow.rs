//! Backend A stages and end-to-end resolution.
//!
//! A workflow signal passes through three stages:
//! reference resolution, artifact resolution and assembly.

use super::api::{JobService, RunService};
use super::artifacts::KfpArtifactResolver;
use super::metadata::MetadataStore;
use super::references::KfpReferenceResolver;
use super::workflow::WorkflowResource;
use crate::assembler::{AssemblyInput, EventAssembler, PipelineNameFallback};
use crate::cancellation::CancellationToken;
use crate::classify::Classification;
use crate::config::{FlowConfig, ProviderConfig};
use crate::core::{ResourceReferences, RunCompletionEventData};
use crate::errors::Result;
use crate::streams::{Flow, Transform};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// A terminal workflow with its references resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWorkflow {
    /// The workflow name; keys the lineage context.
    pub workflow_name: String,
    /// The backend run identifier.
    pub run_id: String,
    /// The classified phase.
    pub classification: Classification,
    /// The resolved references.
    pub references: ResourceReferences,
    /// Names from the workflow to fall back on.
    pub fallback: PipelineNameFallback,
}

/// Classifies the workflow and resolves its run's references.
#[derive(Debug, Clone)]
pub struct KfpReferenceStage {
    resolver: KfpReferenceResolver,
}

impl KfpReferenceStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(resolver: KfpReferenceResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Transform for KfpReferenceStage {
    type In = WorkflowResource;
    type Out = ResolvedWorkflow;

    fn name(&self) -> &'static str {
        "kfp-references"
    }

    async fn transform(
        &self,
        workflow: WorkflowResource,
        cancel: &CancellationToken,
    ) -> Result<Option<ResolvedWorkflow>> {
        let phase = workflow.phase();
        let classification = phase.classify();
        if !classification.is_terminal() {
            debug!(workflow = %workflow.name(), %phase, "workflow not finished");
            return Ok(None);
        }

        let run_id = workflow.run_id();
        if run_id.is_empty() {
            info!(workflow = %workflow.name(), "workflow has no run id, skipping");
            return Ok(None);
        }

        let references = self.resolver.resolve(run_id, cancel).await?;

        Ok(Some(ResolvedWorkflow {
            workflow_name: workflow.name().to_string(),
            run_id: run_id.to_string(),
            classification,
            fallback: workflow.fallback(),
            references,
        }))
    }
}

/// Looks up the run's artifacts in the lineage store.
#[derive(Debug, Clone)]
pub struct KfpArtifactStage {
    resolver: KfpArtifactResolver,
}

impl KfpArtifactStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(resolver: KfpArtifactResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Transform for KfpArtifactStage {
    type In = ResolvedWorkflow;
    type Out = AssemblyInput;

    fn name(&self) -> &'static str {
        "kfp-artifacts"
    }

    async fn transform(
        &self,
        resolved: ResolvedWorkflow,
        cancel: &CancellationToken,
    ) -> Result<Option<AssemblyInput>> {
        let run_artifacts = self
            .resolver
            .run_artifacts(&resolved.workflow_name, &resolved.references.artifacts, cancel)
            .await?;

        let mut input = AssemblyInput::new(
            resolved.run_id,
            resolved.classification,
            resolved.references,
        );
        input.fallback = resolved.fallback;
        input.serving_model_artifacts = run_artifacts.serving_model_artifacts;
        input.artifacts = run_artifacts.artifacts;
        Ok(Some(input))
    }
}

/// Resolves backend A workflow signals into events.
#[derive(Debug, Clone)]
pub struct KfpEventResolver {
    references: KfpReferenceStage,
    artifacts: KfpArtifactStage,
    assembler: EventAssembler,
}

impl KfpEventResolver {
    /// Creates a resolver over the given collaborators.
    #[must_use]
    pub fn new(
        config: &ProviderConfig,
        runs: Arc<dyn RunService>,
        jobs: Arc<dyn JobService>,
        store: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            references: KfpReferenceStage::new(KfpReferenceResolver::new(runs, jobs)),
            artifacts: KfpArtifactStage::new(KfpArtifactResolver::new(store, config.kfp.clone())),
            assembler: EventAssembler::new(config.name.clone()),
        }
    }

    /// Resolves one workflow. `Ok(None)` means no event is due.
    pub async fn event_for_workflow(
        &self,
        workflow: WorkflowResource,
        cancel: &CancellationToken,
    ) -> Result<Option<RunCompletionEventData>> {
        let Some(resolved) = self.references.transform(workflow, cancel).await? else {
            return Ok(None);
        };
        let Some(input) = self.artifacts.transform(resolved, cancel).await? else {
            return Ok(None);
        };
        Ok(self.assembler.assemble(input))
    }

    /// Wires the three stages into a flow.
    #[must_use]
    pub fn into_flow(
        self,
        cancel: CancellationToken,
        config: &FlowConfig,
    ) -> Flow<WorkflowResource, RunCompletionEventData> {
        Flow::new(self.references, cancel, config)
            .via(self.artifacts)
            .via(self.assembler)
    }
}
