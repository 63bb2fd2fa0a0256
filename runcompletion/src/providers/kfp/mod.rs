//! Backend A: workflow signals backed by a run/job service and a lineage
//! store.
//!
//! - [`KfpReferenceResolver`] tries the run's reference block, then the
//!   creating job's, then the legacy reference list.
//! - [`KfpArtifactResolver`] queries the lineage store for pushed models and
//!   filtered artifacts.
//! - [`KfpEventResolver`] composes both with the assembler, as a single call
//!   or as a [`Flow`](crate::streams::Flow).

pub mod api;
mod artifacts;
mod flow;
pub mod metadata;
mod references;
mod workflow;

pub use artifacts::{KfpArtifactResolver, RunArtifacts, ARTIFACT_NAME_PROPERTY, PUSHED_PROPERTY};
pub use flow::{KfpArtifactStage, KfpEventResolver, KfpReferenceStage, ResolvedWorkflow};
pub use references::{KfpReferenceResolver, ReferenceStrategy};
pub use workflow::{
    ObjectMeta, WorkflowResource, WorkflowSpec, PHASE_LABEL, PIPELINE_SPEC_ANNOTATION,
    RUN_ID_LABEL,
};
