//! Backend B: managed pipeline jobs identified by labels.
//!
//! The job carries everything needed: its state, the identity labels
//! written on submission and every task's output artifacts. Resolution
//! takes a single [`PipelineJobClient`] call.

pub mod api;
mod artifacts;
mod flow;
mod references;

pub use api::{ArtifactList, OutputArtifact, PipelineJob, PipelineJobClient, PipelineTaskDetail};
pub use artifacts::{
    pipeline_components, serving_model_artifacts, PUSHED_DESTINATION_PROPERTY,
    PUSHED_MODEL_SCHEMA, PUSHED_PROPERTY,
};
pub use flow::{FetchedJob, VaiEventResolver, VaiJobStage, VaiResolveStage};
pub use references::VaiReferenceResolver;
