//! Core domain model for run-completion events.
//!
//! This module contains the types every backend resolves into:
//! - Namespaced resource names
//! - Artifact definitions, artifacts and component trees
//! - Resource references and the canonical event

mod artifact;
mod event;
mod names;
mod references;
mod status;

pub use artifact::{
    Artifact, ArtifactDefinition, ArtifactLocator, ArtifactPath, ArtifactPathError,
    ComponentArtifact, ComponentArtifactInstance, PipelineComponent, ARTIFACT_PATH_PATTERN,
};
pub use event::{RunCompletionEvent, RunCompletionEventData};
pub use names::{NameError, NamespacedName};
pub use references::ResourceReferences;
pub use status::RunCompletionStatus;
