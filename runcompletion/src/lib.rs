//! # Runcompletion
//!
//! Turns completion signals from machine-learning pipeline backends into one
//! canonical run-completion event.
//!
//! Each backend reports completion its own way:
//!
//! - **Backend A** ([`providers::kfp`]): a workflow resource whose phase label
//!   changed, with identities held by a run/job service and artifacts in a
//!   lineage store
//! - **Backend B** ([`providers::vai`]): a run identifier, resolved through a
//!   managed job API whose labels carry the identities
//!
//! Both are classified, resolved and assembled into a
//! [`RunCompletionEventData`](core::RunCompletionEventData), either with a
//! single async call or as a staged [`Flow`](streams::Flow) whose messages
//! carry acknowledgement handlers back to the signal source.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use runcompletion::prelude::*;
//!
//! let config = ProviderConfig::from_yaml_str(document)?;
//! let resolver = VaiEventResolver::new(&config, client);
//! let flow = resolver.into_flow(CancellationToken::new(), &config.flow);
//! let (inlet, outlet, errors) = flow.into_parts();
//!
//! tokio::spawn(async move { run_sink(outlet, &LoggingEventSink::default()).await });
//! inlet.send(StreamMessage::new(run_id, handlers)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod assembler;
pub mod cancellation;
pub mod classify;
pub mod config;
pub mod core;
pub mod errors;
pub mod filter;
pub mod labels;
pub mod observability;
pub mod providers;
pub mod streams;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::assembler::{select_artifacts, AssemblyInput, EventAssembler};
    pub use crate::cancellation::CancellationToken;
    pub use crate::classify::{Classification, PipelineState, WorkflowPhase};
    pub use crate::config::{FlowConfig, KfpParameters, ProviderConfig, VaiParameters};
    pub use crate::core::{
        Artifact, ArtifactDefinition, ArtifactPath, NamespacedName, PipelineComponent,
        ResourceReferences, RunCompletionEvent, RunCompletionEventData, RunCompletionStatus,
    };
    pub use crate::errors::{BackendError, FailureKind, RunCompletionError};
    pub use crate::filter::Filter;
    pub use crate::labels::{LabelGen, LabelKeys, LabelSource};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::providers::kfp::{KfpEventResolver, WorkflowResource};
    pub use crate::providers::vai::{PipelineJobClient, VaiEventResolver};
    pub use crate::streams::{
        run_sink, EventSink, Flow, LoggingEventSink, OnCompleteHandlers, StreamMessage,
        Transform,
    };
}
