//! Message-passing plumbing for run-completion flows.
//!
//! This module provides:
//! - [`StreamMessage`] and its [`OnCompleteHandlers`]
//! - The [`Transform`] trait and [`Flow`], a linear chain of stages
//! - [`EventSink`] implementations and [`run_sink`]

mod flow;
pub(crate) mod message;
mod sink;

pub use flow::{Flow, Transform};
pub use message::{Handler, OnCompleteHandlers, StreamMessage};
pub use sink::{run_sink, CollectingEventSink, EventSink, LoggingEventSink, SinkError};
