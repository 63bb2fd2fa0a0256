//! Event sinks at the end of a flow.

use super::message::StreamMessage;
use crate::core::RunCompletionEventData;
use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn, Level};

/// Error returned when a sink rejects an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sink rejected event: {0}")]
pub struct SinkError(pub String);

/// Receives completed events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publishes an event. An error asks the source to redeliver.
    async fn publish(&self, event: &RunCompletionEventData) -> Result<(), SinkError>;
}

/// Drains a flow outlet into `sink`.
///
/// A message is acknowledged only after the sink accepts it; a rejected
/// message gets its recoverable handler. Returns when the outlet closes.
pub async fn run_sink<S>(mut outlet: mpsc::Receiver<StreamMessage<RunCompletionEventData>>, sink: &S)
where
    S: EventSink + ?Sized,
{
    while let Some(message) = outlet.recv().await {
        let (event, handlers) = message.into_parts();
        match sink.publish(&event).await {
            Ok(()) => handlers.success(),
            Err(error) => {
                warn!(run_id = %event.run_id, %error, "failed to publish run completion event");
                handlers.recoverable_failure();
            }
        }
    }
    debug!("event sink outlet closed");
}

/// A sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a logging sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn publish(&self, event: &RunCompletionEventData) -> Result<(), SinkError> {
        let payload = serde_json::to_string(event).map_err(|e| SinkError(e.to_string()))?;
        if self.level == Level::DEBUG {
            debug!(run_id = %event.run_id, provider = %event.provider, %payload, "run completed");
        } else {
            info!(run_id = %event.run_id, provider = %event.provider, %payload, "run completed");
        }
        Ok(())
    }
}

/// A sink that keeps every event, for tests and local runs.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<RunCompletionEventData>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<RunCompletionEventData> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn publish(&self, event: &RunCompletionEventData) -> Result<(), SinkError> {
        self.events.write().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NamespacedName, RunCompletionStatus};
    use crate::streams::message::test_support::recording_handlers;

    struct RejectingSink;

    #[async_trait]
    impl EventSink for RejectingSink {
        async fn publish(&self, _event: &RunCompletionEventData) -> Result<(), SinkError> {
            Err(SinkError("bus unavailable".into()))
        }
    }

    fn event(run_id: &str) -> RunCompletionEventData {
        RunCompletionEventData {
            status: RunCompletionStatus::Succeeded,
            pipeline_name: NamespacedName::new("pipeline", "team"),
            run_configuration_name: None,
            run_name: None,
            run_id: run_id.into(),
            run_start_time: None,
            run_end_time: None,
            serving_model_artifacts: vec![],
            artifacts: vec![],
            pipeline_components: vec![],
            provider: "test".into(),
        }
    }

    #[tokio::test]
    async fn test_accepted_events_are_acknowledged() {
        let (tx, rx) = mpsc::channel(2);
        let (handlers, calls) = recording_handlers();
        tx.send(StreamMessage::new(event("run-1"), handlers)).await.unwrap();
        drop(tx);

        let sink = CollectingEventSink::new();
        run_sink(rx, &sink).await;

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.events()[0].run_id, "run-1");
        assert_eq!(calls.counts(), (1, 0, 0));
    }

    #[tokio::test]
    async fn test_rejected_events_are_retried() {
        let (tx, rx) = mpsc::channel(1);
        let (handlers, calls) = recording_handlers();
        tx.send(StreamMessage::new(event("run-1"), handlers)).await.unwrap();
        drop(tx);

        run_sink(rx, &RejectingSink).await;
        assert_eq!(calls.counts(), (0, 1, 0));
    }

    #[tokio::test]
    async fn test_logging_sink_accepts() {
        assert!(LoggingEventSink::default().publish(&event("run-1")).await.is_ok());
        assert!(LoggingEventSink::debug().publish(&event("run-2")).await.is_ok());
    }
}
