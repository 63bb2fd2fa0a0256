//! Flow stages: one sequential loop per transform, wired by bounded queues.

use super::message::StreamMessage;
use crate::cancellation::CancellationToken;
use crate::config::FlowConfig;
use crate::errors::{FailureKind, Result, RunCompletionError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// A single step of a flow.
///
/// `Ok(None)` suppresses the message: it is dropped and none of its
/// handlers run.
#[async_trait]
pub trait Transform: Send + Sync + 'static {
    /// Payload accepted.
    type In: Send + 'static;
    /// Payload produced.
    type Out: Send + 'static;

    /// A short name for logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Transforms one payload.
    async fn transform(
        &self,
        input: Self::In,
        cancel: &CancellationToken,
    ) -> Result<Option<Self::Out>>;
}

/// A linear pipeline of stages.
///
/// Messages are processed strictly in arrival order. Each stage hands off
/// through a queue of [`FlowConfig::capacity`] slots, so a slow stage
/// stalls the stages before it. All stages report errors to one shared
/// error outlet, after invoking the message's failure handler.
///
/// The error outlet is unbounded and held by the flow until it is split or
/// shut down. Callers that only read outputs should take it apart with
/// [`Flow::into_parts`] and drop the error receiver; errors are then
/// discarded as they are reported.
pub struct Flow<I, O> {
    inlet: mpsc::Sender<StreamMessage<I>>,
    outlet: mpsc::Receiver<StreamMessage<O>>,
    errors: mpsc::UnboundedReceiver<RunCompletionError>,
    error_tx: mpsc::UnboundedSender<RunCompletionError>,
    cancel: CancellationToken,
    capacity: usize,
    tasks: Vec<JoinHandle<()>>,
}

impl<I, O> Flow<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Starts a flow with a single stage.
    pub fn new<T>(transform: T, cancel: CancellationToken, config: &FlowConfig) -> Self
    where
        T: Transform<In = I, Out = O>,
    {
        let capacity = config.capacity();
        let (inlet, inbound) = mpsc::channel(capacity);
        let (outbound, outlet) = mpsc::channel(capacity);
        let (error_tx, errors) = mpsc::unbounded_channel();

        let task = spawn_stage(
            Arc::new(transform),
            inbound,
            outbound,
            error_tx.clone(),
            cancel.clone(),
        );

        Self {
            inlet,
            outlet,
            errors,
            error_tx,
            cancel,
            capacity,
            tasks: vec![task],
        }
    }

    /// Appends a stage consuming this flow's output.
    pub fn via<T>(self, transform: T) -> Flow<I, T::Out>
    where
        T: Transform<In = O>,
    {
        let (outbound, outlet) = mpsc::channel(self.capacity);
        let mut tasks = self.tasks;
        tasks.push(spawn_stage(
            Arc::new(transform),
            self.outlet,
            outbound,
            self.error_tx.clone(),
            self.cancel.clone(),
        ));

        Flow {
            inlet: self.inlet,
            outlet,
            errors: self.errors,
            error_tx: self.error_tx,
            cancel: self.cancel,
            capacity: self.capacity,
            tasks,
        }
    }

    /// A sender for the first stage.
    pub fn inlet(&self) -> mpsc::Sender<StreamMessage<I>> {
        self.inlet.clone()
    }

    /// Receives the next output message.
    pub async fn next(&mut self) -> Option<StreamMessage<O>> {
        self.outlet.recv().await
    }

    /// Receives the next error.
    pub async fn next_error(&mut self) -> Option<RunCompletionError> {
        self.errors.recv().await
    }

    /// Returns an already reported error, if any.
    pub fn try_next_error(&mut self) -> Option<RunCompletionError> {
        self.errors.try_recv().ok()
    }

    /// Splits the flow into its inlet, outlet and error outlet.
    ///
    /// Stage tasks keep running until the inlet senders are dropped or the
    /// token is cancelled.
    pub fn into_parts(
        self,
    ) -> (
        mpsc::Sender<StreamMessage<I>>,
        mpsc::Receiver<StreamMessage<O>>,
        mpsc::UnboundedReceiver<RunCompletionError>,
    ) {
        (self.inlet, self.outlet, self.errors)
    }

    /// Closes the inlet and waits for every stage to drain.
    ///
    /// Outputs that were not received invoke their recoverable handlers.
    /// Senders obtained from [`Flow::inlet`] must be dropped for the first
    /// stage to finish.
    pub async fn shutdown(self) {
        let Self {
            inlet,
            mut outlet,
            tasks,
            ..
        } = self;
        drop(inlet);
        while let Some(message) = outlet.recv().await {
            message.handlers.recoverable_failure();
        }
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "flow stage task failed");
            }
        }
    }
}

fn spawn_stage<T: Transform>(
    transform: Arc<T>,
    inbound: mpsc::Receiver<StreamMessage<T::In>>,
    outbound: mpsc::Sender<StreamMessage<T::Out>>,
    errors: mpsc::UnboundedSender<RunCompletionError>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(run_stage(transform, inbound, outbound, errors, cancel))
}

async fn run_stage<T: Transform>(
    transform: Arc<T>,
    mut inbound: mpsc::Receiver<StreamMessage<T::In>>,
    outbound: mpsc::Sender<StreamMessage<T::Out>>,
    errors: mpsc::UnboundedSender<RunCompletionError>,
    cancel: CancellationToken,
) {
    let stage = transform.name();

    loop {
        let message = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            message = inbound.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };

        let (payload, handlers) = message.into_parts();
        match transform.transform(payload, &cancel).await {
            Ok(Some(output)) => {
                let permit = tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        handlers.recoverable_failure();
                        break;
                    }
                    permit = outbound.reserve() => permit,
                };
                match permit {
                    Ok(permit) => permit.send(StreamMessage::new(output, handlers)),
                    Err(_) => {
                        debug!(stage, "downstream closed");
                        handlers.recoverable_failure();
                        break;
                    }
                }
            }
            Ok(None) => debug!(stage, "message suppressed"),
            Err(err) => {
                let kind = err.failure_kind();
                match kind {
                    FailureKind::Unrecoverable => error!(stage, error = %err, "dropping message"),
                    FailureKind::Recoverable => warn!(stage, error = %err, "message will be retried"),
                }
                handlers.fail(kind);
                if errors.send(err).is_err() {
                    debug!(stage, "error outlet closed");
                }
            }
        }
    }

    // Whatever is still queued will not be processed.
    inbound.close();
    let mut released = 0_usize;
    while let Some(message) = inbound.recv().await {
        message.handlers.recoverable_failure();
        released += 1;
    }
    if released > 0 {
        debug!(stage, released, "released queued messages");
    }

    debug!(stage, "flow stage stopped");
}
