//! Messages with completion handlers.

use crate::errors::FailureKind;
use std::fmt;

/// A completion callback.
pub type Handler = Box<dyn FnOnce() + Send + 'static>;

/// The three ways a message can complete.
///
/// Every consuming method takes `self`, so exactly one handler can run and
/// it runs at most once. Dropping the handlers invokes none of them.
pub struct OnCompleteHandlers {
    on_success: Handler,
    on_recoverable_failure: Handler,
    on_unrecoverable_failure: Handler,
}

impl OnCompleteHandlers {
    /// Creates handlers from three callbacks.
    pub fn new<S, R, U>(on_success: S, on_recoverable_failure: R, on_unrecoverable_failure: U) -> Self
    where
        S: FnOnce() + Send + 'static,
        R: FnOnce() + Send + 'static,
        U: FnOnce() + Send + 'static,
    {
        Self {
            on_success: Box::new(on_success),
            on_recoverable_failure: Box::new(on_recoverable_failure),
            on_unrecoverable_failure: Box::new(on_unrecoverable_failure),
        }
    }

    /// Handlers that do nothing.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(|| {}, || {}, || {})
    }

    /// Acknowledges the message.
    pub fn success(self) {
        (self.on_success)();
    }

    /// Asks the source to redeliver the message.
    pub fn recoverable_failure(self) {
        (self.on_recoverable_failure)();
    }

    /// Asks the source to drop the message permanently.
    pub fn unrecoverable_failure(self) {
        (self.on_unrecoverable_failure)();
    }

    /// Invokes the failure handler matching `kind`.
    pub fn fail(self, kind: FailureKind) {
        match kind {
            FailureKind::Recoverable => self.recoverable_failure(),
            FailureKind::Unrecoverable => self.unrecoverable_failure(),
        }
    }
}

impl Default for OnCompleteHandlers {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for OnCompleteHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnCompleteHandlers").finish_non_exhaustive()
    }
}

/// A payload travelling through a flow with its source's handlers.
#[derive(Debug)]
pub struct StreamMessage<T> {
    /// The payload.
    pub payload: T,
    /// How to report completion to the source.
    pub handlers: OnCompleteHandlers,
}

impl<T> StreamMessage<T> {
    /// Creates a message.
    pub fn new(payload: T, handlers: OnCompleteHandlers) -> Self {
        Self { payload, handlers }
    }

    /// Replaces the payload, keeping the handlers.
    pub fn with_payload<U>(self, payload: U) -> StreamMessage<U> {
        StreamMessage {
            payload,
            handlers: self.handlers,
        }
    }

    /// Splits the message.
    pub fn into_parts(self) -> (T, OnCompleteHandlers) {
        (self.payload, self.handlers)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::recording_handlers;
    use super::*;

    #[test]
    fn test_each_handler_runs_once() {
        let (handlers, calls) = recording_handlers();
        handlers.success();
        assert_eq!(calls.counts(), (1, 0, 0));

        let (handlers, calls) = recording_handlers();
        handlers.fail(FailureKind::Recoverable);
        assert_eq!(calls.counts(), (0, 1, 0));

        let (handlers, calls) = recording_handlers();
        handlers.fail(FailureKind::Unrecoverable);
        assert_eq!(calls.counts(), (0, 0, 1));
    }

    #[test]
    fn test_with_payload_keeps_handlers() {
        let (handlers, calls) = recording_handlers();
        let message = StreamMessage::new(1, handlers).with_payload("one");
        assert_eq!(message.payload, "one");

        let (_, handlers) = message.into_parts();
        handlers.success();
        assert_eq!(calls.counts(), (1, 0, 0));
    }

    #[test]
    fn test_dropping_invokes_nothing() {
        let (handlers, calls) = recording_handlers();
        drop(StreamMessage::new((), handlers));
        assert_eq!(calls.counts(), (0, 0, 0));
    }
}
