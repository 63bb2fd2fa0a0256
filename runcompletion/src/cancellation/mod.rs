//! Cooperative cancellation shared by every flow stage.
//!
//! A single [`CancellationToken`] is cloned into each stage loop and each
//! resolver. Cancelling it stops the loops and aborts in-flight
//! collaborator calls with [`RunCompletionError::Cancelled`].
//!
//! [`RunCompletionError::Cancelled`]: crate::errors::RunCompletionError::Cancelled

mod token;

pub use token::CancellationToken;
