//! Shared helpers.

pub mod timestamps;

pub use timestamps::{normalize_utc, Timestamp};
