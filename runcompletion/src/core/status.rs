//! Canonical run-completion status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The terminal status reported on a run-completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunCompletionStatus {
    /// The run finished successfully.
    Succeeded,
    /// The run failed, errored or was cancelled.
    Failed,
}

impl fmt::Display for RunCompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(RunCompletionStatus::Succeeded.to_string(), "succeeded");
        assert_eq!(RunCompletionStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_status_serialize() {
        let json = serde_json::to_string(&RunCompletionStatus::Succeeded).unwrap();
        assert_eq!(json, r#""succeeded""#);

        let deserialized: RunCompletionStatus = serde_json::from_str(r#""failed""#).unwrap();
        assert_eq!(deserialized, RunCompletionStatus::Failed);
    }
}
