//! Status classification for backend execution states.
//!
//! Each backend reports progress in its own vocabulary. Both are parsed into
//! closed enums and mapped onto [`Classification`]; a non-terminal state is
//! not an error, callers simply stop without emitting an event.

use crate::core::RunCompletionStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The outcome of classifying a backend state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// The run reached a final state.
    Terminal(RunCompletionStatus),
    /// The run may still change state.
    NotTerminal,
}

impl Classification {
    /// Returns the terminal status, if any.
    #[must_use]
    pub fn status(self) -> Option<RunCompletionStatus> {
        match self {
            Self::Terminal(status) => Some(status),
            Self::NotTerminal => None,
        }
    }

    /// Returns true for a final state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Terminal(_))
    }
}

/// Workflow phase label values (backend A).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WorkflowPhase {
    /// No phase yet.
    Unset,
    /// Waiting to start.
    Pending,
    /// Executing.
    Running,
    /// Finished successfully.
    Succeeded,
    /// Finished with a failed step.
    Failed,
    /// Finished because the engine itself errored.
    Error,
    /// A value this version does not know.
    Other(String),
}

impl WorkflowPhase {
    /// Parses a phase label value.
    #[must_use]
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            None | Some("") => Self::Unset,
            Some("Pending") => Self::Pending,
            Some("Running") => Self::Running,
            Some("Succeeded") => Self::Succeeded,
            Some("Failed") => Self::Failed,
            Some("Error") => Self::Error,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    /// Maps the phase onto the canonical status.
    #[must_use]
    pub fn classify(&self) -> Classification {
        match self {
            Self::Succeeded => Classification::Terminal(RunCompletionStatus::Succeeded),
            Self::Failed | Self::Error => Classification::Terminal(RunCompletionStatus::Failed),
            Self::Unset | Self::Pending | Self::Running | Self::Other(_) => {
                Classification::NotTerminal
            }
        }
    }
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, ""),
            Self::Pending => write!(f, "Pending"),
            Self::Running => write!(f, "Running"),
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Failed => write!(f, "Failed"),
            Self::Error => write!(f, "Error"),
            Self::Other(other) => write!(f, "{other}"),
        }
    }
}

/// Managed pipeline job states (backend B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    /// The state was not reported.
    #[default]
    #[serde(alias = "PIPELINE_STATE_UNSPECIFIED")]
    Unspecified,
    /// Created and queued.
    #[serde(alias = "PIPELINE_STATE_QUEUED")]
    Queued,
    /// Waiting for resources.
    #[serde(alias = "PIPELINE_STATE_PENDING")]
    Pending,
    /// Executing.
    #[serde(alias = "PIPELINE_STATE_RUNNING")]
    Running,
    /// Finished successfully.
    #[serde(alias = "PIPELINE_STATE_SUCCEEDED")]
    Succeeded,
    /// Finished with a failure.
    #[serde(alias = "PIPELINE_STATE_FAILED")]
    Failed,
    /// Cancellation requested, not yet complete.
    #[serde(alias = "PIPELINE_STATE_CANCELLING")]
    Cancelling,
    /// Cancelled.
    #[serde(alias = "PIPELINE_STATE_CANCELLED")]
    Cancelled,
    /// Paused.
    #[serde(alias = "PIPELINE_STATE_PAUSED")]
    Paused,
}

impl PipelineState {
    /// Maps the state onto the canonical status.
    #[must_use]
    pub fn classify(self) -> Classification {
        match self {
            Self::Succeeded => Classification::Terminal(RunCompletionStatus::Succeeded),
            Self::Failed | Self::Cancelled => {
                Classification::Terminal(RunCompletionStatus::Failed)
            }
            Self::Unspecified
            | Self::Queued
            | Self::Pending
            | Self::Running
            | Self::Cancelling
            | Self::Paused => Classification::NotTerminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_phase_terminal() {
        assert_eq!(
            WorkflowPhase::from_label(Some("Succeeded")).classify(),
            Classification::Terminal(RunCompletionStatus::Succeeded)
        );
        assert_eq!(
            WorkflowPhase::from_label(Some("Failed")).classify(),
            Classification::Terminal(RunCompletionStatus::Failed)
        );
        assert_eq!(
            WorkflowPhase::from_label(Some("Error")).classify(),
            Classification::Terminal(RunCompletionStatus::Failed)
        );
    }

    #[test]
    fn test_workflow_phase_not_terminal() {
        for label in [None, Some(""), Some("Pending"), Some("Running"), Some("Omitted")] {
            let phase = WorkflowPhase::from_label(label);
            assert_eq!(phase.classify(), Classification::NotTerminal, "{phase}");
            assert_eq!(phase.classify().status(), None);
        }
    }

    #[test]
    fn test_workflow_phase_is_case_sensitive() {
        assert_eq!(
            WorkflowPhase::from_label(Some("succeeded")),
            WorkflowPhase::Other("succeeded".into())
        );
    }

    #[test]
    fn test_pipeline_state_terminal() {
        assert_eq!(
            PipelineState::Succeeded.classify(),
            Classification::Terminal(RunCompletionStatus::Succeeded)
        );
        assert_eq!(
            PipelineState::Failed.classify(),
            Classification::Terminal(RunCompletionStatus::Failed)
        );
        assert_eq!(
            PipelineState::Cancelled.classify(),
            Classification::Terminal(RunCompletionStatus::Failed)
        );
    }

    #[test]
    fn test_pipeline_state_not_terminal() {
        for state in [
            PipelineState::Unspecified,
            PipelineState::Queued,
            PipelineState::Pending,
            PipelineState::Running,
            PipelineState::Cancelling,
            PipelineState::Paused,
        ] {
            assert!(!state.classify().is_terminal(), "{state:?}");
        }
    }

    #[test]
    fn test_pipeline_state_deserialize_aliases() {
        let short: PipelineState = serde_json::from_str(r#""SUCCEEDED""#).unwrap();
        let long: PipelineState = serde_json::from_str(r#""PIPELINE_STATE_SUCCEEDED""#).unwrap();
        assert_eq!(short, PipelineState::Succeeded);
        assert_eq!(long, PipelineState::Succeeded);
    }
}
