//! transient status notices and per-operation workflow state

use serde::{Deserialize, Serialize};

/// kind of a transient status notice
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Pending,
    Success,
    Error,
}

/// human-readable notice scoped to a single operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusNotice {
    pub kind: StatusKind,
    pub message: String,
}

impl StatusNotice {
    pub fn pending(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Pending,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: message.into(),
        }
    }
}

/// explicit state of a single workflow
///
/// one value per operation replaces ad-hoc busy flags; a workflow that is
/// `Running` rejects re-entry until it settles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed(String),
}

impl WorkflowState {
    pub fn is_running(&self) -> bool {
        matches!(self, WorkflowState::Running)
    }
}
