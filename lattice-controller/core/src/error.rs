use crate::ApiError;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// A sibling resource has not been reconciled yet.
    #[error(transparent)]
    NotReady(#[from] ResolutionMiss),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("no free rule priority on listener {listener_id} at or above {priority}")]
    PriorityExhausted { listener_id: String, priority: u32 },

    #[error("rule {rule_id} has no remote identifier")]
    Unreconciled { rule_id: String },

    #[error("requeue needed: {reason}")]
    Requeue {
        reason: String,
        after: Option<Duration>,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A name that could not be resolved to a remote identifier.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionMiss {
    #[error("service {namespace}/{name} is not ready")]
    Service { name: String, namespace: String },

    #[error("listener {port}/{protocol} of service {namespace}/{name} is not ready")]
    Listener {
        name: String,
        namespace: String,
        port: u16,
        protocol: String,
    },

    #[error("target group {namespace}/{name} is not ready")]
    TargetGroup { name: String, namespace: String },
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid rule id {rule_id:?}: expected rule-<priority>")]
pub struct FormatError {
    pub rule_id: String,
}

// === impl RuleError ===

impl RuleError {
    /// Requests that the caller revisits the object immediately.
    pub fn requeue(reason: impl ToString) -> Self {
        Self::Requeue {
            reason: reason.to_string(),
            after: None,
        }
    }

    /// Requests that the caller revisits the object after `after`.
    pub fn requeue_after(reason: impl ToString, after: Duration) -> Self {
        Self::Requeue {
            reason: reason.to_string(),
            after: Some(after),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotReady(_) | Self::Requeue { .. })
    }
}
