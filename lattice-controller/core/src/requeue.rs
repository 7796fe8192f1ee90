use crate::RuleError;
use std::time::Duration;

/// How long to wait before revisiting an object whose sibling resources
/// are not yet known.
pub const NOT_READY_RETRY: Duration = Duration::from_secs(20);

/// The result of a reconciliation pass, as seen by a scheduler.
#[derive(Debug)]
pub enum Outcome {
    Ready,
    RetryAfter { delay: Duration, reason: String },
    RetryNow { reason: String },
    Failed(RuleError),
}

// === impl Outcome ===

impl Outcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl<T> From<Result<T, RuleError>> for Outcome {
    fn from(res: Result<T, RuleError>) -> Self {
        match res {
            Ok(_) => Self::Ready,
            Err(RuleError::NotReady(miss)) => Self::RetryAfter {
                delay: NOT_READY_RETRY,
                reason: miss.to_string(),
            },
            Err(RuleError::Requeue {
                reason,
                after: Some(delay),
            }) => Self::RetryAfter { delay, reason },
            Err(RuleError::Requeue {
                reason,
                after: None,
            }) => Self::RetryNow { reason },
            Err(error) => Self::Failed(error),
        }
    }
}
