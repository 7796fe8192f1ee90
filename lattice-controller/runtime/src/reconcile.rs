use crate::{ControllerConfig, ResourceId};
use kube::runtime::controller::Action;
use lattice_controller_core::{Outcome, Rule, RuleApi, RuleError};
use lattice_controller_rules::RuleSynthesizer;
use std::{sync::Arc, time::Duration};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// Reconciles routes, bounding how many run at once.
#[derive(Clone, Debug)]
pub struct RouteReconciler<A> {
    synthesizer: RuleSynthesizer<A>,
    limit: Arc<Semaphore>,
}

// === impl RouteReconciler ===

impl<A: RuleApi> RouteReconciler<A> {
    pub fn new(config: &ControllerConfig, synthesizer: RuleSynthesizer<A>) -> Self {
        Self {
            synthesizer,
            limit: Arc::new(Semaphore::new(config.route_max_concurrent_reconciles.get())),
        }
    }

    /// Synthesizes a route's rules, recording each rule's remote status, and
    /// returns when the route should next be visited.
    pub async fn reconcile(
        &self,
        route: &ResourceId,
        rules: &mut [Rule],
        cancel: &CancellationToken,
    ) -> Result<Action, RuleError> {
        let span = info_span!("reconcile", namespace = %route.namespace, name = %route.name);

        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RuleError::Cancelled),
            permit = self.limit.acquire() => permit.map_err(|_| RuleError::Cancelled)?,
        };

        let res = self
            .synthesizer
            .synthesize(rules, cancel)
            .instrument(span.clone())
            .await;
        let _enter = span.enter();
        into_action(res.into())
    }
}

/// Translates the outcome of a pass into the scheduler's next action.
///
/// Failures are returned as errors so that the scheduler applies its own
/// backoff.
pub fn into_action(outcome: Outcome) -> Result<Action, RuleError> {
    match outcome {
        Outcome::Ready => {
            debug!("Reconciled");
            Ok(Action::await_change())
        }
        Outcome::RetryAfter { delay, reason } => {
            info!(%reason, ?delay, "Requeueing");
            Ok(Action::requeue(delay))
        }
        Outcome::RetryNow { reason } => {
            info!(%reason, "Requeueing immediately");
            Ok(Action::requeue(Duration::ZERO))
        }
        Outcome::Failed(error) => {
            warn!(%error, "Reconciliation failed");
            Err(error)
        }
    }
}
