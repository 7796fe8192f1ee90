use ahash::AHashMap as HashMap;
use lattice_controller_core::{
    api::{
        ApiError, BatchUpdateRuleRequest, CreateRuleRequest, ForwardAction, HttpMatch,
        RuleDefinition, RulePriorityUpdate, RuleSummary, UpdateRuleRequest,
        WeightedTargetGroup,
    },
    priority::{self, MAX_PRIORITY},
    store::{ListenerKey, ServiceKey, TargetGroupKey},
    ResolutionMiss, Rule, RuleApi, RuleError, RuleSpec, RuleStatus, SharedStore,
};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Reconciles individual rules against a remote listener.
///
/// Names are resolved through the identifier store, which this type only
/// ever reads.
#[derive(Clone, Debug)]
pub struct RuleManager<A> {
    api: A,
    store: SharedStore,
}

/// Where a desired rule lands on its listener.
#[derive(Debug, PartialEq, Eq)]
enum Placement<'r> {
    Create { priority: u32 },
    Update { existing: &'r RuleDefinition },
}

// === impl RuleManager ===

impl<A: RuleApi> RuleManager<A> {
    pub fn new(api: A, store: SharedStore) -> Self {
        Self { api, store }
    }

    /// Creates the rule remotely, or updates the remote rule it corresponds
    /// to.
    ///
    /// The rule's logical priority may already be held by a rule with a
    /// different path, e.g. when a route's match changed. That rule is left
    /// alone and the new rule takes the next free priority instead.
    pub async fn create(
        &self,
        rule: &Rule,
        cancel: &CancellationToken,
    ) -> Result<RuleStatus, RuleError> {
        let spec = &rule.spec;
        let (service_id, listener_id) = self.resolve_listener(spec)?;
        let target_groups = self.resolve_target_groups(spec)?;
        let desired_priority = priority::decode(&spec.rule_id)?;

        let r#match = spec.path_prefix().map(HttpMatch::path_prefix);
        let action = ForwardAction { target_groups };

        let remote = self.rules_by_priority(&service_id, &listener_id, cancel).await?;
        let placement = place(
            &remote,
            desired_priority,
            spec.path_prefix(),
            &listener_id,
        )?;

        let (mutation, priority) = match placement {
            Placement::Update { existing } => {
                let priority = existing.priority.unwrap_or(desired_priority);
                if existing.r#match == r#match && existing.action == action {
                    debug!(
                        rule_id = %spec.rule_id,
                        remote_id = %existing.id,
                        priority,
                        "Rule is up to date"
                    );
                    return Ok(RuleStatus {
                        service_id,
                        listener_id,
                        rule_id: existing.id.clone(),
                        rule_arn: existing.arn.clone(),
                        priority,
                    });
                }

                let req = UpdateRuleRequest {
                    service_id: service_id.clone(),
                    listener_id: listener_id.clone(),
                    rule_id: existing.id.clone(),
                    priority,
                    r#match,
                    action,
                };
                let mutation = call(cancel, self.api.update_rule(req)).await?;
                info!(rule_id = %spec.rule_id, remote_id = %mutation.id, priority, "Updated rule");
                (mutation, priority)
            }

            Placement::Create { priority } => {
                if priority != priority::remote(desired_priority) {
                    info!(
                        rule_id = %spec.rule_id,
                        desired_priority,
                        priority,
                        "Priority is held by another rule"
                    );
                }
                let req = CreateRuleRequest {
                    service_id: service_id.clone(),
                    listener_id: listener_id.clone(),
                    name: spec.remote_name(),
                    priority,
                    r#match,
                    action,
                };
                let mutation = call(cancel, self.api.create_rule(req)).await?;
                info!(rule_id = %spec.rule_id, remote_id = %mutation.id, priority, "Created rule");
                (mutation, priority)
            }
        };

        Ok(RuleStatus {
            service_id,
            listener_id,
            rule_id: mutation.id,
            rule_arn: mutation.arn,
            priority,
        })
    }

    /// Sets every rule's remote priority to its logical priority in a single
    /// batch.
    ///
    /// All rules must belong to the same listener and must already have been
    /// created.
    pub async fn update(
        &self,
        rules: &[Rule],
        cancel: &CancellationToken,
    ) -> Result<(), RuleError> {
        let Some(first) = rules.first() else {
            return Ok(());
        };
        let (service_id, listener_id) = self.resolve_listener(&first.spec)?;

        let updates = rules
            .iter()
            .map(|rule| {
                let priority = priority::remote(priority::decode(&rule.spec.rule_id)?);
                let status = rule.status.as_ref().ok_or_else(|| RuleError::Unreconciled {
                    rule_id: rule.spec.rule_id.clone(),
                })?;
                Ok::<_, RuleError>(RulePriorityUpdate {
                    rule_id: status.rule_id.clone(),
                    priority,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let count = updates.len();
        let req = BatchUpdateRuleRequest {
            service_id,
            listener_id,
            rules: updates,
        };
        let result = call(cancel, self.api.batch_update_rule(req)).await?;
        if !result.unsuccessful.is_empty() {
            for failure in &result.unsuccessful {
                warn!(
                    remote_id = %failure.rule_id,
                    code = %failure.code,
                    message = %failure.message,
                    "Failed to update rule priority"
                );
            }
            return Err(RuleError::requeue(format!(
                "{} of {count} rule priorities were not updated",
                result.unsuccessful.len()
            )));
        }

        info!(count, "Updated rule priorities");
        Ok(())
    }

    /// Lists the rules of a listener in the order the remote service returns
    /// them.
    ///
    /// Summaries carry no priority, so each status reports a priority of 0.
    /// Remote priorities start at 1, so 0 always means unknown here.
    pub async fn list(
        &self,
        service_id: &str,
        listener_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<RuleStatus>, RuleError> {
        let summaries = self.summaries(service_id, listener_id, cancel).await?;
        Ok(summaries
            .into_iter()
            .map(|summary| RuleStatus {
                service_id: service_id.to_string(),
                listener_id: listener_id.to_string(),
                rule_id: summary.id,
                rule_arn: summary.arn,
                priority: 0,
            })
            .collect())
    }

    pub async fn get(
        &self,
        service_id: &str,
        listener_id: &str,
        rule_id: &str,
        cancel: &CancellationToken,
    ) -> Result<RuleDefinition, RuleError> {
        call(cancel, self.api.get_rule(service_id, listener_id, rule_id)).await
    }

    /// Deletes a remote rule. A rule that no longer exists is not an error.
    pub async fn delete(
        &self,
        rule_id: &str,
        listener_id: &str,
        service_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(), RuleError> {
        match call(cancel, self.api.delete_rule(service_id, listener_id, rule_id)).await {
            Ok(()) => {
                info!(%rule_id, %listener_id, "Deleted rule");
                Ok(())
            }
            Err(RuleError::Api(ApiError::NotFound { .. })) => {
                debug!(%rule_id, %listener_id, "Rule already deleted");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    pub(crate) async fn summaries(
        &self,
        service_id: &str,
        listener_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<RuleSummary>, RuleError> {
        call(cancel, self.api.list_rules(service_id, listener_id)).await
    }

    fn resolve_listener(&self, spec: &RuleSpec) -> Result<(String, String), RuleError> {
        let service = self
            .store
            .get_service(&ServiceKey::new(&spec.service_name, &spec.service_namespace))
            .ok_or_else(|| ResolutionMiss::Service {
                name: spec.service_name.clone(),
                namespace: spec.service_namespace.clone(),
            });
        let service = not_ready(service)?;

        let listener = self
            .store
            .get_listener(&ListenerKey::new(
                &spec.service_name,
                &spec.service_namespace,
                spec.listener_port,
                &spec.listener_protocol,
            ))
            .ok_or_else(|| ResolutionMiss::Listener {
                name: spec.service_name.clone(),
                namespace: spec.service_namespace.clone(),
                port: spec.listener_port,
                protocol: spec.listener_protocol.clone(),
            });
        let listener = not_ready(listener)?;

        Ok((service.id, listener.id))
    }

    fn resolve_target_groups(
        &self,
        spec: &RuleSpec,
    ) -> Result<Vec<WeightedTargetGroup>, RuleError> {
        spec.action
            .target_groups
            .iter()
            .map(|tg| {
                let key =
                    TargetGroupKey::for_backend(&tg.name, &tg.namespace, tg.is_service_import);
                let record = self.store.get_target_group(&key).ok_or_else(|| {
                    ResolutionMiss::TargetGroup {
                        name: tg.name.clone(),
                        namespace: tg.namespace.clone(),
                    }
                });
                Ok::<_, RuleError>(WeightedTargetGroup {
                    target_group_id: not_ready(record)?.id,
                    weight: tg.weight,
                })
            })
            .collect()
    }

    /// Fetches every non-default rule on the listener, keyed by priority.
    async fn rules_by_priority(
        &self,
        service_id: &str,
        listener_id: &str,
        cancel: &CancellationToken,
    ) -> Result<HashMap<u32, RuleDefinition>, RuleError> {
        let summaries = self.summaries(service_id, listener_id, cancel).await?;

        let mut rules = HashMap::with_capacity(summaries.len());
        for summary in summaries.into_iter().filter(|s| !s.is_default) {
            let rule = self.get(service_id, listener_id, &summary.id, cancel).await?;
            if let Some(priority) = rule.priority {
                rules.insert(priority, rule);
            }
        }
        Ok(rules)
    }
}

/// Walks up from the desired priority until it finds either a free
/// priority or the rule that already matches the desired path.
fn place<'r>(
    existing: &'r HashMap<u32, RuleDefinition>,
    desired: u32,
    path: Option<&str>,
    listener_id: &str,
) -> Result<Placement<'r>, RuleError> {
    let mut priority = priority::remote(desired);
    while priority <= MAX_PRIORITY {
        match existing.get(&priority) {
            None => return Ok(Placement::Create { priority }),
            Some(rule) if rule.path() == path => return Ok(Placement::Update { existing: rule }),
            Some(rule) => {
                debug!(priority, remote_id = %rule.id, "Priority is in use");
            }
        }
        priority += 1;
    }

    Err(RuleError::PriorityExhausted {
        listener_id: listener_id.to_string(),
        priority: desired,
    })
}

fn not_ready<T>(res: Result<T, ResolutionMiss>) -> Result<T, RuleError> {
    res.map_err(|miss| {
        debug!(%miss, "Waiting for dependency");
        miss.into()
    })
}

/// Races a remote call against cancellation.
async fn call<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, RuleError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RuleError::Cancelled),
        res = fut => res.map_err(Into::into),
    }
}
