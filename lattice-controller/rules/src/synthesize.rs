use crate::RuleManager;
use ahash::AHashSet as HashSet;
use lattice_controller_core::{priority, Rule, RuleApi, RuleError};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Reconciles the complete rule set of a route.
///
/// A route owns every listener its rules are attached to, so remote rules
/// on those listeners that the route no longer wants are deleted.
#[derive(Clone, Debug)]
pub struct RuleSynthesizer<A> {
    manager: RuleManager<A>,
}

// === impl RuleSynthesizer ===

impl<A: RuleApi> RuleSynthesizer<A> {
    pub fn new(manager: RuleManager<A>) -> Self {
        Self { manager }
    }

    /// Creates or updates every rule, recording its status on the rule, then
    /// removes stale remote rules and restores the logical priority order.
    pub async fn synthesize(
        &self,
        rules: &mut [Rule],
        cancel: &CancellationToken,
    ) -> Result<(), RuleError> {
        for rule in rules.iter_mut() {
            let status = self.manager.create(rule, cancel).await?;
            rule.status = Some(status);
        }

        let mut listeners = BTreeMap::<(String, String), Vec<usize>>::new();
        for (i, rule) in rules.iter().enumerate() {
            if let Some(status) = rule.status.as_ref() {
                listeners
                    .entry((status.service_id.clone(), status.listener_id.clone()))
                    .or_default()
                    .push(i);
            }
        }

        for ((service_id, listener_id), members) in listeners {
            let desired = members
                .iter()
                .filter_map(|&i| rules[i].status.as_ref())
                .map(|status| status.rule_id.clone())
                .collect::<HashSet<_>>();

            let remote = self.manager.summaries(&service_id, &listener_id, cancel).await?;
            for stale in remote
                .iter()
                .filter(|s| !s.is_default && !desired.contains(&s.id))
            {
                debug!(remote_id = %stale.id, name = %stale.name, "Removing stale rule");
                self.manager
                    .delete(&stale.id, &listener_id, &service_id, cancel)
                    .await?;
            }

            let mut displaced = false;
            for &i in &members {
                let rule = &rules[i];
                let wanted = priority::remote(priority::decode(&rule.spec.rule_id)?);
                if rule.status.as_ref().map(|s| s.priority) != Some(wanted) {
                    displaced = true;
                }
            }
            if !displaced {
                continue;
            }

            info!(%listener_id, rules = members.len(), "Restoring rule priorities");
            let group = members.iter().map(|&i| rules[i].clone()).collect::<Vec<_>>();
            self.manager.update(&group, cancel).await?;
            for &i in &members {
                let wanted = priority::remote(priority::decode(&rules[i].spec.rule_id)?);
                if let Some(status) = rules[i].status.as_mut() {
                    status.priority = wanted;
                }
            }
        }

        Ok(())
    }
}
