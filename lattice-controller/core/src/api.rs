//! The subset of the remote service's API used to manage listener rules.

use std::sync::Arc;

/// Manages the rules of a remote listener.
///
/// Implementations own transport concerns (authentication, retries,
/// pagination); callers see each method as a single round trip.
#[async_trait::async_trait]
pub trait RuleApi: Send + Sync {
    /// Lists the rules of a listener, in the order the service returns them.
    async fn list_rules(
        &self,
        service_id: &str,
        listener_id: &str,
    ) -> Result<Vec<RuleSummary>, ApiError>;

    async fn get_rule(
        &self,
        service_id: &str,
        listener_id: &str,
        rule_id: &str,
    ) -> Result<RuleDefinition, ApiError>;

    async fn create_rule(&self, req: CreateRuleRequest) -> Result<RuleMutation, ApiError>;

    async fn update_rule(&self, req: UpdateRuleRequest) -> Result<RuleMutation, ApiError>;

    /// Changes the priorities of several rules at once. The service applies
    /// the batch atomically, so priorities may be swapped between rules.
    async fn batch_update_rule(
        &self,
        req: BatchUpdateRuleRequest,
    ) -> Result<BatchUpdateRuleResult, ApiError>;

    async fn delete_rule(
        &self,
        service_id: &str,
        listener_id: &str,
        rule_id: &str,
    ) -> Result<(), ApiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleSummary {
    pub id: String,
    pub arn: String,
    pub name: String,
    pub is_default: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleDefinition {
    pub id: String,
    pub arn: String,
    pub name: String,
    pub priority: Option<u32>,
    pub is_default: bool,
    pub r#match: Option<HttpMatch>,
    pub action: ForwardAction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpMatch {
    pub method: Option<String>,
    pub path: Option<PathMatch>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathMatch {
    Exact(String),
    Prefix(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ForwardAction {
    pub target_groups: Vec<WeightedTargetGroup>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightedTargetGroup {
    pub target_group_id: String,
    pub weight: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateRuleRequest {
    pub service_id: String,
    pub listener_id: String,
    pub name: String,
    pub priority: u32,
    pub r#match: Option<HttpMatch>,
    pub action: ForwardAction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateRuleRequest {
    pub service_id: String,
    pub listener_id: String,
    pub rule_id: String,
    pub priority: u32,
    pub r#match: Option<HttpMatch>,
    pub action: ForwardAction,
}

/// The identifiers of a created or updated rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleMutation {
    pub id: String,
    pub arn: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchUpdateRuleRequest {
    pub service_id: String,
    pub listener_id: String,
    pub rules: Vec<RulePriorityUpdate>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RulePriorityUpdate {
    pub rule_id: String,
    pub priority: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchUpdateRuleResult {
    pub successful: Vec<RulePriorityUpdate>,
    pub unsuccessful: Vec<RuleUpdateFailure>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleUpdateFailure {
    pub rule_id: String,
    pub code: String,
    pub message: String,
}

// === impl HttpMatch ===

impl HttpMatch {
    pub fn path_prefix(prefix: impl ToString) -> Self {
        Self {
            method: None,
            path: Some(PathMatch::Prefix(prefix.to_string())),
        }
    }
}

// === impl RuleDefinition ===

impl RuleDefinition {
    /// The path this rule matches, if any.
    pub fn path(&self) -> Option<&str> {
        match self.r#match.as_ref()?.path.as_ref()? {
            PathMatch::Exact(path) | PathMatch::Prefix(path) => {
                Some(path.as_str()).filter(|p| !p.is_empty())
            }
        }
    }
}

#[async_trait::async_trait]
impl<A: RuleApi + ?Sized> RuleApi for Arc<A> {
    async fn list_rules(
        &self,
        service_id: &str,
        listener_id: &str,
    ) -> Result<Vec<RuleSummary>, ApiError> {
        (**self).list_rules(service_id, listener_id).await
    }

    async fn get_rule(
        &self,
        service_id: &str,
        listener_id: &str,
        rule_id: &str,
    ) -> Result<RuleDefinition, ApiError> {
        (**self).get_rule(service_id, listener_id, rule_id).await
    }

    async fn create_rule(&self, req: CreateRuleRequest) -> Result<RuleMutation, ApiError> {
        (**self).create_rule(req).await
    }

    async fn update_rule(&self, req: UpdateRuleRequest) -> Result<RuleMutation, ApiError> {
        (**self).update_rule(req).await
    }

    async fn batch_update_rule(
        &self,
        req: BatchUpdateRuleRequest,
    ) -> Result<BatchUpdateRuleResult, ApiError> {
        (**self).batch_update_rule(req).await
    }

    async fn delete_rule(
        &self,
        service_id: &str,
        listener_id: &str,
        rule_id: &str,
    ) -> Result<(), ApiError> {
        (**self).delete_rule(service_id, listener_id, rule_id).await
    }
}
