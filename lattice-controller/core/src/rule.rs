use chrono::{offset::Utc, DateTime};

/// A routing rule as desired by a route, and as observed once reconciled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub spec: RuleSpec,
    pub status: Option<RuleStatus>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleSpec {
    pub service_name: String,
    pub service_namespace: String,
    pub listener_port: u16,
    pub listener_protocol: String,

    /// The logical identifier, `rule-<priority>`. See [`crate::priority`].
    pub rule_id: String,

    /// A path prefix to match. Empty for the default, weighted rule.
    pub rule_value: String,
    pub action: RuleAction,

    /// Used to name the rule when it is first created remotely.
    pub create_time: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleAction {
    pub target_groups: Vec<RuleTargetGroup>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RuleTargetGroup {
    pub name: String,
    pub namespace: String,
    pub is_service_import: bool,
    pub weight: u32,
}

/// Remote identifiers of a reconciled rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleStatus {
    pub service_id: String,
    pub listener_id: String,

    /// The identifier assigned by the remote service. Distinct from
    /// [`RuleSpec::rule_id`].
    pub rule_id: String,
    pub rule_arn: String,

    /// The priority the rule was written at. This only differs from the
    /// remote form of the logical priority (see [`crate::priority::remote`])
    /// when a conflicting rule occupied it. Remote priorities start at 1; a
    /// status built from a listing, which carries no priority, holds 0.
    pub priority: u32,
}

// === impl Rule ===

impl Rule {
    pub fn new(spec: RuleSpec) -> Self {
        Self { spec, status: None }
    }
}

// === impl RuleSpec ===

impl RuleSpec {
    /// The name given to the rule when it is created remotely.
    pub fn remote_name(&self) -> String {
        format!("k8s-{}-{}", self.create_time.timestamp(), self.rule_id)
    }

    /// The path prefix this rule matches, if it isn't a default rule.
    pub fn path_prefix(&self) -> Option<&str> {
        Some(self.rule_value.as_str()).filter(|v| !v.is_empty())
    }
}
