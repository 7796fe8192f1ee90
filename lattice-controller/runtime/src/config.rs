use anyhow::{bail, Result};
use std::num::NonZeroUsize;

/// Settings for the controller, read from flags or the environment.
#[derive(Clone, Debug, Default, clap::Args)]
pub struct ControllerArgs {
    /// The region of the remote service.
    #[clap(long, env = "REGION")]
    region: Option<String>,

    /// Used when no region is configured explicitly.
    #[clap(long, env = "AWS_REGION", hide = true)]
    aws_region: Option<String>,

    #[clap(long, env = "CLUSTER_NAME")]
    cluster_name: Option<String>,

    #[clap(long, env = "CLUSTER_VPC_ID")]
    cluster_vpc_id: Option<String>,

    #[clap(long, env = "AWS_ACCOUNT_ID")]
    account_id: Option<String>,

    /// The service network that gateways are associated with by default.
    #[clap(long, env = "DEFAULT_SERVICE_NETWORK")]
    default_service_network: Option<String>,

    /// Associates every gateway with the default service network. Ignored
    /// unless a default service network is configured.
    #[clap(
        long,
        env = "ENABLE_SERVICE_NETWORK_OVERRIDE",
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = parse_flag
    )]
    enable_service_network_override: bool,

    #[clap(
        long,
        env = "DISABLE_TAGGING_SERVICE_API",
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = parse_flag
    )]
    disable_tagging_service_api: bool,

    #[clap(
        long,
        env = "DEV_MODE",
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = parse_flag
    )]
    dev_mode: bool,

    #[clap(
        long,
        env = "WEBHOOK_ENABLED",
        action = clap::ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = parse_flag
    )]
    webhook_enabled: bool,

    #[clap(long, env = "ROUTE_MAX_CONCURRENT_RECONCILES", default_value = "1")]
    route_max_concurrent_reconciles: usize,
}

/// Startup configuration. Built once and shared read-only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerConfig {
    pub region: String,
    pub cluster_name: String,
    pub vpc_id: String,
    pub account_id: String,
    pub default_service_network: Option<String>,
    pub service_network_override: bool,
    pub disable_tagging_service_api: bool,
    pub dev_mode: bool,
    pub webhook_enabled: bool,
    pub route_max_concurrent_reconciles: NonZeroUsize,
}

// === impl ControllerArgs ===

impl ControllerArgs {
    pub fn into_config(self) -> Result<ControllerConfig> {
        let Self {
            region,
            aws_region,
            cluster_name,
            cluster_vpc_id,
            account_id,
            default_service_network,
            enable_service_network_override,
            disable_tagging_service_api,
            dev_mode,
            webhook_enabled,
            route_max_concurrent_reconciles,
        } = self;

        let Some(region) = non_empty(region).or_else(|| non_empty(aws_region)) else {
            bail!("region is not specified");
        };
        let Some(cluster_name) = non_empty(cluster_name) else {
            bail!("cluster name is not specified");
        };
        let Some(vpc_id) = non_empty(cluster_vpc_id) else {
            bail!("vpcId is not specified");
        };
        let Some(account_id) = non_empty(account_id) else {
            bail!("account is not specified");
        };
        let Some(route_max_concurrent_reconciles) =
            NonZeroUsize::new(route_max_concurrent_reconciles)
        else {
            bail!("invalid value for ROUTE_MAX_CONCURRENT_RECONCILES: must be positive");
        };

        let default_service_network = non_empty(default_service_network);
        let service_network_override =
            enable_service_network_override && default_service_network.is_some();

        Ok(ControllerConfig {
            region,
            cluster_name,
            vpc_id,
            account_id,
            default_service_network,
            service_network_override,
            disable_tagging_service_api,
            dev_mode,
            webhook_enabled,
            route_max_concurrent_reconciles,
        })
    }
}

/// Only `true`, in any case, enables a flag. Other values disable it.
fn parse_flag(value: &str) -> Result<bool, std::convert::Infallible> {
    Ok(value.eq_ignore_ascii_case("true"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
