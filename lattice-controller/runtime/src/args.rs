use crate::{config::ControllerArgs, core::LATTICE_CONTROLLER_NAME, ControllerConfig};
use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[clap(
    name = "lattice-controller",
    about = "Reconciles route rules onto service network listeners"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "lattice=info,warn",
        env = "LATTICE_CONTROLLER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    controller: ControllerArgs,
}

impl Args {
    /// Installs the global log subscriber and builds the startup
    /// configuration.
    pub fn init(self) -> Result<Arc<ControllerConfig>> {
        let Self {
            log_level,
            log_format,
            controller,
        } = self;

        log_format.try_init(log_level)?;

        let config = controller.into_config()?;
        info!(
            controller = LATTICE_CONTROLLER_NAME,
            region = %config.region,
            cluster = %config.cluster_name,
            vpc = %config.vpc_id,
            account = %config.account_id,
            default_service_network = ?config.default_service_network,
            service_network_override = config.service_network_override,
            disable_tagging_service_api = config.disable_tagging_service_api,
            dev_mode = config.dev_mode,
            webhook_enabled = config.webhook_enabled,
            route_workers = config.route_max_concurrent_reconciles.get(),
            "Loaded configuration"
        );
        Ok(Arc::new(config))
    }

    /// Builds the startup configuration without touching global logging
    /// state.
    pub fn config(&self) -> Result<ControllerConfig> {
        self.controller.clone().into_config()
    }
}
