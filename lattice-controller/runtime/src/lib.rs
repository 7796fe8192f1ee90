//! Process-level wiring for the rule controller: command-line and
//! environment configuration, logging, and the per-route reconciler that
//! translates rule outcomes into scheduler actions.

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use lattice_controller_core as core;
pub use lattice_controller_rules as rules;

mod args;
mod config;
mod reconcile;
mod resource_id;

pub use self::{
    args::Args,
    config::{ControllerArgs, ControllerConfig},
    reconcile::{into_action, RouteReconciler},
    resource_id::ResourceId,
};
