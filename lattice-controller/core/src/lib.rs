//! Core types for reconciling routing rules into a remote load-balancing
//! service.
//!
//! A [`Rule`] names its owning service, listener and target groups by their
//! Kubernetes names. The remote service only knows opaque identifiers, so
//! the [`IdentifierStore`] translates between the two once sibling
//! reconcilers have created those resources. The [`RuleApi`] trait is the
//! narrow surface the rule engine needs from the remote service.

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod api;
mod error;
pub mod priority;
mod requeue;
mod rule;
pub mod store;

pub use self::{
    api::{ApiError, RuleApi},
    error::{FormatError, ResolutionMiss, RuleError},
    requeue::{Outcome, NOT_READY_RETRY},
    rule::{Rule, RuleAction, RuleSpec, RuleStatus, RuleTargetGroup},
    store::{IdentifierStore, SharedStore},
};

pub const LATTICE_CONTROLLER_NAME: &str = "application-networking.k8s.aws/gateway-api-controller";
