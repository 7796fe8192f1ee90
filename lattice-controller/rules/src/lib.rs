//! Reconciles routing rules against a remote listener.
//!
//! [`RuleManager`] handles one rule at a time: it resolves the rule's
//! service, listener and target groups through the identifier store, works
//! out whether the rule already exists remotely, and creates or updates it.
//! [`RuleSynthesizer`] drives the manager for all of a route's rules.

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod manager;
mod synthesize;


pub use self::{manager::RuleManager, synthesize::RuleSynthesizer};
