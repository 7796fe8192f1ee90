//! Encodes a rule's intended evaluation order into its logical identifier.
//!
//! Logical rule ids have the form `rule-<N>`. Lower values of `N` are
//! evaluated first, mirroring the remote service's priority semantics.

use crate::FormatError;

const PREFIX: &str = "rule-";

/// The highest priority the remote service accepts on a listener.
pub const MAX_PRIORITY: u32 = 100;

/// Parses the priority out of a logical rule id.
pub fn decode(rule_id: &str) -> Result<u32, FormatError> {
    let invalid = || FormatError {
        rule_id: rule_id.to_string(),
    };

    let digits = rule_id.strip_prefix(PREFIX).ok_or_else(invalid)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    digits.parse().map_err(|_| invalid())
}

pub fn encode(priority: u32) -> String {
    format!("{PREFIX}{priority}")
}

/// The remote priority a logical priority is written at. Remote priorities
/// start at 1, so `rule-0` shares the first slot's value.
pub fn remote(logical: u32) -> u32 {
    logical.max(1)
}
