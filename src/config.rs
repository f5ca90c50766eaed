//! Dispatcher configuration: paging default and unknown-field policy.

use serde::Deserialize;

const fn default_limit() -> u32 {
    5
}

/// What to do with payload fields that match no column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Drop them silently
    #[default]
    Ignore,
    /// Fail the write with `UnknownField`
    Reject,
}

/// Dispatcher configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Page size used when a list request carries no usable `limit`
    pub default_limit: u32,
    pub unknown_fields: UnknownFieldPolicy,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            unknown_fields: UnknownFieldPolicy::default(),
        }
    }
}

impl ExplorerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }
}
