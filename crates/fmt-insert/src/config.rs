/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Expansion configuration.
//!
//! [`ExpandConfig`] controls how strictly command streams are checked and how
//! the caller-side growth loop sizes its buffers. Every field has a default,
//! so an empty TOML document is a valid configuration:
//!
//! ```toml
//! trigger-policy = "validate"
//! growth = "doubling"
//! initial-capacity = 64
//! max-attempts = 4
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ExpandResult;

/// Size of the first buffer tried by [`crate::growth::render`].
pub const DEFAULT_INITIAL_CAPACITY: usize = 512;

/// Number of expansion attempts before [`crate::growth::render`] gives up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 8;

/// How command stream preconditions are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerPolicy {
    /// Preconditions are the caller's responsibility and are not checked.
    ///
    /// Violations never cause out-of-bounds access, but the produced text is
    /// whatever the scanning rules yield for the malformed stream.
    #[default]
    Assume,

    /// The stream is checked before anything is written, and violations are
    /// reported as [`ExpandError`](crate::ExpandError)s.
    Validate,
}

/// Schedule used to pick the next buffer size after an undersized attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrowthPolicy {
    /// Smallest Fibonacci number (1, 2, 3, 5, 8, ...) not below the required size.
    #[default]
    Fibonacci,

    /// Keep doubling the current capacity until the required size fits.
    Doubling,

    /// Exactly the required size.
    Exact,
}

impl GrowthPolicy {
    /// Compute the capacity for the next attempt.
    ///
    /// The result is always `>= required`.
    pub fn next_capacity(self, current: usize, required: usize) -> usize {
        match self {
            GrowthPolicy::Fibonacci => {
                let (mut prev, mut fib) = (1usize, 1usize);
                while fib < required {
                    match fib.checked_add(prev) {
                        Some(next) => {
                            prev = fib;
                            fib = next;
                        }
                        None => return required,
                    }
                }
                fib
            }
            GrowthPolicy::Doubling => {
                let mut capacity = current.max(1);
                while capacity < required {
                    capacity = capacity.saturating_mul(2);
                }
                capacity
            }
            GrowthPolicy::Exact => required,
        }
    }
}

/// Configuration for validation and buffer growth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExpandConfig {
    pub trigger_policy: TriggerPolicy,
    pub growth: GrowthPolicy,
    pub initial_capacity: usize,
    pub max_attempts: usize,
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self {
            trigger_policy: TriggerPolicy::default(),
            growth: GrowthPolicy::default(),
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ExpandConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML source.
    pub fn from_toml_str(source: &str) -> ExpandResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Set the trigger policy.
    pub fn with_trigger_policy(mut self, policy: TriggerPolicy) -> Self {
        self.trigger_policy = policy;
        self
    }

    /// Set the growth policy.
    pub fn with_growth(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    /// Set the size of the first buffer tried when rendering.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the maximum number of rendering attempts.
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExpandError;

    #[test]
    fn test_fibonacci_schedule() {
        let growth = GrowthPolicy::Fibonacci;
        assert_eq!(growth.next_capacity(0, 0), 1);
        assert_eq!(growth.next_capacity(0, 1), 1);
        assert_eq!(growth.next_capacity(0, 4), 5);
        assert_eq!(growth.next_capacity(512, 513), 610);
        assert_eq!(growth.next_capacity(512, 610), 610);
        assert_eq!(growth.next_capacity(512, 611), 987);
    }

    #[test]
    fn test_fibonacci_overflow_falls_back_to_required() {
        let required = usize::MAX - 1;
        assert_eq!(
            GrowthPolicy::Fibonacci.next_capacity(0, required),
            required
        );
    }

    #[test]
    fn test_doubling_schedule() {
        let growth = GrowthPolicy::Doubling;
        assert_eq!(growth.next_capacity(0, 3), 4);
        assert_eq!(growth.next_capacity(10, 11), 20);
        assert_eq!(growth.next_capacity(10, 41), 80);
    }

    #[test]
    fn test_exact_schedule() {
        assert_eq!(GrowthPolicy::Exact.next_capacity(512, 1000), 1000);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = ExpandConfig::from_toml_str("").unwrap();
        assert_eq!(config, ExpandConfig::default());
        assert_eq!(config.initial_capacity, DEFAULT_INITIAL_CAPACITY);
    }

    #[test]
    fn test_full_toml() {
        let config = ExpandConfig::from_toml_str(
            r#"
            trigger-policy = "validate"
            growth = "doubling"
            initial-capacity = 64
            max-attempts = 4
            "#,
        )
        .unwrap();
        assert_eq!(
            config,
            ExpandConfig::new()
                .with_trigger_policy(TriggerPolicy::Validate)
                .with_growth(GrowthPolicy::Doubling)
                .with_initial_capacity(64)
                .with_max_attempts(4)
        );
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = ExpandConfig::from_toml_str("buffer = 3").unwrap_err();
        assert!(matches!(err, ExpandError::Config(_)));
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let err = ExpandConfig::from_toml_str(r#"growth = "tripling""#).unwrap_err();
        assert!(matches!(err, ExpandError::Config(_)));
    }
}
