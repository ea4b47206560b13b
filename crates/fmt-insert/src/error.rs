/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for command validation, configuration and rendering.
//!
//! Expansion itself never fails: an undersized buffer is reported through the
//! returned size. These errors only arise when a caller opts into
//! [`TriggerPolicy::Validate`](crate::config::TriggerPolicy::Validate), loads a
//! configuration, or runs the growth loop in [`crate::growth`].

use thiserror::Error;

/// Errors that can occur while validating or rendering a command stream.
#[derive(Debug, Error)]
pub enum ExpandError {
    /// An insertion was registered with an empty name.
    #[error("Insertion name must not be empty")]
    EmptyName,

    /// An insertion name contains a NUL byte.
    #[error("Insertion name contains a NUL byte: {name:?}")]
    NulInName { name: String },

    /// An insertion name does not start with the invocation's trigger byte.
    #[error(
        "Insertion {name:?} starts with {found:?}, but earlier insertions start with {expected:?}"
    )]
    MixedTrigger {
        name: String,
        expected: char,
        found: char,
    },

    /// A declared expansion length exceeds the bytes actually supplied.
    #[error("Declared length {declared} exceeds the {available} bytes supplied")]
    LengthOutOfBounds { declared: usize, available: usize },

    /// A derived insertion was not immediately followed by a sub-expansion.
    #[error("Derived insertion {name:?} is not immediately followed by a sub-expansion")]
    UnpairedDerived { name: String },

    /// The command stream ended without a terminating format string.
    #[error("Command stream has no terminating format string")]
    MissingTerminator,

    /// A declared length was never consumed by an insertion.
    #[error("Declared length is not followed by an insertion")]
    DanglingLength,

    /// The growth loop gave up before the buffer was large enough.
    #[error("Buffer still too small after {attempts} attempts ({required} bytes required)")]
    GrowthExhausted { attempts: usize, required: usize },

    /// Error parsing a TOML configuration.
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for fallible expansion operations.
pub type ExpandResult<T> = Result<T, ExpandError>;
