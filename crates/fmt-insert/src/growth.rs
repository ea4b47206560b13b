/*
 * growth.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Caller-side buffer growth.
//!
//! [`render`] runs the measure/grow/retry loop around [`crate::expand`]: it
//! tries a buffer of `initial-capacity` bytes, and while the reported size
//! does not fit, allocates a buffer picked by the configured
//! [`GrowthPolicy`](crate::GrowthPolicy) and reruns the whole command stream.
//! The stream must be rerun from the start because derived insertions refer
//! to output that an undersized attempt never wrote.
//!
//! Since every retry uses a capacity of at least the reported size, a render
//! takes at most two attempts; [`Rendered::attempts`] reports how many were
//! made.

use crate::command::Command;
use crate::config::{ExpandConfig, TriggerPolicy};
use crate::error::{ExpandError, ExpandResult};
use crate::interpreter::{expand, validate};

/// Output of a completed render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    bytes: Vec<u8>,
    capacity: usize,
    attempts: usize,
}

impl Rendered {
    /// The complete output, including every terminating NUL.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The output without its final NUL.
    ///
    /// With several format strings this still contains the NULs ending the
    /// earlier ones.
    pub fn text(&self) -> &[u8] {
        self.bytes.strip_suffix(b"\0").unwrap_or(self.bytes.as_slice())
    }

    /// The output as a string, if it is valid UTF-8.
    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(self.text()).ok()
    }

    /// Split the output into its NUL-terminated strings.
    ///
    /// Binary expansions containing NUL bytes make this split ambiguous; use
    /// [`Command::SavePosition`] offsets for those.
    pub fn strings(&self) -> impl Iterator<Item = &[u8]> {
        self.text().split(|&byte| byte == 0)
    }

    /// Size of the buffer the output was rendered into.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of expansion attempts, one per buffer allocated.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Expand `commands` into a buffer that grows until the output fits.
///
/// At least one attempt is always made. Fails with
/// [`ExpandError::GrowthExhausted`] if the output still does not fit after
/// `max-attempts` attempts, or with a validation error under
/// [`TriggerPolicy::Validate`].
pub fn render(config: &ExpandConfig, commands: &[Command<'_>]) -> ExpandResult<Rendered> {
    if config.trigger_policy == TriggerPolicy::Validate {
        validate(commands)?;
    }

    let mut buffer = vec![0u8; config.initial_capacity];
    let mut attempts = 0;
    loop {
        attempts += 1;
        let required = expand(Some(buffer.as_mut_slice()), commands);
        if required <= buffer.len() {
            let capacity = buffer.len();
            buffer.truncate(required);
            return Ok(Rendered {
                bytes: buffer,
                capacity,
                attempts,
            });
        }
        if attempts >= config.max_attempts {
            return Err(ExpandError::GrowthExhausted { attempts, required });
        }

        let capacity = config.growth.next_capacity(buffer.len(), required);
        tracing::debug!(
            attempt = attempts,
            required,
            capacity,
            "Buffer too small, retrying"
        );
        buffer = vec![0u8; capacity];
    }
}
