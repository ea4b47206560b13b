/*
 * sink.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Bounded output sinks.
//!
//! A sink receives every output fragment of an invocation and tracks the
//! logical output position. Two implementations exist, picked once per
//! invocation by [`crate::interpreter`]:
//!
//! - [`MeasuringSink`] never writes; it only counts bytes.
//! - [`BoundedSink`] writes into a caller buffer until a fragment would not
//!   fit. From then on it measures only, and never writes again.
//!
//! In both cases the final [`Sink::position`] is the number of bytes the
//! complete output needs.

/// Destination for output fragments.
pub trait Sink {
    /// Append `bytes` at the current position.
    fn emit(&mut self, bytes: &[u8]);

    /// Append a copy of the earlier output region `start..start + len`.
    ///
    /// Used for derived insertions, whose expansion is part of the output.
    /// A region that does not lie within the output written so far is
    /// counted but never copied.
    fn replay(&mut self, start: usize, len: usize);

    /// Logical output position, in bytes from the start of the destination.
    fn position(&self) -> usize;

    /// Whether output is only being measured.
    fn is_measuring(&self) -> bool;
}

/// Sink that only counts bytes.
#[derive(Debug, Clone, Default)]
pub struct MeasuringSink {
    position: usize,
}

impl MeasuringSink {
    pub fn new() -> Self {
        Self { position: 0 }
    }
}

impl Sink for MeasuringSink {
    fn emit(&mut self, bytes: &[u8]) {
        self.position += bytes.len();
    }

    fn replay(&mut self, _start: usize, len: usize) {
        self.position += len;
    }

    fn position(&self) -> usize {
        self.position
    }

    fn is_measuring(&self) -> bool {
        true
    }
}

/// Sink writing into a fixed buffer, degrading to measuring on overflow.
#[derive(Debug)]
pub struct BoundedSink<'b> {
    buffer: &'b mut [u8],
    position: usize,
    measuring: bool,
}

impl<'b> BoundedSink<'b> {
    pub fn new(buffer: &'b mut [u8]) -> Self {
        Self {
            buffer,
            position: 0,
            measuring: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Reserve `len` bytes at the current position.
    ///
    /// Returns the target range if it fits and the sink still writes. The
    /// position advances either way.
    fn reserve(&mut self, len: usize) -> Option<std::ops::Range<usize>> {
        let start = self.position;
        let end = start.saturating_add(len);
        self.position = end;
        if self.measuring {
            return None;
        }
        if end > self.buffer.len() {
            self.measuring = true;
            tracing::debug!(
                capacity = self.buffer.len(),
                attempted = end,
                "Output exceeds buffer, switching to measuring"
            );
            return None;
        }
        Some(start..end)
    }
}

impl Sink for BoundedSink<'_> {
    fn emit(&mut self, bytes: &[u8]) {
        if let Some(target) = self.reserve(bytes.len()) {
            self.buffer[target].copy_from_slice(bytes);
        }
    }

    fn replay(&mut self, start: usize, len: usize) {
        let Some(target) = self.reserve(len) else {
            return;
        };
        // Still writing, so everything before `target.start` was written.
        match start.checked_add(len) {
            Some(end) if end <= target.start => {
                self.buffer.copy_within(start..end, target.start);
            }
            _ => {
                self.measuring = true;
                tracing::warn!(
                    start,
                    len,
                    written = target.start,
                    "Replayed region was never written, switching to measuring"
                );
            }
        }
    }

    fn position(&self) -> usize {
        self.position
    }

    fn is_measuring(&self) -> bool {
        self.measuring
    }
}
