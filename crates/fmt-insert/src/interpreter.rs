/*
 * interpreter.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Command stream interpreter.
//!
//! The interpreter reads commands in order, registering insertions as it goes
//! and scanning format strings into a [`Sink`]. Registered insertions are kept
//! in one [`InsertionTable`] owned by the invocation, so each stays visible to
//! everything after it until the invocation ends.
//!
//! The entry points are [`expand`], which never fails, and
//! [`Expander::expand`], which can check the stream first according to its
//! [`ExpandConfig`].

use memchr::memchr;

use crate::command::Command;
use crate::config::{ExpandConfig, TriggerPolicy};
use crate::error::{ExpandError, ExpandResult};
use crate::growth::{self, Rendered};
use crate::insertion::{Expansion, InsertionId, InsertionTable};
use crate::scanner::expand_format;
use crate::sink::{BoundedSink, MeasuringSink, Sink};

/// Expand a command stream into `buffer`.
///
/// Returns the number of bytes the complete output needs, every terminating
/// NUL included. If that is at most the buffer length, the buffer holds the
/// complete output; otherwise its contents are unspecified and the caller
/// should retry with a buffer of at least the returned size. Nothing is ever
/// written past the end of `buffer`. Passing `None` (or an empty buffer) only
/// measures.
pub fn expand(buffer: Option<&mut [u8]>, commands: &[Command<'_>]) -> usize {
    match buffer {
        Some(buffer) if !buffer.is_empty() => {
            Interpreter::new(BoundedSink::new(buffer)).run(commands)
        }
        _ => Interpreter::new(MeasuringSink::new()).run(commands),
    }
}

/// Expansion entry point with configurable checking and buffer growth.
#[derive(Debug, Clone, Default)]
pub struct Expander {
    config: ExpandConfig,
}

impl Expander {
    pub fn new(config: ExpandConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExpandConfig {
        &self.config
    }

    /// Like [`expand`], but checks the stream first under
    /// [`TriggerPolicy::Validate`]. A rejected stream writes nothing.
    pub fn expand(
        &self,
        buffer: Option<&mut [u8]>,
        commands: &[Command<'_>],
    ) -> ExpandResult<usize> {
        if self.config.trigger_policy == TriggerPolicy::Validate {
            validate(commands)?;
        }
        Ok(expand(buffer, commands))
    }

    /// Expand into a freshly allocated buffer, growing it as needed.
    pub fn render(&self, commands: &[Command<'_>]) -> ExpandResult<Rendered> {
        growth::render(&self.config, commands)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Finished,
}

/// State of one invocation.
#[derive(Debug)]
pub struct Interpreter<'a, S: Sink> {
    sink: S,
    table: InsertionTable<'a>,
    trigger: Option<u8>,
    pending_len: Option<usize>,
    /// Derived insertion registered by the previous command.
    pending_derived: Option<InsertionId>,
}

impl<'a, S: Sink> Interpreter<'a, S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            table: InsertionTable::new(),
            trigger: None,
            pending_len: None,
            pending_derived: None,
        }
    }

    /// Process commands up to and including the first [`Command::Finish`].
    ///
    /// Returns the final output position.
    pub fn run(&mut self, commands: &[Command<'a>]) -> usize {
        for &command in commands {
            if self.step(command) == Flow::Finished {
                break;
            }
        }
        self.sink.position()
    }

    pub fn table(&self) -> &InsertionTable<'a> {
        &self.table
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn step(&mut self, command: Command<'a>) -> Flow {
        tracing::trace!(
            command = command.kind(),
            position = self.sink.position(),
            "Processing command"
        );
        let derived = self.pending_derived.take();

        match command {
            Command::Insert { name, expansion } => {
                let len = match self.pending_len.take() {
                    Some(declared) => declared.min(expansion.len()),
                    None => memchr(0, expansion).unwrap_or(expansion.len()),
                };
                self.register(name, Expansion::Bytes(&expansion[..len]));
            }
            Command::DeclareLength(len) => self.pending_len = Some(len),
            Command::SavePosition(slot) => slot.set(self.sink.position()),
            Command::BeginDerived { name } => {
                // A declared length is consumed here, but the sub-expansion
                // decides the final length.
                self.pending_len = None;
                let start = self.sink.position();
                let id = self.register(name, Expansion::Output { start, len: 0 });
                self.pending_derived = Some(id);
            }
            Command::SubExpand(format) => {
                let produced = self.scan(format);
                if let Some(id) = derived {
                    let len = produced - 1;
                    self.table.commit_output_len(id, len);
                    tracing::debug!(len, "Committed derived insertion");
                }
            }
            Command::Finish(format) => {
                self.scan(format);
                return Flow::Finished;
            }
        }
        Flow::Continue
    }

    fn register(&mut self, name: &'a [u8], expansion: Expansion<'a>) -> InsertionId {
        tracing::trace!(
            name = %String::from_utf8_lossy(name),
            len = expansion.len(),
            "Registered insertion"
        );
        self.table.define(name, expansion)
    }

    fn scan(&mut self, format: &[u8]) -> usize {
        if self.trigger.is_none() {
            self.trigger = self.table.newest().and_then(|insertion| insertion.trigger());
        }
        expand_format(&mut self.sink, &self.table, self.trigger, format)
    }
}

/// Check the preconditions of a command stream.
///
/// Every insertion name must be non-empty, free of NUL bytes and start with
/// the same byte as the first registered name. Declared lengths must fit the
/// bytes they describe and be consumed by an insertion. Derived insertions
/// must be immediately followed by a sub-expansion, and the stream must end
/// with a terminating format string. Commands after the terminator are not
/// checked, as they are never read.
pub fn validate(commands: &[Command<'_>]) -> ExpandResult<()> {
    let mut trigger: Option<u8> = None;
    let mut pending_len: Option<usize> = None;
    let mut iter = commands.iter().peekable();

    while let Some(&command) = iter.next() {
        if let Some(name) = command.registered_name() {
            check_name(name, &mut trigger)?;
        }
        match command {
            Command::Insert { expansion, .. } => {
                if let Some(declared) = pending_len.take() {
                    if declared > expansion.len() {
                        return Err(ExpandError::LengthOutOfBounds {
                            declared,
                            available: expansion.len(),
                        });
                    }
                }
            }
            Command::DeclareLength(len) => {
                if pending_len.replace(len).is_some() {
                    return Err(ExpandError::DanglingLength);
                }
            }
            Command::BeginDerived { name } => {
                pending_len = None;
                if !matches!(iter.peek(), Some(Command::SubExpand(_))) {
                    return Err(ExpandError::UnpairedDerived {
                        name: String::from_utf8_lossy(name).into_owned(),
                    });
                }
            }
            Command::SavePosition(_) | Command::SubExpand(_) => {}
            Command::Finish(_) => {
                if pending_len.is_some() {
                    return Err(ExpandError::DanglingLength);
                }
                return Ok(());
            }
        }
    }
    Err(ExpandError::MissingTerminator)
}

fn check_name(name: &[u8], trigger: &mut Option<u8>) -> ExpandResult<()> {
    let Some(&first) = name.first() else {
        return Err(ExpandError::EmptyName);
    };
    if memchr(0, name).is_some() {
        return Err(ExpandError::NulInName {
            name: String::from_utf8_lossy(name).into_owned(),
        });
    }
    match *trigger {
        Some(expected) if expected != first => Err(ExpandError::MixedTrigger {
            name: String::from_utf8_lossy(name).into_owned(),
            expected: char::from(expected),
            found: char::from(first),
        }),
        Some(_) => Ok(()),
        None => {
            *trigger = Some(first);
            Ok(())
        }
    }
}
