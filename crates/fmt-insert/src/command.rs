/*
 * command.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Command stream types.
//!
//! An invocation is driven by an ordered sequence of [`Command`]s. Insertions
//! are registered as the stream is read and are visible to every command that
//! follows them. The stream ends with [`Command::Finish`], which carries the
//! final format string.
//!
//! [`Script`] builds a command stream; [`Script::finish`] terminates it.
//! The builder does not check what it builds; [`crate::validate`] does.
//!
//! ```
//! use std::cell::Cell;
//! use fmt_insert::{Script, expand};
//!
//! let start = Cell::new(0);
//! let script = Script::new()
//!     .insert("%1", "world")
//!     .save_position(&start)
//!     .finish("Hello, %1!");
//!
//! let mut buffer = [0u8; 32];
//! let needed = expand(Some(&mut buffer[..]), script.commands());
//! assert_eq!(&buffer[..needed], b"Hello, world!\0");
//! assert_eq!(start.get(), 0);
//! ```

use std::cell::Cell;

/// A single command in an expansion command stream.
///
/// All payloads borrow caller data for the duration of the invocation; the
/// engine never copies names, expansions or format strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Register `name` to expand to `expansion`.
    ///
    /// Unless a length was declared, the expansion ends at its first NUL byte.
    Insert { name: &'a [u8], expansion: &'a [u8] },

    /// Override the expansion length of the next registered insertion.
    DeclareLength(usize),

    /// Store the current output offset into the cell.
    SavePosition(&'a Cell<usize>),

    /// Register `name` to expand to the output produced by the next
    /// [`Command::SubExpand`].
    BeginDerived { name: &'a [u8] },

    /// Expand a format string into the output, NUL-terminated.
    SubExpand(&'a [u8]),

    /// Expand the final format string and end the invocation.
    Finish(&'a [u8]),
}

impl<'a> Command<'a> {
    /// Short name of the command kind, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Insert { .. } => "insert",
            Command::DeclareLength(_) => "declare-length",
            Command::SavePosition(_) => "save-position",
            Command::BeginDerived { .. } => "begin-derived",
            Command::SubExpand(_) => "sub-expand",
            Command::Finish(_) => "finish",
        }
    }

    /// The insertion name registered by this command, if any.
    pub fn registered_name(&self) -> Option<&'a [u8]> {
        match *self {
            Command::Insert { name, .. } | Command::BeginDerived { name } => Some(name),
            _ => None,
        }
    }
}

/// Builder for a command stream.
///
/// Methods take anything byte-like (`str`, `String`, `[u8]`, `Vec<u8>`) and
/// borrow it for `'a`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script<'a> {
    commands: Vec<Command<'a>>,
}

impl<'a> Script<'a> {
    /// Create an empty script.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Register a NUL-terminated insertion.
    pub fn insert<N, E>(mut self, name: &'a N, expansion: &'a E) -> Self
    where
        N: AsRef<[u8]> + ?Sized,
        E: AsRef<[u8]> + ?Sized,
    {
        self.commands.push(Command::Insert {
            name: name.as_ref(),
            expansion: expansion.as_ref(),
        });
        self
    }

    /// Register an insertion whose expansion is the whole of `expansion`,
    /// embedded NUL bytes included.
    pub fn insert_bytes<N, E>(self, name: &'a N, expansion: &'a E) -> Self
    where
        N: AsRef<[u8]> + ?Sized,
        E: AsRef<[u8]> + ?Sized,
    {
        let len = expansion.as_ref().len();
        self.declare_length(len).insert(name, expansion)
    }

    /// Override the expansion length of the next insertion.
    pub fn declare_length(mut self, len: usize) -> Self {
        self.commands.push(Command::DeclareLength(len));
        self
    }

    /// Record the output offset at this point of the stream.
    pub fn save_position(mut self, slot: &'a Cell<usize>) -> Self {
        self.commands.push(Command::SavePosition(slot));
        self
    }

    /// Register `name` as the expansion of `format`, which is also written to
    /// the output as a NUL-terminated string.
    pub fn derive<N, F>(mut self, name: &'a N, format: &'a F) -> Self
    where
        N: AsRef<[u8]> + ?Sized,
        F: AsRef<[u8]> + ?Sized,
    {
        self.commands.push(Command::BeginDerived {
            name: name.as_ref(),
        });
        self.commands.push(Command::SubExpand(format.as_ref()));
        self
    }

    /// Expand an intermediate format string into the output.
    pub fn sub_expand<F>(mut self, format: &'a F) -> Self
    where
        F: AsRef<[u8]> + ?Sized,
    {
        self.commands.push(Command::SubExpand(format.as_ref()));
        self
    }

    /// Terminate the stream with the final format string.
    pub fn finish<F>(mut self, format: &'a F) -> Self
    where
        F: AsRef<[u8]> + ?Sized,
    {
        self.commands.push(Command::Finish(format.as_ref()));
        self
    }

    /// Append a raw command.
    pub fn push(mut self, command: Command<'a>) -> Self {
        self.commands.push(command);
        self
    }

    /// The commands built so far.
    pub fn commands(&self) -> &[Command<'a>] {
        &self.commands
    }

    /// Consume the builder, returning the command list.
    pub fn into_commands(self) -> Vec<Command<'a>> {
        self.commands
    }
}
