/*
 * insertion.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Registered insertion sequences.
//!
//! An [`InsertionTable`] lives for exactly one invocation. Entries are only
//! ever appended, so every insertion stays visible to all commands and format
//! strings processed after it. Lookup walks the table newest-first, which is
//! what makes later definitions shadow earlier ones with the same name.

/// The bytes an insertion expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion<'a> {
    /// Caller-supplied bytes.
    Bytes(&'a [u8]),

    /// A region of the invocation's own output, produced by a sub-expansion.
    ///
    /// `start` is an offset from the beginning of the destination buffer.
    Output { start: usize, len: usize },
}

impl Expansion<'_> {
    /// Number of bytes this expansion produces.
    pub fn len(&self) -> usize {
        match self {
            Expansion::Bytes(bytes) => bytes.len(),
            Expansion::Output { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A name bound to its expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion<'a> {
    pub name: &'a [u8],
    pub expansion: Expansion<'a>,
}

impl<'a> Insertion<'a> {
    /// The byte every name in the invocation must start with.
    pub fn trigger(&self) -> Option<u8> {
        self.name.first().copied()
    }

    /// Whether this insertion's name is a prefix of `rest`.
    ///
    /// Empty names never match.
    pub fn matches(&self, rest: &[u8]) -> bool {
        !self.name.is_empty() && rest.starts_with(self.name)
    }
}

/// Handle to an entry in an [`InsertionTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionId(usize);

/// Ordered collection of insertions for one invocation.
#[derive(Debug, Clone, Default)]
pub struct InsertionTable<'a> {
    entries: Vec<Insertion<'a>>,
}

impl<'a> InsertionTable<'a> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a new insertion, visible to every later lookup.
    pub fn define(&mut self, name: &'a [u8], expansion: Expansion<'a>) -> InsertionId {
        self.entries.push(Insertion { name, expansion });
        InsertionId(self.entries.len() - 1)
    }

    /// Fix the length of a derived insertion once its sub-expansion is done.
    ///
    /// Has no effect on insertions with caller-supplied bytes.
    pub fn commit_output_len(&mut self, id: InsertionId, produced: usize) {
        if let Some(Insertion {
            expansion: Expansion::Output { len, .. },
            ..
        }) = self.entries.get_mut(id.0)
        {
            *len = produced;
        }
    }

    /// Find the most recently registered insertion whose name prefixes `rest`.
    ///
    /// This is first match in reverse registration order, not longest match.
    pub fn resolve(&self, rest: &[u8]) -> Option<&Insertion<'a>> {
        self.newest_first().find(|insertion| insertion.matches(rest))
    }

    /// The most recently registered insertion.
    pub fn newest(&self) -> Option<&Insertion<'a>> {
        self.entries.last()
    }

    pub fn get(&self, id: InsertionId) -> Option<&Insertion<'a>> {
        self.entries.get(id.0)
    }

    /// Iterate from the newest insertion to the oldest.
    pub fn newest_first(&self) -> impl Iterator<Item = &Insertion<'a>> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
