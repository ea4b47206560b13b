/*
 * scanner.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Format string scanning.
//!
//! [`Fragments`] splits a format string into output fragments: literal spans
//! copied verbatim and the expansions of matched insertion names. Scanning is
//! byte-oriented. Only positions holding the trigger byte are candidates for
//! a substitution; at such a position the insertion table is searched
//! newest-first and the first name that prefixes the remaining input wins.
//! When nothing matches, the trigger byte is ordinary text.
//!
//! The format string is treated as if it were followed by a NUL byte, which is
//! always produced as the last fragment, so every expanded string in the
//! output is NUL-terminated.

use memchr::memchr;

use crate::insertion::{Expansion, InsertionTable};
use crate::sink::Sink;

const NUL: &[u8] = b"\0";

/// One unit of scanner output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    /// Bytes copied from the format string (or the closing NUL).
    Literal(&'a [u8]),

    /// The expansion of a matched insertion.
    Insertion(Expansion<'a>),
}

/// Lazy iterator over the fragments of one format string.
///
/// The iterator borrows the table, so the set of visible insertions cannot
/// change while a format string is being scanned.
#[derive(Debug, Clone)]
pub struct Fragments<'t, 'a> {
    rest: &'a [u8],
    table: &'t InsertionTable<'a>,
    trigger: Option<u8>,
    terminated: bool,
}

impl<'t, 'a> Fragments<'t, 'a> {
    pub fn new(format: &'a [u8], table: &'t InsertionTable<'a>, trigger: Option<u8>) -> Self {
        Self {
            rest: format,
            table,
            trigger,
            terminated: false,
        }
    }

    fn take_literal(&mut self, len: usize) -> Fragment<'a> {
        let (literal, rest) = self.rest.split_at(len);
        self.rest = rest;
        Fragment::Literal(literal)
    }
}

impl<'a> Iterator for Fragments<'_, 'a> {
    type Item = Fragment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            if self.terminated {
                return None;
            }
            self.terminated = true;
            return Some(Fragment::Literal(NUL));
        }

        let Some(trigger) = self.trigger else {
            return Some(self.take_literal(self.rest.len()));
        };

        if self.rest[0] == trigger {
            if let Some(insertion) = self.table.resolve(self.rest) {
                self.rest = &self.rest[insertion.name.len()..];
                return Some(Fragment::Insertion(insertion.expansion));
            }
            // Unmatched trigger: literal up to the next candidate position.
            let len = memchr(trigger, &self.rest[1..]).map_or(self.rest.len(), |at| at + 1);
            return Some(self.take_literal(len));
        }

        let len = memchr(trigger, self.rest).unwrap_or(self.rest.len());
        Some(self.take_literal(len))
    }
}

/// Scan `format` and push every fragment to `sink`.
///
/// Returns the number of bytes produced, including the closing NUL.
pub fn expand_format<S: Sink + ?Sized>(
    sink: &mut S,
    table: &InsertionTable<'_>,
    trigger: Option<u8>,
    format: &[u8],
) -> usize {
    let start = sink.position();
    for fragment in Fragments::new(format, table, trigger) {
        match fragment {
            Fragment::Literal(bytes) | Fragment::Insertion(Expansion::Bytes(bytes)) => {
                sink.emit(bytes)
            }
            Fragment::Insertion(Expansion::Output { start, len }) => sink.replay(start, len),
        }
    }
    sink.position() - start
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MeasuringSink;
    use pretty_assertions::assert_eq;

    fn table_of<'a>(entries: &[(&'a str, &'a str)]) -> InsertionTable<'a> {
        let mut table = InsertionTable::new();
        for (name, expansion) in entries {
            table.define(name.as_bytes(), Expansion::Bytes(expansion.as_bytes()));
        }
        table
    }

    fn fragments<'a>(format: &'a str, table: &InsertionTable<'a>) -> Vec<Fragment<'a>> {
        let trigger = table.newest().and_then(|i| i.trigger());
        Fragments::new(format.as_bytes(), table, trigger).collect()
    }

    #[test]
    fn test_no_trigger_is_one_literal() {
        let table = InsertionTable::new();
        assert_eq!(
            fragments("plain % text", &table),
            vec![Fragment::Literal(b"plain % text"), Fragment::Literal(b"\0")]
        );
    }

    #[test]
    fn test_empty_format_yields_only_terminator() {
        let table = table_of(&[("%1", "x")]);
        assert_eq!(fragments("", &table), vec![Fragment::Literal(b"\0")]);
    }

    #[test]
    fn test_substitution_splits_literals() {
        let table = table_of(&[("%1", "one"), ("%2", "two")]);
        assert_eq!(
            fragments("a %2 b %1", &table),
            vec![
                Fragment::Literal(b"a "),
                Fragment::Insertion(Expansion::Bytes(b"two")),
                Fragment::Literal(b" b "),
                Fragment::Insertion(Expansion::Bytes(b"one")),
                Fragment::Literal(b"\0"),
            ]
        );
    }

    #[test]
    fn test_unmatched_trigger_runs_to_next_candidate() {
        let table = table_of(&[("%x", "X")]);
        assert_eq!(
            fragments("100% done %x", &table),
            vec![
                Fragment::Literal(b"100"),
                Fragment::Literal(b"% done "),
                Fragment::Insertion(Expansion::Bytes(b"X")),
                Fragment::Literal(b"\0"),
            ]
        );
    }

    #[test]
    fn test_trailing_trigger_is_literal() {
        let table = table_of(&[("%x", "X")]);
        assert_eq!(
            fragments("50%", &table),
            vec![
                Fragment::Literal(b"50"),
                Fragment::Literal(b"%"),
                Fragment::Literal(b"\0"),
            ]
        );
    }

    #[test]
    fn test_newest_wins_over_longest() {
        let table = table_of(&[("A", "short"), ("AB", "long")]);
        assert_eq!(
            fragments("AB", &table)[0],
            Fragment::Insertion(Expansion::Bytes(b"long"))
        );

        let table = table_of(&[("AB", "long"), ("A", "short")]);
        assert_eq!(
            fragments("AB", &table),
            vec![
                Fragment::Insertion(Expansion::Bytes(b"short")),
                Fragment::Literal(b"B"),
                Fragment::Literal(b"\0"),
            ]
        );
    }

    #[test]
    fn test_expand_format_counts_bytes() {
        let table = table_of(&[("%n", "name")]);
        let mut sink = MeasuringSink::new();
        let produced = expand_format(&mut sink, &table, Some(b'%'), b"hi %n");
        assert_eq!(produced, "hi name".len() + 1);
        assert_eq!(sink.position(), produced);
    }
}
