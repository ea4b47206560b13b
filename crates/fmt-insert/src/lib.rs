/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Two-pass template expansion over named insertion sequences.
//!
//! An expansion is driven by a stream of [`Command`]s. Commands register
//! insertions (a name and the bytes it expands to) and expand format strings,
//! in which every occurrence of a registered name is replaced by its
//! expansion and everything else is copied verbatim. Each expanded string is
//! NUL-terminated, and consecutive strings are packed without padding.
//!
//! - Names are plain byte strings. All names in one invocation start with the
//!   same *trigger* byte (`%1`, `%2`, `%%`, or `{year}`, `{month}`, but not
//!   both styles at once).
//! - Lookup is newest-first: a later definition of a name shadows an earlier
//!   one, and among overlapping names the most recent wins.
//! - An insertion is visible only to commands after it.
//! - A *derived* insertion expands to the output of a sub-expansion, so text
//!   can be composed once and reused.
//!
//! # Buffer protocol
//!
//! [`expand`] writes into a caller buffer and returns the size the full
//! output needs. Output never goes past the end of the buffer; if the returned
//! size is larger than the buffer, the caller allocates at least that much
//! and runs the same command stream again. [`growth::render`] does this loop.
//!
//! # Example
//!
//! ```
//! use fmt_insert::{Script, expand};
//!
//! let script = Script::new()
//!     .insert("{day}", "24")
//!     .insert("{month}", "12")
//!     .insert("{year}", "2000")
//!     .derive("{date}", "{year}-{month}-{day}")
//!     .insert("{who}", "Santa Claus")
//!     .finish("On {date}, {who} spoke.");
//!
//! let needed = expand(None, script.commands());
//! let mut buffer = vec![0u8; needed];
//! expand(Some(buffer.as_mut_slice()), script.commands());
//! assert!(buffer.ends_with(b"On 2000-12-24, Santa Claus spoke.\0"));
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod growth;
pub mod insertion;
pub mod interpreter;
pub mod scanner;
pub mod sink;

// Re-export main types at crate root
pub use command::{Command, Script};
pub use config::{ExpandConfig, GrowthPolicy, TriggerPolicy};
pub use error::{ExpandError, ExpandResult};
pub use growth::{Rendered, render};
pub use insertion::{Expansion, Insertion, InsertionTable};
pub use interpreter::{Expander, Interpreter, expand, validate};
pub use scanner::{Fragment, Fragments};
pub use sink::{BoundedSink, MeasuringSink, Sink};
