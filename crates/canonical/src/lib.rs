//! Canonical text layer for the corpus cleaner.
//!
//! Turns raw collaborator text into plain prose and provides the shared
//! definitions of "word" and "character" that every statistic is counted in.
//!
//! ## What we do
//!
//! - Markup stripping: tags, comments, `script`/`style` bodies, character
//!   references ([`strip_markup`])
//! - Whitespace normalization ([`collapse_whitespace`])
//! - Word and character counting ([`word_count`], [`char_count`])
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock calls, no OS/locale dependence. The same text gives the
//! same result on any machine, and [`strip_markup`] is idempotent.

mod markup;
mod token;
mod whitespace;

pub use crate::markup::strip_markup;
pub use crate::token::{char_count, char_prefix, word_count, words};
pub use crate::whitespace::collapse_whitespace;
