//! # Atlas Adapters
//!
//! Per-language parsers normalizing source syntax into a common record
//! shape. Each adapter turns `(source text, language)` into an ordered list
//! of [`NormalizedRecord`]s (kind, name, span, signature, doc metadata, call
//! sites) or a [`ParseFailure`] signal the hierarchy builder recovers from.
//!
//! Adapters are selected from the [`AdapterRegistry`] by file extension, not
//! by inspecting content. All four built-in adapters (Rust, Python,
//! JavaScript, TypeScript) share one tree-sitter walker parameterized by
//! language.

mod language;
mod record;
mod registry;
mod walker;

pub use language::Language;
pub use record::{CallSite, NormalizedRecord, ParseFailure};
pub use registry::{AdapterRegistry, LanguageAdapter, TreeSitterAdapter};
