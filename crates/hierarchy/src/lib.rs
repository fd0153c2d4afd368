//! # Atlas Hierarchy
//!
//! Turns per-file normalized records into the invariant-preserving node
//! tree, and links call sites to declarations across the whole build.
//!
//! ## Invariants maintained here
//!
//! - the node set is a strict forest under a single Repo root;
//! - every non-root node has exactly one parent;
//! - a child's span lies inside its parent's span;
//! - children are ordered by source position;
//! - resolution outcomes are edge records, never errors.

mod builder;
mod resolver;
mod scaffold;
mod symbols;

pub use builder::{build_file_tree, FileTree};
pub use resolver::{CallerCalls, Resolution, Resolver};
pub use scaffold::Scaffold;
pub use symbols::{Declaration, SymbolTable};
