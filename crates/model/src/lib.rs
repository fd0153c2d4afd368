//! # Atlas Model
//!
//! Shared vocabulary for the code-atlas workspace: the hierarchical node
//! model, call-reference edges, stable node identity, and the configuration
//! and report types the build pipeline exchanges.
//!
//! ## Hierarchy
//!
//! ```text
//! Repo
//!   └─> Package (one per directory with supported files)
//!         └─> File
//!               ├─> Class
//!               │     └─> Function (method)
//!               └─> Function
//!                     └─> Block (nested scope)
//! ```
//!
//! Node identity is a pure function of (kind, path, name, span), so two
//! builds of an unchanged tree produce identical ids regardless of how the
//! build was parallelized.

mod config;
mod edge;
mod id;
mod node;
mod report;

pub use config::BuildConfig;
pub use edge::{CallEdge, CalleeRef, UnresolvedReason};
pub use id::{stable_node_id, NodeId};
pub use node::{DocMeta, Node, NodeKind, Param, Span};
pub use report::BuildReport;
