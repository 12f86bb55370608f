//! # sandcmp-store
//!
//! Loading layer for sandbox-profile graphs.
//!
//! This crate provides:
//! - the canonical graph cache (strict JSON read, atomic canonical write)
//! - `PolicyCompiler` / `PolicyDecompiler` collaborator seams and an
//!   external-command adapter for both
//! - `PolicyInput` validation (binary form needs an ops table and a release)
//! - `GraphLoader`, which turns any input into an `OperationGraph`
//! - `RunConfig`, the immutable per-run configuration
//!
//! It does not compare anything. Comparison lives in `sandcmp-kernel`.
//!
//! ## Data flow
//!
//! ```text
//! source text ──────────── compiler ───┐
//! binary + ops + release ─ decompiler ─┼─► raw JSON ─► OperationGraph
//! cached JSON ─────────────────────────┘
//! ```

pub mod cache;
pub mod collaborator;
pub mod config;
pub mod error;
pub mod loader;
pub mod source;

pub use cache::{
    graph_from_str, graph_from_value, read_graph_from_path, write_graph, write_graph_to_path,
};
pub use collaborator::{
    COMPILER_ROLE, DECOMPILER_ROLE, ExternalCommand, PolicyCompiler, PolicyDecompiler,
};
pub use config::{ConfigOverrides, DEFAULT_CONFIG_PATH, RunConfig};
pub use error::{CollaboratorError, ConfigError, InputError, LoadError};
pub use loader::GraphLoader;
pub use source::{BinaryCompanions, GraphForm, PolicyInput};
