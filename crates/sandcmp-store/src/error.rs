//! Errors raised before any comparison takes place.

use sandcmp_kernel::{GraphShapeError, StrategyError};
use std::path::PathBuf;

/// A policy could not be turned into a graph. Always names the file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{}: cannot read policy file: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("{}: corrupted graph file: {message}", .path.display())]
    Corrupt { path: PathBuf, message: String },

    #[error("{}: invalid JSON: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{}: malformed graph: {source}", .path.display())]
    Shape {
        path: PathBuf,
        #[source]
        source: GraphShapeError,
    },

    #[error("{}: no {role} is configured", .path.display())]
    CollaboratorMissing { path: PathBuf, role: &'static str },

    #[error("{}: {source}", .path.display())]
    Collaborator {
        path: PathBuf,
        #[source]
        source: CollaboratorError,
    },

    #[error("{}: cannot write graph: {message}", .path.display())]
    Write { path: PathBuf, message: String },
}

impl LoadError {
    /// The file the error is about.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Read { path, .. }
            | Self::Corrupt { path, .. }
            | Self::Parse { path, .. }
            | Self::Shape { path, .. }
            | Self::CollaboratorMissing { path, .. }
            | Self::Collaborator { path, .. }
            | Self::Write { path, .. } => path,
        }
    }
}

/// An external compiler or decompiler did not produce a raw graph.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{role} executable `{program}` was not found")]
    NotInstalled { role: &'static str, program: String },

    #[error("{role} command failed: {command} ({message})")]
    Failed {
        role: &'static str,
        command: String,
        message: String,
    },

    #[error("{role} command produced unusable output: {command} ({message})")]
    Output {
        role: &'static str,
        command: String,
        message: String,
    },
}

/// Configuration file problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{}: cannot read config: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("{}: invalid config: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// The requested run is not well-formed. Nothing has been loaded yet.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("binary-form input requires both an ops table and a release identifier (missing {missing})")]
    MissingCompanion { missing: &'static str },

    #[error("an ops table and release identifier are only accepted for binary-form input, not {form}")]
    UnexpectedCompanion { form: crate::source::GraphForm },

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
