//! Policy inputs: where a graph comes from and what it needs.

use crate::error::InputError;
use std::fmt;
use std::path::{Path, PathBuf};

/// The form a policy file is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GraphForm {
    /// A canonical graph serialized as JSON (the cache format).
    #[default]
    Json,
    /// Profile source text, reduced by the compiler collaborator.
    Source,
    /// A compiled profile, reduced by the decompiler collaborator.
    Binary,
}

impl fmt::Display for GraphForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Source => write!(f, "source"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

impl std::str::FromStr for GraphForm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" | "graph" | "cache" => Ok(Self::Json),
            "source" | "sbpl" | "text" => Ok(Self::Source),
            "binary" | "compiled" | "bin" => Ok(Self::Binary),
            _ => Err(format!("unknown policy form: {s} (expected json, source, or binary)")),
        }
    }
}

/// Companion inputs the decompiler needs alongside a compiled profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryCompanions {
    pub ops_table: PathBuf,
    pub release: String,
}

/// One policy to load, validated for flag consistency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyInput {
    path: PathBuf,
    form: GraphForm,
    companions: Option<BinaryCompanions>,
}

impl PolicyInput {
    /// Validate a policy input.
    ///
    /// Binary form requires both an ops table and a release identifier;
    /// other forms accept neither.
    pub fn new(
        path: impl Into<PathBuf>,
        form: GraphForm,
        ops_table: Option<PathBuf>,
        release: Option<String>,
    ) -> Result<Self, InputError> {
        let companions = match (form, ops_table, release) {
            (GraphForm::Binary, Some(ops_table), Some(release)) => {
                Some(BinaryCompanions { ops_table, release })
            }
            (GraphForm::Binary, None, Some(_)) => {
                return Err(InputError::MissingCompanion {
                    missing: "ops table",
                });
            }
            (GraphForm::Binary, Some(_), None) => {
                return Err(InputError::MissingCompanion {
                    missing: "release identifier",
                });
            }
            (GraphForm::Binary, None, None) => {
                return Err(InputError::MissingCompanion {
                    missing: "ops table and release identifier",
                });
            }
            (_, None, None) => None,
            (form, _, _) => return Err(InputError::UnexpectedCompanion { form }),
        };
        Ok(Self {
            path: path.into(),
            form,
            companions,
        })
    }

    /// A cached canonical graph.
    pub fn json(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            form: GraphForm::Json,
            companions: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn form(&self) -> GraphForm {
        self.form
    }

    pub fn companions(&self) -> Option<&BinaryCompanions> {
        self.companions.as_ref()
    }
}
