//! Adapters for the external compiler and decompiler.
//!
//! Both collaborators reduce a policy to a raw graph document. They are
//! expected to be deterministic. This crate only checks the shape of what
//! they return; it never interprets the policy itself.
//!
//! [`ExternalCommand`] shells out to a configured program and reads the raw
//! graph as JSON from its stdout:
//!
//! ```text
//! compile:    <argv...> <source_path>
//! decompile:  <argv...> <binary_path> <ops_table_path> <release_id>
//! ```

use crate::error::CollaboratorError;
use serde_json::Value;
use std::path::Path;
use std::process::Command;

pub const COMPILER_ROLE: &str = "compiler";
pub const DECOMPILER_ROLE: &str = "decompiler";

/// Reduces profile source text to a raw graph document.
pub trait PolicyCompiler {
    fn compile(&self, source: &Path) -> Result<Value, CollaboratorError>;
}

/// Reduces a compiled profile to a raw graph document.
pub trait PolicyDecompiler {
    fn decompile(
        &self,
        binary: &Path,
        ops_table: &Path,
        release: &str,
    ) -> Result<Value, CollaboratorError>;
}

/// A collaborator implemented by an external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    argv: Vec<String>,
}

impl ExternalCommand {
    /// `argv` must name at least the program.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() {
            return None;
        }
        Some(Self { argv })
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    fn run(
        &self,
        role: &'static str,
        extra: &[&std::ffi::OsStr],
    ) -> Result<Value, CollaboratorError> {
        let command_line = self.describe(extra);
        log::info!("running {role}: {command_line}");

        let output = Command::new(&self.argv[0])
            .args(&self.argv[1..])
            .args(extra)
            .output()
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    CollaboratorError::NotInstalled {
                        role,
                        program: self.argv[0].clone(),
                    }
                } else {
                    CollaboratorError::Failed {
                        role,
                        command: command_line.clone(),
                        message: err.to_string(),
                    }
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("exit status {}", output.status)
            } else {
                stderr
            };
            return Err(CollaboratorError::Failed {
                role,
                command: command_line,
                message,
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| CollaboratorError::Output {
            role,
            command: command_line,
            message: e.to_string(),
        })
    }

    fn describe(&self, extra: &[&std::ffi::OsStr]) -> String {
        self.argv
            .iter()
            .cloned()
            .chain(extra.iter().map(|arg| arg.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl PolicyCompiler for ExternalCommand {
    fn compile(&self, source: &Path) -> Result<Value, CollaboratorError> {
        self.run(COMPILER_ROLE, &[source.as_os_str()])
    }
}

impl PolicyDecompiler for ExternalCommand {
    fn decompile(
        &self,
        binary: &Path,
        ops_table: &Path,
        release: &str,
    ) -> Result<Value, CollaboratorError> {
        self.run(
            DECOMPILER_ROLE,
            &[
                binary.as_os_str(),
                ops_table.as_os_str(),
                std::ffi::OsStr::new(release),
            ],
        )
    }
}
