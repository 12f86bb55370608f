//! Run configuration.
//!
//! Settings come from an optional TOML file and are overridden by command
//! line flags. The merged [`RunConfig`] is built once and passed explicitly
//! to the loader and the comparator.
//!
//! ```toml
//! [compare]
//! node_equality = "literal"
//!
//! [collaborators]
//! compiler = ["python3", "sandbox_compiler.py"]
//! decompiler = ["python3", "reverse_sandbox.py"]
//! ```

use crate::collaborator::ExternalCommand;
use crate::error::ConfigError;
use crate::loader::GraphLoader;
use sandcmp_kernel::{NodeEqualityMode, NodeEquivalence, StrategyError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "sandcmp.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    compare: CompareSection,
    #[serde(default)]
    collaborators: CollaboratorSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CompareSection {
    #[serde(default)]
    node_equality: Option<NodeEqualityMode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CollaboratorSection {
    #[serde(default)]
    compiler: Option<Vec<String>>,
    #[serde(default)]
    decompiler: Option<Vec<String>>,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub node_equality: Option<NodeEqualityMode>,
    pub compiler: Option<Vec<String>>,
    pub decompiler: Option<Vec<String>>,
}

/// Immutable settings for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    pub node_equality: NodeEqualityMode,
    pub compiler: Option<ExternalCommand>,
    pub decompiler: Option<ExternalCommand>,
}

impl RunConfig {
    /// Parse a config document. `origin` is only used in error messages.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        Ok(Self {
            node_equality: file.compare.node_equality.unwrap_or_default(),
            compiler: command_from(file.collaborators.compiler, "collaborators.compiler")?,
            decompiler: command_from(file.collaborators.decompiler, "collaborators.decompiler")?,
        })
    }

    /// Load configuration.
    ///
    /// With an explicit path the file must exist. Without one,
    /// `sandcmp.toml` in the working directory is used when present and
    /// defaults apply otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path,
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    log::debug!("no {DEFAULT_CONFIG_PATH} found, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        log::debug!("loaded config from {}", path.display());
        Self::from_toml_str(&text, path)
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(mode) = overrides.node_equality {
            self.node_equality = mode;
        }
        if let Some(argv) = command_from(overrides.compiler, "--compiler")? {
            self.compiler = Some(argv);
        }
        if let Some(argv) = command_from(overrides.decompiler, "--decompiler")? {
            self.decompiler = Some(argv);
        }
        Ok(self)
    }

    /// The node-equality strategy selected by this configuration.
    pub fn equivalence(&self) -> Result<Box<dyn NodeEquivalence>, StrategyError> {
        self.node_equality.strategy()
    }

    /// A loader wired to the configured collaborators.
    pub fn loader(&self) -> GraphLoader {
        let mut loader = GraphLoader::new();
        if let Some(compiler) = &self.compiler {
            loader = loader.with_compiler(Box::new(compiler.clone()));
        }
        if let Some(decompiler) = &self.decompiler {
            loader = loader.with_decompiler(Box::new(decompiler.clone()));
        }
        loader
    }
}

fn command_from(
    argv: Option<Vec<String>>,
    field: &str,
) -> Result<Option<ExternalCommand>, ConfigError> {
    match argv {
        None => Ok(None),
        Some(argv) => ExternalCommand::new(argv)
            .map(Some)
            .ok_or_else(|| ConfigError::Invalid(format!("{field} must name a program"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> &'static Path {
        Path::new("sandcmp.toml")
    }

    #[test]
    fn empty_document_gives_defaults() {
        let config = RunConfig::from_toml_str("", origin()).unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.node_equality, NodeEqualityMode::Literal);
    }

    #[test]
    fn parses_all_sections() {
        let config = RunConfig::from_toml_str(
            r#"
[compare]
node_equality = "regex-automaton"

[collaborators]
compiler = ["python3", "sandbox_compiler.py"]
decompiler = ["python3", "reverse_sandbox.py"]
"#,
            origin(),
        )
        .unwrap();
        assert_eq!(config.node_equality, NodeEqualityMode::RegexAutomaton);
        assert_eq!(
            config.compiler.as_ref().map(ExternalCommand::argv),
            Some(&["python3".to_string(), "sandbox_compiler.py".to_string()][..])
        );
        assert!(config.decompiler.is_some());
    }

    #[test]
    fn rejects_unknown_keys_and_empty_commands() {
        assert!(matches!(
            RunConfig::from_toml_str("[compare]\nfuzzy = true\n", origin()),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            RunConfig::from_toml_str("[collaborators]\ncompiler = []\n", origin()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn overrides_take_precedence() {
        let base = RunConfig::from_toml_str(
            "[collaborators]\ncompiler = [\"from-file\"]\n",
            origin(),
        )
        .unwrap();
        let merged = base
            .with_overrides(ConfigOverrides {
                node_equality: Some(NodeEqualityMode::RegexAutomaton),
                compiler: Some(vec!["from-flag".to_string()]),
                decompiler: None,
            })
            .unwrap();
        assert_eq!(merged.node_equality, NodeEqualityMode::RegexAutomaton);
        assert_eq!(
            merged.compiler.as_ref().map(|c| c.argv()[0].as_str()),
            Some("from-flag")
        );
        assert!(merged.decompiler.is_none());
        assert!(merged.equivalence().is_err());
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let path = std::env::temp_dir().join("sandcmp-config-does-not-exist.toml");
        assert!(matches!(
            RunConfig::load(Some(&path)),
            Err(ConfigError::Read { .. })
        ));
    }
}
