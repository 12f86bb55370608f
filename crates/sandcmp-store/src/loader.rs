//! The graph loader: any policy input → canonical [`OperationGraph`].

use crate::cache::{graph_from_value, read_graph_from_path};
use crate::collaborator::{COMPILER_ROLE, DECOMPILER_ROLE, PolicyCompiler, PolicyDecompiler};
use crate::error::LoadError;
use crate::source::{GraphForm, PolicyInput};
use sandcmp_kernel::OperationGraph;
use std::path::Path;

/// Loads policies of any form. Holds no state besides its collaborators,
/// so reference and candidate can be loaded in either order.
#[derive(Default)]
pub struct GraphLoader {
    compiler: Option<Box<dyn PolicyCompiler>>,
    decompiler: Option<Box<dyn PolicyDecompiler>>,
}

impl GraphLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compiler(mut self, compiler: Box<dyn PolicyCompiler>) -> Self {
        self.compiler = Some(compiler);
        self
    }

    pub fn with_decompiler(mut self, decompiler: Box<dyn PolicyDecompiler>) -> Self {
        self.decompiler = Some(decompiler);
        self
    }

    /// Load one policy. Either a complete graph or an error naming the file.
    pub fn load(&self, input: &PolicyInput) -> Result<OperationGraph, LoadError> {
        let path = input.path();
        log::debug!("loading {} policy {}", input.form(), path.display());

        let graph = match input.form() {
            GraphForm::Json => read_graph_from_path(path)?,
            GraphForm::Source => {
                let compiler = self.compiler.as_deref().ok_or_else(|| {
                    LoadError::CollaboratorMissing {
                        path: path.to_path_buf(),
                        role: COMPILER_ROLE,
                    }
                })?;
                ensure_readable(path)?;
                let raw = compiler
                    .compile(path)
                    .map_err(|source| collaborator_error(path, source))?;
                graph_from_value(path, &raw)?
            }
            GraphForm::Binary => {
                let decompiler = self.decompiler.as_deref().ok_or_else(|| {
                    LoadError::CollaboratorMissing {
                        path: path.to_path_buf(),
                        role: DECOMPILER_ROLE,
                    }
                })?;
                // PolicyInput guarantees companions for binary form.
                let companions = input.companions().ok_or_else(|| LoadError::Read {
                    path: path.to_path_buf(),
                    message: "binary input without ops table and release".to_string(),
                })?;
                ensure_readable(path)?;
                ensure_readable(&companions.ops_table)?;
                let raw = decompiler
                    .decompile(path, &companions.ops_table, &companions.release)
                    .map_err(|source| collaborator_error(path, source))?;
                graph_from_value(path, &raw)?
            }
        };

        if graph.is_empty() {
            log::warn!("{} holds no operations", path.display());
        }
        log::info!(
            "loaded {}: {} operations, {} paths",
            path.display(),
            graph.operation_count(),
            graph.path_count()
        );
        Ok(graph)
    }
}

fn collaborator_error(path: &Path, source: crate::error::CollaboratorError) -> LoadError {
    LoadError::Collaborator {
        path: path.to_path_buf(),
        source,
    }
}

fn ensure_readable(path: &Path) -> Result<(), LoadError> {
    std::fs::File::open(path)
        .map(|_| ())
        .map_err(|e| LoadError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollaboratorError;
    use serde_json::{Value, json};
    use std::cell::RefCell;
    use std::fs;
    use std::path::PathBuf;
    use std::rc::Rc;
    use std::time::{SystemTime, UNIX_EPOCH};

    struct FixedCompiler(Value);

    impl PolicyCompiler for FixedCompiler {
        fn compile(&self, _source: &Path) -> Result<Value, CollaboratorError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default, Clone)]
    struct RecordingDecompiler {
        calls: Rc<RefCell<Vec<(PathBuf, PathBuf, String)>>>,
    }

    impl PolicyDecompiler for RecordingDecompiler {
        fn decompile(
            &self,
            binary: &Path,
            ops_table: &Path,
            release: &str,
        ) -> Result<Value, CollaboratorError> {
            self.calls.borrow_mut().push((
                binary.to_path_buf(),
                ops_table.to_path_buf(),
                release.to_string(),
            ));
            Ok(json!({ "file-read*": [[["literal", "/etc/hosts"]]] }))
        }
    }

    fn temp_file(prefix: &str, contents: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "sandcmp-loader-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::write(&path, contents).expect("fixture should write");
        path
    }

    #[test]
    fn json_form_reads_cache_and_dedups() {
        let path = temp_file(
            "json",
            r#"{"file-read*": [[["literal", "/a"]], [["literal", "/a"]]]}"#,
        );
        let graph = GraphLoader::new()
            .load(&PolicyInput::json(&path))
            .expect("cache should load");
        assert_eq!(graph.path_count(), 1);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn source_form_without_compiler_fails_fast() {
        let path = temp_file("src-none", "(version 1)");
        let input = PolicyInput::new(&path, GraphForm::Source, None, None).unwrap();
        match GraphLoader::new().load(&input) {
            Err(LoadError::CollaboratorMissing { role, .. }) => assert_eq!(role, COMPILER_ROLE),
            other => panic!("expected missing compiler, got {other:?}"),
        }
        let _ = fs::remove_file(path);
    }

    #[test]
    fn source_form_validates_compiler_output() {
        let path = temp_file("src-bad", "(version 1)");
        let input = PolicyInput::new(&path, GraphForm::Source, None, None).unwrap();
        let loader = GraphLoader::new().with_compiler(Box::new(FixedCompiler(json!(["nope"]))));
        let err = loader.load(&input).expect_err("bad shape should fail");
        assert!(matches!(err, LoadError::Shape { .. }));
        assert_eq!(err.path(), path.as_path());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn binary_form_passes_companions_to_decompiler() {
        let binary = temp_file("bin", "\u{1}\u{2}");
        let ops = temp_file("ops", "file-read*\nfile-write*\n");
        let input = PolicyInput::new(
            &binary,
            GraphForm::Binary,
            Some(ops.clone()),
            Some("10.15".to_string()),
        )
        .unwrap();

        let decompiler = RecordingDecompiler::default();
        let loader = GraphLoader::new().with_decompiler(Box::new(decompiler.clone()));
        let graph = loader.load(&input).expect("binary should load");
        assert!(graph.contains_operation("file-read*"));
        assert_eq!(
            decompiler.calls.borrow().as_slice(),
            &[(binary.clone(), ops.clone(), "10.15".to_string())]
        );

        let _ = fs::remove_file(binary);
        let _ = fs::remove_file(ops);
    }

    #[test]
    fn binary_form_checks_ops_table_exists() {
        let binary = temp_file("bin-noops", "\u{1}");
        let ops = std::env::temp_dir().join("sandcmp-loader-ops-table-does-not-exist");
        let input = PolicyInput::new(
            &binary,
            GraphForm::Binary,
            Some(ops.clone()),
            Some("10.15".to_string()),
        )
        .unwrap();
        let loader = GraphLoader::new().with_decompiler(Box::new(RecordingDecompiler::default()));
        let err = loader.load(&input).expect_err("missing ops table should fail");
        assert_eq!(err.path(), ops.as_path());
        let _ = fs::remove_file(binary);
    }
}
