//! Canonical graph cache: one JSON document per policy.
//!
//! The cache is the interchange format between the collaborators and the
//! comparator. Collaborator output can be normalized once and compared
//! many times.

use crate::error::LoadError;
use sandcmp_kernel::OperationGraph;
use serde_json::Value;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Parse a raw graph document already read from `origin`.
pub fn graph_from_value(origin: &Path, document: &Value) -> Result<OperationGraph, LoadError> {
    OperationGraph::from_json(document).map_err(|source| LoadError::Shape {
        path: origin.to_path_buf(),
        source,
    })
}

/// Parse graph text read from `origin`.
pub fn graph_from_str(origin: &Path, text: &str) -> Result<OperationGraph, LoadError> {
    let document: Value = serde_json::from_str(text).map_err(|e| LoadError::Parse {
        path: origin.to_path_buf(),
        message: e.to_string(),
    })?;
    graph_from_value(origin, &document)
}

/// Read a canonical graph from a JSON file.
pub fn read_graph_from_path(path: impl AsRef<Path>) -> Result<OperationGraph, LoadError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| LoadError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let text = validate_graph_bytes(path, &bytes)?;
    let graph = graph_from_str(path, text)?;
    log::debug!(
        "loaded {} operations / {} paths from {}",
        graph.operation_count(),
        graph.path_count(),
        path.display()
    );
    Ok(graph)
}

/// Write a graph in canonical form (sorted, deduplicated, pretty-printed).
pub fn write_graph(writer: &mut impl Write, graph: &OperationGraph) -> std::io::Result<()> {
    let text = serde_json::to_string_pretty(&graph.to_json())?;
    writeln!(writer, "{text}")
}

/// Write a graph to a file path, replacing any existing file atomically.
pub fn write_graph_to_path(
    path: impl AsRef<Path>,
    graph: &OperationGraph,
) -> Result<(), LoadError> {
    let path = path.as_ref();
    let write_err = |target: &Path, e: std::io::Error| LoadError::Write {
        path: target.to_path_buf(),
        message: e.to_string(),
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| write_err(parent, e))?;
    }

    let tmp_path = tmp_write_path(path);
    let write_result = (|| -> Result<(), LoadError> {
        let file = File::create(&tmp_path).map_err(|e| write_err(&tmp_path, e))?;
        let mut writer = BufWriter::new(file);
        write_graph(&mut writer, graph).map_err(|e| write_err(&tmp_path, e))?;
        writer.flush().map_err(|e| write_err(&tmp_path, e))?;
        let file = writer
            .into_inner()
            .map_err(|e| write_err(&tmp_path, e.into_error()))?;
        file.sync_all().map_err(|e| write_err(&tmp_path, e))?;
        Ok(())
    })();

    if let Err(error) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        write_err(path, e)
    })?;
    log::debug!("wrote canonical graph to {}", path.display());
    Ok(())
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}

fn validate_graph_bytes<'a>(path: &Path, bytes: &'a [u8]) -> Result<&'a str, LoadError> {
    if bytes.contains(&0) {
        return Err(LoadError::Corrupt {
            path: path.to_path_buf(),
            message: "contains NUL byte(s)".to_string(),
        });
    }
    std::str::from_utf8(bytes).map_err(|_| LoadError::Corrupt {
        path: path.to_path_buf(),
        message: "contains non-UTF-8 byte sequence(s)".to_string(),
    })
}
