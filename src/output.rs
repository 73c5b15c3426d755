//! Writing serialized Gruntfiles to disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result of writing a Gruntfile.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "WriteResult tells whether the file changed"]
pub enum WriteResult {
    Written { bytes: usize },
    /// The file already held exactly this text
    Unchanged,
}

/// Write `text` to `path` atomically, skipping the write when the file
/// already holds the same content.
pub fn write_gruntfile(path: &Path, text: &str) -> Result<WriteResult, WriteError> {
    match fs::read(path) {
        Ok(current) if xxh3_64(&current) == xxh3_64(text.as_bytes()) => {
            tracing::debug!(path = %path.display(), "gruntfile unchanged");
            return Ok(WriteResult::Unchanged);
        }
        Ok(_) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(WriteError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    atomic_write(path, text.as_bytes()).map_err(|source| WriteError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(WriteResult::Written { bytes: text.len() })
}

fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    // Tempfile in the same directory so the rename stays on one filesystem
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_then_skips_identical_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Gruntfile.js");

        let first = write_gruntfile(&path, "module.exports = function (grunt) {\n};\n").unwrap();
        assert_eq!(first, WriteResult::Written { bytes: 39 });

        let second = write_gruntfile(&path, "module.exports = function (grunt) {\n};\n").unwrap();
        assert_eq!(second, WriteResult::Unchanged);
    }

    #[test]
    fn overwrites_changed_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Gruntfile.js");
        fs::write(&path, "old").unwrap();

        let result = write_gruntfile(&path, "new").unwrap();
        assert_eq!(result, WriteResult::Written { bytes: 3 });
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn missing_directory_is_a_write_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("Gruntfile.js");
        assert!(matches!(
            write_gruntfile(&path, "x"),
            Err(WriteError::Write { .. })
        ));
    }
}
