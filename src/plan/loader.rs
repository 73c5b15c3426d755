//! Reading edit plans from TOML text, files and plan directories.

use crate::plan::schema::{EditPlan, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Where a plan's text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOrigin {
    Inline,
    File(PathBuf),
}

impl fmt::Display for PlanOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanOrigin::Inline => f.write_str("inline plan"),
            PlanOrigin::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read edit plan from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse edit plan TOML ({origin}): {source}")]
    Toml {
        origin: PlanOrigin,
        source: toml_edit::de::Error,
    },

    #[error("invalid edit plan ({origin}): {source}")]
    Validation {
        origin: PlanOrigin,
        source: ValidationError,
    },

    #[error("failed to list edit plans in {}: {source}", .dir.display())]
    Walk {
        dir: PathBuf,
        source: walkdir::Error,
    },

    #[error("no .toml edit plans found in {}", .dir.display())]
    EmptyDirectory { dir: PathBuf },
}

impl ConfigError {
    /// Plan the error belongs to, when it concerns a single plan.
    pub fn origin(&self) -> Option<&PlanOrigin> {
        match self {
            ConfigError::Toml { origin, .. } | ConfigError::Validation { origin, .. } => Some(origin),
            _ => None,
        }
    }
}

fn parse_plan(input: &str, origin: PlanOrigin) -> Result<EditPlan, ConfigError> {
    let plan: EditPlan = match toml_edit::de::from_str(input) {
        Ok(plan) => plan,
        Err(source) => return Err(ConfigError::Toml { origin, source }),
    };
    if let Err(source) = plan.validate() {
        return Err(ConfigError::Validation { origin, source });
    }
    tracing::debug!(plan = %plan.meta.name, %origin, edits = plan.edits.len(), "loaded edit plan");
    Ok(plan)
}

pub fn load_from_str(input: &str) -> Result<EditPlan, ConfigError> {
    parse_plan(input, PlanOrigin::Inline)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<EditPlan, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_plan(&contents, PlanOrigin::File(path.to_path_buf()))
}

/// Every `.toml` file directly inside `dir`, in file name order.
pub fn discover_plan_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, ConfigError> {
    let dir = dir.as_ref();
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1) {
        let entry = entry.map_err(|source| ConfigError::Walk {
            dir: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|ext| ext.to_str()) == Some("toml")
        {
            files.push(entry.into_path());
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(ConfigError::EmptyDirectory {
            dir: dir.to_path_buf(),
        });
    }
    Ok(files)
}
