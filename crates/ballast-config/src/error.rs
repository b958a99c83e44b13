//! Errors raised while reading, writing and building chain descriptions.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::validation::ValidationError;

/// File system step that failed while moving a chain file to or from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    /// Reading a chain file.
    Read,
    /// Writing a chain file.
    Write,
    /// Creating the directory a chain file is saved into.
    CreateDirectory,
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read chain file",
            Self::Write => "write chain file",
            Self::CreateDirectory => "create directory for chain file",
        })
    }
}

/// Errors from loading, saving or building a chain.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A chain file could not be read, written or given a directory.
    #[error("could not {operation} '{}': {source}", .path.display())]
    File {
        /// Step that failed.
        operation: FileOperation,
        /// File or directory involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML is malformed, names an unknown stage `type`, or has a
    /// setting of the wrong type.
    #[error("malformed chain description{}: {source}", origin(.path.as_deref()))]
    Parse {
        /// File the text came from; `None` for in-memory strings.
        path: Option<PathBuf>,
        /// Parser diagnostic, with line and column.
        #[source]
        source: toml::de::Error,
    },

    /// The chain could not be rendered as TOML.
    #[error("could not serialize chain '{name}': {source}")]
    Serialize {
        /// Chain name.
        name: String,
        /// Serializer error.
        #[source]
        source: toml::ser::Error,
    },

    /// The process spec or a stage setting is out of range.
    #[error("chain '{name}' is invalid: {source}")]
    Invalid {
        /// Chain name.
        name: String,
        /// Every problem found.
        #[source]
        source: ValidationError,
    },
}

fn origin(path: Option<&Path>) -> String {
    path.map(|p| format!(" in '{}'", p.display())).unwrap_or_default()
}

impl ConfigError {
    /// A chain file could not be read.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::file(FileOperation::Read, path, source)
    }

    /// A chain file could not be written.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::file(FileOperation::Write, path, source)
    }

    /// The directory for a chain file could not be created.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::file(FileOperation::CreateDirectory, path, source)
    }

    fn file(operation: FileOperation, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            operation,
            path: path.into(),
            source,
        }
    }

    /// File or directory the error concerns, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path, .. } => Some(path),
            Self::Parse { path, .. } => path.as_deref(),
            Self::Serialize { .. } | Self::Invalid { .. } => None,
        }
    }

    /// Validation problems, when the chain parsed but was rejected.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Invalid { source, .. } => Some(source),
            _ => None,
        }
    }
}
