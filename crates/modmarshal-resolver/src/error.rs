use std::path::PathBuf;

use thiserror::Error;

use modmarshal_source::SourceError;

/// Manifest parse failures. Fatal to the enclosing resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("manifest line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Failures while loading and type-checking a package.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no module manifest found in any directory above {}", .0.display())]
    NoManifestFound(PathBuf),

    #[error("{path}: multiple packages: {first} and {second}")]
    MultiplePackages {
        path: String,
        first: String,
        second: String,
    },

    #[error("{file}: cannot find package clause")]
    MissingPackageClause { file: String },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("type check failed: {0}")]
    Check(#[source] anyhow::Error),
}
