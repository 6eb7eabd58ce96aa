//! Source layer for modmarshal.
//!
//! A [`VirtualSource`] is a uniform read-only view over one module's files,
//! backed either by a local directory or by a versioned zip archive fetched
//! from the module proxy with byte-range reads (the archive's central
//! directory is read without downloading the payload).
//!
//! [`ArchiveCache::materialize`] turns a dependency coordinate into a
//! source, preferring the on-disk module cache and falling back to the
//! network.

mod archive;
mod cache;
mod escape;
mod http;
mod vfs;

pub use archive::ZipSource;
pub use cache::ArchiveCache;
pub use escape::{escape_path, escape_version, is_directory_path, module_zip_url};
pub use http::HttpRangeReader;
pub use vfs::{DirEntry, DirSource, VirtualSource};

use thiserror::Error;

/// Failures while locating or reading module sources.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Neither the local cache nor the remote fetch produced a usable source.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("invalid module path or version: {0}")]
    Escape(String),

    #[error("{0}: file not found")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Archive(String),
}
