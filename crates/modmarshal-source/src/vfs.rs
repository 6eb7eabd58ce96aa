//! Directory-backed virtual source.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::SourceError;

/// Uniform read-only view over a module's files.
///
/// Paths are slash-separated and relative to the source root; `"."` is the
/// root itself.
pub trait VirtualSource {
    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, SourceError>;

    fn is_dir(&self, path: &str) -> bool;

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, SourceError>;

    fn read_file(&self, path: &str) -> Result<Vec<u8>, SourceError>;
}

/// One entry of [`VirtualSource::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// [`VirtualSource`] over a real directory.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn join(&self, path: &str) -> PathBuf {
        if path == "." {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }
}

impl VirtualSource for DirSource {
    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, SourceError> {
        let full = self.join(path);
        let file = fs::File::open(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound(path.to_string()),
            _ => SourceError::Io(e),
        })?;

        Ok(Box::new(file))
    }

    fn is_dir(&self, path: &str) -> bool {
        self.join(path).is_dir()
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, SourceError> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(self.join(path))? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type()?.is_dir();

            entries.push(DirEntry { name, is_dir });
        }

        entries.sort();

        Ok(entries)
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, SourceError> {
        fs::read(self.join(path)).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound(path.to_string()),
            _ => SourceError::Io(e),
        })
    }
}
