//! Coordinate-to-source materialization.

use std::path::{Path, PathBuf};

use tracing::debug;

use modmarshal_types::DependencyCoordinate;

use crate::archive::ZipSource;
use crate::escape::{cache_dir, module_zip_url};
use crate::http::HttpRangeReader;
use crate::vfs::{DirSource, VirtualSource};
use crate::SourceError;

const DEFAULT_PROXY: &str = "https://proxy.golang.org";

/// Maps dependency coordinates to virtual sources.
///
/// Directory coordinates bypass the cache entirely. Versioned coordinates
/// prefer the on-disk cache (`<root>/<escaped-base>@<escaped-version>`) and
/// fall back to fetching the module zip from the proxy with ranged reads.
/// The cache is treated as append-only and content-addressed: a hit keyed
/// by exact path+version is never re-verified.
pub struct ArchiveCache {
    cache_root: PathBuf,
    proxy: String,
}

impl Default for ArchiveCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveCache {
    /// Cache rooted at the module download cache (`$GOPATH/pkg/mod`, with
    /// `~/go` standing in when GOPATH is unset), proxying to the default
    /// public proxy.
    pub fn new() -> Self {
        Self {
            cache_root: default_cache_root(),
            proxy: DEFAULT_PROXY.to_string(),
        }
    }

    pub fn with_root(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            proxy: DEFAULT_PROXY.to_string(),
        }
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = proxy.into();
        self
    }

    /// Produce a [`VirtualSource`] for `coord`.
    pub fn materialize(
        &self,
        coord: &DependencyCoordinate,
    ) -> Result<Box<dyn VirtualSource>, SourceError> {
        if coord.is_directory() {
            let root = join_sub(Path::new(&coord.base), &coord.sub_path);
            debug!(root = %root.display(), "directory source");

            return Ok(Box::new(DirSource::new(root)));
        }

        let cached = cache_dir(&self.cache_root, &coord.base, &coord.version)?;

        match std::fs::metadata(&cached) {
            Ok(meta) if meta.is_dir() => {
                debug!(dir = %cached.display(), "cache hit");

                return Ok(Box::new(DirSource::new(join_sub(&cached, &coord.sub_path))));
            }
            Ok(_) => {}
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            Err(_) => {}
        }

        let url = module_zip_url(&self.proxy, &coord.base, &coord.version)?;
        debug!(url, "cache miss, fetching archive");

        let reader = HttpRangeReader::open(&url)?;
        let base = archive_prefix(&coord.base, &coord.version, &coord.sub_path);

        Ok(Box::new(ZipSource::new(reader, base)?))
    }
}

/// Member prefix inside a published module zip: `<base>@<version>`, plus the
/// coordinate's sub-path when it points into a subpackage.
fn archive_prefix(base: &str, version: &str, sub_path: &str) -> String {
    let prefix = format!("{base}@{version}");

    if sub_path.is_empty() || sub_path == "." {
        prefix
    } else {
        format!("{prefix}/{sub_path}")
    }
}

fn join_sub(base: &Path, sub_path: &str) -> PathBuf {
    if sub_path.is_empty() || sub_path == "." {
        base.to_path_buf()
    } else {
        base.join(sub_path)
    }
}

fn default_cache_root() -> PathBuf {
    let gopath = std::env::var_os("GOPATH")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join("go")))
        .unwrap_or_else(|| PathBuf::from("go"));

    gopath.join("pkg").join("mod")
}
