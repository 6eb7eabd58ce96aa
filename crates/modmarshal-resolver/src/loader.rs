//! Module discovery and memoized package loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, trace};

use modmarshal_source::{ArchiveCache, SourceError, VirtualSource};
use modmarshal_types::{Package, PackageId, TypeTable};

use crate::check::{package_clause, Importer, SourceFile, Typechecker};
use crate::files::FileFilter;
use crate::import::ImportResolver;
use crate::manifest::ModuleManifest;
use crate::LoadError;

const MANIFEST_NAME: &str = "go.mod";

/// A discovered module: its parsed manifest and the directory it roots.
#[derive(Debug, Clone)]
pub struct Module {
    pub manifest: ModuleManifest,
    pub root: PathBuf,
}

impl Module {
    /// Walk upward from `start` to the nearest directory holding a
    /// manifest. Returns the module together with `start`'s sub-path below
    /// the module root (`"."` when `start` is the root itself).
    ///
    /// A manifest that exists but fails to parse aborts the walk; a missing
    /// manifest just moves to the parent directory.
    pub fn find(start: &Path) -> Result<(Self, String), LoadError> {
        let mut dir = start.to_path_buf();
        let mut below: Vec<String> = Vec::new();

        loop {
            match std::fs::read(dir.join(MANIFEST_NAME)) {
                Ok(bytes) => {
                    let manifest = ModuleManifest::parse(&bytes)?;

                    below.reverse();
                    let sub = if below.is_empty() {
                        ".".to_string()
                    } else {
                        below.join("/")
                    };

                    debug!(root = %dir.display(), sub, "found module root");

                    return Ok((Self { manifest, root: dir }, sub));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(SourceError::Io(e).into()),
            }

            if let Some(name) = dir.file_name() {
                below.push(name.to_string_lossy().into_owned());
            }

            match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => return Err(LoadError::NoManifestFound(start.to_path_buf())),
            }
        }
    }

    /// Fully qualified import path of a sub-directory of this module.
    pub fn import_path(&self, sub: &str) -> String {
        if sub.is_empty() || sub == "." {
            self.manifest.identity().to_string()
        } else {
            format!("{}/{}", self.manifest.identity(), sub)
        }
    }
}

/// Orchestrates import resolution, source materialization and type
/// checking for one resolution run.
///
/// Every import path is resolved at most once per loader; the memo map is
/// consulted through a mutex but never held across a resolution, so the
/// checker's recursive import callbacks re-enter freely.
pub struct TypeLoader<'c> {
    module: Module,
    cache: ArchiveCache,
    filter: FileFilter,
    checker: &'c dyn Typechecker,
    resolved: Mutex<HashMap<String, PackageId>>,
}

impl<'c> TypeLoader<'c> {
    pub fn new(module: Module, checker: &'c dyn Typechecker) -> Self {
        Self {
            module,
            cache: ArchiveCache::new(),
            filter: FileFilter::default(),
            checker,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_cache(mut self, cache: ArchiveCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Discover the module enclosing `start` and return a loader for it,
    /// along with the fully qualified import path of `start` itself.
    pub fn resolve_package(
        start: &Path,
        checker: &'c dyn Typechecker,
    ) -> Result<(Self, String), LoadError> {
        let (module, sub) = Module::find(start)?;
        let import = module.import_path(&sub);

        Ok((Self::new(module, checker), import))
    }

    /// Load and check the package at `import_path`, excluding any file
    /// named in `ignore` (used to keep an in-progress output file out of a
    /// self-referential run).
    pub fn load(
        &self,
        table: &mut TypeTable,
        import_path: &str,
        ignore: &[&str],
    ) -> Result<PackageId, LoadError> {
        if let Some(id) = self.resolved.lock().get(import_path) {
            return Ok(*id);
        }

        let resolver = ImportResolver::new(&self.module.manifest, &self.module.root);

        let id = match resolver.resolve(import_path) {
            Some(coord) => {
                trace!(import_path, ?coord, "resolved import");

                let source = self.cache.materialize(&coord)?;
                self.parse_package(table, source.as_ref(), import_path, ignore)?
            }
            None => self.standard_import(table, import_path),
        };

        self.resolved.lock().insert(import_path.to_string(), id);

        Ok(id)
    }

    /// Import callback used recursively by the checker.
    pub fn import(&self, table: &mut TypeTable, path: &str) -> Result<PackageId, LoadError> {
        self.load(table, path, &[])
    }

    /// Select, scan and check the build files found in `source` as the
    /// package at `declared_path`.
    pub fn parse_package(
        &self,
        table: &mut TypeTable,
        source: &dyn VirtualSource,
        declared_path: &str,
        ignore: &[&str],
    ) -> Result<PackageId, LoadError> {
        let mut files: Vec<SourceFile> = Vec::new();

        for entry in source.read_dir(".")? {
            if entry.is_dir
                || !self.filter.is_build_file(&entry.name)
                || ignore.contains(&entry.name.as_str())
            {
                continue;
            }

            let content = source.read_file(&entry.name)?;
            let package = package_clause(&entry.name, &content)?;

            if let Some(first) = files.first() {
                if first.package != package {
                    return Err(LoadError::MultiplePackages {
                        path: declared_path.to_string(),
                        first: first.package.clone(),
                        second: package,
                    });
                }
            }

            files.push(SourceFile {
                name: entry.name,
                package,
                content,
            });
        }

        debug!(declared_path, files = files.len(), "checking package");

        let mut importer = LoaderImporter { loader: self };

        self.checker
            .check(table, declared_path, &files, &mut importer)
            .map_err(LoadError::Check)
    }

    /// Paths outside the module's manifest belong to the standard import
    /// space. The checker sees them as opaque packages named after their
    /// last path segment.
    fn standard_import(&self, table: &mut TypeTable, path: &str) -> PackageId {
        if let Some(id) = table.find_package(path) {
            return id;
        }

        let name = path.rsplit('/').next().unwrap_or(path);

        table.add_package(Package::new(path, name))
    }
}

struct LoaderImporter<'a, 'c> {
    loader: &'a TypeLoader<'c>,
}

impl Importer for LoaderImporter<'_, '_> {
    fn import(&mut self, table: &mut TypeTable, path: &str) -> Result<PackageId, LoadError> {
        self.loader.import(table, path)
    }
}
