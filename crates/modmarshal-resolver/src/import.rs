//! Import-path to dependency-coordinate mapping.

use std::path::Path;

use modmarshal_types::DependencyCoordinate;

use crate::manifest::{Dependency, ModuleManifest};

/// Decides where an import path's source lives, relative to one module.
pub struct ImportResolver<'a> {
    manifest: &'a ModuleManifest,
    root: &'a Path,
}

impl<'a> ImportResolver<'a> {
    pub fn new(manifest: &'a ModuleManifest, root: &'a Path) -> Self {
        Self { manifest, root }
    }

    /// Resolve `import_path` to a coordinate.
    ///
    /// The module's own identity (or any path under it) maps into the module
    /// root. Declared dependencies match either exactly or as the longest
    /// prefix ending at a path-separator boundary; `"foo/barbaz"` never
    /// matches a dependency `"foo/bar"`. `None` means the path belongs to
    /// the standard import space and is outside this module's manifest.
    pub fn resolve(&self, import_path: &str) -> Option<DependencyCoordinate> {
        let identity = self.manifest.identity();

        if import_path == identity {
            return Some(self.local("."));
        }

        if let Some(rest) = import_path
            .strip_prefix(identity)
            .and_then(|r| r.strip_prefix('/'))
        {
            return Some(self.local(rest));
        }

        let deps = self.manifest.dependencies();

        if let Some(dep) = deps.get(import_path) {
            return Some(self.coordinate(dep, "."));
        }

        let mut best: Option<(&str, &Dependency)> = None;

        for (path, dep) in deps {
            let boundary = import_path
                .strip_prefix(path)
                .is_some_and(|rest| rest.starts_with('/'));

            if boundary && best.is_none_or(|(b, _)| path.len() > b.len()) {
                best = Some((path, dep));
            }
        }

        best.map(|(path, dep)| self.coordinate(dep, &import_path[path.len() + 1..]))
    }

    fn local(&self, sub_path: &str) -> DependencyCoordinate {
        DependencyCoordinate::local(self.root.to_string_lossy().into_owned(), sub_path)
    }

    fn coordinate(&self, dep: &Dependency, sub_path: &str) -> DependencyCoordinate {
        if dep.version.is_empty() {
            // Directory-form replacement, relative to the module root.
            let rel = dep.base.strip_prefix("./").unwrap_or(&dep.base);
            let dir = self.root.join(rel);

            DependencyCoordinate::local(dir.to_string_lossy().into_owned(), sub_path)
        } else {
            DependencyCoordinate::remote(&dep.base, &dep.version, sub_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> ModuleManifest {
        ModuleManifest::parse(
            b"module example.com/m\n\
              require (\n\
              \tgolang.org/x/mod v0.31.0\n\
              \tfoo/bar v1.0.0\n\
              \tfoo/bar/deep v2.0.0\n\
              )\n\
              replace golang.org/x/tools => somewhere.org/tools v0.1.0\n\
              replace example.com/dep => ./local/dep\n\
              require example.com/dep v1.0.0\n",
        )
        .unwrap()
    }

    fn resolve(import_path: &str) -> Option<DependencyCoordinate> {
        let m = manifest();
        ImportResolver::new(&m, Path::new("/src/m")).resolve(import_path)
    }

    #[test]
    fn own_identity_is_the_module_root() {
        assert_eq!(
            resolve("example.com/m"),
            Some(DependencyCoordinate::local("/src/m", "."))
        );
        assert_eq!(
            resolve("example.com/m/internal/a"),
            Some(DependencyCoordinate::local("/src/m", "internal/a"))
        );
    }

    #[test]
    fn exact_dependency_match() {
        assert_eq!(
            resolve("golang.org/x/mod"),
            Some(DependencyCoordinate::remote("golang.org/x/mod", "v0.31.0", "."))
        );
    }

    #[test]
    fn longest_prefix_wins() {
        assert_eq!(
            resolve("foo/bar/sub"),
            Some(DependencyCoordinate::remote("foo/bar", "v1.0.0", "sub"))
        );
        assert_eq!(
            resolve("foo/bar/deep/sub"),
            Some(DependencyCoordinate::remote("foo/bar/deep", "v2.0.0", "sub"))
        );
    }

    #[test]
    fn partial_segments_never_match() {
        assert_eq!(resolve("foo/barbaz"), None);
        assert_eq!(resolve("example.com/mx"), None);
    }

    #[test]
    fn rewritten_path_resolves_to_the_replacement() {
        assert_eq!(
            resolve("golang.org/x/tools/modfile"),
            Some(DependencyCoordinate::remote(
                "somewhere.org/tools",
                "v0.1.0",
                "modfile"
            ))
        );
    }

    #[test]
    fn directory_replacement_resolves_locally() {
        assert_eq!(
            resolve("example.com/dep/util"),
            Some(DependencyCoordinate::local("/src/m/local/dep", "util"))
        );
    }

    #[test]
    fn unknown_paths_are_left_to_the_standard_importer() {
        assert_eq!(resolve("fmt"), None);
        assert_eq!(resolve("github.com/unknown/pkg"), None);
    }
}
