//! Build-relevant file selection.
//!
//! Mirrors the toolchain's implicit file constraints: only `.go` files, no
//! test files, no `_`/`.`-prefixed names, and `_GOOS`/`_GOARCH` name
//! suffixes must match the configured target.

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "illumos", "ios", "js", "linux", "netbsd",
    "openbsd", "plan9", "solaris", "wasip1", "windows",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "arm", "arm64", "loong64", "mips", "mips64", "mips64le", "mipsle", "ppc64",
    "ppc64le", "riscv64", "s390x", "wasm",
];

/// Filters a package's directory listing down to buildable source files
/// for one target platform.
#[derive(Debug, Clone)]
pub struct FileFilter {
    goos: String,
    goarch: String,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::new(host_os(), host_arch())
    }
}

impl FileFilter {
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
        }
    }

    pub fn is_build_file(&self, name: &str) -> bool {
        let Some(stem) = name.strip_suffix(".go") else {
            return false;
        };

        if stem.is_empty()
            || name.starts_with('_')
            || name.starts_with('.')
            || stem.ends_with("_test")
        {
            return false;
        }

        self.matches_platform(stem)
    }

    /// Apply the `name_GOOS.go`, `name_GOARCH.go` and `name_GOOS_GOARCH.go`
    /// suffix constraints. A stem with no underscore carries no constraint,
    /// so a bare `linux.go` builds everywhere.
    fn matches_platform(&self, stem: &str) -> bool {
        let parts: Vec<&str> = stem.split('_').collect();

        match parts.as_slice() {
            [_, .., os, arch] if KNOWN_OS.contains(os) && KNOWN_ARCH.contains(arch) => {
                *os == self.goos && *arch == self.goarch
            }
            [_, .., last] if KNOWN_ARCH.contains(last) => *last == self.goarch,
            [_, .., last] if KNOWN_OS.contains(last) => *last == self.goos,
            _ => true,
        }
    }
}

fn host_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        other => other,
    }
}
