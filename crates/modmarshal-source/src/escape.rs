//! Module path and version escaping for cache directories and proxy URLs.
//!
//! Case-sensitive module paths have to live inside case-insensitive
//! filesystems and URLs, so every uppercase ASCII letter is encoded as `!`
//! followed by its lowercase form (`github.com/Azure` ->
//! `github.com/!azure`).

use std::path::{Path, PathBuf};

use crate::SourceError;

/// Escape a module path for use in a cache directory or proxy URL.
pub fn escape_path(path: &str) -> Result<String, SourceError> {
    escape(path, "module path")
}

/// Escape a module version.
pub fn escape_version(version: &str) -> Result<String, SourceError> {
    if version.contains('/') {
        return Err(SourceError::Escape(format!(
            "version {version:?} must not contain '/'"
        )));
    }

    escape(version, "version")
}

fn escape(s: &str, what: &str) -> Result<String, SourceError> {
    if s.is_empty() {
        return Err(SourceError::Escape(format!("empty {what}")));
    }

    let mut out = String::with_capacity(s.len());

    for c in s.chars() {
        match c {
            '!' => {
                return Err(SourceError::Escape(format!(
                    "{what} {s:?} must not contain '!'"
                )))
            }
            'A'..='Z' => {
                out.push('!');
                out.push(c.to_ascii_lowercase());
            }
            c if c.is_ascii_graphic() => out.push(c),
            c => {
                return Err(SourceError::Escape(format!(
                    "{what} {s:?} contains invalid character {c:?}"
                )))
            }
        }
    }

    Ok(out)
}

/// The proxy URL for a module zip: `<proxy>/<escaped-path>/@v/<escaped-version>.zip`.
pub fn module_zip_url(proxy: &str, base: &str, version: &str) -> Result<String, SourceError> {
    let p = escape_path(base)?;
    let v = escape_version(version)?;

    Ok(format!("{}/{}/@v/{}.zip", proxy.trim_end_matches('/'), p, v))
}

/// On-disk cache directory for a module version:
/// `<root>/<escaped-path>@<escaped-version>`.
pub fn cache_dir(root: &Path, base: &str, version: &str) -> Result<PathBuf, SourceError> {
    let p = escape_path(base)?;
    let v = escape_version(version)?;

    Ok(root.join(format!("{p}@{v}")))
}

/// Whether a manifest path refers to a local directory rather than a module
/// path (`.`, `..`, or anything beginning `./`, `../` or `/`).
pub fn is_directory_path(path: &str) -> bool {
    path == "."
        || path == ".."
        || path.starts_with("./")
        || path.starts_with("../")
        || path.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_uppercase() {
        assert_eq!(
            escape_path("github.com/Azure/azure-sdk").unwrap(),
            "github.com/!azure/azure-sdk"
        );
        assert_eq!(escape_path("golang.org/x/sync").unwrap(), "golang.org/x/sync");
        assert_eq!(escape_version("v0.19.0-RC1").unwrap(), "v0.19.0-!r!c1");
    }

    #[test]
    fn rejects_bang_and_spaces() {
        assert!(escape_path("foo!bar").is_err());
        assert!(escape_path("foo bar").is_err());
        assert!(escape_version("v1.0.0/extra").is_err());
        assert!(escape_path("").is_err());
    }

    #[test]
    fn proxy_url_matches_convention() {
        assert_eq!(
            module_zip_url("https://proxy.golang.org", "golang.org/x/sync", "v0.19.0").unwrap(),
            "https://proxy.golang.org/golang.org/x/sync/@v/v0.19.0.zip"
        );
    }

    #[test]
    fn cache_dir_layout() {
        let dir = cache_dir(Path::new("/cache"), "github.com/BurntSushi/toml", "v1.2.0").unwrap();
        assert_eq!(
            dir,
            Path::new("/cache/github.com/!burnt!sushi/toml@v1.2.0")
        );
    }

    #[test]
    fn directory_paths() {
        assert!(is_directory_path("./local"));
        assert!(is_directory_path("../sibling"));
        assert!(is_directory_path("/abs/path"));
        assert!(is_directory_path("."));
        assert!(!is_directory_path("example.com/mod"));
    }
}
