//! The seam to the external type-checking service.
//!
//! Type checking itself is out of scope here: a [`Typechecker`]
//! implementation (possibly out of process, exchanging tables as JSON)
//! consumes the selected source files and populates the [`TypeTable`]. The
//! loader hands it an [`Importer`] callback so the checker can pull in
//! transitive imports through the same resolution machinery.

use modmarshal_types::{PackageId, TypeTable};

use crate::LoadError;

/// One selected source file, with its declared package name pre-scanned.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub package: String,
    pub content: Vec<u8>,
}

/// Import callback supplied to the checker for transitive dependencies.
pub trait Importer {
    fn import(&mut self, table: &mut TypeTable, path: &str) -> Result<PackageId, LoadError>;
}

/// External type-checking service.
pub trait Typechecker {
    /// Check `files` as the package at `pkg_path`, recording its types and
    /// scope in `table`.
    fn check(
        &self,
        table: &mut TypeTable,
        pkg_path: &str,
        files: &[SourceFile],
        importer: &mut dyn Importer,
    ) -> anyhow::Result<PackageId>;
}

/// Extract the package name a source file declares.
///
/// Scans past blank lines and comments only; the first real token must open
/// the package clause.
pub(crate) fn package_clause(file: &str, bytes: &[u8]) -> Result<String, LoadError> {
    let text = String::from_utf8_lossy(bytes);
    let mut in_block = false;

    for raw in text.lines() {
        let line = strip_comments(raw, &mut in_block);
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            None => continue,
            Some("package") => {
                if let Some(name) = tokens.next() {
                    return Ok(name.trim_end_matches(';').to_string());
                }
                break;
            }
            Some(_) => break,
        }
    }

    Err(LoadError::MissingPackageClause {
        file: file.to_string(),
    })
}

fn strip_comments(line: &str, in_block: &mut bool) -> String {
    let mut out = String::new();
    let mut rest = line;

    loop {
        if *in_block {
            match rest.find("*/") {
                Some(at) => {
                    rest = &rest[at + 2..];
                    *in_block = false;
                }
                None => return out,
            }
        }

        let line_at = rest.find("//");
        let block_at = rest.find("/*");

        match (line_at, block_at) {
            (Some(l), None) => {
                out.push_str(&rest[..l]);
                return out;
            }
            (Some(l), Some(b)) if l < b => {
                out.push_str(&rest[..l]);
                return out;
            }
            (_, Some(b)) => {
                out.push_str(&rest[..b]);
                rest = &rest[b + 2..];
                *in_block = true;
            }
            (None, None) => {
                out.push_str(rest);
                return out;
            }
        }
    }
}
