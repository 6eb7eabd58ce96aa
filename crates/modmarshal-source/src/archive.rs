//! Archive-backed virtual source.
//!
//! Module zips published to the proxy nest every file under a
//! `<base>@<version>/` prefix; a [`ZipSource`] is scoped to such a prefix
//! and synthesizes directory entries from member-name prefixes, since zip
//! archives need not carry explicit directory records.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek};

use parking_lot::Mutex;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::vfs::{DirEntry, VirtualSource};
use crate::SourceError;

/// [`VirtualSource`] over a zip archive, scoped to a member-name prefix.
pub struct ZipSource<R: Read + Seek> {
    archive: Mutex<ZipArchive<R>>,
    /// Member names, captured once; lookups and listings scan this instead
    /// of locking the archive.
    names: Vec<String>,
    base: String,
}

impl<R: Read + Seek> ZipSource<R> {
    /// Open `reader` as a zip archive scoped under `base` (no trailing
    /// slash). Reads the central directory eagerly; for a ranged HTTP
    /// reader that is the only part of the payload touched.
    pub fn new(reader: R, base: impl Into<String>) -> Result<Self, SourceError> {
        let archive = ZipArchive::new(reader).map_err(zip_error)?;
        let names = archive.file_names().map(str::to_string).collect();

        Ok(Self {
            archive: Mutex::new(archive),
            names,
            base: base.into(),
        })
    }

    fn member(&self, path: &str) -> String {
        if path == "." {
            self.base.clone()
        } else {
            format!("{}/{}", self.base, path)
        }
    }
}

impl<R: Read + Seek> VirtualSource for ZipSource<R> {
    fn open(&self, path: &str) -> Result<Box<dyn Read + '_>, SourceError> {
        Ok(Box::new(Cursor::new(self.read_file(path)?)))
    }

    fn is_dir(&self, path: &str) -> bool {
        let member = self.member(path);
        let with_slash = format!("{member}/");

        for name in &self.names {
            if *name == member {
                return false;
            } else if name.starts_with(&with_slash) {
                return true;
            }
        }

        false
    }

    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>, SourceError> {
        let prefix = format!("{}/", self.member(path));

        // Children are deduplicated by their first path segment after the
        // prefix; a segment is a directory iff some member continues past it.
        let mut children: BTreeMap<&str, bool> = BTreeMap::new();

        for name in &self.names {
            let Some(rest) = name.strip_prefix(&prefix) else {
                continue;
            };

            if rest.is_empty() {
                continue;
            }

            let (segment, remainder) = match rest.find('/') {
                Some(n) => (&rest[..n], &rest[n + 1..]),
                None => (rest, ""),
            };

            if segment.is_empty() {
                continue;
            }

            let is_dir = !remainder.is_empty() || rest.ends_with('/');
            *children.entry(segment).or_insert(false) |= is_dir;
        }

        if children.is_empty() && !self.is_dir(path) && path != "." {
            return Err(SourceError::NotFound(path.to_string()));
        }

        Ok(children
            .into_iter()
            .map(|(name, is_dir)| DirEntry {
                name: name.to_string(),
                is_dir,
            })
            .collect())
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, SourceError> {
        let member = self.member(path);
        let mut archive = self.archive.lock();

        let mut file = archive.by_name(&member).map_err(|e| match e {
            ZipError::FileNotFound => SourceError::NotFound(path.to_string()),
            other => zip_error(other),
        })?;

        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;

        Ok(bytes)
    }
}

fn zip_error(e: ZipError) -> SourceError {
    match e {
        ZipError::Io(io) => SourceError::Io(io),
        other => SourceError::Archive(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn sample_archive() -> ZipSource<Cursor<Vec<u8>>> {
        let mut w = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = FileOptions::default();

        for (name, body) in [
            ("mod@v1.0.0/go.mod", "module example.com/mod\n"),
            ("mod@v1.0.0/a.go", "package mod\n"),
            ("mod@v1.0.0/inner/b.go", "package inner\n"),
            ("mod@v1.0.0/inner/deep/c.go", "package deep\n"),
            ("other@v9.9.9/x.go", "package other\n"),
        ] {
            w.start_file(name, opts).unwrap();
            w.write_all(body.as_bytes()).unwrap();
        }

        let cursor = w.finish().unwrap();

        ZipSource::new(cursor, "mod@v1.0.0").unwrap()
    }

    #[test]
    fn lists_root_without_duplicates_or_foreign_members() {
        let src = sample_archive();

        let entries = src.read_dir(".").unwrap();
        assert_eq!(
            entries,
            vec![
                DirEntry { name: "a.go".into(), is_dir: false },
                DirEntry { name: "go.mod".into(), is_dir: false },
                DirEntry { name: "inner".into(), is_dir: true },
            ]
        );
    }

    #[test]
    fn synthesizes_nested_directories() {
        let src = sample_archive();

        assert!(src.is_dir("inner"));
        assert!(src.is_dir("inner/deep"));
        assert!(!src.is_dir("a.go"));
        assert!(!src.is_dir("missing"));

        let entries = src.read_dir("inner").unwrap();
        assert_eq!(
            entries,
            vec![
                DirEntry { name: "b.go".into(), is_dir: false },
                DirEntry { name: "deep".into(), is_dir: true },
            ]
        );
    }

    #[test]
    fn reads_members_under_prefix() {
        let src = sample_archive();

        assert_eq!(src.read_file("inner/b.go").unwrap(), b"package inner\n");
        assert!(matches!(
            src.read_file("x.go").unwrap_err(),
            SourceError::NotFound(_)
        ));
    }
}
