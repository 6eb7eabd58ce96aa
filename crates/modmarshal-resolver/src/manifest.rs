//! Module manifest (`go.mod` subset) parsing.
//!
//! Only the directives that matter for source resolution are interpreted:
//! `module`, `require` and `replace`. `go`, `toolchain`, `exclude` and
//! `retract` are recognized and skipped. The parsed manifest exposes a
//! single effective dependency mapping with all replacements applied.

use std::collections::BTreeMap;

use modmarshal_source::is_directory_path;

use crate::ManifestError;

/// Effective target of one dependency path: either a versioned module
/// (fetched through the cache/proxy) or, when `version` is empty, a
/// directory relative to the declaring module's root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub base: String,
    pub version: String,
}

/// A parsed manifest: the module's identity plus its resolvable
/// dependencies. Immutable once parsed.
#[derive(Debug, Clone, Default)]
pub struct ModuleManifest {
    identity: String,
    deps: BTreeMap<String, Dependency>,
}

#[derive(Debug)]
struct Rewrite {
    old_path: String,
    old_version: Option<String>,
    new_base: String,
    new_version: String,
}

#[derive(Clone, Copy, PartialEq)]
enum Block {
    None,
    Require,
    Replace,
    Skip,
}

impl ModuleManifest {
    pub fn parse(bytes: &[u8]) -> Result<Self, ManifestError> {
        let text = String::from_utf8_lossy(bytes);

        let mut identity = String::new();
        let mut deps = BTreeMap::new();
        let mut rewrites = Vec::new();
        let mut block = Block::None;

        for (n, raw) in text.lines().enumerate() {
            let line = n + 1;
            let content = match raw.find("//") {
                Some(at) => &raw[..at],
                None => raw,
            };
            let content = content.trim();

            if content.is_empty() {
                continue;
            }

            if block != Block::None {
                if content == ")" {
                    block = Block::None;
                    continue;
                }

                match block {
                    Block::Require => parse_require(content, line, &mut deps)?,
                    Block::Replace => rewrites.push(parse_rewrite(content, line)?),
                    Block::Skip => {}
                    Block::None => unreachable!(),
                }
                continue;
            }

            let (directive, rest) = match content.split_once(char::is_whitespace) {
                Some((d, r)) => (d, r.trim()),
                None => (content, ""),
            };

            match directive {
                "module" => {
                    if rest.is_empty() || rest.contains(char::is_whitespace) {
                        return Err(malformed(line, "module directive needs one path"));
                    }
                    identity = rest.to_string();
                }
                "go" | "toolchain" => {}
                "require" if rest == "(" => block = Block::Require,
                "require" => parse_require(rest, line, &mut deps)?,
                "replace" if rest == "(" => block = Block::Replace,
                "replace" => rewrites.push(parse_rewrite(rest, line)?),
                "exclude" | "retract" if rest == "(" => block = Block::Skip,
                "exclude" | "retract" => {}
                other => {
                    return Err(malformed(line, format!("unknown directive {other:?}")));
                }
            }
        }

        if identity.is_empty() {
            return Err(malformed(0, "missing module directive"));
        }

        for rw in rewrites {
            // An unversioned rewrite applies unconditionally, making the
            // path resolvable even when it was never required. A versioned
            // one applies only when the required version matches exactly.
            let applies = match &rw.old_version {
                None => true,
                Some(v) => deps.get(&rw.old_path).is_some_and(|d| d.version == *v),
            };

            if applies {
                deps.insert(
                    rw.old_path,
                    Dependency {
                        base: rw.new_base,
                        version: rw.new_version,
                    },
                );
            }
        }

        Ok(Self { identity, deps })
    }

    /// The module's own canonical import path.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Dependency path → effective target, replacements applied.
    pub fn dependencies(&self) -> &BTreeMap<String, Dependency> {
        &self.deps
    }
}

fn parse_require(
    content: &str,
    line: usize,
    deps: &mut BTreeMap<String, Dependency>,
) -> Result<(), ManifestError> {
    let tokens: Vec<&str> = content.split_whitespace().collect();

    match tokens.as_slice() {
        [path, version] => {
            deps.insert(
                (*path).to_string(),
                Dependency {
                    base: (*path).to_string(),
                    version: (*version).to_string(),
                },
            );
            Ok(())
        }
        _ => Err(malformed(line, "require needs a path and a version")),
    }
}

fn parse_rewrite(content: &str, line: usize) -> Result<Rewrite, ManifestError> {
    let tokens: Vec<&str> = content.split_whitespace().collect();
    let arrow = tokens
        .iter()
        .position(|t| *t == "=>")
        .ok_or_else(|| malformed(line, "replace needs \"=>\""))?;

    let (old_path, old_version) = match &tokens[..arrow] {
        [path] => ((*path).to_string(), None),
        [path, version] => ((*path).to_string(), Some((*version).to_string())),
        _ => return Err(malformed(line, "replace needs an old path")),
    };

    let (new_base, new_version) = match &tokens[arrow + 1..] {
        [base, version] => ((*base).to_string(), (*version).to_string()),
        [base] if is_directory_path(base) => ((*base).to_string(), String::new()),
        [_] => {
            return Err(malformed(
                line,
                "replacement module path needs a version",
            ))
        }
        _ => return Err(malformed(line, "replace needs a new path")),
    };

    Ok(Rewrite {
        old_path,
        old_version,
        new_base,
        new_version,
    })
}

fn malformed(line: usize, reason: impl Into<String>) -> ManifestError {
    ManifestError::Malformed {
        line,
        reason: reason.into(),
    }
}
