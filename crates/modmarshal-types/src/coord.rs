use serde::{Deserialize, Serialize};

/// Where to fetch a dependency's source from.
///
/// `base` is either a literal filesystem path (local module root or a
/// directory-form replacement) or a module path to be fetched from the
/// cache/proxy. An empty `version` always denotes a directory-backed source.
/// Never mutated after construction; equality is field-wise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyCoordinate {
    pub base: String,
    pub version: String,
    pub sub_path: String,
}

impl DependencyCoordinate {
    pub fn local(base: impl Into<String>, sub_path: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            version: String::new(),
            sub_path: sub_path.into(),
        }
    }

    pub fn remote(
        base: impl Into<String>,
        version: impl Into<String>,
        sub_path: impl Into<String>,
    ) -> Self {
        Self {
            base: base.into(),
            version: version.into(),
            sub_path: sub_path.into(),
        }
    }

    /// Directory-backed sources are exactly those without a version.
    pub fn is_directory(&self) -> bool {
        self.version.is_empty()
    }
}
