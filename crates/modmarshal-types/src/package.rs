use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::table::TypeId;

/// A type-checked package: import path, short name, and the package-level
/// scope. Scope entries for constants, variables and functions are kept as
/// [`ScopeEntry::Value`] so lookups can distinguish "absent" from "present
/// but not a type".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub scope: BTreeMap<String, ScopeEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeEntry {
    Type(TypeId),
    Value,
}

impl Package {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            scope: BTreeMap::new(),
        }
    }

    pub fn define_type(&mut self, name: impl Into<String>, id: TypeId) {
        self.scope.insert(name.into(), ScopeEntry::Type(id));
    }
}
