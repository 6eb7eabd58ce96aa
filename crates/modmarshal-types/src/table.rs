use serde::{Deserialize, Serialize};

use crate::package::{Package, ScopeEntry};
use crate::types::{NamedType, Type};
use crate::SymbolError;

/// Index of a type node in a [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(u32);

impl TypeId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a package in a [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(u32);

impl PackageId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena of resolved types and packages for one resolution run.
///
/// Checkers building cyclic types reserve a slot with [`TypeTable::reserve`]
/// and backfill it once the underlying type is known.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TypeTable {
    types: Vec<Type>,
    packages: Vec<Package>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Reserve a slot for a type that is still being constructed.
    pub fn reserve(&mut self) -> TypeId {
        self.insert(Type::Unsupported)
    }

    /// Backfill a reserved slot.
    pub fn fill(&mut self, id: TypeId, ty: Type) {
        self.types[id.index()] = ty;
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    pub fn add_package(&mut self, pkg: Package) -> PackageId {
        let id = PackageId(self.packages.len() as u32);
        self.packages.push(pkg);
        id
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.index()]
    }

    pub fn package_mut(&mut self, id: PackageId) -> &mut Package {
        &mut self.packages[id.index()]
    }

    pub fn find_package(&self, path: &str) -> Option<PackageId> {
        self.packages
            .iter()
            .position(|p| p.path == path)
            .map(|n| PackageId(n as u32))
    }

    /// Resolve `name` in `pkg`'s scope to a named type declaration.
    ///
    /// Fails with [`SymbolError::NotFound`] when the scope has no such
    /// identifier and [`SymbolError::NotAType`] when it names a value or a
    /// non-named type.
    pub fn lookup_named(&self, pkg: PackageId, name: &str) -> Result<(TypeId, &NamedType), SymbolError> {
        let entry = self
            .package(pkg)
            .scope
            .get(name)
            .ok_or_else(|| SymbolError::NotFound(name.to_string()))?;

        let id = match entry {
            ScopeEntry::Type(id) => *id,
            ScopeEntry::Value => return Err(SymbolError::NotAType(name.to_string())),
        };

        match self.get(id) {
            Type::Named(named) => Ok((id, named)),
            _ => Err(SymbolError::NotAType(name.to_string())),
        }
    }
}
