//! Symbol-table model for modmarshal.
//!
//! A type-checking service (external to this workspace, see the
//! `Typechecker` trait in `modmarshal-resolver`) produces a [`TypeTable`]:
//! an arena of resolved types plus the packages whose scopes name them.
//! Arena ids instead of references keep self-referential types representable
//! and make the whole table serde-serializable, so out-of-process checkers
//! can hand symbol tables over as JSON.

mod coord;
mod package;
mod table;
mod types;

pub use coord::DependencyCoordinate;
pub use package::{Package, ScopeEntry};
pub use table::{PackageId, TypeId, TypeTable};
pub use types::{BasicKind, Field, MethodSig, NamedType, Type};

use thiserror::Error;

/// Lookup failures against a [`TypeTable`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymbolError {
    #[error("package not found: {0}")]
    PackageNotFound(String),

    #[error("typename not found: {0}")]
    NotFound(String),

    #[error("identifier is not a named type: {0}")]
    NotAType(String),
}
