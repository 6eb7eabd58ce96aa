//! Module-aware package resolution.
//!
//! Turns a dotted import path into a type-checked package: the manifest of
//! the enclosing module decides where each import lives (the module itself,
//! a declared dependency, or the standard library), `modmarshal-source`
//! materializes the dependency's files, and a pluggable [`Typechecker`]
//! converts those files into [`modmarshal_types::TypeTable`] entries. Import
//! paths are resolved at most once per [`TypeLoader`].

mod check;
mod error;
mod files;
mod import;
mod loader;
mod manifest;

pub use check::{Importer, SourceFile, Typechecker};
pub use error::{LoadError, ManifestError};
pub use files::FileFilter;
pub use import::ImportResolver;
pub use loader::{Module, TypeLoader};
pub use manifest::{Dependency, ModuleManifest};
