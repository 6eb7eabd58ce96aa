use serde::{Deserialize, Serialize};

use crate::table::TypeId;

/// A resolved type.
///
/// Composite variants reference their element types by [`TypeId`] so that
/// self-referential declarations (a struct holding a pointer back to itself)
/// stay representable without reference cycles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    Basic(BasicKind),
    Array { len: u64, elem: TypeId },
    Slice { elem: TypeId },
    Map { key: TypeId, value: TypeId },
    Pointer { elem: TypeId },
    Struct { fields: Vec<Field> },
    Named(NamedType),
    /// A type the checker could resolve but this pipeline cannot classify
    /// (interfaces, channels, functions). Kept so scopes stay complete.
    Unsupported,
}

/// A struct field, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
    /// Raw struct tag, empty when absent.
    #[serde(default)]
    pub tag: String,
}

impl Field {
    /// Whether the field is visible outside its declaring package.
    pub fn is_exported(&self) -> bool {
        exported(&self.name)
    }
}

/// A user-declared type name wrapping an underlying type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedType {
    /// Import path of the declaring package.
    pub package_path: String,
    /// Short name of the declaring package, used to spell qualified idents.
    pub package_name: String,
    pub name: String,
    pub underlying: TypeId,
    /// Declared method set, signatures as plain type strings.
    #[serde(default)]
    pub methods: Vec<MethodSig>,
    /// Number of type parameters; non-zero marks a generic declaration.
    #[serde(default)]
    pub type_params: u16,
}

impl NamedType {
    pub fn is_exported(&self) -> bool {
        exported(&self.name)
    }

    /// Whether the method set contains an exact match for `sig`
    /// (name plus parameter and result type strings).
    pub fn implements(&self, sig: &MethodSig) -> bool {
        self.methods.iter().any(|m| {
            m.name == sig.name && m.params == sig.params && m.results == sig.results
        })
    }
}

/// A method signature, with parameter and result types rendered as the
/// checker's canonical type strings (e.g. `"[]byte"`, `"io.Writer"`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MethodSig {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub results: Vec<String>,
}

impl MethodSig {
    pub fn new(name: &str, params: &[&str], results: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            params: params.iter().map(|s| s.to_string()).collect(),
            results: results.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Primitive kinds, widths fixed at classification time.
///
/// `Int`/`Uint` are the language's native-width integers and travel as 64
/// bits on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
}

impl BasicKind {
    /// The Go spelling of the kind.
    pub fn go_name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
        }
    }
}

/// Exported-identifier test: an ASCII uppercase first letter.
pub(crate) fn exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}
