//! Type-graph classification.

use std::collections::HashMap;

use tracing::trace;

use modmarshal_types::{BasicKind, MethodSig, Type, TypeId, TypeTable};

use crate::options::{GenOptions, Role, ROLES};
use crate::shape::{FieldShape, Implemented, NamedShape, Shape, ShapeArena, ShapeId};
use crate::GenError;

/// Classifies resolved types into structural shapes, one visitation per
/// named type.
///
/// Cycles are broken with a reserve-then-backfill scheme: a named type
/// registers a placeholder slot before its underlying type is classified,
/// so any recursive reference lands on the slot's id instead of recursing
/// forever. The slot is filled once the subtree completes.
pub struct Walker<'t> {
    table: &'t TypeTable,
    arena: ShapeArena,
    visited: HashMap<TypeId, ShapeId>,
    capabilities: Vec<(Role, MethodSig)>,
}

impl<'t> Walker<'t> {
    pub fn new(table: &'t TypeTable, options: &GenOptions) -> Self {
        let capabilities = ROLES
            .iter()
            .filter_map(|&role| options.capability_sig(role).map(|sig| (role, sig)))
            .collect();

        Self {
            table,
            arena: ShapeArena::new(),
            visited: HashMap::new(),
            capabilities,
        }
    }

    pub fn into_arena(self) -> ShapeArena {
        self.arena
    }

    pub fn classify(&mut self, id: TypeId) -> Result<ShapeId, GenError> {
        let table = self.table;

        let shape = match table.get(id) {
            Type::Named(named) => {
                if let Some(&sid) = self.visited.get(&id) {
                    return Ok(sid);
                }

                if named.type_params > 0 {
                    return Err(GenError::UnsupportedGenericType(format!(
                        "{}.{}",
                        named.package_path, named.name
                    )));
                }

                trace!(name = %named.name, package = %named.package_path, "classifying named type");

                let sid = self.arena.reserve();
                self.visited.insert(id, sid);

                let inner = self.classify(named.underlying)?;

                self.arena.fill(
                    sid,
                    Shape::Named(NamedShape {
                        package_path: named.package_path.clone(),
                        package_name: named.package_name.clone(),
                        name: named.name.clone(),
                        exported: named.is_exported(),
                        inner,
                        implements: self.implemented(named),
                    }),
                );

                return Ok(sid);
            }
            Type::Basic(BasicKind::Uintptr) => Shape::Unsupported,
            Type::Basic(kind) => Shape::Primitive(*kind),
            Type::Array { len, elem } => Shape::Array {
                len: *len,
                elem: self.classify(*elem)?,
            },
            Type::Slice { elem } => Shape::Slice {
                elem: self.classify(*elem)?,
            },
            Type::Map { key, value } => Shape::Map {
                key: self.classify(*key)?,
                value: self.classify(*value)?,
            },
            Type::Pointer { elem } => Shape::Pointer {
                elem: self.classify(*elem)?,
            },
            Type::Struct { fields } => {
                // Unexported fields cannot be reconstructed from outside
                // their declaring package; they are dropped here and never
                // reach the synthesizer.
                let mut shaped = Vec::new();

                for field in fields.iter().filter(|f| f.is_exported()) {
                    shaped.push(FieldShape {
                        name: field.name.clone(),
                        shape: self.classify(field.ty)?,
                    });
                }

                Shape::Struct { fields: shaped }
            }
            Type::Unsupported => Shape::Unsupported,
        };

        Ok(self.arena.insert(shape))
    }

    fn implemented(&self, named: &modmarshal_types::NamedType) -> Implemented {
        let mut flags = Implemented::default();

        for (role, sig) in &self.capabilities {
            if named.implements(sig) {
                match role {
                    Role::Append => flags.append = true,
                    Role::Marshal => flags.marshal = true,
                    Role::Write => flags.write = true,
                    Role::Unmarshal => flags.unmarshal = true,
                    Role::Read => flags.read = true,
                }
            }
        }

        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modmarshal_types::{Field, NamedType};

    fn named(table: &mut TypeTable, name: &str, underlying: TypeId) -> TypeId {
        table.insert(Type::Named(NamedType {
            package_path: "example.com/m".into(),
            package_name: "m".into(),
            name: name.into(),
            underlying,
            methods: Vec::new(),
            type_params: 0,
        }))
    }

    #[test]
    fn classifies_composites() {
        let mut table = TypeTable::new();
        let int32 = table.insert(Type::Basic(BasicKind::Int32));
        let slice = table.insert(Type::Slice { elem: int32 });
        let strukt = table.insert(Type::Struct {
            fields: vec![
                Field { name: "Values".into(), ty: slice, tag: String::new() },
                Field { name: "hidden".into(), ty: int32, tag: String::new() },
            ],
        });
        let id = named(&mut table, "T", strukt);

        let mut walker = Walker::new(&table, &GenOptions::default());
        let sid = walker.classify(id).unwrap();
        let arena = walker.into_arena();

        let Shape::Named(n) = arena.get(sid) else {
            panic!("expected a named shape");
        };
        let Shape::Struct { fields } = arena.get(n.inner) else {
            panic!("expected a struct shape");
        };

        // The unexported field is gone.
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "Values");
        assert!(matches!(arena.get(fields[0].shape), Shape::Slice { .. }));
    }

    #[test]
    fn self_reference_lands_on_the_same_slot() {
        let mut table = TypeTable::new();
        let slot = table.reserve();
        let node = table.insert(Type::Named(NamedType {
            package_path: "example.com/m".into(),
            package_name: "m".into(),
            name: "Node".into(),
            underlying: slot,
            methods: Vec::new(),
            type_params: 0,
        }));
        let ptr = table.insert(Type::Pointer { elem: node });
        table.fill(
            slot,
            Type::Struct {
                fields: vec![Field { name: "Next".into(), ty: ptr, tag: String::new() }],
            },
        );

        let mut walker = Walker::new(&table, &GenOptions::default());
        let sid = walker.classify(node).unwrap();
        let arena = walker.into_arena();

        let Shape::Named(n) = arena.get(sid) else {
            panic!("expected a named shape");
        };
        let Shape::Struct { fields } = arena.get(n.inner) else {
            panic!("expected a struct shape");
        };
        let Shape::Pointer { elem } = arena.get(fields[0].shape) else {
            panic!("expected a pointer shape");
        };

        assert_eq!(*elem, sid);
    }

    #[test]
    fn generic_types_are_rejected() {
        let mut table = TypeTable::new();
        let int32 = table.insert(Type::Basic(BasicKind::Int32));
        let id = table.insert(Type::Named(NamedType {
            package_path: "example.com/m".into(),
            package_name: "m".into(),
            name: "Box".into(),
            underlying: int32,
            methods: Vec::new(),
            type_params: 1,
        }));

        let mut walker = Walker::new(&table, &GenOptions::default());
        assert!(matches!(
            walker.classify(id),
            Err(GenError::UnsupportedGenericType(name)) if name == "example.com/m.Box"
        ));
    }

    #[test]
    fn existing_capabilities_are_detected() {
        let mut table = TypeTable::new();
        let int32 = table.insert(Type::Basic(BasicKind::Int32));
        let id = table.insert(Type::Named(NamedType {
            package_path: "example.com/m".into(),
            package_name: "m".into(),
            name: "T".into(),
            underlying: int32,
            methods: vec![
                MethodSig::new("MarshalBinary", &[], &["[]byte", "error"]),
                // Wrong signature for the unmarshal role.
                MethodSig::new("UnmarshalBinary", &["[]byte", "int"], &["error"]),
            ],
            type_params: 0,
        }));

        let mut walker = Walker::new(&table, &GenOptions::default());
        let sid = walker.classify(id).unwrap();
        let arena = walker.into_arena();

        let Shape::Named(n) = arena.get(sid) else {
            panic!("expected a named shape");
        };
        assert!(n.implements.marshal);
        assert!(!n.implements.unmarshal);
        assert!(!n.implements.write);
    }

    #[test]
    fn uintptr_is_unsupported() {
        let mut table = TypeTable::new();
        let id = table.insert(Type::Basic(BasicKind::Uintptr));

        let mut walker = Walker::new(&table, &GenOptions::default());
        let sid = walker.classify(id).unwrap();
        assert!(matches!(walker.into_arena().get(sid), Shape::Unsupported));
    }
}
