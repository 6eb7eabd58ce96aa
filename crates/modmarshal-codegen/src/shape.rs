//! Structural shapes.
//!
//! The walker reduces resolved types to this closed set of forms, which is
//! all the synthesizer understands. Shapes live in an arena and reference
//! each other by id, so a self-referential named type is just a node whose
//! subtree points back at its own id.

use modmarshal_types::BasicKind;

/// Index of a shape in a [`ShapeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(u32);

impl ShapeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Placeholder for a named type still being classified. None remain
    /// once classification finishes.
    Pending,
    /// A type this pipeline cannot encode (interfaces, channels, functions,
    /// uintptr). Reaching one during synthesis fails the run.
    Unsupported,
    Primitive(BasicKind),
    Array { len: u64, elem: ShapeId },
    Slice { elem: ShapeId },
    Map { key: ShapeId, value: ShapeId },
    Pointer { elem: ShapeId },
    Struct { fields: Vec<FieldShape> },
    Named(NamedShape),
}

/// An exported struct field, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldShape {
    pub name: String,
    pub shape: ShapeId,
}

/// A user-declared type name wrapping an inner shape.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedShape {
    pub package_path: String,
    pub package_name: String,
    pub name: String,
    pub exported: bool,
    pub inner: ShapeId,
    pub implements: Implemented,
}

/// Which target capabilities a named type's existing method set already
/// provides. A set flag suppresses regenerating that wrapper method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Implemented {
    pub append: bool,
    pub marshal: bool,
    pub write: bool,
    pub unmarshal: bool,
    pub read: bool,
}

/// Arena holding every shape classified during one run.
#[derive(Debug, Default)]
pub struct ShapeArena {
    shapes: Vec<Shape>,
}

impl ShapeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, shape: Shape) -> ShapeId {
        let id = ShapeId(self.shapes.len() as u32);
        self.shapes.push(shape);
        id
    }

    /// Reserve a slot for a named type whose shape is not yet known.
    pub fn reserve(&mut self) -> ShapeId {
        self.insert(Shape::Pending)
    }

    pub fn fill(&mut self, id: ShapeId, shape: Shape) {
        self.shapes[id.index()] = shape;
    }

    pub fn get(&self, id: ShapeId) -> &Shape {
        &self.shapes[id.index()]
    }
}
