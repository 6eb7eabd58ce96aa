//! Type-graph code generation.
//!
//! Walks the structural shape of resolved types and synthesizes cycle-safe
//! binary encode/decode methods for them, emitted as one Go source file per
//! run. Generation is all-or-nothing: any classification or synthesis
//! failure aborts the run before any output text is produced.

mod error;
mod options;
mod output;
mod shape;
mod synth;
mod walk;

pub use error::GenError;
pub use options::{GenOptions, Role};
pub use shape::{FieldShape, Implemented, NamedShape, Shape, ShapeArena, ShapeId};
pub use synth::{GenOutput, GeneratedMethodSet, HelperFlags};
pub use walk::Walker;

use modmarshal_types::{PackageId, TypeTable};

/// Generate methods for `type_names`, all declared in `package`, into a
/// single source file for that package.
///
/// `invocation` is recorded verbatim in the file's `//go:generate` header
/// so the output documents how to reproduce itself.
pub fn generate(
    table: &TypeTable,
    package: PackageId,
    type_names: &[String],
    options: &GenOptions,
    invocation: &[String],
) -> Result<GenOutput, GenError> {
    let mut walker = Walker::new(table, options);
    let mut roots = Vec::new();

    for name in type_names {
        let (id, _) = table.lookup_named(package, name)?;
        roots.push((name.clone(), walker.classify(id)?));
    }

    let arena = walker.into_arena();
    let pkg = table.package(package);

    synth::generate(&arena, options, &pkg.path, &pkg.name, &roots, invocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modmarshal_types::{BasicKind, Field, NamedType, Package, Type, TypeId};

    struct Builder {
        table: TypeTable,
        pkg: Package,
    }

    impl Builder {
        fn new() -> Self {
            Self {
                table: TypeTable::new(),
                pkg: Package::new("example.com/demo", "demo"),
            }
        }

        fn basic(&mut self, kind: BasicKind) -> TypeId {
            self.table.insert(Type::Basic(kind))
        }

        fn field(&mut self, name: &str, ty: TypeId) -> Field {
            Field {
                name: name.to_string(),
                ty,
                tag: String::new(),
            }
        }

        fn named(&mut self, name: &str, underlying: TypeId) -> TypeId {
            let id = self.table.insert(Type::Named(NamedType {
                package_path: "example.com/demo".into(),
                package_name: "demo".into(),
                name: name.into(),
                underlying,
                methods: Vec::new(),
                type_params: 0,
            }));
            self.pkg.define_type(name, id);
            id
        }

        fn finish(self) -> (TypeTable, PackageId) {
            let mut table = self.table;
            let id = table.add_package(self.pkg);
            (table, id)
        }
    }

    fn run(b: Builder, names: &[&str], options: &GenOptions) -> Result<GenOutput, GenError> {
        let (table, pkg) = b.finish();
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();

        generate(&table, pkg, &names, options, &["gen".to_string()])
    }

    #[test]
    fn generates_wrappers_and_routines_for_a_flat_struct() {
        let mut b = Builder::new();
        let int32 = b.basic(BasicKind::Int32);
        let fields = vec![b.field("X", int32), b.field("Y", int32)];
        let strukt = b.table.insert(Type::Struct { fields });
        b.named("Point", strukt);

        let out = run(b, &["Point"], &GenOptions::default()).unwrap();

        assert!(out.source.contains("func (v *Point) MarshalBinary() ([]byte, error) {"));
        assert!(out.source.contains("func (v *Point) UnmarshalBinary(data []byte) error {"));
        assert!(out.source.contains("func (v *Point) WriteTo(w io.Writer) (int64, error) {"));
        assert!(out
            .source
            .contains("func _marshal_Point(w *byteio.StickyLittleEndianWriter, v *Point) {"));
        assert!(out.source.contains("w.WriteInt32(int32((*v).X))"));
        assert!(out.source.contains("(*v).Y = int32(r.ReadInt32())"));

        assert_eq!(out.helpers, HelperFlags::default());
        assert_eq!(out.methods.len(), 1);
        assert_eq!(out.methods[0].encode_routine.as_deref(), Some("_marshal_Point"));
        assert_eq!(out.methods[0].decode_routine.as_deref(), Some("_unmarshal_Point"));
    }

    #[test]
    fn standard_names_document_their_interfaces() {
        let mut b = Builder::new();
        let int32 = b.basic(BasicKind::Int32);
        let fields = vec![b.field("X", int32)];
        let strukt = b.table.insert(Type::Struct { fields });
        b.named("Point", strukt);

        let out = run(b, &["Point"], &GenOptions::default()).unwrap();

        assert!(out
            .source
            .contains("// MarshalBinary implements the encoding.BinaryMarshaler interface.\nfunc (v *Point) MarshalBinary"));
        assert!(out
            .source
            .contains("// WriteTo implements the io.WriterTo interface.\nfunc (v *Point) WriteTo"));
        assert!(out
            .source
            .contains("// ReadFrom implements the io.ReaderFrom interface.\nfunc (v *Point) ReadFrom"));
    }

    #[test]
    fn custom_names_get_descriptive_docs() {
        let mut b = Builder::new();
        let int32 = b.basic(BasicKind::Int32);
        let fields = vec![b.field("X", int32)];
        let strukt = b.table.insert(Type::Struct { fields });
        b.named("Point", strukt);

        let options = GenOptions {
            write: Some("Emit".to_string()),
            unmarshal: Some("Decode".to_string()),
            ..GenOptions::default()
        };
        let out = run(b, &["Point"], &options).unwrap();

        assert!(out
            .source
            .contains("// Emit writes data to w until the type is fully encoded.\n"));
        assert!(out
            .source
            .contains("// Decode decodes the receiver from the binary form.\nfunc (v *Point) Decode"));
        assert!(!out.source.contains("io.WriterTo interface"));
    }

    #[test]
    fn writer_to_implementers_keep_their_method() {
        let mut b = Builder::new();
        let int32 = b.basic(BasicKind::Int32);
        let fields = vec![b.field("X", int32)];
        let strukt = b.table.insert(Type::Struct { fields });
        let id = b.table.insert(Type::Named(NamedType {
            package_path: "example.com/demo".into(),
            package_name: "demo".into(),
            name: "Streamed".into(),
            underlying: strukt,
            methods: vec![modmarshal_types::MethodSig::new(
                "WriteTo",
                &["io.Writer"],
                &["int64", "error"],
            )],
            type_params: 0,
        }));
        b.pkg.define_type("Streamed", id);

        let out = run(b, &["Streamed"], &GenOptions::default()).unwrap();

        assert!(!out.source.contains("func (v *Streamed) WriteTo"));
        assert!(out.source.contains("func (v *Streamed) ReadFrom"));
    }

    #[test]
    fn native_int_travels_as_64_bits() {
        let mut b = Builder::new();
        let int = b.basic(BasicKind::Int);
        let fields = vec![b.field("N", int)];
        let strukt = b.table.insert(Type::Struct { fields });
        b.named("Counter", strukt);

        let out = run(b, &["Counter"], &GenOptions::default()).unwrap();

        assert!(out.source.contains("w.WriteInt64(int64((*v).N))"));
        assert!(out.source.contains("(*v).N = int(r.ReadInt64())"));
    }

    #[test]
    fn named_primitive_decodes_through_its_own_name() {
        let mut b = Builder::new();
        let uint8 = b.basic(BasicKind::Uint8);
        b.named("Flag", uint8);

        let out = run(b, &["Flag"], &GenOptions::default()).unwrap();

        assert!(out.source.contains("w.WriteUint8(uint8((*v)))"));
        assert!(out.source.contains("(*v) = Flag(r.ReadUint8())"));
    }

    #[test]
    fn self_referential_struct_generates_a_flat_recursive_pair() {
        let mut b = Builder::new();
        let int64 = b.basic(BasicKind::Int64);
        let slot = b.table.reserve();
        let node = b.table.insert(Type::Named(NamedType {
            package_path: "example.com/demo".into(),
            package_name: "demo".into(),
            name: "Node".into(),
            underlying: slot,
            methods: Vec::new(),
            type_params: 0,
        }));
        b.pkg.define_type("Node", node);
        let ptr = b.table.insert(Type::Pointer { elem: node });
        let fields = vec![b.field("Value", int64), b.field("Next", ptr)];
        b.table.fill(slot, Type::Struct { fields });

        let out = run(b, &["Node"], &GenOptions::default()).unwrap();

        // One routine each, mutually recursive through calls.
        assert_eq!(out.source.matches("func _marshal_Node(").count(), 1);
        assert_eq!(out.source.matches("func _unmarshal_Node(").count(), 1);
        assert!(out.source.contains("(*v).Next = new(Node)"));
        assert!(out.source.contains("_unmarshal_Node(r, &(*(*v).Next))"));
        assert!(out.source.contains("_marshal_Node(w, &(*(*v).Next))"));
    }

    #[test]
    fn sequences_and_maps_are_count_prefixed() {
        let mut b = Builder::new();
        let str_ty = b.basic(BasicKind::String);
        let f64 = b.basic(BasicKind::Float64);
        let slice = b.table.insert(Type::Slice { elem: f64 });
        let map = b.table.insert(Type::Map { key: str_ty, value: f64 });
        let fields = vec![b.field("Samples", slice), b.field("Stats", map)];
        let strukt = b.table.insert(Type::Struct { fields });
        b.named("Report", strukt);

        let out = run(b, &["Report"], &GenOptions::default()).unwrap();

        assert!(out.source.contains("w.WriteUintX(uint64(len((*v).Samples)))"));
        assert!(out.source.contains("(*v).Samples = make([]float64, r.ReadUintX())"));
        assert!(out.source.contains("(*v).Stats = make(map[string]float64, n)"));
        assert!(out.source.contains("var k string"));
        assert!(out.source.contains("(*v).Stats[k] = e"));
        assert_eq!(out.helpers, HelperFlags::default());
    }

    #[test]
    fn fixed_arrays_carry_no_length_prefix() {
        let mut b = Builder::new();
        let u8 = b.basic(BasicKind::Uint8);
        let arr = b.table.insert(Type::Array { len: 16, elem: u8 });
        let fields = vec![b.field("Sum", arr)];
        let strukt = b.table.insert(Type::Struct { fields });
        b.named("Digest", strukt);

        let out = run(b, &["Digest"], &GenOptions::default()).unwrap();
        let marshal_at = out.source.find("func _marshal_Digest").unwrap();
        let body = &out.source[marshal_at..];

        assert!(body.contains("for i := range (*v).Sum {"));
        // No count is written for the array itself.
        assert!(!body[..body.find('}').unwrap()].contains("WriteUintX"));
    }

    #[test]
    fn anonymous_elements_route_through_helpers_emitted_once() {
        let mut b = Builder::new();
        let i32 = b.basic(BasicKind::Int32);
        let inner_a = vec![b.field("N", i32)];
        let anon_a = b.table.insert(Type::Struct { fields: inner_a });
        let inner_b = vec![b.field("M", i32)];
        let anon_b = b.table.insert(Type::Struct { fields: inner_b });
        let slice_a = b.table.insert(Type::Slice { elem: anon_a });
        let slice_b = b.table.insert(Type::Slice { elem: anon_b });
        let fields = vec![b.field("A", slice_a), b.field("B", slice_b)];
        let strukt = b.table.insert(Type::Struct { fields });
        b.named("Batch", strukt);

        let out = run(b, &["Batch"], &GenOptions::default()).unwrap();

        assert!(out.helpers.make_slice);
        assert!(out.source.contains("_make_slice(&(*v).A, r.ReadUintX())"));
        assert!(out.source.contains("_make_slice(&(*v).B, r.ReadUintX())"));
        assert_eq!(out.source.matches("func _make_slice[").count(), 1);
    }

    #[test]
    fn existing_implementations_suppress_their_wrappers() {
        let mut b = Builder::new();
        let i32 = b.basic(BasicKind::Int32);
        let fields = vec![b.field("X", i32)];
        let strukt = b.table.insert(Type::Struct { fields });
        let id = b.table.insert(Type::Named(NamedType {
            package_path: "example.com/demo".into(),
            package_name: "demo".into(),
            name: "Custom".into(),
            underlying: strukt,
            methods: vec![modmarshal_types::MethodSig::new(
                "MarshalBinary",
                &[],
                &["[]byte", "error"],
            )],
            type_params: 0,
        }));
        b.pkg.define_type("Custom", id);

        let out = run(b, &["Custom"], &GenOptions::default()).unwrap();

        assert!(!out.source.contains("func (v *Custom) MarshalBinary"));
        assert!(out.source.contains("func (v *Custom) UnmarshalBinary"));
        // The routine itself is still generated for other shapes to call.
        assert!(out.source.contains("func _marshal_Custom("));
    }

    #[test]
    fn disabled_directions_emit_nothing_for_them() {
        let mut b = Builder::new();
        let i32 = b.basic(BasicKind::Int32);
        let fields = vec![b.field("X", i32)];
        let strukt = b.table.insert(Type::Struct { fields });
        b.named("EncodeOnly", strukt);

        let options = GenOptions {
            unmarshal: None,
            read: None,
            ..GenOptions::default()
        };
        let out = run(b, &["EncodeOnly"], &options).unwrap();

        assert!(out.source.contains("func _marshal_EncodeOnly("));
        assert!(!out.source.contains("_unmarshal_"));
        assert!(out.methods[0].decode_routine.is_none());
    }

    #[test]
    fn unsupported_fields_abort_the_run() {
        let mut b = Builder::new();
        let chan = b.table.insert(Type::Unsupported);
        let fields = vec![b.field("C", chan)];
        let strukt = b.table.insert(Type::Struct { fields });
        b.named("Bad", strukt);

        assert!(matches!(
            run(b, &["Bad"], &GenOptions::default()),
            Err(GenError::UnsupportedShape { type_name, .. }) if type_name == "Bad"
        ));
    }

    #[test]
    fn missing_and_non_type_names_are_reported() {
        let b = Builder::new();
        let err = run(b, &["Nope"], &GenOptions::default()).unwrap_err();

        assert!(matches!(
            err,
            GenError::Symbol(modmarshal_types::SymbolError::NotFound(_))
        ));
    }

    #[test]
    fn complex_numbers_decompose_into_float_pairs() {
        let mut b = Builder::new();
        let c128 = b.basic(BasicKind::Complex128);
        let fields = vec![b.field("Z", c128)];
        let strukt = b.table.insert(Type::Struct { fields });
        b.named("Wave", strukt);

        let out = run(b, &["Wave"], &GenOptions::default()).unwrap();

        assert!(out.source.contains("w.WriteFloat64(float64(real((*v).Z)))"));
        assert!(out.source.contains("w.WriteFloat64(float64(imag((*v).Z)))"));
        assert!(out
            .source
            .contains("(*v).Z = complex128(complex(r.ReadFloat64(), r.ReadFloat64()))"));
    }

    #[test]
    fn pointers_allocate_only_on_a_true_presence_flag() {
        let mut b = Builder::new();
        let s = b.basic(BasicKind::String);
        let ptr = b.table.insert(Type::Pointer { elem: s });
        let fields = vec![b.field("Note", ptr)];
        let strukt = b.table.insert(Type::Struct { fields });
        b.named("Entry", strukt);

        let out = run(b, &["Entry"], &GenOptions::default()).unwrap();

        assert!(out.source.contains("if r.ReadBool() {"));
        assert!(out.source.contains("(*v).Note = new(string)"));
        assert!(out.source.contains("(*v).Note = nil"));
    }
}
