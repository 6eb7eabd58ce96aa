//! Encode/decode routine synthesis.
//!
//! Consumes the shape arena and emits Go source: per requested type a set
//! of wrapper methods, per reachable named type one `_marshal_*` and one
//! `_unmarshal_*` routine, and at most one copy of each generic helper.
//! Routines form a flat, mutually-recursive batch, so a cyclic type simply
//! calls back into a routine that appears later in the file.

use std::collections::{BTreeSet, HashSet, VecDeque};

use tracing::debug;

use modmarshal_types::BasicKind;

use crate::options::{GenOptions, Role, ROLES};
use crate::output;
use crate::shape::{NamedShape, Shape, ShapeArena, ShapeId};
use crate::GenError;

/// Routine names generated for one requested type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMethodSet {
    pub type_name: String,
    pub encode_routine: Option<String>,
    pub decode_routine: Option<String>,
}

/// Which generic helpers the batch ended up needing. Each is emitted at
/// most once per file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HelperFlags {
    pub alloc_pointee: bool,
    pub make_slice: bool,
    pub make_map: bool,
    pub map_key_value: bool,
}

/// Result of one generation run.
#[derive(Debug, Clone)]
pub struct GenOutput {
    pub source: String,
    pub methods: Vec<GeneratedMethodSet>,
    pub helpers: HelperFlags,
}

const HELPER_NEW: &str = "func _new[P ~*E, E any](p *P) {\n\t*p = P(new(E))\n}\n";

const HELPER_MAKE_SLICE: &str =
    "func _make_slice[S ~[]E, E any](s *S, n uint64) {\n\t*s = make(S, n)\n}\n";

const HELPER_MAKE_MAP: &str =
    "func _make_map[M ~map[K]V, K comparable, V any](m *M, n uint64) {\n\t*m = make(M, n)\n}\n";

const HELPER_MAP_KEY_VALUE: &str =
    "func _map_key_value[M ~map[K]V, K comparable, V any](M) (K, V) {\n\tvar k K\n\tvar v V\n\treturn k, v\n}\n";

#[derive(Clone, Copy, PartialEq)]
enum Dir {
    Encode,
    Decode,
}

pub(crate) fn generate(
    arena: &ShapeArena,
    options: &GenOptions,
    package_path: &str,
    package_name: &str,
    roots: &[(String, ShapeId)],
    invocation: &[String],
) -> Result<GenOutput, GenError> {
    let mut synth = MethodSynthesizer {
        arena,
        options,
        package_path: package_path.to_string(),
        queue: VecDeque::new(),
        scheduled: HashSet::new(),
        imports: BTreeSet::new(),
        helpers: HelperFlags::default(),
        inlining: HashSet::new(),
        current: String::new(),
    };

    let mut wrappers = String::new();
    let mut methods = Vec::new();

    for (name, sid) in roots {
        let Shape::Named(named) = arena.get(*sid) else {
            return Err(GenError::unsupported(name, "not a named type"));
        };

        synth.schedule(*sid);
        methods.push(synth.emit_wrappers(&mut wrappers, named));
    }

    let mut marshal = String::new();
    let mut unmarshal = String::new();

    while let Some(sid) = synth.queue.pop_front() {
        let Shape::Named(named) = arena.get(sid) else {
            continue;
        };

        if options.encode_requested() {
            synth.emit_routine(&mut marshal, named, Dir::Encode)?;
        }
        if options.decode_requested() {
            synth.emit_routine(&mut unmarshal, named, Dir::Decode)?;
        }
    }

    let mut helpers = String::new();

    for (flag, text) in [
        (synth.helpers.alloc_pointee, HELPER_NEW),
        (synth.helpers.make_slice, HELPER_MAKE_SLICE),
        (synth.helpers.make_map, HELPER_MAKE_MAP),
        (synth.helpers.map_key_value, HELPER_MAP_KEY_VALUE),
    ] {
        if flag {
            helpers.push_str(text);
            helpers.push('\n');
        }
    }

    let encode_wrapped = options.append.is_some() || options.marshal.is_some();
    let decode_wrapped = options.unmarshal.is_some();
    let streaming = options.write.is_some() || options.read.is_some();

    debug!(
        types = roots.len(),
        routines = synth.scheduled.len(),
        "assembling generated file"
    );

    let source = output::render(
        package_name,
        invocation,
        encode_wrapped || decode_wrapped,
        streaming,
        &synth.imports,
        &[
            wrappers.as_str(),
            marshal.as_str(),
            unmarshal.as_str(),
            helpers.as_str(),
        ],
    );

    Ok(GenOutput {
        source,
        methods,
        helpers: synth.helpers,
    })
}

struct MethodSynthesizer<'a> {
    arena: &'a ShapeArena,
    options: &'a GenOptions,
    package_path: String,
    queue: VecDeque<ShapeId>,
    scheduled: HashSet<ShapeId>,
    imports: BTreeSet<String>,
    helpers: HelperFlags,
    /// Named shapes currently being expanded inline; re-entering one means
    /// an inaccessible recursive type.
    inlining: HashSet<ShapeId>,
    /// Type the routine under emission belongs to, for error reporting.
    current: String,
}

impl<'a> MethodSynthesizer<'a> {
    fn schedule(&mut self, sid: ShapeId) {
        if self.scheduled.insert(sid) {
            self.queue.push_back(sid);
        }
    }

    /// Spell the named type from the output package, registering the
    /// import when it lives elsewhere. `None` means the name is not
    /// accessible to the generated file.
    fn spell_named(&mut self, n: &NamedShape) -> Option<String> {
        if n.package_path == self.package_path {
            Some(n.name.clone())
        } else if n.exported {
            self.imports.insert(n.package_path.clone());
            Some(format!("{}.{}", n.package_name, n.name))
        } else {
            None
        }
    }

    /// Spell the shape as a Go type expression, or `None` when it mentions
    /// an inaccessible name (anonymous structs are routed through helpers
    /// rather than spelled out).
    fn type_expr(&mut self, sid: ShapeId) -> Option<String> {
        let arena = self.arena;

        match arena.get(sid) {
            Shape::Primitive(kind) => Some(kind.go_name().to_string()),
            Shape::Array { len, elem } => Some(format!("[{len}]{}", self.type_expr(*elem)?)),
            Shape::Slice { elem } => Some(format!("[]{}", self.type_expr(*elem)?)),
            Shape::Map { key, value } => {
                let k = self.type_expr(*key)?;
                let v = self.type_expr(*value)?;
                Some(format!("map[{k}]{v}"))
            }
            Shape::Pointer { elem } => Some(format!("*{}", self.type_expr(*elem)?)),
            Shape::Named(n) => self.spell_named(n),
            Shape::Struct { .. } | Shape::Pending | Shape::Unsupported => None,
        }
    }

    fn routine_suffix(&self, n: &NamedShape) -> String {
        if n.package_path == self.package_path {
            escape_name(&n.name)
        } else {
            escape_name(&format!("{}.{}", n.package_name, n.name))
        }
    }

    fn emit_wrappers(&mut self, buf: &mut String, named: &NamedShape) -> GeneratedMethodSet {
        let ty = &named.name;
        let suffix = self.routine_suffix(named);

        for role in ROLES {
            let Some(method) = self.options.method_name(role) else {
                continue;
            };

            let already = match role {
                Role::Append => named.implements.append,
                Role::Marshal => named.implements.marshal,
                Role::Write => named.implements.write,
                Role::Unmarshal => named.implements.unmarshal,
                Role::Read => named.implements.read,
            };

            if already {
                continue;
            }

            buf.push_str(&wrapper_doc(role, method));

            match role {
                Role::Append => {
                    buf.push_str(&format!(
                        "func (v *{ty}) {method}(data []byte) ([]byte, error) {{\n\
                         \tbuf := bytes.NewBuffer(data)\n\
                         \tw := byteio.StickyLittleEndianWriter{{Writer: buf}}\n\
                         \t_marshal_{suffix}(&w, v)\n\
                         \treturn buf.Bytes(), w.Err\n\
                         }}\n\n"
                    ));
                }
                Role::Marshal => {
                    buf.push_str(&format!(
                        "func (v *{ty}) {method}() ([]byte, error) {{\n\
                         \tvar buf bytes.Buffer\n\
                         \tw := byteio.StickyLittleEndianWriter{{Writer: &buf}}\n\
                         \t_marshal_{suffix}(&w, v)\n\
                         \treturn buf.Bytes(), w.Err\n\
                         }}\n\n"
                    ));
                }
                Role::Write => {
                    buf.push_str(&format!(
                        "func (v *{ty}) {method}(w io.Writer) (int64, error) {{\n\
                         \tsw := byteio.StickyLittleEndianWriter{{Writer: w}}\n\
                         \t_marshal_{suffix}(&sw, v)\n\
                         \treturn sw.Count, sw.Err\n\
                         }}\n\n"
                    ));
                }
                Role::Unmarshal => {
                    buf.push_str(&format!(
                        "func (v *{ty}) {method}(data []byte) error {{\n\
                         \tr := byteio.StickyLittleEndianReader{{Reader: bytes.NewReader(data)}}\n\
                         \t_unmarshal_{suffix}(&r, v)\n\
                         \treturn r.Err\n\
                         }}\n\n"
                    ));
                }
                Role::Read => {
                    buf.push_str(&format!(
                        "func (v *{ty}) {method}(r io.Reader) (int64, error) {{\n\
                         \tsr := byteio.StickyLittleEndianReader{{Reader: r}}\n\
                         \t_unmarshal_{suffix}(&sr, v)\n\
                         \treturn sr.Count, sr.Err\n\
                         }}\n\n"
                    ));
                }
            }
        }

        GeneratedMethodSet {
            type_name: ty.clone(),
            encode_routine: self
                .options
                .encode_requested()
                .then(|| format!("_marshal_{suffix}")),
            decode_routine: self
                .options
                .decode_requested()
                .then(|| format!("_unmarshal_{suffix}")),
        }
    }

    fn emit_routine(
        &mut self,
        buf: &mut String,
        named: &NamedShape,
        dir: Dir,
    ) -> Result<(), GenError> {
        let ty = self
            .spell_named(named)
            .ok_or_else(|| GenError::unsupported(&named.name, "inaccessible type name"))?;
        let suffix = self.routine_suffix(named);

        self.current = named.name.clone();

        match dir {
            Dir::Encode => {
                buf.push_str(&format!(
                    "func _marshal_{suffix}(w *byteio.StickyLittleEndianWriter, v *{ty}) {{\n"
                ));
                self.encode_shape(buf, named.inner, "(*v)", 1, 0)?;
            }
            Dir::Decode => {
                buf.push_str(&format!(
                    "func _unmarshal_{suffix}(r *byteio.StickyLittleEndianReader, v *{ty}) {{\n"
                ));
                self.decode_shape(buf, named.inner, "(*v)", 1, 0, Some(ty.as_str()))?;
            }
        }

        buf.push_str("}\n\n");

        Ok(())
    }

    fn encode_shape(
        &mut self,
        buf: &mut String,
        sid: ShapeId,
        lv: &str,
        indent: usize,
        depth: usize,
    ) -> Result<(), GenError> {
        let arena = self.arena;

        match arena.get(sid) {
            Shape::Primitive(BasicKind::Complex64) => {
                line(buf, indent, &format!("w.WriteFloat32(float32(real({lv})))"));
                line(buf, indent, &format!("w.WriteFloat32(float32(imag({lv})))"));
            }
            Shape::Primitive(BasicKind::Complex128) => {
                line(buf, indent, &format!("w.WriteFloat64(float64(real({lv})))"));
                line(buf, indent, &format!("w.WriteFloat64(float64(imag({lv})))"));
            }
            Shape::Primitive(kind) => {
                let (write, _, wire) = scalar_io(*kind)
                    .ok_or_else(|| GenError::unsupported(&self.current, kind.go_name()))?;

                line(buf, indent, &format!("w.{write}({wire}({lv}))"));
            }
            Shape::Named(n) => {
                if self.spell_named(n).is_some() {
                    let suffix = self.routine_suffix(n);

                    self.schedule(sid);
                    line(buf, indent, &format!("_marshal_{suffix}(w, &{lv})"));
                } else {
                    self.inline_named(buf, sid, lv, indent, depth, Dir::Encode)?;
                }
            }
            Shape::Struct { fields } => {
                for field in fields {
                    let flv = format!("{lv}.{}", field.name);
                    self.encode_shape(buf, field.shape, &flv, indent, depth)?;
                }
            }
            Shape::Array { elem, .. } => {
                let i = idx_var(depth);

                line(buf, indent, &format!("for {i} := range {lv} {{"));
                self.encode_shape(buf, *elem, &format!("{lv}[{i}]"), indent + 1, depth + 1)?;
                line(buf, indent, "}");
            }
            Shape::Slice { elem } => {
                let i = idx_var(depth);

                line(buf, indent, &format!("w.WriteUintX(uint64(len({lv})))"));
                line(buf, indent, &format!("for {i} := range {lv} {{"));
                self.encode_shape(buf, *elem, &format!("{lv}[{i}]"), indent + 1, depth + 1)?;
                line(buf, indent, "}");
            }
            Shape::Map { key, value } => {
                let k = key_var(depth);
                let e = elem_var(depth);

                line(buf, indent, &format!("w.WriteUintX(uint64(len({lv})))"));
                line(buf, indent, &format!("for {k}, {e} := range {lv} {{"));
                self.encode_shape(buf, *key, &k, indent + 1, depth + 1)?;
                self.encode_shape(buf, *value, &e, indent + 1, depth + 1)?;
                line(buf, indent, "}");
            }
            Shape::Pointer { elem } => {
                line(buf, indent, &format!("if {lv} == nil {{"));
                line(buf, indent + 1, "w.WriteBool(false)");
                line(buf, indent, "} else {");
                line(buf, indent + 1, "w.WriteBool(true)");
                self.encode_shape(buf, *elem, &format!("(*{lv})"), indent + 1, depth)?;
                line(buf, indent, "}");
            }
            Shape::Pending => {
                return Err(GenError::unsupported(&self.current, "unresolved placeholder"))
            }
            Shape::Unsupported => {
                return Err(GenError::unsupported(
                    &self.current,
                    format!("unencodable value at {lv}"),
                ))
            }
        }

        Ok(())
    }

    fn decode_shape(
        &mut self,
        buf: &mut String,
        sid: ShapeId,
        lv: &str,
        indent: usize,
        depth: usize,
        cast: Option<&str>,
    ) -> Result<(), GenError> {
        let arena = self.arena;

        match arena.get(sid) {
            Shape::Primitive(kind @ (BasicKind::Complex64 | BasicKind::Complex128)) => {
                let (read, target) = match kind {
                    BasicKind::Complex64 => ("ReadFloat32", "complex64"),
                    _ => ("ReadFloat64", "complex128"),
                };
                let target = cast.unwrap_or(target);

                line(
                    buf,
                    indent,
                    &format!("{lv} = {target}(complex(r.{read}(), r.{read}()))"),
                );
            }
            Shape::Primitive(kind) => {
                let (_, read, _) = scalar_io(*kind)
                    .ok_or_else(|| GenError::unsupported(&self.current, kind.go_name()))?;
                let target = cast.unwrap_or(kind.go_name());

                line(buf, indent, &format!("{lv} = {target}(r.{read}())"));
            }
            Shape::Named(n) => {
                if self.spell_named(n).is_some() {
                    let suffix = self.routine_suffix(n);

                    self.schedule(sid);
                    line(buf, indent, &format!("_unmarshal_{suffix}(r, &{lv})"));
                } else {
                    self.inline_named(buf, sid, lv, indent, depth, Dir::Decode)?;
                }
            }
            Shape::Struct { fields } => {
                for field in fields {
                    let flv = format!("{lv}.{}", field.name);
                    self.decode_shape(buf, field.shape, &flv, indent, depth, None)?;
                }
            }
            Shape::Array { elem, .. } => {
                let i = idx_var(depth);

                line(buf, indent, &format!("for {i} := range {lv} {{"));
                self.decode_shape(buf, *elem, &format!("{lv}[{i}]"), indent + 1, depth + 1, None)?;
                line(buf, indent, "}");
            }
            Shape::Slice { elem } => {
                let i = idx_var(depth);

                match self.type_expr(*elem) {
                    Some(expr) => {
                        line(buf, indent, &format!("{lv} = make([]{expr}, r.ReadUintX())"));
                    }
                    None => {
                        self.helpers.make_slice = true;
                        line(buf, indent, &format!("_make_slice(&{lv}, r.ReadUintX())"));
                    }
                }

                line(buf, indent, &format!("for {i} := range {lv} {{"));
                self.decode_shape(buf, *elem, &format!("{lv}[{i}]"), indent + 1, depth + 1, None)?;
                line(buf, indent, "}");
            }
            Shape::Map { key, value } => {
                let n = count_var(depth);
                let i = idx_var(depth);
                let k = key_var(depth);
                let e = elem_var(depth);

                line(buf, indent, &format!("{n} := r.ReadUintX()"));

                let spelled = match (self.type_expr(*key), self.type_expr(*value)) {
                    (Some(kt), Some(vt)) => Some((kt, vt)),
                    _ => None,
                };

                match &spelled {
                    Some((kt, vt)) => {
                        line(buf, indent, &format!("{lv} = make(map[{kt}]{vt}, {n})"));
                    }
                    None => {
                        self.helpers.make_map = true;
                        line(buf, indent, &format!("_make_map(&{lv}, {n})"));
                    }
                }

                line(
                    buf,
                    indent,
                    &format!("for {i} := uint64(0); {i} < {n}; {i}++ {{"),
                );

                match &spelled {
                    Some((kt, vt)) => {
                        line(buf, indent + 1, &format!("var {k} {kt}"));
                        line(buf, indent + 1, &format!("var {e} {vt}"));
                    }
                    None => {
                        self.helpers.map_key_value = true;
                        line(buf, indent + 1, &format!("{k}, {e} := _map_key_value({lv})"));
                    }
                }

                self.decode_shape(buf, *key, &k, indent + 1, depth + 1, None)?;
                self.decode_shape(buf, *value, &e, indent + 1, depth + 1, None)?;
                line(buf, indent + 1, &format!("{lv}[{k}] = {e}"));
                line(buf, indent, "}");
            }
            Shape::Pointer { elem } => {
                line(buf, indent, "if r.ReadBool() {");

                match self.type_expr(*elem) {
                    Some(expr) => {
                        line(buf, indent + 1, &format!("{lv} = new({expr})"));
                    }
                    None => {
                        self.helpers.alloc_pointee = true;
                        line(buf, indent + 1, &format!("_new(&{lv})"));
                    }
                }

                self.decode_shape(buf, *elem, &format!("(*{lv})"), indent + 1, depth, None)?;
                line(buf, indent, "} else {");
                line(buf, indent + 1, &format!("{lv} = nil"));
                line(buf, indent, "}");
            }
            Shape::Pending => {
                return Err(GenError::unsupported(&self.current, "unresolved placeholder"))
            }
            Shape::Unsupported => {
                return Err(GenError::unsupported(
                    &self.current,
                    format!("unreconstructable value at {lv}"),
                ))
            }
        }

        Ok(())
    }

    /// Expand an inaccessible named type in place.
    ///
    /// Only struct underlyings survive this: their exported fields are
    /// addressable through the wrapper without ever spelling its name.
    /// Anything else would need a conversion the generated file cannot
    /// write, and a recursive wrapper would expand forever.
    fn inline_named(
        &mut self,
        buf: &mut String,
        sid: ShapeId,
        lv: &str,
        indent: usize,
        depth: usize,
        dir: Dir,
    ) -> Result<(), GenError> {
        let arena = self.arena;

        let Shape::Named(n) = arena.get(sid) else {
            return Err(GenError::unsupported(&self.current, "not a named type"));
        };
        let full = format!("{}.{}", n.package_path, n.name);

        if !self.inlining.insert(sid) {
            return Err(GenError::unsupported(
                &self.current,
                format!("recursive inaccessible type {full}"),
            ));
        }

        let result = match arena.get(n.inner) {
            Shape::Struct { .. } => match dir {
                Dir::Encode => self.encode_shape(buf, n.inner, lv, indent, depth),
                Dir::Decode => self.decode_shape(buf, n.inner, lv, indent, depth, None),
            },
            _ => Err(GenError::unsupported(
                &self.current,
                format!("inaccessible type {full} cannot be reconstructed"),
            )),
        };

        self.inlining.remove(&sid);

        result
    }
}

/// Doc comment for a wrapper method: the standard name claims its interface,
/// a custom name gets a descriptive line instead.
fn wrapper_doc(role: Role, method: &str) -> String {
    let (standard, interface) = match role {
        Role::Append => ("AppendBinary", "encoding.BinaryAppender"),
        Role::Marshal => ("MarshalBinary", "encoding.BinaryMarshaler"),
        Role::Write => ("WriteTo", "io.WriterTo"),
        Role::Unmarshal => ("UnmarshalBinary", "encoding.BinaryUnmarshaler"),
        Role::Read => ("ReadFrom", "io.ReaderFrom"),
    };

    if method == standard {
        return format!("// {standard} implements the {interface} interface.\n");
    }

    match role {
        Role::Append => {
            format!("// {method} appends the binary form of the receiver to data.\n")
        }
        Role::Marshal => format!("// {method} encodes the receiver into the binary form.\n"),
        Role::Write => format!(
            "// {method} writes data to w until the type is fully encoded.\n\
             //\n\
             // The return value n is the number of bytes written. Any error encountered during the write is also returned.\n"
        ),
        Role::Unmarshal => {
            format!("// {method} decodes the receiver from the binary form.\n")
        }
        Role::Read => format!(
            "// {method} reads data from r until the type is fully decoded.\n\
             //\n\
             // The return value n is the number of bytes read. Any error encountered during the read is also returned.\n"
        ),
    }
}

/// Write/read method and wire conversion for scalar kinds. Complex kinds
/// decompose into float pairs elsewhere; uintptr has no wire form.
fn scalar_io(kind: BasicKind) -> Option<(&'static str, &'static str, &'static str)> {
    Some(match kind {
        BasicKind::Bool => ("WriteBool", "ReadBool", "bool"),
        BasicKind::Int => ("WriteInt64", "ReadInt64", "int64"),
        BasicKind::Int8 => ("WriteInt8", "ReadInt8", "int8"),
        BasicKind::Int16 => ("WriteInt16", "ReadInt16", "int16"),
        BasicKind::Int32 => ("WriteInt32", "ReadInt32", "int32"),
        BasicKind::Int64 => ("WriteInt64", "ReadInt64", "int64"),
        BasicKind::Uint => ("WriteUint64", "ReadUint64", "uint64"),
        BasicKind::Uint8 => ("WriteUint8", "ReadUint8", "uint8"),
        BasicKind::Uint16 => ("WriteUint16", "ReadUint16", "uint16"),
        BasicKind::Uint32 => ("WriteUint32", "ReadUint32", "uint32"),
        BasicKind::Uint64 => ("WriteUint64", "ReadUint64", "uint64"),
        BasicKind::Float32 => ("WriteFloat32", "ReadFloat32", "float32"),
        BasicKind::Float64 => ("WriteFloat64", "ReadFloat64", "float64"),
        BasicKind::String => ("WriteStringX", "ReadStringX", "string"),
        BasicKind::Uintptr | BasicKind::Complex64 | BasicKind::Complex128 => return None,
    })
}

/// Routine-name fragment for a type name: underscores double, dots become
/// underscores, so distinct names stay distinct after joining.
fn escape_name(name: &str) -> String {
    name.replace('_', "__").replace('.', "_")
}

fn line(buf: &mut String, indent: usize, text: &str) {
    for _ in 0..indent {
        buf.push('\t');
    }
    buf.push_str(text);
    buf.push('\n');
}

fn idx_var(depth: usize) -> String {
    match depth {
        0 => "i".to_string(),
        1 => "j".to_string(),
        n => format!("i{n}"),
    }
}

fn count_var(depth: usize) -> String {
    match depth {
        0 => "n".to_string(),
        n => format!("n{n}"),
    }
}

fn key_var(depth: usize) -> String {
    match depth {
        0 => "k".to_string(),
        n => format!("k{n}"),
    }
}

fn elem_var(depth: usize) -> String {
    match depth {
        0 => "e".to_string(),
        n => format!("e{n}"),
    }
}
