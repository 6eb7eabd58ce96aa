//! Generated-file assembly.

use std::collections::BTreeSet;

const BYTEIO_IMPORT: &str = "vimagination.zapto.org/byteio";

/// Assemble the full output file: header comment recording the invocation,
/// package clause, import block, then the emitted sections in order
/// (wrappers, encode routines, decode routines, helpers).
pub(crate) fn render(
    package_name: &str,
    invocation: &[String],
    need_bytes: bool,
    need_io: bool,
    foreign: &BTreeSet<String>,
    sections: &[&str],
) -> String {
    let mut out = String::new();

    out.push_str("// Code generated by modmarshal. DO NOT EDIT.\n\n");

    out.push_str("//go:generate modmarshal");
    for arg in invocation {
        out.push(' ');
        out.push_str(&quote_arg(arg));
    }
    out.push_str("\n\n");

    out.push_str(&format!("package {package_name}\n\n"));

    let mut std_group = Vec::new();
    if need_bytes {
        std_group.push("bytes");
    }
    if need_io {
        std_group.push("io");
    }

    let mut ext_group: BTreeSet<&str> = foreign.iter().map(String::as_str).collect();
    ext_group.insert(BYTEIO_IMPORT);

    out.push_str("import (\n");
    for path in &std_group {
        out.push_str(&format!("\t\"{path}\"\n"));
    }
    if !std_group.is_empty() {
        out.push('\n');
    }
    for path in &ext_group {
        out.push_str(&format!("\t\"{path}\"\n"));
    }
    out.push_str(")\n\n");

    for section in sections {
        out.push_str(section);
    }

    // Sections end with a blank separator line; the file ends with one \n.
    while out.ends_with("\n\n") {
        out.pop();
    }

    out
}

/// Quote an invocation argument for the `//go:generate` header so the
/// recorded command re-parses to the same argument list.
fn quote_arg(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./@:=,".contains(c));

    if plain {
        arg.to_string()
    } else {
        let mut quoted = String::from("\"");
        for c in arg.chars() {
            match c {
                '"' => quoted.push_str("\\\""),
                '\\' => quoted.push_str("\\\\"),
                '\n' => quoted.push_str("\\n"),
                '\t' => quoted.push_str("\\t"),
                other => quoted.push(other),
            }
        }
        quoted.push('"');
        quoted
    }
}
