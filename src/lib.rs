//! Binary marshal/unmarshal method generation for Go types, driven by a
//! module-aware package resolver.
//!
//! The pipeline: discover the enclosing module, resolve the requested
//! package's import path to a source (local directory, module cache, or
//! remote archive over ranged HTTP), have an external type checker turn it
//! into a symbol table, then walk the requested types' structural shapes
//! and synthesize encode/decode routines. The member crates each own one
//! stage; this crate is the thin CLI glue over them.

pub mod args;

use std::fs;
use std::io::Write as _;

use anyhow::{anyhow, Context, Result};
use tracing::info;

use modmarshal_resolver::{ImportResolver, Module};
use modmarshal_types::{SymbolError, TypeTable};

use crate::args::Args;

/// Entry point shared by the binary and the integration tests.
///
/// `invocation` is the raw argument list, recorded in the generated file's
/// header so the output documents how to reproduce itself.
pub fn run(args: &Args, invocation: &[String]) -> Result<()> {
    args.validate().map_err(|m| anyhow!(m))?;

    if args.list || !args.resolve.is_empty() {
        return inspect(args);
    }

    generate(args, invocation)
}

fn inspect(args: &Args) -> Result<()> {
    let (module, sub) = Module::find(&args.package_dir)
        .with_context(|| format!("resolving module for {}", args.package_dir.display()))?;

    if args.list {
        println!("module  {}", module.manifest.identity());
        println!("root    {}", module.root.display());
        println!("package {}", module.import_path(&sub));

        for (path, dep) in module.manifest.dependencies() {
            if dep.version.is_empty() {
                println!("require {path} => {}", dep.base);
            } else {
                println!("require {path} {}@{}", dep.base, dep.version);
            }
        }
    }

    let resolver = ImportResolver::new(&module.manifest, &module.root);

    for import in &args.resolve {
        match resolver.resolve(import) {
            Some(c) if c.is_directory() => {
                println!("{import} -> dir {} sub={}", c.base, c.sub_path);
            }
            Some(c) => println!("{import} -> {}@{} sub={}", c.base, c.version, c.sub_path),
            None => println!("{import} -> standard import"),
        }
    }

    Ok(())
}

fn generate(args: &Args, invocation: &[String]) -> Result<()> {
    let symbols = args
        .symbols
        .as_ref()
        .ok_or_else(|| anyhow!("--symbols is required for generation"))?;

    let bytes =
        fs::read(symbols).with_context(|| format!("reading {}", symbols.display()))?;
    let table: TypeTable = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing symbol table {}", symbols.display()))?;

    let package_path = match &args.package {
        Some(path) => path.clone(),
        None => {
            let (module, sub) = Module::find(&args.package_dir)
                .with_context(|| format!("resolving module for {}", args.package_dir.display()))?;

            module.import_path(&sub)
        }
    };

    let package = table
        .find_package(&package_path)
        .ok_or_else(|| SymbolError::PackageNotFound(package_path.clone()))
        .with_context(|| format!("in symbol table {}", symbols.display()))?;

    let options = args.gen_options();
    let out =
        modmarshal_codegen::generate(&table, package, &args.type_names, &options, invocation)?;

    info!(
        types = args.type_names.len(),
        bytes = out.source.len(),
        helpers = ?out.helpers,
        "generated methods"
    );

    // The output file is only touched once every requested type succeeded.
    if args.output == "-" {
        std::io::stdout().write_all(out.source.as_bytes())?;
    } else {
        fs::write(&args.output, out.source)
            .with_context(|| format!("writing {}", args.output))?;
    }

    Ok(())
}
