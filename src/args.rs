use clap::Parser;
use std::path::PathBuf;

use modmarshal_codegen::GenOptions;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Package directory to operate on; module discovery walks upward from
    /// here to the nearest manifest.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub package_dir: PathBuf,

    /// Type name to generate methods for. Can be provided multiple times.
    #[arg(long = "type", value_name = "NAME")]
    pub type_names: Vec<String>,

    /// Symbol table JSON produced by the external type checker. Required
    /// for generation.
    #[arg(long, value_name = "PATH")]
    pub symbols: Option<PathBuf>,

    /// Import path of the package to generate into. Defaults to the import
    /// path resolved from --package-dir.
    #[arg(long, value_name = "IMPORT")]
    pub package: Option<String>,

    /// Output file path (use '-' for stdout). Nothing is written unless
    /// generation succeeds for every requested type.
    #[arg(long, value_name = "PATH", default_value = "-")]
    pub output: String,

    /// Print the resolved module, its effective dependencies and the
    /// package's import path, then exit.
    #[arg(long, default_value_t = false)]
    pub list: bool,

    /// Resolve an import path against the module's manifest and print its
    /// coordinate. Can be provided multiple times.
    #[arg(long, value_name = "IMPORT")]
    pub resolve: Vec<String>,

    /// Method name for the append role.
    #[arg(long, value_name = "NAME", default_value = "AppendBinary")]
    pub append_name: String,

    /// Method name for the marshal role.
    #[arg(long, value_name = "NAME", default_value = "MarshalBinary")]
    pub marshal_name: String,

    /// Method name for the write role.
    #[arg(long, value_name = "NAME", default_value = "WriteTo")]
    pub write_name: String,

    /// Method name for the unmarshal role.
    #[arg(long, value_name = "NAME", default_value = "UnmarshalBinary")]
    pub unmarshal_name: String,

    /// Method name for the read role.
    #[arg(long, value_name = "NAME", default_value = "ReadFrom")]
    pub read_name: String,

    /// Do not emit the append method.
    #[arg(long, default_value_t = false)]
    pub no_append: bool,

    /// Do not emit the marshal method.
    #[arg(long, default_value_t = false)]
    pub no_marshal: bool,

    /// Do not emit the write method.
    #[arg(long, default_value_t = false)]
    pub no_write: bool,

    /// Do not emit the unmarshal method.
    #[arg(long, default_value_t = false)]
    pub no_unmarshal: bool,

    /// Do not emit the read method.
    #[arg(long, default_value_t = false)]
    pub no_read: bool,
}

impl Args {
    /// Validate flag combinations before any work happens.
    pub fn validate(&self) -> Result<(), String> {
        let inspecting = self.list || !self.resolve.is_empty();

        if self.type_names.is_empty() && !inspecting {
            return Err("at least one --type is required (or --list/--resolve)".to_string());
        }

        if !self.type_names.is_empty() && self.symbols.is_none() {
            return Err("--type requires --symbols".to_string());
        }

        if self.no_append && self.no_marshal && self.no_write && self.no_unmarshal && self.no_read
        {
            return Err("all method roles are disabled; nothing to generate".to_string());
        }

        Ok(())
    }

    /// Method selection derived from the name/disable flag pairs.
    pub fn gen_options(&self) -> GenOptions {
        let pick = |disabled: bool, name: &str| (!disabled).then(|| name.to_string());

        GenOptions {
            append: pick(self.no_append, &self.append_name),
            marshal: pick(self.no_marshal, &self.marshal_name),
            write: pick(self.no_write, &self.write_name),
            unmarshal: pick(self.no_unmarshal, &self.unmarshal_name),
            read: pick(self.no_read, &self.read_name),
        }
    }
}
