use clap::Parser;

use modmarshal::args::Args;

fn main() {
    let invocation: Vec<String> = std::env::args().skip(1).collect();
    let args = Args::parse();

    if let Err(e) = modmarshal::run(&args, &invocation) {
        eprintln!("modmarshal: {e:#}");
        std::process::exit(1);
    }
}
