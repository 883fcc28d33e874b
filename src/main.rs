use std::path::PathBuf;
use std::process;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "hostgen",
    version,
    about = "Generate an OpenCL host program from a kernel manifest"
)]
struct Cli {
    /// XML kernel manifest
    manifest: PathBuf,
    /// C file to write
    output: PathBuf,
    /// Log each generation stage (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    if hostgen::generate_file(&cli.manifest, &cli.output).is_err() {
        process::exit(1);
    }
}
