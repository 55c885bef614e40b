//! Print a Parquet file as CSV on stdout.
//!
//! Same pipeline as `colconv <file>` with every option at its default.

use std::path::PathBuf;

use clap::Parser;
use colconv_cli::run::{init_logging, run_to_exit_code};
use colconv_core::ConvertOptions;

#[derive(Debug, Parser)]
#[command(name = "pq2csv", version, about)]
struct Args {
    /// Parquet file to print
    parquet: PathBuf,
}

fn main() {
    let args = Args::parse();
    init_logging(false);

    let code = run_to_exit_code(&ConvertOptions::new(args.parquet));
    std::process::exit(code);
}
