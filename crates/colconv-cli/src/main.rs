//! CLI tool for converting Parquet and CSV files to CSV, JSON or Parquet.

use std::{num::NonZeroUsize, path::PathBuf};

use clap::{Parser, ValueEnum};
use colconv_cli::{
    error::CliResult,
    run::{init_logging, run_to_exit_code},
};
use colconv_core::{
    ConvertOptions, ExecConfig, InputFormat, OutputFormat, ParquetCompression, load_schema,
    outcome::EXIT_FAILURE, parse_separator,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputFormatArg {
    Parquet,
    Csv,
}

impl From<InputFormatArg> for InputFormat {
    fn from(v: InputFormatArg) -> Self {
        match v {
            InputFormatArg::Parquet => InputFormat::Parquet,
            InputFormatArg::Csv => InputFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    Csv,
    Json,
    Jsonl,
    Parquet,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(v: OutputFormatArg) -> Self {
        match v {
            OutputFormatArg::Csv => OutputFormat::Csv,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Jsonl => OutputFormat::Jsonl,
            OutputFormatArg::Parquet => OutputFormat::Parquet,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompressionArg {
    Snappy,
    Gzip,
    Zstd,
    Lz4,
    Brotli,
    Uncompressed,
}

impl From<CompressionArg> for ParquetCompression {
    fn from(v: CompressionArg) -> Self {
        match v {
            CompressionArg::Snappy => ParquetCompression::Snappy,
            CompressionArg::Gzip => ParquetCompression::Gzip,
            CompressionArg::Zstd => ParquetCompression::Zstd,
            CompressionArg::Lz4 => ParquetCompression::Lz4,
            CompressionArg::Brotli => ParquetCompression::Brotli,
            CompressionArg::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "colconv", version, about)]
struct Cli {
    /// Input file path
    input: PathBuf,

    /// Output file (default: stdout for CSV/JSON)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// CSV separator, a single character or `\t` (ignored for JSON/Parquet)
    #[arg(long, default_value = ",")]
    sep: String,

    /// Number of CPU threads
    #[arg(long)]
    threads: Option<NonZeroUsize>,

    /// Input file format
    #[arg(long = "input-format", value_enum, default_value_t = InputFormatArg::Parquet)]
    input_format: InputFormatArg,

    /// Output format (parquet requires --output)
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormatArg::Csv)]
    output_format: OutputFormatArg,

    /// Schema file (.json or .pkl) mapping column names to simple types
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Parquet output codec
    #[arg(long, value_enum, default_value_t = CompressionArg::Snappy)]
    compression: CompressionArg,

    /// Log row counts and destinations to stderr
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Cli {
    fn into_options(self) -> CliResult<ConvertOptions> {
        let separator = parse_separator(&self.sep)?;
        let schema = match &self.schema {
            Some(path) => load_schema(path)?,
            None => None,
        };

        Ok(ConvertOptions {
            input: self.input,
            output: self.output,
            input_format: self.input_format.into(),
            output_format: self.output_format.into(),
            separator,
            schema,
            compression: self.compression.into(),
            exec: ExecConfig {
                threads: self.threads,
                ..ExecConfig::default()
            },
        })
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match cli.into_options() {
        Ok(opts) => run_to_exit_code(&opts),
        Err(e) => {
            eprintln!("[Error] {e}");
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}
