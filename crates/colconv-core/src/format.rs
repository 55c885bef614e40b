//! Input/output formats, Parquet codecs and the CSV separator.

use std::fmt;

use parquet::basic::{BrotliLevel, Compression, GzipLevel, ZstdLevel};

use crate::error::{ConvertResult, InvalidSeparatorSnafu};

/// Formats the converter can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    /// Apache Parquet.
    #[default]
    Parquet,
    /// Delimited text with a header row.
    Csv,
}

/// Formats the converter can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Delimited text with a header row.
    #[default]
    Csv,
    /// A JSON array with one object per row.
    Json,
    /// One JSON object per line.
    Jsonl,
    /// Apache Parquet. Needs a file destination.
    Parquet,
}

impl OutputFormat {
    /// Whether the format may be streamed to stdout.
    pub fn allows_stdout(self) -> bool {
        !matches!(self, OutputFormat::Parquet)
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Parquet => write!(f, "parquet"),
            InputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
            OutputFormat::Parquet => write!(f, "parquet"),
        }
    }
}

/// Codec for Parquet output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParquetCompression {
    /// Snappy (the default).
    #[default]
    Snappy,
    /// Gzip at the default level.
    Gzip,
    /// Zstandard at the default level.
    Zstd,
    /// LZ4 raw blocks.
    Lz4,
    /// Brotli at the default level.
    Brotli,
    /// No compression.
    Uncompressed,
}

impl From<ParquetCompression> for Compression {
    fn from(value: ParquetCompression) -> Self {
        match value {
            ParquetCompression::Snappy => Compression::SNAPPY,
            ParquetCompression::Gzip => Compression::GZIP(GzipLevel::default()),
            ParquetCompression::Zstd => Compression::ZSTD(ZstdLevel::default()),
            ParquetCompression::Lz4 => Compression::LZ4_RAW,
            ParquetCompression::Brotli => Compression::BROTLI(BrotliLevel::default()),
            ParquetCompression::Uncompressed => Compression::UNCOMPRESSED,
        }
    }
}

/// Parse a `--sep` value into the single byte the CSV reader and writer use.
///
/// Accepts one ASCII character, or the two-character escape `\t`.
pub fn parse_separator(sep: &str) -> ConvertResult<u8> {
    if sep == "\\t" {
        return Ok(b'\t');
    }

    match sep.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => InvalidSeparatorSnafu { sep }.fail(),
    }
}
