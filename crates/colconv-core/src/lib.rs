//! Core of `colconv`, a converter between columnar file formats.
//!
//! This crate wires DataFusion, Arrow and Parquet together for one job:
//! read a Parquet or CSV file lazily, evaluate it as a stream of record
//! batches, and write those batches as CSV, JSON, JSON Lines or Parquet.
//!
//! - `dtype`: the closed vocabulary of column type names used in schema
//!   files and its mapping onto Arrow types.
//! - `schema`: loading `.json` / `.pkl` schema files into declared column
//!   types for CSV parsing.
//! - `format`: input/output formats, Parquet codecs, the CSV separator.
//! - `sink`: stdout or atomically committed file output.
//! - `convert`: the scan -> execute -> encode pipeline.
//! - `outcome`: mapping a finished (or interrupted) run onto an exit code.
//!
//! The command-line front end lives in `colconv-cli`.
#![deny(missing_docs)]

pub mod convert;
pub mod dtype;
pub mod error;
pub mod format;
pub mod outcome;
pub mod schema;
pub mod sink;
mod writer;

#[cfg(test)]
mod test_util;

pub use convert::{ConvertOptions, ConvertReport, ExecConfig, convert, scan_input, write_output};
pub use dtype::TypeTag;
pub use error::{ConvertError, ConvertResult};
pub use format::{InputFormat, OutputFormat, ParquetCompression, parse_separator};
pub use outcome::{Outcome, convert_interruptible};
pub use schema::{SchemaOverrides, load_schema};
pub use sink::Destination;
