//! Error types and SNAFU context selectors for the conversion pipeline.
//!
//! `ConvertError` covers every failure a conversion can hit, from loading a
//! schema file to committing the output. Context selectors are visible to the
//! sibling modules so each stage attaches its own path and message.

use arrow::error::ArrowError;
use datafusion::error::DataFusionError;
use parquet::errors::ParquetError;
use snafu::prelude::*;

/// Result alias used throughout `colconv-core`.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Errors raised while configuring or running a conversion.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConvertError {
    /// The `--schema` path does not exist or cannot be inspected.
    #[snafu(display("Schema file not found: {path}"))]
    SchemaFileMissing {
        /// Path given on the command line.
        path: String,
        /// Underlying filesystem error.
        source: std::io::Error,
    },

    /// The schema file extension is neither `.json` nor `.pkl`.
    #[snafu(display("Unsupported schema format: {extension} ({path})"))]
    UnsupportedSchemaExtension {
        /// Path given on the command line.
        path: String,
        /// Extension that was found (empty when the file has none).
        extension: String,
    },

    /// The schema file exists but could not be read.
    #[snafu(display("Failed to read schema file: {path}"))]
    ReadSchemaFile {
        /// Schema file path.
        path: String,
        /// Underlying filesystem error.
        source: std::io::Error,
    },

    /// The `.json` schema file is not valid JSON.
    #[snafu(display("Invalid JSON schema file {path}: {source}"))]
    ParseJsonSchema {
        /// Schema file path.
        path: String,
        /// Decoder error.
        source: serde_json::Error,
    },

    /// The `.pkl` schema file is not a pickle stream we can decode.
    #[snafu(display("Invalid pickle schema file {path}: {source}"))]
    ParsePickleSchema {
        /// Schema file path.
        path: String,
        /// Decoder error.
        source: serde_pickle::Error,
    },

    /// The schema file decoded to something other than a name -> type mapping.
    #[snafu(display("Schema file {path} must contain a mapping of column name to type, found {found}"))]
    SchemaNotAMapping {
        /// Schema file path.
        path: String,
        /// Short description of what was decoded instead.
        found: String,
    },

    /// The CSV separator is not a single ASCII character.
    #[snafu(display("Invalid separator {sep:?}: expected a single ASCII character"))]
    InvalidSeparator {
        /// Separator as given on the command line.
        sep: String,
    },

    /// Parquet output was requested without an output file.
    #[snafu(display("Parquet output requires --output file path"))]
    ParquetToStdout,

    /// The input file does not exist or cannot be inspected.
    #[snafu(display("Input file not found: {path}"))]
    InputMissing {
        /// Input path.
        path: String,
        /// Underlying filesystem error.
        source: std::io::Error,
    },

    /// Planning or execution failed inside DataFusion.
    #[snafu(display("{source}"))]
    DataFusion {
        /// Engine error.
        #[snafu(source(from(DataFusionError, Box::new)))]
        source: Box<DataFusionError>,
    },

    /// Encoding a record batch failed.
    #[snafu(display("{source}"))]
    Arrow {
        /// Arrow writer error.
        source: ArrowError,
    },

    /// Writing the Parquet output failed.
    #[snafu(display("{source}"))]
    Parquet {
        /// Parquet writer error.
        #[snafu(source(from(ParquetError, Box::new)))]
        source: Box<ParquetError>,
    },

    /// CSV cannot represent nested columns.
    #[snafu(display("CSV output does not support column '{field}' of type {data_type}"))]
    CsvUnsupportedType {
        /// Column name.
        field: String,
        /// Arrow type of the column.
        data_type: String,
    },

    /// The output file (or its temporary sibling) could not be created.
    #[snafu(display("Failed to open output {path}: {source}"))]
    OpenOutput {
        /// Path that failed.
        path: String,
        /// Underlying filesystem error.
        source: std::io::Error,
    },

    /// Flushing, syncing or renaming the output failed.
    #[snafu(display("Failed to finish output {path}: {source}"))]
    FinishOutput {
        /// Path that failed.
        path: String,
        /// Underlying filesystem error.
        source: std::io::Error,
    },

    /// The conversion task panicked or was cancelled.
    #[snafu(display("Conversion task failed: {source}"))]
    TaskFailed {
        /// Join error from the runtime.
        source: tokio::task::JoinError,
    },

    /// The reader on the other end of stdout went away.
    #[snafu(display("Broken pipe while writing to stdout"))]
    BrokenPipe,
}

impl ConvertError {
    /// True when the failure came from a closed downstream pipe.
    ///
    /// Also walks the source chain so an EPIPE surfacing through a writer
    /// that kept its `io::Error` is recognized.
    pub fn is_broken_pipe(&self) -> bool {
        if matches!(self, ConvertError::BrokenPipe) {
            return true;
        }

        let mut current: Option<&(dyn std::error::Error + 'static)> =
            std::error::Error::source(self);
        while let Some(err) = current {
            if let Some(io) = err.downcast_ref::<std::io::Error>() {
                if io.kind() == std::io::ErrorKind::BrokenPipe {
                    return true;
                }
            }
            current = err.source();
        }
        false
    }
}
