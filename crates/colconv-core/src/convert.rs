//! The conversion pipeline: lazy scan -> streamed evaluation -> encoder.
//!
//! [`scan_input`] builds a DataFusion plan over the input file without
//! reading any rows. [`write_output`] executes it as a record-batch stream and
//! feeds each batch to the encoder for the requested format, so memory stays
//! bounded by the batch size rather than the table size.

use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use arrow::datatypes::Schema;
use datafusion::{
    logical_expr::{Expr, cast, ident},
    prelude::{CsvReadOptions, DataFrame, ParquetReadOptions, SessionConfig, SessionContext},
};
use futures_util::StreamExt;
use log::{debug, info};
use snafu::ResultExt;

use crate::{
    error::{
        BrokenPipeSnafu, ConvertResult, DataFusionSnafu, InputMissingSnafu, ParquetToStdoutSnafu,
    },
    format::{InputFormat, OutputFormat, ParquetCompression},
    schema::{SchemaOverrides, csv_parse_schema},
    sink::{Destination, open_output_sink},
    writer::{BatchWriter, WriteSettings},
};

/// Rows per record batch unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Engine execution settings for one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecConfig {
    /// Upper bound on engine parallelism; `None` keeps DataFusion's default
    /// (the number of CPU cores).
    pub threads: Option<NonZeroUsize>,
    /// Rows per record batch.
    pub batch_size: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            threads: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ExecConfig {
    /// Session settings derived from this configuration.
    ///
    /// File scans are not split across partitions so rows are emitted in
    /// input order, and Parquet strings are read as plain `Utf8`/`Binary`
    /// rather than view types so they round-trip unchanged.
    pub fn session_config(&self) -> SessionConfig {
        let mut cfg = SessionConfig::new()
            .with_batch_size(self.batch_size)
            .with_repartition_file_scans(false);
        if let Some(threads) = self.threads {
            cfg = cfg.with_target_partitions(threads.get());
        }
        cfg.options_mut().execution.parquet.schema_force_view_types = false;
        cfg
    }
}

/// Everything one conversion needs. Built once, then read-only.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Source file.
    pub input: PathBuf,
    /// Destination file; `None` writes to stdout.
    pub output: Option<PathBuf>,
    /// How to read `input`.
    pub input_format: InputFormat,
    /// How to write the result.
    pub output_format: OutputFormat,
    /// CSV field separator, used for CSV input and CSV output.
    pub separator: u8,
    /// Declared CSV column types. Ignored for Parquet input.
    pub schema: Option<SchemaOverrides>,
    /// Codec for Parquet output.
    pub compression: ParquetCompression,
    /// Engine settings.
    pub exec: ExecConfig,
}

impl ConvertOptions {
    /// Parquet in, CSV to stdout, comma separated, no schema.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            input_format: InputFormat::default(),
            output_format: OutputFormat::default(),
            separator: b',',
            schema: None,
            compression: ParquetCompression::default(),
            exec: ExecConfig::default(),
        }
    }

    /// Where the result will be written.
    pub fn destination(&self) -> Destination {
        Destination::from_output(self.output.as_deref())
    }

    /// Reject combinations that cannot succeed, before touching any file.
    pub fn validate(&self) -> ConvertResult<()> {
        if self.output.is_none() && !self.output_format.allows_stdout() {
            return ParquetToStdoutSnafu.fail();
        }
        Ok(())
    }

    fn write_settings(&self) -> WriteSettings {
        WriteSettings {
            format: self.output_format,
            separator: self.separator,
            compression: self.compression,
        }
    }
}

/// Summary of a finished conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertReport {
    /// Rows written.
    pub rows: u64,
    /// Columns written.
    pub columns: usize,
    /// Where they went.
    pub destination: Destination,
}

/// Extension filter handed to DataFusion so any file name is accepted.
fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

fn csv_read_options(separator: u8, extension: &str) -> CsvReadOptions<'_> {
    CsvReadOptions::new()
        .has_header(true)
        .delimiter(separator)
        .file_extension(extension)
}

/// Open `opts.input` as a lazy table scan.
pub async fn scan_input(ctx: &SessionContext, opts: &ConvertOptions) -> ConvertResult<DataFrame> {
    let path = opts.input.as_path();
    std::fs::metadata(path).context(InputMissingSnafu {
        path: path.display().to_string(),
    })?;

    let location = path.to_string_lossy().into_owned();
    let extension = file_extension(path);

    match opts.input_format {
        InputFormat::Parquet => {
            if opts.schema.is_some() {
                debug!("Ignoring schema for parquet input {}", path.display());
            }
            let read = ParquetReadOptions {
                file_extension: &extension,
                ..Default::default()
            };
            ctx.read_parquet(location, read)
                .await
                .context(DataFusionSnafu)
        }
        InputFormat::Csv => {
            let inferred = ctx
                .read_csv(
                    location.as_str(),
                    csv_read_options(opts.separator, &extension),
                )
                .await
                .context(DataFusionSnafu)?;

            let Some(overrides) = &opts.schema else {
                return Ok(inferred);
            };

            let declared = overrides.apply(inferred.schema().as_arrow());
            debug!(
                "Reading {} with {} declared column type(s)",
                path.display(),
                overrides.len()
            );
            let parse = csv_parse_schema(&declared);
            let df = ctx
                .read_csv(
                    location.as_str(),
                    csv_read_options(opts.separator, &extension).schema(&parse),
                )
                .await
                .context(DataFusionSnafu)?;

            if parse == declared {
                Ok(df)
            } else {
                cast_to_declared(df, &declared)
            }
        }
    }
}

/// Project `df` onto `declared`, casting columns whose parsed type differs.
fn cast_to_declared(df: DataFrame, declared: &Schema) -> ConvertResult<DataFrame> {
    let parsed = df.schema().as_arrow().clone();
    let exprs: Vec<Expr> = declared
        .fields()
        .iter()
        .zip(parsed.fields())
        .map(|(want, got)| {
            let column = ident(want.name());
            if want.data_type() == got.data_type() {
                column
            } else {
                cast(column, want.data_type().clone()).alias(want.name())
            }
        })
        .collect();

    df.select(exprs).context(DataFusionSnafu)
}

/// Evaluate `df` as a stream and write it according to `opts`.
pub async fn write_output(df: DataFrame, opts: &ConvertOptions) -> ConvertResult<ConvertReport> {
    let destination = opts.destination();
    let schema = df.schema().inner().clone();
    let columns = schema.fields().len();

    let mut stream = df.execute_stream().await.context(DataFusionSnafu)?;

    let sink = open_output_sink(&destination).await?;
    let monitor = sink.pipe_monitor();

    let written = async {
        let mut writer = BatchWriter::try_new(sink, schema, opts.write_settings())?;
        while let Some(item) = stream.next().await {
            let batch = item.context(DataFusionSnafu)?;
            writer.write_batch(&batch)?;
        }
        writer.finish().await
    }
    .await;

    let rows = match written {
        Ok(rows) => rows,
        Err(e) if monitor.is_broken() => {
            debug!("Output pipe closed: {e}");
            return BrokenPipeSnafu.fail();
        }
        Err(e) => return Err(e),
    };

    Ok(ConvertReport {
        rows,
        columns,
        destination,
    })
}

/// Run a whole conversion: validate, scan, evaluate, write.
pub async fn convert(opts: &ConvertOptions) -> ConvertResult<ConvertReport> {
    opts.validate()?;

    let ctx = SessionContext::new_with_config(opts.exec.session_config());
    let df = scan_input(&ctx, opts).await?;
    let report = write_output(df, opts).await?;

    info!(
        "Wrote {} rows ({} columns) from {} to {} as {}",
        report.rows,
        report.columns,
        opts.input.display(),
        report.destination,
        opts.output_format
    );
    Ok(report)
}
