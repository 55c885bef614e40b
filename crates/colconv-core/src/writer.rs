use arrow::{
    array::RecordBatch,
    datatypes::{Schema, SchemaRef},
};
use arrow_json::writer::{JsonArray, LineDelimited};
use parquet::{arrow::ArrowWriter, file::properties::WriterProperties};
use snafu::ResultExt;

use crate::{
    error::{ArrowSnafu, ConvertResult, CsvUnsupportedTypeSnafu, ParquetSnafu},
    format::{OutputFormat, ParquetCompression},
    sink::OutputSink,
};

/// Format-specific knobs for [`BatchWriter`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct WriteSettings {
    pub(crate) format: OutputFormat,
    pub(crate) separator: u8,
    pub(crate) compression: ParquetCompression,
}

enum Encoder {
    Csv(Box<arrow_csv::Writer<OutputSink>>),
    Json(Box<arrow_json::Writer<OutputSink, JsonArray>>),
    Jsonl(Box<arrow_json::Writer<OutputSink, LineDelimited>>),
    Parquet(Box<ArrowWriter<OutputSink>>),
}

/// Serializes record batches into an [`OutputSink`].
pub(crate) struct BatchWriter {
    encoder: Encoder,
    schema: SchemaRef,
    rows: u64,
    batches: usize,
}

impl BatchWriter {
    pub(crate) fn try_new(
        sink: OutputSink,
        schema: SchemaRef,
        settings: WriteSettings,
    ) -> ConvertResult<Self> {
        let encoder = match settings.format {
            OutputFormat::Csv => {
                ensure_csv_supported(schema.as_ref())?;
                let writer = arrow_csv::WriterBuilder::new()
                    .with_header(true)
                    .with_delimiter(settings.separator)
                    .build(sink);
                Encoder::Csv(Box::new(writer))
            }
            OutputFormat::Json => Encoder::Json(Box::new(
                arrow_json::WriterBuilder::new()
                    .with_explicit_nulls(true)
                    .build::<_, JsonArray>(sink),
            )),
            OutputFormat::Jsonl => Encoder::Jsonl(Box::new(
                arrow_json::WriterBuilder::new()
                    .with_explicit_nulls(true)
                    .build::<_, LineDelimited>(sink),
            )),
            OutputFormat::Parquet => {
                let props = WriterProperties::builder()
                    .set_compression(settings.compression.into())
                    .build();
                let writer = ArrowWriter::try_new(sink, schema.clone(), Some(props))
                    .context(ParquetSnafu)?;
                Encoder::Parquet(Box::new(writer))
            }
        };

        Ok(Self {
            encoder,
            schema,
            rows: 0,
            batches: 0,
        })
    }

    pub(crate) fn write_batch(&mut self, batch: &RecordBatch) -> ConvertResult<()> {
        match &mut self.encoder {
            Encoder::Csv(w) => w.write(batch).context(ArrowSnafu)?,
            Encoder::Json(w) => w.write(batch).context(ArrowSnafu)?,
            Encoder::Jsonl(w) => w.write(batch).context(ArrowSnafu)?,
            Encoder::Parquet(w) => w.write(batch).context(ParquetSnafu)?,
        }
        self.rows += batch.num_rows() as u64;
        self.batches += 1;
        Ok(())
    }

    /// Finalize the encoding and commit the sink. Returns the row count.
    pub(crate) async fn finish(mut self) -> ConvertResult<u64> {
        if self.batches == 0 {
            // Still emit the CSV header for an empty result.
            let empty = RecordBatch::new_empty(self.schema.clone());
            self.write_batch(&empty)?;
        }

        let sink = match self.encoder {
            Encoder::Csv(w) => w.into_inner(),
            Encoder::Json(mut w) => {
                w.finish().context(ArrowSnafu)?;
                w.into_inner()
            }
            Encoder::Jsonl(mut w) => {
                w.finish().context(ArrowSnafu)?;
                w.into_inner()
            }
            Encoder::Parquet(w) => w.into_inner().context(ParquetSnafu)?,
        };

        sink.finish().await?;
        Ok(self.rows)
    }
}

/// Reject the first nested column; CSV cells are scalar.
pub(crate) fn ensure_csv_supported(schema: &Schema) -> ConvertResult<()> {
    match schema.fields().iter().find(|f| f.data_type().is_nested()) {
        Some(field) => CsvUnsupportedTypeSnafu {
            field: field.name().to_string(),
            data_type: field.data_type().to_string(),
        }
        .fail(),
        None => Ok(()),
    }
}
