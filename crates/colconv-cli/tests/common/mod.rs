use std::{path::Path, sync::Arc};

use arrow::array::{BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// `id: Int64, name: Utf8` with the given rows.
#[allow(dead_code)]
pub fn write_people_parquet(path: &Path, rows: &[(i64, &str)]) -> TestResult {
    let mut id_builder = Int64Builder::with_capacity(rows.len());
    let mut name_builder = StringBuilder::new();
    for (id, name) in rows {
        id_builder.append_value(*id);
        name_builder.append_value(name);
    }

    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
    ]);
    let batch = RecordBatch::try_new(
        Arc::new(schema.clone()),
        vec![
            Arc::new(id_builder.finish()) as _,
            Arc::new(name_builder.finish()),
        ],
    )?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, Arc::new(schema), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Trade-like rows: `symbol: Utf8, price: Float64, volume: Int64,
/// is_trade: Boolean, venue: Utf8?` with a null venue every fifth row.
#[allow(dead_code)]
pub fn write_trades_parquet(path: &Path, rows: usize) -> TestResult {
    let mut sym_builder = StringBuilder::new();
    let mut price_builder = Float64Builder::with_capacity(rows);
    let mut volume_builder = Int64Builder::with_capacity(rows);
    let mut trade_builder = BooleanBuilder::with_capacity(rows);
    let mut venue_builder = StringBuilder::new();

    let mut seed = 0xBAD_5EED_u64;
    for i in 0..rows {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        sym_builder.append_value(format!("SYM{}", i % 3));
        price_builder.append_value(100.0 + (seed % 10_000) as f64 / 100.0);
        volume_builder.append_value(1_000 + (seed % 5_000) as i64);
        trade_builder.append_value(i % 2 == 0);
        if i % 5 == 0 {
            venue_builder.append_null();
        } else {
            venue_builder.append_value(format!("X{}", (seed % 7) + 1));
        }
    }

    let schema = Schema::new(vec![
        Field::new("symbol", DataType::Utf8, false),
        Field::new("price", DataType::Float64, false),
        Field::new("volume", DataType::Int64, false),
        Field::new("is_trade", DataType::Boolean, false),
        Field::new("venue", DataType::Utf8, true),
    ]);
    let batch = RecordBatch::try_new(
        Arc::new(schema.clone()),
        vec![
            Arc::new(sym_builder.finish()) as _,
            Arc::new(price_builder.finish()),
            Arc::new(volume_builder.finish()),
            Arc::new(trade_builder.finish()),
            Arc::new(venue_builder.finish()),
        ],
    )?;

    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, Arc::new(schema), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Total rows across all row groups of a Parquet file.
#[allow(dead_code)]
pub fn parquet_row_count(path: &Path) -> TestResult<usize> {
    let file = std::fs::File::open(path)?;
    let reader =
        parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let mut total = 0;
    for batch in reader {
        total += batch?.num_rows();
    }
    Ok(total)
}

/// Column names of a Parquet file, in order.
#[allow(dead_code)]
pub fn parquet_column_names(path: &Path) -> TestResult<Vec<String>> {
    let file = std::fs::File::open(path)?;
    let builder = parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder::try_new(file)?;
    Ok(builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect())
}
