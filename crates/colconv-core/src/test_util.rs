use std::{fs::File, path::Path, sync::Arc};

use arrow::{
    array::{Int64Builder, RecordBatch, StringBuilder},
    datatypes::{DataType, Field, Schema},
};
use parquet::arrow::ArrowWriter;

pub(crate) type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Write `rows` as a single-row-group Parquet file with columns
/// `id: Int64, name: Utf8`.
pub(crate) fn write_people_parquet(path: &Path, rows: &[(i64, &str)]) -> TestResult {
    let mut id_builder = Int64Builder::with_capacity(rows.len());
    let mut name_builder = StringBuilder::new();
    for (id, name) in rows {
        id_builder.append_value(*id);
        name_builder.append_value(name);
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(id_builder.finish()) as _,
            Arc::new(name_builder.finish()),
        ],
    )?;

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
