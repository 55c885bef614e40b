//! Schema files: column name -> type tag mappings used to coerce CSV columns.
//!
//! A schema file is either JSON (`.json`, a single object) or a Python pickle
//! (`.pkl`, a single dict). Values name a [`TypeTag`]; entries with anything
//! else are dropped with a warning rather than failing the run. When nothing
//! usable remains the loader reports "no schema", which callers treat exactly
//! like an omitted `--schema` flag.

use std::{collections::BTreeMap, path::Path, sync::Arc};

use arrow::datatypes::{DataType, Field, Schema};
use log::warn;
use snafu::ResultExt;

use crate::{
    dtype::TypeTag,
    error::{
        ConvertResult, ParseJsonSchemaSnafu, ParsePickleSchemaSnafu, ReadSchemaFileSnafu,
        SchemaFileMissingSnafu, SchemaNotAMappingSnafu, UnsupportedSchemaExtensionSnafu,
    },
};

/// Supported schema file encodings, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFileKind {
    /// `.json`: a JSON object.
    Json,
    /// `.pkl`: a pickled dict.
    Pickle,
}

impl SchemaFileKind {
    /// Pick the decoder for `path` from its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(SchemaFileKind::Json),
            Some("pkl") => Some(SchemaFileKind::Pickle),
            _ => None,
        }
    }
}

/// Declared Arrow types for a subset of columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaOverrides {
    columns: BTreeMap<String, DataType>,
}

impl SchemaOverrides {
    /// Translate raw `(column, type name)` pairs.
    ///
    /// Unknown type names are skipped with a warning. Returns `None` when no
    /// entry survives.
    pub fn translate<I, K, V>(entries: I) -> Option<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut columns = BTreeMap::new();
        for (column, dtype) in entries {
            let column = column.into();
            match dtype.as_ref().parse::<TypeTag>() {
                Ok(tag) => {
                    columns.insert(column, tag.to_arrow());
                }
                Err(_) => {
                    warn!(
                        "Unsupported dtype '{}' for column '{column}', skipping",
                        dtype.as_ref()
                    );
                }
            }
        }

        if columns.is_empty() {
            None
        } else {
            Some(Self { columns })
        }
    }

    /// Declared type for `column`, if any.
    pub fn get(&self, column: &str) -> Option<&DataType> {
        self.columns.get(column)
    }

    /// Number of columns with a declared type.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false for values produced by [`SchemaOverrides::translate`].
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate `(column, type)` pairs in column-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataType)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overlay the declared types onto an inferred schema.
    ///
    /// Field order and names come from `inferred`; overridden fields become
    /// nullable. Declared columns missing from `inferred` are reported and
    /// ignored.
    pub fn apply(&self, inferred: &Schema) -> Schema {
        for column in self.columns.keys() {
            if inferred.field_with_name(column).is_err() {
                warn!("Schema column '{column}' is not present in the input, ignoring");
            }
        }

        let fields: Vec<Arc<Field>> = inferred
            .fields()
            .iter()
            .map(|field| match self.columns.get(field.name()) {
                Some(dt) => Arc::new(Field::new(field.name(), dt.clone(), true)),
                None => Arc::clone(field),
            })
            .collect();

        Schema::new_with_metadata(fields, inferred.metadata().clone())
    }
}

/// Type the CSV reader produces for a column declared as `declared`.
///
/// Arrow's CSV parser has no `Duration` or `Binary` support. Those columns are
/// read as integer microseconds and as text, then cast to the declared type.
pub fn csv_parse_type(declared: &DataType) -> DataType {
    match declared {
        DataType::Duration(_) => DataType::Int64,
        DataType::Binary | DataType::LargeBinary => DataType::Utf8,
        other => other.clone(),
    }
}

/// `declared` with every field replaced by its [`csv_parse_type`].
pub fn csv_parse_schema(declared: &Schema) -> Schema {
    let fields: Vec<Arc<Field>> = declared
        .fields()
        .iter()
        .map(|field| {
            let parse_type = csv_parse_type(field.data_type());
            if &parse_type == field.data_type() {
                Arc::clone(field)
            } else {
                Arc::new(field.as_ref().clone().with_data_type(parse_type))
            }
        })
        .collect();

    Schema::new_with_metadata(fields, declared.metadata().clone())
}

/// Load and translate a schema file.
///
/// Missing files, unsupported extensions and undecodable contents are fatal.
/// Unknown type names are not.
pub fn load_schema(path: &Path) -> ConvertResult<Option<SchemaOverrides>> {
    let display = path.display().to_string();

    std::fs::metadata(path).context(SchemaFileMissingSnafu {
        path: display.clone(),
    })?;

    let Some(kind) = SchemaFileKind::from_path(path) else {
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        return UnsupportedSchemaExtensionSnafu {
            path: display,
            extension,
        }
        .fail();
    };

    let bytes = std::fs::read(path).context(ReadSchemaFileSnafu {
        path: display.clone(),
    })?;

    let entries = match kind {
        SchemaFileKind::Json => json_entries(&display, &bytes)?,
        SchemaFileKind::Pickle => pickle_entries(&display, &bytes)?,
    };

    Ok(SchemaOverrides::translate(entries))
}

fn json_entries(path: &str, bytes: &[u8]) -> ConvertResult<Vec<(String, String)>> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).context(ParseJsonSchemaSnafu { path })?;

    let map = match value {
        serde_json::Value::Object(map) => map,
        other => {
            return SchemaNotAMappingSnafu {
                path,
                found: json_kind(&other),
            }
            .fail();
        }
    };

    Ok(map
        .into_iter()
        .map(|(column, dtype)| {
            let dtype = match dtype {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (column, dtype)
        })
        .collect())
}

fn json_kind(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
    .to_string()
}

fn pickle_entries(path: &str, bytes: &[u8]) -> ConvertResult<Vec<(String, String)>> {
    use serde_pickle::{DeOptions, HashableValue, Value};

    let value = serde_pickle::value_from_slice(bytes, DeOptions::new())
        .context(ParsePickleSchemaSnafu { path })?;

    let map = match value {
        Value::Dict(map) => map,
        other => {
            return SchemaNotAMappingSnafu {
                path,
                found: format!("{other:?}"),
            }
            .fail();
        }
    };

    Ok(map
        .into_iter()
        .map(|(column, dtype)| {
            let column = match column {
                HashableValue::String(s) => s,
                other => format!("{other:?}"),
            };
            let dtype = match dtype {
                Value::String(s) => s,
                other => format!("{other:?}"),
            };
            (column, dtype)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use arrow::datatypes::{DataType, Field, Schema};
    use tempfile::TempDir;

    use super::*;
    use crate::error::ConvertError;

    type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

    fn write_pickle(path: &Path, map: &BTreeMap<String, String>) -> TestResult {
        let bytes = serde_pickle::to_vec(map, serde_pickle::SerOptions::new())?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    #[test]
    fn every_tag_translates_to_its_arrow_type() -> TestResult {
        let tmp = TempDir::new()?;
        for tag in TypeTag::ALL {
            let path = tmp.path().join(format!("{}.json", tag.name()));
            std::fs::write(&path, format!(r#"{{"col": "{}"}}"#, tag.name()))?;

            let schema = load_schema(&path)?.ok_or("expected a schema")?;
            assert_eq!(schema.len(), 1);
            assert_eq!(schema.get("col"), Some(&tag.to_arrow()));
        }
        Ok(())
    }

    #[test]
    fn json_unknown_tags_are_dropped() -> TestResult {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("schema.json");
        std::fs::write(
            &path,
            r#"{"id": "Int64", "tags": "List[Utf8]", "score": 3, "name": "Utf8"}"#,
        )?;

        let schema = load_schema(&path)?.ok_or("expected a schema")?;
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.get("id"), Some(&DataType::Int64));
        assert_eq!(schema.get("name"), Some(&DataType::Utf8));
        assert!(schema.get("tags").is_none());
        assert!(schema.get("score").is_none());
        Ok(())
    }

    #[test]
    fn no_recognized_columns_means_no_schema() -> TestResult {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("schema.json");
        std::fs::write(&path, r#"{"a": "Struct", "b": "whatever"}"#)?;
        assert!(load_schema(&path)?.is_none());

        let empty = tmp.path().join("empty.json");
        std::fs::write(&empty, "{}")?;
        assert!(load_schema(&empty)?.is_none());
        Ok(())
    }

    #[test]
    fn pickle_schema_loads() -> TestResult {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("schema.pkl");
        let mut map = BTreeMap::new();
        map.insert("id".to_string(), "UInt32".to_string());
        map.insert("when".to_string(), "Date".to_string());
        map.insert("blob".to_string(), "Mystery".to_string());
        write_pickle(&path, &map)?;

        let schema = load_schema(&path)?.ok_or("expected a schema")?;
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.get("id"), Some(&DataType::UInt32));
        assert_eq!(schema.get("when"), Some(&DataType::Date32));
        Ok(())
    }

    #[test]
    fn missing_file_is_fatal() -> TestResult {
        let tmp = TempDir::new()?;
        let err = load_schema(&tmp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConvertError::SchemaFileMissing { .. }));
        Ok(())
    }

    #[test]
    fn unsupported_extension_is_fatal() -> TestResult {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("schema.yaml");
        std::fs::write(&path, "id: Int64\n")?;

        match load_schema(&path).unwrap_err() {
            ConvertError::UnsupportedSchemaExtension { extension, .. } => {
                assert_eq!(extension, ".yaml");
            }
            other => return Err(format!("unexpected error: {other:?}").into()),
        }
        Ok(())
    }

    #[test]
    fn json_array_is_not_a_mapping() -> TestResult {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("schema.json");
        std::fs::write(&path, r#"["Int64"]"#)?;

        let err = load_schema(&path).unwrap_err();
        assert!(matches!(err, ConvertError::SchemaNotAMapping { .. }));
        Ok(())
    }

    #[test]
    fn malformed_json_is_fatal() -> TestResult {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("schema.json");
        std::fs::write(&path, "{not json")?;

        let err = load_schema(&path).unwrap_err();
        assert!(matches!(err, ConvertError::ParseJsonSchema { .. }));
        Ok(())
    }

    #[test]
    fn apply_overrides_matching_fields_only() -> TestResult {
        let overrides = SchemaOverrides::translate([("price", "Float32"), ("missing", "Int8")])
            .ok_or("expected a schema")?;

        let inferred = Schema::new(vec![
            Field::new("id", DataType::Int64, true),
            Field::new("price", DataType::Int64, true),
        ]);
        let merged = overrides.apply(&inferred);

        assert_eq!(merged.fields().len(), 2);
        assert_eq!(merged.field(0), inferred.field(0));
        assert_eq!(merged.field(1).name(), "price");
        assert_eq!(merged.field(1).data_type(), &DataType::Float32);
        assert!(merged.field(1).is_nullable());
        Ok(())
    }
}
