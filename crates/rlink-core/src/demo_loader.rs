//! A minimal CSV-to-`RecordTable` loader.
//!
//! Production ingestion (schema mapping, type coercion, Parquet/DB sources)
//! is out of scope for this crate — callers are expected to arrive with an
//! already-built [`RecordTable`]. This loader exists so the CLI and the
//! integration harness have *some* concrete path from a flat CSV file to
//! that shape; every non-id column is treated as an optional string field.

use std::path::Path;

use rlink_error::{Result, RlinkError};
use rlink_types::record::{FieldValue, Record, RecordTable};
use rlink_types::schema::ColumnMap;

/// Reads `path` as a headered CSV, treating `id_column` as the record id and
/// every other column as a string-valued field (empty cells become absent,
/// per [`Record::from_fields`]'s normalization).
pub fn load_csv(path: &Path, id_column: &str) -> Result<RecordTable> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let id_idx = headers
        .iter()
        .position(|h| h == id_column)
        .ok_or_else(|| RlinkError::config(format!("id column '{id_column}' not found in {}", path.display())))?;

    let field_indices: Vec<usize> = (0..headers.len()).filter(|&i| i != id_idx).collect();
    let field_names: Vec<&str> = field_indices.iter().map(|&i| &headers[i]).collect();
    let columns = ColumnMap::from_names(field_names);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let id = record.get(id_idx).unwrap_or_default();
        let fields = field_indices
            .iter()
            .map(|&i| record.get(i).map(|s| FieldValue::Str(s.into())))
            .collect();
        rows.push(Record::from_fields(id, fields));
    }
    Ok(RecordTable::new(rows, columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_rows_and_normalizes_empty_cells() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "indv_id,fname,mname").unwrap();
        writeln!(file, "a1,jane,").unwrap();
        file.flush().unwrap();

        let table = load_csv(file.path(), "indv_id").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].indv_id.as_ref(), "a1");
        let fname_idx = table.columns.index_of("fname").unwrap();
        assert_eq!(table.rows[0].get(fname_idx).and_then(FieldValue::as_str), Some("jane"));
        let mname_idx = table.columns.index_of("mname").unwrap();
        assert!(table.rows[0].get(mname_idx).is_none());
    }

    #[test]
    fn missing_id_column_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fname").unwrap();
        writeln!(file, "jane").unwrap();
        file.flush().unwrap();

        assert!(load_csv(file.path(), "indv_id").is_err());
    }
}
