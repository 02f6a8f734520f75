// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Tabular record source and sink.
//!
//! Records arrive as rows of a CSV file (header row required) or a JSON array
//! of objects, with one designated text column. The storage format is a
//! collaborator concern: this module only materializes rows into a
//! `RecordSet` and writes an enriched copy back out. Cells are held as
//! `serde_json::Value` so JSON inputs keep their field types across the
//! annotate round-trip; CSV cells are plain strings.

use std::fs;
use std::io;
use std::path::Path;

use serde_json::Value;

/// Supported tabular formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Json,
}

impl TableFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "unsupported table format {:?} for {} (expected .csv or .json)",
                    other.unwrap_or(""),
                    path.display()
                ),
            )),
        }
    }
}

/// An ordered, fully materialized set of records.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RecordSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Text cell at `(row, column)`. `None` if the cell is absent, null, or
    /// not a string — the encoder turns that into a hard error rather than
    /// silently skipping the record.
    pub fn text_at(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column)?.as_str()
    }

    /// Load from `path`, inferring the format from the extension.
    pub fn load(path: &Path) -> io::Result<Self> {
        match TableFormat::from_path(path)? {
            TableFormat::Csv => Self::load_csv(path),
            TableFormat::Json => Self::load_json(path),
        }
    }

    /// Save to `path`, inferring the format from the extension.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        match TableFormat::from_path(path)? {
            TableFormat::Csv => self.save_csv(path),
            TableFormat::Json => self.save_json(path),
        }
    }

    pub fn load_csv(path: &Path) -> io::Result<Self> {
        let mut reader = csv::Reader::from_path(path).map_err(csv_to_io)?;
        let columns: Vec<String> = reader
            .headers()
            .map_err(csv_to_io)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(csv_to_io)?;
            rows.push(record.iter().map(|cell| Value::from(cell)).collect());
        }
        Ok(Self { columns, rows })
    }

    pub fn save_csv(&self, path: &Path) -> io::Result<()> {
        let mut writer = csv::Writer::from_path(path).map_err(csv_to_io)?;
        writer.write_record(&self.columns).map_err(csv_to_io)?;
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(render_cell).collect();
            writer.write_record(&cells).map_err(csv_to_io)?;
        }
        writer.flush()
    }

    /// Load a JSON array of objects. Columns are the sorted union of keys
    /// across all objects; absent fields become nulls.
    pub fn load_json(path: &Path) -> io::Result<Self> {
        let raw = fs::read_to_string(path)?;
        let parsed: Vec<serde_json::Map<String, Value>> =
            serde_json::from_str(&raw).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("{}: expected a JSON array of objects: {}", path.display(), e),
                )
            })?;

        let mut columns: Vec<String> = Vec::new();
        for object in &parsed {
            for key in object.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        columns.sort();

        let rows = parsed
            .into_iter()
            .map(|mut object| {
                columns
                    .iter()
                    .map(|key| object.remove(key).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Ok(Self { columns, rows })
    }

    pub fn save_json(&self, path: &Path) -> io::Result<()> {
        let objects: Vec<serde_json::Map<String, Value>> = self
            .rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect();
        let serialized = serde_json::to_string_pretty(&objects)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        fs::write(path, serialized)
    }
}

/// Render a cell for CSV output. Strings pass through untouched; everything
/// else uses its JSON rendering (so `true` stays `true`, not `"true"`).
fn render_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn csv_to_io(err: csv::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_round_trip_preserves_cells() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_temp(&dir, "in.csv", "id,input\n0,hello world\n1,second row\n");

        let records = RecordSet::load(&input).unwrap();
        assert_eq!(records.columns(), &["id", "input"]);
        assert_eq!(records.len(), 2);
        let column = records.column_index("input").unwrap();
        assert_eq!(records.text_at(0, column), Some("hello world"));
        assert_eq!(records.text_at(1, column), Some("second row"));

        let output = dir.path().join("out.csv");
        records.save(&output).unwrap();
        let reloaded = RecordSet::load(&output).unwrap();
        assert_eq!(reloaded, records);
    }

    #[test]
    fn json_round_trip_preserves_types() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_temp(
            &dir,
            "in.json",
            r#"[{"id": 0, "input": "hello"}, {"id": 1, "input": "world"}]"#,
        );

        let records = RecordSet::load(&input).unwrap();
        assert_eq!(records.columns(), &["id", "input"]);
        assert_eq!(records.rows()[0][0], Value::from(0));

        let output = dir.path().join("out.json");
        records.save(&output).unwrap();
        let reloaded = RecordSet::load(&output).unwrap();
        assert_eq!(reloaded, records);
    }

    #[test]
    fn json_missing_field_becomes_null() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_temp(&dir, "in.json", r#"[{"input": "a"}, {"id": 1}]"#);

        let records = RecordSet::load(&input).unwrap();
        let column = records.column_index("input").unwrap();
        assert_eq!(records.text_at(0, column), Some("a"));
        assert_eq!(records.text_at(1, column), None);
    }

    #[test]
    fn non_string_cell_is_not_text() {
        let records = RecordSet::new(
            vec!["input".to_string()],
            vec![vec![Value::from(42)]],
        );
        assert_eq!(records.text_at(0, 0), None);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = TableFormat::from_path(Path::new("data.xlsx")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
