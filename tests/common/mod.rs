//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;

use dupmark::{encode_records, OffsetTable, RecordSet, SeparatorConfig, SeparatorCounter};

/// Record set with an `id` column and the given `input` texts.
pub fn record_set(texts: &[&str]) -> RecordSet {
    RecordSet::new(
        vec!["id".to_string(), "input".to_string()],
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| vec![Value::from(i), Value::from(*t)])
            .collect(),
    )
}

/// Write the texts as a CSV table and return its path.
pub fn write_csv(dir: &Path, name: &str, texts: &[&str]) -> PathBuf {
    let path = dir.join(name);
    record_set(texts).save(&path).unwrap();
    path
}

/// Encode the texts with the default separator, writing `data.stream` and
/// `data.stream.size` into `dir`.
pub fn encode_to_files(dir: &Path, texts: &[&str]) -> (PathBuf, PathBuf, OffsetTable) {
    let records = record_set(texts);
    let config = SeparatorConfig::default();
    let mut counter = SeparatorCounter::new();

    let stream_path = dir.join("data.stream");
    let mut stream = Vec::new();
    let table = encode_records(&records, "input", &config, &mut counter, &mut stream).unwrap();
    fs::write(&stream_path, stream).unwrap();

    let sizes_path = dir.join("data.stream.size");
    table.save(&sizes_path).unwrap();
    (stream_path, sizes_path, table)
}

/// Write a `.byterange` file the way the dedup tool emits one: chatter,
/// a marker line, then one `start end` pair per line.
pub fn write_range_file(dir: &Path, name: &str, ranges: &[(u64, u64)]) -> PathBuf {
    let path = dir.join(name);
    let mut file = fs::File::create(&path).unwrap();
    writeln!(file, "Loading suffix array...").unwrap();
    writeln!(file, "Duplicates found: {}", ranges.len()).unwrap();
    writeln!(file, "Writing out the duplicate ranges").unwrap();
    for (start, end) in ranges {
        writeln!(file, "{} {}", start, end).unwrap();
    }
    path
}
