// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Stream encoder: records in, one concatenated byte stream plus an offset
//! table out.
//!
//! Each record is written as `separator || payload` where the separator
//! carries a uid that increments once per record. The table entry appended
//! after each write is `previous_cumulative_offset + len(separator || payload)`,
//! so the finished table always has `record_count + 1` entries starting at 0.
//!
//! Encoding is strictly ordered and fail-fast: a record whose designated text
//! column is missing or non-textual aborts the run with the offending record
//! index. Partial output may exist on disk but the table is never returned.

use std::fmt;
use std::io::{self, Write};

#[cfg(feature = "parallel")]
use indicatif::ProgressBar;

use crate::offsets::OffsetTable;
use crate::records::RecordSet;
use crate::types::{SeparatorConfig, SeparatorCounter};

/// Errors that abort an encode run.
#[derive(Debug)]
pub enum EncodeError {
    /// The designated text column does not exist in the record set.
    MissingColumn { name: String },
    /// A record's text cell is absent, null, or not a string.
    NonTextPayload { record: usize },
    /// The u32 separator uid space ran out mid-run.
    SeparatorExhausted { record: usize },
    /// The underlying stream writer failed.
    Io(io::Error),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::MissingColumn { name } => {
                write!(f, "text column '{}' not found in record set", name)
            }
            EncodeError::NonTextPayload { record } => {
                write!(f, "record {} has no text payload in the designated column", record)
            }
            EncodeError::SeparatorExhausted { record } => {
                write!(f, "separator uid space exhausted at record {}", record)
            }
            EncodeError::Io(err) => write!(f, "stream write failed: {}", err),
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodeError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for EncodeError {
    fn from(err: io::Error) -> Self {
        EncodeError::Io(err)
    }
}

/// Serialize every record's text column into `out`, returning the offset
/// table for the run.
///
/// The separator counter is threaded in explicitly so callers control uid
/// continuity; a fresh counter gives a fresh deterministic run.
pub fn encode_records<W: Write>(
    records: &RecordSet,
    column: &str,
    config: &SeparatorConfig,
    counter: &mut SeparatorCounter,
    out: &mut W,
) -> Result<OffsetTable, EncodeError> {
    let column_idx = records
        .column_index(column)
        .ok_or_else(|| EncodeError::MissingColumn {
            name: column.to_string(),
        })?;

    let mut table = OffsetTable::new();
    for record in 0..records.len() {
        let text = records
            .text_at(record, column_idx)
            .ok_or(EncodeError::NonTextPayload { record })?;
        let uid = counter
            .next_uid()
            .ok_or(EncodeError::SeparatorExhausted { record })?;

        let separator = config.render(uid);
        out.write_all(&separator)?;
        out.write_all(text.as_bytes())?;
        table.push_record((separator.len() + text.len()) as u64);
    }

    Ok(table)
}

/// Same as [`encode_records`], updating a progress bar per record.
#[cfg(feature = "parallel")]
pub fn encode_records_with_progress<W: Write>(
    records: &RecordSet,
    column: &str,
    config: &SeparatorConfig,
    counter: &mut SeparatorCounter,
    out: &mut W,
    progress: &ProgressBar,
) -> Result<OffsetTable, EncodeError> {
    let column_idx = records
        .column_index(column)
        .ok_or_else(|| EncodeError::MissingColumn {
            name: column.to_string(),
        })?;

    let mut table = OffsetTable::new();
    for record in 0..records.len() {
        let text = records
            .text_at(record, column_idx)
            .ok_or(EncodeError::NonTextPayload { record })?;
        let uid = counter
            .next_uid()
            .ok_or(EncodeError::SeparatorExhausted { record })?;

        let separator = config.render(uid);
        out.write_all(&separator)?;
        out.write_all(text.as_bytes())?;
        table.push_record((separator.len() + text.len()) as u64);

        progress.set_position((record + 1) as u64);
    }

    Ok(table)
}
