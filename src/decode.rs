// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Span decoder and record annotator.
//!
//! Duplicate ranges come from a byte-level suffix array, so a resolved span
//! may begin or end in the middle of a multi-byte UTF-8 character. Decoding
//! therefore runs a bounded boundary-adjustment search: try the exact slice,
//! then retry with up to `max_trim` bytes (default 3, since the widest UTF-8
//! sequence is 4 bytes) trimmed from the end, the start, or both. The first
//! adjustment that decodes wins; if none does, the span is unrecoverable and
//! the record is named in the error — corrupted text is never substituted.
//!
//! Annotation is embarrassingly parallel across records: each record reads
//! only its own payload and its own slice of the span map. With the
//! `parallel` feature the work runs on the rayon pool; either way every
//! record is attempted and the error for the lowest record index wins, so
//! failures are deterministic.

use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use serde_json::Value;

use crate::records::RecordSet;
use crate::types::{DupSpanMap, LocalSpan, DEFAULT_MAX_TRIM};

/// Name of the derived boolean column.
pub const IS_DUPLICATED_COLUMN: &str = "is_duplicated";

/// Name of the derived duplicate-substrings column.
pub const DUPLICATED_STRINGS_COLUMN: &str = "duplicated_strings";

/// Errors that abort annotation.
#[derive(Debug)]
pub enum DecodeError {
    /// The designated text column does not exist in the record set.
    MissingColumn { name: String },
    /// A record has resolved spans but no text payload to slice.
    MissingPayload { record: usize },
    /// A span starts past the record's payload: the span map was built
    /// against a different record set.
    SpanOutOfBounds {
        record: usize,
        span: LocalSpan,
        payload_len: usize,
    },
    /// No adjustment within the bounded search space yielded valid text.
    UndecodableSpan { record: usize, span: LocalSpan },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::MissingColumn { name } => {
                write!(f, "text column '{}' not found in record set", name)
            }
            DecodeError::MissingPayload { record } => {
                write!(f, "record {} has spans to decode but no text payload", record)
            }
            DecodeError::SpanOutOfBounds { record, span, payload_len } => write!(
                f,
                "span ({}, {}) exceeds record {}'s payload length {}",
                span.start, span.end, record, payload_len
            ),
            DecodeError::UndecodableSpan { record, span } => write!(
                f,
                "span ({}, {}) of record {} has no decodable boundary adjustment",
                span.start, span.end, record
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Bounded boundary-adjustment search over a byte slice.
///
/// Tries `bytes[s..len - e]` for every trim pair `(s, e)` with
/// `s, e <= max_trim`, end trims first within each start-trim level, and
/// returns the first slice that is valid UTF-8. `None` if the whole search
/// space fails.
pub fn decode_adjusted(bytes: &[u8], max_trim: usize) -> Option<&str> {
    for start_trim in 0..=max_trim {
        for end_trim in 0..=max_trim {
            if start_trim + end_trim > bytes.len() {
                continue;
            }
            let slice = &bytes[start_trim..bytes.len() - end_trim];
            if let Ok(text) = std::str::from_utf8(slice) {
                return Some(text);
            }
        }
    }
    None
}

/// Decode one resolved span of a record's payload.
///
/// Resolved span ends are measured against the encoded record, which is a
/// separator wider than the payload, so an end past the payload is clamped
/// to it. A start past the payload has no such excuse and is an error.
pub fn decode_span(
    payload: &[u8],
    span: LocalSpan,
    record: usize,
    max_trim: usize,
) -> Result<String, DecodeError> {
    if span.start > payload.len() {
        return Err(DecodeError::SpanOutOfBounds {
            record,
            span,
            payload_len: payload.len(),
        });
    }
    let end = span.end.min(payload.len());
    decode_adjusted(&payload[span.start..end], max_trim)
        .map(str::to_string)
        .ok_or(DecodeError::UndecodableSpan { record, span })
}

/// Annotation totals for the run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotateReport {
    pub duplicated: usize,
    pub clean: usize,
}

/// Decoded annotation for one record.
type RowAnnotation = (bool, Vec<String>);

fn annotate_row(
    records: &RecordSet,
    column: usize,
    spans: &DupSpanMap,
    record: usize,
    max_trim: usize,
) -> Result<RowAnnotation, DecodeError> {
    let Some(span_list) = spans.get(&record) else {
        return Ok((false, Vec::new()));
    };

    let text = records
        .text_at(record, column)
        .ok_or(DecodeError::MissingPayload { record })?;
    let payload = text.as_bytes();

    let mut decoded = Vec::with_capacity(span_list.len());
    for span in span_list {
        decoded.push(decode_span(payload, *span, record, max_trim)?);
    }
    Ok((true, decoded))
}

/// Annotate every record with its duplication flag and decoded substrings.
///
/// Returns a new record set with two appended columns:
/// `is_duplicated` (bool) and `duplicated_strings` (the literal rendering of
/// the decoded list, empty string for clean records).
pub fn annotate_records(
    records: &RecordSet,
    column: &str,
    spans: &DupSpanMap,
    max_trim: usize,
) -> Result<(RecordSet, AnnotateReport), DecodeError> {
    let column_idx = records
        .column_index(column)
        .ok_or_else(|| DecodeError::MissingColumn {
            name: column.to_string(),
        })?;

    #[cfg(feature = "parallel")]
    let results: Vec<Result<RowAnnotation, DecodeError>> = (0..records.len())
        .into_par_iter()
        .map(|record| annotate_row(records, column_idx, spans, record, max_trim))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let results: Vec<Result<RowAnnotation, DecodeError>> = (0..records.len())
        .map(|record| annotate_row(records, column_idx, spans, record, max_trim))
        .collect();

    // Lowest record index wins: deterministic regardless of worker order.
    let mut annotations = Vec::with_capacity(results.len());
    for result in results {
        annotations.push(result?);
    }

    let mut report = AnnotateReport::default();
    let mut columns = records.columns().to_vec();
    columns.push(IS_DUPLICATED_COLUMN.to_string());
    columns.push(DUPLICATED_STRINGS_COLUMN.to_string());

    let rows = records
        .rows()
        .iter()
        .zip(annotations)
        .map(|(row, (is_duplicated, decoded))| {
            if is_duplicated {
                report.duplicated += 1;
            } else {
                report.clean += 1;
            }
            let rendered = if is_duplicated {
                format!("{:?}", decoded)
            } else {
                String::new()
            };
            let mut enriched = row.clone();
            enriched.push(Value::Bool(is_duplicated));
            enriched.push(Value::String(rendered));
            enriched
        })
        .collect();

    Ok((RecordSet::new(columns, rows), report))
}

/// Convenience wrapper using the default trim depth.
pub fn annotate_records_default(
    records: &RecordSet,
    column: &str,
    spans: &DupSpanMap,
) -> Result<(RecordSet, AnnotateReport), DecodeError> {
    annotate_records(records, column, spans, DEFAULT_MAX_TRIM)
}
