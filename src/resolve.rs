// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Span resolver: the single forward merge that turns global duplicate
//! ranges into per-record local spans.
//!
//! Records and ranges are both in non-decreasing offset order, so resolution
//! is a merge with one cursor per sequence — O(records + ranges), never a
//! nested search, and deliberately single-threaded: the cursor only moves
//! forward and each step depends on where the previous one left it.
//!
//! # Boundary correction
//!
//! The dedup tool's offsets include the separator written before each
//! record, so a range that starts inside record i's separator region maps to
//! `local_start = max(start - byte_start - sep_width, 0)`. When the previous
//! range of the same record overran the record's end (`end > byte_end +
//! sep_width`), the current range is known to originate before this record's
//! nominal start and its `local_start` is forced to 0 instead. Overflow is
//! tracked per range, not as a flag reused across iterations, and reported —
//! it means the tool found a match spanning a record boundary, which is a
//! boundary-alignment anomaly rather than corruption. Overflowing ranges are
//! clamped, never dropped.

use std::fmt;

use crate::offsets::OffsetTable;
use crate::types::{DupRange, DupSpanMap, LocalSpan, SeparatorConfig};

/// A range whose end ran past its record's nominal end by more than the
/// separator width. Non-fatal; surfaced for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverflowEvent {
    pub record: usize,
    pub range_index: usize,
    pub range_end: u64,
    pub record_end: u64,
}

impl fmt::Display for OverflowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "range {} ends at {} past record {} end {}",
            self.range_index, self.range_end, self.record, self.record_end
        )
    }
}

/// A range whose clamped local span came out inverted. Skipped, not inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSpanEvent {
    pub record: usize,
    pub range_index: usize,
    pub local_start: usize,
    pub local_end: usize,
}

impl fmt::Display for InvalidSpanEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "range {} resolves to inverted span ({}, {}) in record {}",
            self.range_index, self.local_start, self.local_end, self.record
        )
    }
}

/// Anomaly accounting for one resolver run. Deterministic for fixed inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Ranges successfully converted into local spans.
    pub resolved: usize,
    pub overflows: Vec<OverflowEvent>,
    pub invalid: Vec<InvalidSpanEvent>,
}

impl ResolveReport {
    pub fn overflow_count(&self) -> usize {
        self.overflows.len()
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid.len()
    }
}

/// Output of a resolver run: the span map plus its anomaly report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub spans: DupSpanMap,
    pub report: ResolveReport,
}

/// Fatal resolution failures.
#[derive(Debug)]
pub enum ResolveError {
    /// Ranges remained after the last record: the offset table and the range
    /// file do not describe the same stream.
    UnconsumedRanges {
        consumed: usize,
        total: usize,
        next: DupRange,
    },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::UnconsumedRanges { consumed, total, next } => write!(
                f,
                "{} of {} ranges consumed; next unclaimed range starts at {} past the last record \
                 (offset-table / range-file mismatch)",
                consumed, total, next.start
            ),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Resolve a sorted range list against an offset table.
///
/// The boundary correction is derived from `separator.width()` — callers
/// must pass the same configuration the encoder used.
pub fn resolve_spans(
    table: &OffsetTable,
    ranges: &[DupRange],
    separator: &SeparatorConfig,
) -> Result<Resolution, ResolveError> {
    let sep_width = separator.width() as u64;
    let mut spans = DupSpanMap::new();
    let mut report = ResolveReport::default();
    let mut cursor = 0usize;

    for record in 0..table.record_count() {
        let Some((byte_start, byte_end)) = table.bounds(record) else {
            break;
        };
        let record_len = (byte_end - byte_start) as usize;
        // Overflow status of the record's previous range. Scoped to the
        // record: it never carries across a record boundary.
        let mut previous_overflowed = false;

        while cursor < ranges.len()
            && ranges[cursor].start >= byte_start
            && ranges[cursor].start < byte_end
        {
            let range = ranges[cursor];

            // A predecessor that overran this record's end means the current
            // range originates before the record's nominal start: no further
            // left-shift is applied.
            let local_start = if previous_overflowed {
                0
            } else {
                range.start.saturating_sub(byte_start + sep_width) as usize
            };
            let local_end = ((range.end - byte_start) as usize).min(record_len);

            let overflowed = range.end > byte_end + sep_width;
            if overflowed {
                report.overflows.push(OverflowEvent {
                    record,
                    range_index: cursor,
                    range_end: range.end,
                    record_end: byte_end,
                });
            }

            if local_start > local_end {
                report.invalid.push(InvalidSpanEvent {
                    record,
                    range_index: cursor,
                    local_start,
                    local_end,
                });
            } else {
                spans
                    .entry(record)
                    .or_default()
                    .push(LocalSpan::new(local_start, local_end));
                report.resolved += 1;
            }

            previous_overflowed = overflowed;
            cursor += 1;
        }
    }

    if cursor < ranges.len() {
        return Err(ResolveError::UnconsumedRanges {
            consumed: cursor,
            total: ranges.len(),
            next: ranges[cursor],
        });
    }

    Ok(Resolution { spans, report })
}
