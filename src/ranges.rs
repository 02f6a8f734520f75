// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Parser for the duplicate-range files emitted by suffix-array dedup tools.
//!
//! The format is line-oriented text: everything up to and including the line
//! containing the token `out` is preamble and is ignored, then each line is
//! `"<start> <end>"` — two whitespace-separated global byte offsets, in
//! non-decreasing order of start. A file with no marker line yields an empty
//! range list (nothing was reported as duplicated).

use std::fmt;
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::types::DupRange;

/// Marker token separating the tool's preamble from the range list.
pub const RANGE_MARKER: &str = "out";

/// Errors raised while parsing a duplicate-range file.
#[derive(Debug)]
pub enum RangeFileError {
    Io(io::Error),
    /// A line after the marker was not two integers.
    Malformed { line: usize, content: String },
    /// A range with `start >= end`.
    EmptyRange { line: usize, start: u64, end: u64 },
    /// Range starts are not non-decreasing.
    Unsorted { line: usize, start: u64, previous: u64 },
}

impl fmt::Display for RangeFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeFileError::Io(err) => write!(f, "range file read failed: {}", err),
            RangeFileError::Malformed { line, content } => {
                write!(f, "line {}: expected '<start> <end>', got '{}'", line, content)
            }
            RangeFileError::EmptyRange { line, start, end } => {
                write!(f, "line {}: range [{}, {}) is empty or inverted", line, start, end)
            }
            RangeFileError::Unsorted { line, start, previous } => {
                write!(
                    f,
                    "line {}: range start {} is before previous start {}",
                    line, start, previous
                )
            }
        }
    }
}

impl std::error::Error for RangeFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RangeFileError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for RangeFileError {
    fn from(err: io::Error) -> Self {
        RangeFileError::Io(err)
    }
}

/// Parse duplicate ranges from a reader.
pub fn parse_ranges<R: BufRead>(reader: R) -> Result<Vec<DupRange>, RangeFileError> {
    let mut ranges = Vec::new();
    let mut in_body = false;
    let mut previous_start: Option<u64> = None;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;

        if !in_body {
            if line.contains(RANGE_MARKER) {
                in_body = true;
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let (start, end) = match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), None) => match (a.parse::<u64>(), b.parse::<u64>()) {
                (Ok(start), Ok(end)) => (start, end),
                _ => {
                    return Err(RangeFileError::Malformed {
                        line: line_no,
                        content: trimmed.to_string(),
                    })
                }
            },
            _ => {
                return Err(RangeFileError::Malformed {
                    line: line_no,
                    content: trimmed.to_string(),
                })
            }
        };

        if start >= end {
            return Err(RangeFileError::EmptyRange { line: line_no, start, end });
        }
        if let Some(previous) = previous_start {
            if start < previous {
                return Err(RangeFileError::Unsorted { line: line_no, start, previous });
            }
        }

        previous_start = Some(start);
        ranges.push(DupRange::new(start, end));
    }

    Ok(ranges)
}

/// Load duplicate ranges from a file.
pub fn load_ranges(path: &Path) -> Result<Vec<DupRange>, RangeFileError> {
    let file = fs::File::open(path)?;
    parse_ranges(BufReader::new(file))
}
