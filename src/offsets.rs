// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Offset table: the data contract between the stream encoder and the span
//! resolver.
//!
//! For N records the table holds N+1 non-decreasing u64 entries. Entry i is
//! the global stream position where record i begins (its separator included);
//! entry i+1 is where it ends; entry 0 is always 0 and the final entry is the
//! total stream length.
//!
//! # File format (`.size`)
//!
//! A flat array of u64 little-endian integers, no header, no framing. This is
//! exactly what suffix-array deduplication tooling expects alongside the
//! concatenated stream, so nothing may be added to it. All structural
//! validation therefore happens on load.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Cumulative byte offsets delimiting records within a concatenated stream.
///
/// Strictly associated with one encoder run. Monotonicity and the leading
/// zero are validated at every construction site, so downstream code can
/// index `[table[i], table[i+1])` without re-checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetTable {
    offsets: Vec<u64>,
}

impl OffsetTable {
    /// Start a new table for an encode run. Always begins at offset 0.
    pub fn new() -> Self {
        Self { offsets: vec![0] }
    }

    /// Build from raw entries, validating the table invariants.
    pub fn from_entries(offsets: Vec<u64>) -> io::Result<Self> {
        if offsets.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "offset table is empty (need at least the leading zero entry)",
            ));
        }
        if offsets[0] != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("offset table must start at 0, got {}", offsets[0]),
            ));
        }
        for i in 1..offsets.len() {
            if offsets[i] < offsets[i - 1] {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "offset table not monotonic at entry {}: {} < {}",
                        i,
                        offsets[i],
                        offsets[i - 1]
                    ),
                ));
            }
        }
        Ok(Self { offsets })
    }

    /// Append one record boundary: the previous cumulative offset plus the
    /// record's encoded length (separator included).
    pub fn push_record(&mut self, encoded_len: u64) {
        let last = *self.offsets.last().unwrap_or(&0);
        self.offsets.push(last + encoded_len);
    }

    /// Number of records delimited by this table.
    pub fn record_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Total stream length in bytes.
    pub fn total_bytes(&self) -> u64 {
        *self.offsets.last().unwrap_or(&0)
    }

    /// Global `[start, end)` interval of record `i`, separator included.
    pub fn bounds(&self, i: usize) -> Option<(u64, u64)> {
        let start = *self.offsets.get(i)?;
        let end = *self.offsets.get(i + 1)?;
        Some((start, end))
    }

    /// Raw entries, length `record_count() + 1`.
    pub fn entries(&self) -> &[u64] {
        &self.offsets
    }

    /// Serialize as flat u64 LE.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for offset in &self.offsets {
            w.write_all(&offset.to_le_bytes())?;
        }
        Ok(())
    }

    /// Write a `.size` file.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut buf = Vec::with_capacity(self.offsets.len() * 8);
        self.write_to(&mut buf)?;
        fs::write(path, buf)
    }

    /// Load a `.size` file, validating shape and monotonicity.
    pub fn load(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Parse a flat u64 LE array.
    pub fn from_bytes(bytes: &[u8]) -> io::Result<Self> {
        if bytes.len() % 8 != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "offset table length {} is not a multiple of 8",
                    bytes.len()
                ),
            ));
        }
        let offsets: Vec<u64> = bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                u64::from_le_bytes(raw)
            })
            .collect();
        Self::from_entries(offsets)
    }
}

impl Default for OffsetTable {
    fn default() -> Self {
        Self::new()
    }
}
