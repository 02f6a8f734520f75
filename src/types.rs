// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Core data model shared by the encoder, resolver and annotator.
//!
//! Everything here lives in one of two coordinate spaces:
//!
//! - **global**: byte offsets into the concatenated stream the encoder
//!   produces (separators included). The offset table and duplicate ranges
//!   use this space.
//! - **local**: byte offsets into a single record's payload (separator
//!   excluded). Resolved spans use this space.
//!
//! The separator is the only thing that couples the two spaces, so its
//! configuration is modeled explicitly: the resolver's boundary correction is
//! always `SeparatorConfig::width()`, never an assumed constant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default separator prefix tag written before each record.
pub const DEFAULT_PREFIX_TAG: &[u8] = b"\xff\xff";

/// Byte width of the separator's unique id (u32 little-endian).
pub const UID_WIDTH: usize = 4;

/// Default boundary-adjustment search depth, in bytes per edge.
///
/// The widest UTF-8 sequence is 4 bytes, so trimming up to 3 bytes from an
/// edge is enough to reach a character boundary if one exists near it.
pub const DEFAULT_MAX_TRIM: usize = 3;

/// A duplicate byte interval reported by the external suffix-array tool,
/// in global stream coordinates. `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DupRange {
    pub start: u64,
    pub end: u64,
}

impl DupRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }
}

/// A duplicate interval translated into one record's payload coordinates.
///
/// Invariant (enforced by the resolver): `start <= end <= record_len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSpan {
    pub start: usize,
    pub end: usize,
}

impl LocalSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Record index → resolved spans, in discovery order. Records absent from
/// the map have no duplication. Built once, then only read.
pub type DupSpanMap = BTreeMap<usize, Vec<LocalSpan>>;

/// Separator layout: `prefix_tag || uid (u32 LE) || suffix_tag`.
///
/// Both the encoder and the resolver take the same config; `width()` is the
/// boundary-correction offset, so the two sides cannot disagree as long as
/// they share one `SeparatorConfig` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatorConfig {
    prefix: Vec<u8>,
    suffix: Vec<u8>,
}

impl SeparatorConfig {
    pub fn new(prefix: Vec<u8>, suffix: Vec<u8>) -> Self {
        Self { prefix, suffix }
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    pub fn suffix(&self) -> &[u8] {
        &self.suffix
    }

    /// Total separator width in bytes: `prefix + 4 + suffix`.
    ///
    /// 6 for the default configuration (2-byte prefix, empty suffix).
    pub fn width(&self) -> usize {
        self.prefix.len() + UID_WIDTH + self.suffix.len()
    }

    /// Render the separator for a given uid.
    pub fn render(&self, uid: u32) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width());
        out.extend_from_slice(&self.prefix);
        out.extend_from_slice(&uid.to_le_bytes());
        out.extend_from_slice(&self.suffix);
        out
    }
}

impl Default for SeparatorConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX_TAG.to_vec(),
            suffix: Vec::new(),
        }
    }
}

/// Monotonically increasing separator uid source for one encode run.
///
/// Threaded through the encoder explicitly so independent runs get
/// independent, deterministic uid sequences. Ids start at 1 and never repeat
/// within a run; exhausting the u32 space is surfaced as `None` rather than
/// wrapping, since a repeated id would make offset attribution ambiguous to
/// any downstream consumer that parses separators.
#[derive(Debug, Clone, Default)]
pub struct SeparatorCounter {
    last: u32,
}

impl SeparatorCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unique id, or `None` once the u32 space is exhausted.
    pub fn next_uid(&mut self) -> Option<u32> {
        self.last = self.last.checked_add(1)?;
        Some(self.last)
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u32 {
        self.last
    }
}
