// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! CLI definitions for the dupmark command-line interface.
//!
//! Three subcommands: `encode` to serialize a record table into the byte
//! stream and `.size` offset table the external dedup tool consumes,
//! `annotate` to fold the tool's `.byterange` output back onto the records,
//! and `inspect` to examine a `.size` file. The separator tags are hex
//! strings so shells never see raw bytes.

use std::fmt;

use clap::{Parser, Subcommand};

use dupmark::SeparatorConfig;

#[derive(Parser)]
#[command(
    name = "dupmark",
    about = "Offset-table companion for suffix-array text deduplication",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serialize records into a separator-framed byte stream plus offset table
    Encode {
        /// Input table (.csv with header row, or .json array of objects)
        #[arg(short, long)]
        input: String,

        /// Name of the text column to serialize
        #[arg(short, long, default_value = "input")]
        column: String,

        /// Output path for the concatenated byte stream
        #[arg(short, long)]
        stream: String,

        /// Output path for the offset table (flat u64 LE array)
        #[arg(long)]
        sizes: String,

        /// Separator prefix tag, hex encoded
        #[arg(long, default_value = "ffff")]
        pre_sep: String,

        /// Separator suffix tag, hex encoded (empty by default)
        #[arg(long, default_value = "")]
        post_sep: String,
    },

    /// Map duplicate byte ranges back onto records and write the enriched table
    Annotate {
        /// Input table: the same file that was encoded
        #[arg(short, long)]
        input: String,

        /// Name of the text column that was serialized
        #[arg(short, long, default_value = "input")]
        column: String,

        /// Offset table produced by the encode run
        #[arg(long)]
        sizes: String,

        /// Duplicate-range file from the external dedup tool (.byterange)
        #[arg(short, long)]
        ranges: String,

        /// Output path for the annotated table (.csv or .json)
        #[arg(short, long)]
        output: String,

        /// Separator prefix tag, hex encoded (must match the encode run)
        #[arg(long, default_value = "ffff")]
        pre_sep: String,

        /// Separator suffix tag, hex encoded (must match the encode run)
        #[arg(long, default_value = "")]
        post_sep: String,

        /// Boundary-adjustment search depth in bytes per edge
        #[arg(long, default_value_t = 3)]
        max_trim: usize,
    },

    /// Display the structure of a .size offset-table file
    Inspect {
        /// Path to the .size file
        file: String,
    },
}

/// A malformed hex separator tag on the command line.
#[derive(Debug)]
pub struct TagParseError {
    pub tag: String,
}

impl fmt::Display for TagParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "separator tag '{}' is not an even-length hex string",
            self.tag
        )
    }
}

impl std::error::Error for TagParseError {}

/// Decode a hex-encoded separator tag. The empty string is an empty tag.
pub fn parse_hex_tag(tag: &str) -> Result<Vec<u8>, TagParseError> {
    if tag.len() % 2 != 0 || !tag.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TagParseError {
            tag: tag.to_string(),
        });
    }
    Ok(tag
        .as_bytes()
        .chunks_exact(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16).unwrap_or(0) as u8;
            let lo = (pair[1] as char).to_digit(16).unwrap_or(0) as u8;
            (hi << 4) | lo
        })
        .collect())
}

/// Build the separator config shared by the encode and annotate paths.
pub fn separator_from_args(pre_sep: &str, post_sep: &str) -> Result<SeparatorConfig, TagParseError> {
    Ok(SeparatorConfig::new(
        parse_hex_tag(pre_sep)?,
        parse_hex_tag(post_sep)?,
    ))
}
