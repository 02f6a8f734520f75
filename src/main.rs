// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::fs;
use std::io::BufWriter;
use std::path::Path;

use clap::Parser;

use dupmark::{
    annotate_records, load_ranges, resolve_spans, OffsetTable, RecordSet, SeparatorConfig,
    SeparatorCounter,
};

mod cli;
use cli::{separator_from_args, Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Encode {
            input,
            column,
            stream,
            sizes,
            pre_sep,
            post_sep,
        } => run_encode(&input, &column, &stream, &sizes, &pre_sep, &post_sep),
        Commands::Annotate {
            input,
            column,
            sizes,
            ranges,
            output,
            pre_sep,
            post_sep,
            max_trim,
        } => run_annotate(
            &input, &column, &sizes, &ranges, &output, &pre_sep, &post_sep, max_trim,
        ),
        Commands::Inspect { file } => run_inspect(&file),
    };

    if let Err(e) = result {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

/// Serialize a record table into the dedup tool's two inputs: the
/// concatenated byte stream and the `.size` offset table.
fn run_encode(
    input: &str,
    column: &str,
    stream: &str,
    sizes: &str,
    pre_sep: &str,
    post_sep: &str,
) -> Result<(), Box<dyn Error>> {
    let separator = separator_from_args(pre_sep, post_sep)?;
    let records = RecordSet::load(Path::new(input))?;
    eprintln!("  loaded {} records from {}", records.len(), input);

    let mut counter = SeparatorCounter::new();
    let mut writer = BufWriter::new(fs::File::create(stream)?);

    let table = encode_with_progress(&records, column, &separator, &mut counter, &mut writer)?;
    drop(writer);
    table.save(Path::new(sizes))?;

    eprintln!(
        "  ✓ wrote {} ({} bytes, separator width {})",
        stream,
        table.total_bytes(),
        separator.width()
    );
    eprintln!(
        "  ✓ wrote {} ({} entries for {} records)",
        sizes,
        table.entries().len(),
        table.record_count()
    );
    Ok(())
}

#[cfg(feature = "parallel")]
fn encode_with_progress<W: std::io::Write>(
    records: &RecordSet,
    column: &str,
    separator: &SeparatorConfig,
    counter: &mut SeparatorCounter,
    writer: &mut W,
) -> Result<OffsetTable, dupmark::EncodeError> {
    use indicatif::{ProgressBar, ProgressStyle};

    let progress = ProgressBar::new(records.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("  encoding [{bar:30}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let table = dupmark::encode::encode_records_with_progress(
        records, column, separator, counter, writer, &progress,
    )?;
    progress.finish_and_clear();
    Ok(table)
}

#[cfg(not(feature = "parallel"))]
fn encode_with_progress<W: std::io::Write>(
    records: &RecordSet,
    column: &str,
    separator: &SeparatorConfig,
    counter: &mut SeparatorCounter,
    writer: &mut W,
) -> Result<OffsetTable, dupmark::EncodeError> {
    dupmark::encode_records(records, column, separator, counter, writer)
}

/// Fold a `.byterange` file back onto the record table that was encoded,
/// writing the enriched table with `is_duplicated` / `duplicated_strings`.
#[allow(clippy::too_many_arguments)]
fn run_annotate(
    input: &str,
    column: &str,
    sizes: &str,
    ranges_path: &str,
    output: &str,
    pre_sep: &str,
    post_sep: &str,
    max_trim: usize,
) -> Result<(), Box<dyn Error>> {
    let separator = separator_from_args(pre_sep, post_sep)?;
    let records = RecordSet::load(Path::new(input))?;
    let table = OffsetTable::load(Path::new(sizes))?;

    // The offset table is strictly tied to one encode run over this table;
    // a count mismatch means the wrong .size file and every downstream
    // offset would be misattributed.
    if table.record_count() != records.len() {
        return Err(format!(
            "offset table {} delimits {} records but {} has {}",
            sizes,
            table.record_count(),
            input,
            records.len()
        )
        .into());
    }

    let ranges = load_ranges(Path::new(ranges_path))?;
    eprintln!(
        "  loaded {} records, {} duplicate ranges",
        records.len(),
        ranges.len()
    );

    let resolution = resolve_spans(&table, &ranges, &separator)?;
    for event in &resolution.report.overflows {
        eprintln!("  ⚠ exceed bounds: {}", event);
    }
    for event in &resolution.report.invalid {
        eprintln!("  ⚠ skipped: {}", event);
    }
    eprintln!(
        "  resolved {} spans across {} records ({} overflow, {} invalid)",
        resolution.report.resolved,
        resolution.spans.len(),
        resolution.report.overflow_count(),
        resolution.report.invalid_count()
    );

    let (annotated, report) = annotate_records(&records, column, &resolution.spans, max_trim)?;
    annotated.save(Path::new(output))?;

    eprintln!(
        "  ✓ wrote {} (# dupped rows: {}, # not dupped: {})",
        output, report.duplicated, report.clean
    );
    Ok(())
}

/// Display the structure of a `.size` offset-table file.
fn run_inspect(file: &str) -> Result<(), Box<dyn Error>> {
    let table = OffsetTable::load(Path::new(file))?;
    let count = table.record_count();

    let mut smallest = u64::MAX;
    let mut largest = 0u64;
    for i in 0..count {
        if let Some((start, end)) = table.bounds(i) {
            let len = end - start;
            smallest = smallest.min(len);
            largest = largest.max(len);
        }
    }
    let mean = if count > 0 {
        table.total_bytes() / count as u64
    } else {
        0
    };

    const W: usize = 58;
    println!("┌─ OFFSET TABLE {}┐", "─".repeat(W - 15));
    println!("│  File:          {:<w$}│", file, w = W - 17);
    println!("│  Records:       {:<w$}│", count, w = W - 17);
    println!(
        "│  Stream size:   {:<w$}│",
        format_size(table.total_bytes() as usize),
        w = W - 17
    );
    if count > 0 {
        println!(
            "│  Record bytes:  {:<w$}│",
            format!(
                "min {} / mean {} / max {} (separator included)",
                smallest, mean, largest
            ),
            w = W - 17
        );
    }
    println!("└{}┘", "─".repeat(W));
    Ok(())
}

/// Format bytes as human-readable size
fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}
