//! Resolve whole inventory tables.
//!
//! Reads a CSV (or a plain list of names), resolves every row through a
//! [`Pipeline`] and writes the input columns back out followed by `smiles`,
//! `status` and `matched_name`. Row order is preserved in every mode.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read, Write},
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

use clap::ValueEnum;
use csv::{ReaderBuilder, Writer};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::{
    error::{LookupError, Result},
    memoize::{CacheMode, LookupCache},
    normalize::NameForms,
    pipeline::{Pipeline, Resolution},
};

/// Columns appended to every output row.
pub const RESULT_COLUMNS: [&str; 3] = ["smiles", "status", "matched_name"];

/// Parallelism strategy for batch lookups.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum ParallelMode {
    /// Resolve rows one after another. Gentlest on PubChem's rate limits.
    None,
    /// Resolve rows on the rayon thread pool.
    Always,
}

/// Layout of the batch input file.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum InputFormat {
    /// CSV with a header row.
    Csv,
    /// One name per line, no header. Blank lines are skipped.
    Lines,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Header of the column holding chemical names (CSV input only).
    pub column: String,
    pub format: InputFormat,
    pub parallel: ParallelMode,
    pub cache: CacheMode,
    /// Log progress every this many rows; 0 disables progress logging.
    pub progress_every: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            column: "name".to_string(),
            format: InputFormat::Csv,
            parallel: ParallelMode::None,
            cache: CacheMode::Name,
            progress_every: 25,
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub rows: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub cache_hits: usize,
}

/// An input table held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Index of the name column in `headers`.
    pub name_index: usize,
}

impl Table {
    pub fn names(&self) -> Vec<&str> {
        self.rows
            .iter()
            .map(|row| row.get(self.name_index).map_or("", String::as_str))
            .collect()
    }
}

pub fn read_table<R: Read>(reader: R, options: &BatchOptions) -> Result<Table> {
    match options.format {
        InputFormat::Csv => read_csv(reader, &options.column),
        InputFormat::Lines => read_lines(reader),
    }
}

fn read_csv<R: Read>(reader: R, column: &str) -> Result<Table> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let name_index = headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| LookupError::MissingColumn(column.to_string()))?;

    let width = headers.len();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.len() > width {
            let line = record.position().map_or(0, |p| p.line());
            warn!(line, fields = row.len(), width, "dropping cells beyond the header");
            row.truncate(width);
        }
        rows.push(row);
    }
    Ok(Table {
        headers,
        rows,
        name_index,
    })
}

fn read_lines<R: Read>(reader: R) -> Result<Table> {
    let mut rows = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        if !line.trim().is_empty() {
            rows.push(vec![line.trim().to_string()]);
        }
    }
    Ok(Table {
        headers: vec!["name".to_string()],
        rows,
        name_index: 0,
    })
}

pub fn write_table<W: Write>(writer: W, table: &Table, results: &[Resolution]) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    let width = table.headers.len();

    let mut header = table.headers.clone();
    header.extend(RESULT_COLUMNS.iter().map(|c| c.to_string()));
    writer.write_record(&header)?;

    for (row, res) in table.rows.iter().zip(results) {
        let mut record = row.clone();
        record.resize(width, String::new());
        record.push(res.smiles.clone().unwrap_or_default());
        record.push(res.status.to_string());
        record.push(res.matched_name.clone());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Resolve every name of `table`, in row order.
pub fn resolve_table(
    pipeline: &Pipeline,
    table: &Table,
    options: &BatchOptions,
) -> (Vec<Resolution>, BatchSummary) {
    let names = table.names();
    let total = names.len();
    let cache = LookupCache::new(options.cache);
    let done = AtomicUsize::new(0);

    let resolve = |name: &&str| {
        let forms = NameForms::new(name);
        let res = cache.get_or_resolve(&forms, || pipeline.resolve_forms(&forms));
        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
        if options.progress_every > 0 && n % options.progress_every == 0 {
            info!(done = n, total, "batch progress");
        }
        res
    };

    let results: Vec<Resolution> = match options.parallel {
        ParallelMode::None => names.iter().map(resolve).collect(),
        ParallelMode::Always => names.par_iter().map(resolve).collect(),
    };

    let resolved = results.iter().filter(|r| r.is_resolved()).count();
    let summary = BatchSummary {
        rows: total,
        resolved,
        unresolved: total - resolved,
        cache_hits: cache.hits(),
    };
    (results, summary)
}

pub fn run_batch<R: Read, W: Write>(
    pipeline: &Pipeline,
    input: R,
    output: W,
    options: &BatchOptions,
) -> Result<BatchSummary> {
    let table = read_table(input, options)?;
    info!(rows = table.rows.len(), "loaded batch input");
    let (results, summary) = resolve_table(pipeline, &table, options);
    write_table(output, &table, &results)?;
    info!(
        rows = summary.rows,
        resolved = summary.resolved,
        unresolved = summary.unresolved,
        cache_hits = summary.cache_hits,
        "batch finished"
    );
    Ok(summary)
}

pub fn run_batch_files(
    pipeline: &Pipeline,
    input: &Path,
    output: &Path,
    options: &BatchOptions,
) -> Result<BatchSummary> {
    let input = File::open(input)?;
    let output = io::BufWriter::new(File::create(output)?);
    run_batch(pipeline, input, output, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Status;

    #[test]
    fn csv_finds_name_column() {
        let input = "id,name,qty\n1,ethanol,5\n2,acetone,1\n";
        let table = read_table(input.as_bytes(), &BatchOptions::default()).unwrap();
        assert_eq!(table.name_index, 1);
        assert_eq!(table.names(), vec!["ethanol", "acetone"]);
    }

    #[test]
    fn csv_missing_column() {
        let options = BatchOptions {
            column: "chemical".into(),
            ..BatchOptions::default()
        };
        let err = read_table("id,name\n1,ethanol\n".as_bytes(), &options).unwrap_err();
        assert!(matches!(err, LookupError::MissingColumn(c) if c == "chemical"));
    }

    #[test]
    fn short_rows_have_empty_name() {
        let table = read_table("id,name\n1\n".as_bytes(), &BatchOptions::default()).unwrap();
        assert_eq!(table.names(), vec![""]);
    }

    #[test]
    fn wide_rows_keep_result_columns_aligned() {
        let input = "id,name\n1,ethanol\n2,ethanol,extra note\n";
        let table = read_table(input.as_bytes(), &BatchOptions::default()).unwrap();
        assert_eq!(table.rows[1], vec!["2", "ethanol"]);

        let results = vec![Resolution::not_found(), Resolution::not_found()];
        let mut out = Vec::new();
        write_table(&mut out, &table, &results).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "id,name,smiles,status,matched_name\n\
             1,ethanol,,Not found with any method,\n\
             2,ethanol,,Not found with any method,\n"
        );
    }

    #[test]
    fn lines_skip_blanks() {
        let options = BatchOptions {
            format: InputFormat::Lines,
            ..BatchOptions::default()
        };
        let table = read_table("ethanol\n\n  acetone  \n".as_bytes(), &options).unwrap();
        assert_eq!(table.headers, vec!["name"]);
        assert_eq!(table.names(), vec!["ethanol", "acetone"]);
    }

    #[test]
    fn writes_result_columns() {
        let table = Table {
            headers: vec!["id".into(), "name".into()],
            rows: vec![vec!["1".into(), "ethanol".into()], vec!["2".into()]],
            name_index: 1,
        };
        let results = vec![
            Resolution {
                smiles: Some("CCO".into()),
                status: Status::NotFound,
                matched_name: "ethanol".into(),
            },
            Resolution::not_found(),
        ];
        let mut out = Vec::new();
        write_table(&mut out, &table, &results).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "id,name,smiles,status,matched_name\n\
             1,ethanol,CCO,Not found with any method,ethanol\n\
             2,,,Not found with any method,\n"
        );
    }
}
