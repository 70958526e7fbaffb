//! TSV ingestion of the grants table.

use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{info, warn};

use crate::corpus::normalize::{parse_year, split_researchers, strip_quotes};
use crate::corpus::{GrantCorpus, GrantRecord};
use crate::error::{RecommendError, Result};

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    code: Option<usize>,
    year: Option<usize>,
    title: usize,
    theme: usize,
    researchers: usize,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| strip_quotes(h).eq_ignore_ascii_case(n)))
        };
        let required = |names: &[&str]| {
            find(names).ok_or_else(|| RecommendError::MalformedRecord {
                line: 1,
                reason: format!("header has no {} column", names[0]),
            })
        };
        Ok(Self {
            code: find(&["code", "proposalno", "proposal_no"]),
            year: find(&["year", "time"]),
            title: required(&["title"])?,
            theme: required(&["theme"])?,
            researchers: required(&["researchers", "authors"])?,
        })
    }
}

fn field<'r>(row: &'r StringRecord, idx: Option<usize>) -> &'r str {
    idx.and_then(|i| row.get(i)).unwrap_or("")
}

fn parse_row(row: &StringRecord, cols: Columns, line: u64, row_num: usize) -> Result<GrantRecord> {
    let code = strip_quotes(field(row, cols.code));
    let id = if code.is_empty() {
        format!("row-{row_num}")
    } else {
        code.to_string()
    };
    GrantRecord::new(
        id,
        strip_quotes(field(row, Some(cols.title))),
        strip_quotes(field(row, Some(cols.theme))),
        parse_year(field(row, cols.year)),
        split_researchers(field(row, Some(cols.researchers))),
        line,
    )
}

/// Load the grants TSV at `path`.
///
/// Rows missing a title, theme or researchers, or not valid UTF-8, are
/// skipped with a warning.
/// A missing file or an unusable header fails the whole load.
pub fn load_tsv(path: impl AsRef<Path>) -> Result<GrantCorpus> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(RecommendError::DataNotFound { path: path.to_path_buf() });
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .has_headers(true)
        .from_path(path)
        .map_err(csv_error)?;
    let cols = Columns::resolve(&reader.headers().map_err(csv_error)?.clone())?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (row_num, row) in reader.byte_records().enumerate() {
        let row = row.map_err(csv_error)?;
        let line = row.position().map_or(0, |p| p.line());
        let row = match StringRecord::from_byte_record(row) {
            Ok(row) => row,
            Err(err) => {
                skipped += 1;
                warn!(path = %path.display(), line, err = %err.utf8_error(), "skipping grant row with invalid UTF-8");
                continue;
            }
        };
        if row.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        match parse_row(&row, cols, line, row_num + 1) {
            Ok(record) => records.push(record),
            Err(err) => {
                skipped += 1;
                warn!(path = %path.display(), %err, "skipping grant row");
            }
        }
    }

    info!(path = %path.display(), records = records.len(), skipped, "grant corpus loaded");
    Ok(GrantCorpus::new(records))
}

fn csv_error(err: csv::Error) -> RecommendError {
    match err.into_kind() {
        csv::ErrorKind::Io(io) => RecommendError::Io(io),
        other => RecommendError::MalformedRecord {
            line: 0,
            reason: format!("{other:?}"),
        },
    }
}
