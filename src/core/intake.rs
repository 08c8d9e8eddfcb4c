use crate::domain::model::{Cell, RowMatrix};
use crate::utils::error::{ImportError, Result};
use std::path::Path;

pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["csv", "txt", "tsv", "tab"];

/// 依副檔名決定分隔符號
pub fn delimiter_for(path: &str) -> u8 {
    match Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("tsv") | Some("tab") => b'\t',
        _ => b',',
    }
}

/// Parses raw file bytes into a rectangular row matrix.
///
/// Fully blank rows are dropped and short rows are padded with [`Cell::Empty`]
/// so every row has the width of the widest one. A leading UTF-8 BOM is ignored
/// and bytes that are not valid UTF-8 become U+FFFD instead of failing the parse.
pub fn parse_csv(bytes: &[u8], delimiter: u8) -> Result<RowMatrix> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut rows: RowMatrix = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        let row: Vec<Cell> = record
            .iter()
            .map(|field| Cell::from_field(&String::from_utf8_lossy(field)))
            .collect();
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        rows.push(row);
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if rows.len() < 2 || width < 2 {
        return Err(ImportError::EmptyInputError);
    }

    for row in rows.iter_mut() {
        row.resize(width, Cell::Empty);
    }

    tracing::debug!("Parsed {} row(s) x {} column(s)", rows.len(), width);
    Ok(rows)
}
