use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

/// One slot of an extracted row: plain text, or the line sequence an
/// OCR'd cell produced (bordered-layout metric slots).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Lines(Vec<String>),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }
}

pub type Row = Vec<CellValue>;

/// All rows extracted from one page, in document order.
pub type PageResult = Vec<Row>;

/// Per-URL result. The orchestrator appends one entry per input URL and
/// never mutates it afterwards.
#[derive(Debug)]
pub enum PageOutcome {
    Success(PageResult),
    Failure(String),
}

/// Build the url → rows mapping for successful pages only, in input order.
pub fn result_map(entries: &[(String, PageOutcome)]) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (url, outcome) in entries {
        if let PageOutcome::Success(rows) = outcome {
            map.insert(url.clone(), serde_json::json!(rows));
        }
    }
    serde_json::Value::Object(map)
}

pub fn write_json(path: &Path, entries: &[(String, PageOutcome)]) -> Result<()> {
    let json = serde_json::to_string(&result_map(entries))?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Print one page's rows to stdout, one JSON row per line.
pub fn print_page(url: &str, rows: &PageResult) {
    println!("URL: {}", url);
    for row in rows {
        println!("{}", serde_json::to_string(row).unwrap_or_default());
    }
}

// ── Tests ──
