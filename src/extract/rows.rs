use anyhow::Result;
use tracing::debug;

use crate::artifacts::{image_name, ArtifactStore};
use crate::ocr::{read_cell, TextRecognizer};
use crate::output::{CellValue, Row};
use crate::session::ElementHandle;

/// Rows with fewer raw cells are visual separators, not data.
const MIN_CELLS: usize = 3;

/// Strip a leading ordinal prefix like "3. " from a row label. Only the
/// first 10 characters are examined, so labels that legitimately contain
/// ". " later in the text are left alone.
pub fn strip_numbering(text: &str) -> &str {
    let window = match text.char_indices().nth(10) {
        Some((end, _)) => &text[..end],
        None => text,
    };
    match window.find(". ") {
        Some(pos) => &text[pos + 2..],
        None => text,
    }
}

/// Walks a located table's rows, reconciling graphical cells through the
/// recognizer. Debug names use the physical row position within the
/// table, so skipped rows still consume an index.
pub struct RowExtractor<'a, R> {
    recognizer: &'a R,
    artifacts: Option<&'a ArtifactStore>,
    url: &'a str,
}

impl<'a, R: TextRecognizer> RowExtractor<'a, R> {
    pub fn new(recognizer: &'a R, artifacts: Option<&'a ArtifactStore>, url: &'a str) -> Self {
        Self {
            recognizer,
            artifacts,
            url,
        }
    }

    /// Compact layout: [index, label, graphical value] per row; the OCR
    /// lines are flattened into the row as plain text slots.
    pub async fn compact<E: ElementHandle>(&self, table: &E) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        for (i, tr) in table.find_all("tr").await?.iter().enumerate() {
            let cells = tr.find_all("td").await?;
            if cells.len() < MIN_CELLS {
                continue;
            }
            let label = strip_numbering(&cells[1].text().await?).to_string();
            let shot = cells[2].screenshot().await?;
            let lines = read_cell(self.recognizer, &shot, self.artifact_for(i, None))?;

            let mut row = vec![CellValue::Text(label)];
            row.extend(lines.into_iter().map(CellValue::Text));
            rows.push(row);
        }
        Ok(rows)
    }

    /// Bordered layout: a header row read from the `th` cells (index 1
    /// onward), then data rows whose metric slots are each one OCR line
    /// sequence.
    pub async fn bordered<E: ElementHandle>(&self, table: &E) -> Result<Vec<Row>> {
        let mut header = Vec::new();
        for th in table.find_all("th").await?.iter().skip(1) {
            header.push(CellValue::Text(th.text().await?));
        }
        let mut rows = vec![header];

        let trs = table.find_all("tr").await?;
        let total = trs.len();
        for (i, tr) in trs.iter().enumerate() {
            debug!("row {}/{}", i + 1, total);
            let cells = tr.find_all("td").await?;
            if cells.len() < MIN_CELLS {
                continue;
            }
            let label = strip_numbering(&cells[1].text().await?).to_string();

            let mut row = vec![CellValue::Text(label)];
            for (j, cell) in cells[2..].iter().enumerate() {
                let shot = cell.screenshot().await?;
                let lines = read_cell(self.recognizer, &shot, self.artifact_for(i, Some(j)))?;
                row.push(CellValue::Lines(lines));
            }
            rows.push(row);
        }
        Ok(rows)
    }

    fn artifact_for(&self, row: usize, col: Option<usize>) -> Option<(&ArtifactStore, String)> {
        self.artifacts
            .map(|store| (store, image_name(self.url, row, col)))
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_ordinal() {
        assert_eq!(strip_numbering("3. Revenue"), "Revenue");
        assert_eq!(strip_numbering("12. Margin"), "Margin");
    }

    #[test]
    fn no_prefix_unchanged() {
        assert_eq!(strip_numbering("No prefix here"), "No prefix here");
    }

    #[test]
    fn separator_straddling_window_boundary_unchanged() {
        // "Quarterly." fills the 10-char window; the space lands at
        // position 10, outside it
        assert_eq!(strip_numbering("Quarterly. Total"), "Quarterly. Total");
    }

    #[test]
    fn separator_past_window_unchanged() {
        assert_eq!(strip_numbering("Accumulated. Total"), "Accumulated. Total");
    }

    #[test]
    fn separator_inside_window_strips_once() {
        assert_eq!(strip_numbering("1. A. Revenue"), "A. Revenue");
    }

    #[test]
    fn short_and_empty_inputs() {
        assert_eq!(strip_numbering(""), "");
        assert_eq!(strip_numbering("9. X"), "X");
    }

    #[test]
    fn multibyte_label_does_not_panic() {
        assert_eq!(strip_numbering("3. Umsätze"), "Umsätze");
        assert_eq!(strip_numbering("Ümsätze über alles"), "Ümsätze über alles");
    }
}
