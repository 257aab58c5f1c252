use anyhow::Result;

use crate::output::{CellValue, Row};
use crate::session::{ElementHandle, Session};

/// Label-only heading rows above the main table.
pub const HEADING_ROWS_SELECTOR: &str = ".table-borderless tr";
/// Compact layout: fixed 3-column rows, single graphical value.
pub const COMPACT_SELECTOR: &str = ".table-responsive";
/// Bordered layout: header row plus variable-width data rows.
pub const BORDERED_SELECTOR: &str = ".table-bordered";

/// The main-table layout found on a page. Pages expose only one true
/// layout, but both selectors may be structurally present; Compact wins
/// ties.
pub enum TableLayout<E> {
    Compact(E),
    Bordered(E),
    None,
}

/// Pick the page's layout in fixed priority order, keeping only the first
/// matching element per selector.
pub async fn locate<S: Session>(session: &S) -> Result<TableLayout<S::Element>> {
    let mut compact = session.query_all(COMPACT_SELECTOR).await?;
    if !compact.is_empty() {
        return Ok(TableLayout::Compact(compact.remove(0)));
    }
    let mut bordered = session.query_all(BORDERED_SELECTOR).await?;
    if !bordered.is_empty() {
        return Ok(TableLayout::Bordered(bordered.remove(0)));
    }
    Ok(TableLayout::None)
}

/// Collect heading rows: the non-empty trimmed texts of each row's cells.
/// These precede the main table's rows in every result, whichever layout
/// is found.
pub async fn heading_rows<S: Session>(session: &S) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for tr in session.query_all(HEADING_ROWS_SELECTOR).await? {
        let mut line = Vec::new();
        for cell in tr.find_all("td").await? {
            let text = cell.text().await?;
            if !text.is_empty() {
                line.push(CellValue::Text(text));
            }
        }
        if !line.is_empty() {
            rows.push(line);
        }
    }
    Ok(rows)
}
