pub mod locate;
pub mod rows;

use anyhow::Result;
use tracing::info;

use crate::artifacts::ArtifactStore;
use crate::ocr::TextRecognizer;
use crate::output::PageResult;
use crate::session::Session;
use locate::TableLayout;
use rows::RowExtractor;

/// Per-page pipeline: heading rows first, then whichever main-table
/// layout the locator picked. "No table" is not an error; the page just
/// yields its heading rows (possibly none).
pub async fn process_page<S: Session, R: TextRecognizer>(
    session: &S,
    recognizer: &R,
    url: &str,
    artifacts: Option<&ArtifactStore>,
) -> Result<PageResult> {
    let mut results = locate::heading_rows(session).await?;

    let extractor = RowExtractor::new(recognizer, artifacts, url);
    match locate::locate(session).await? {
        TableLayout::Compact(table) => results.extend(extractor.compact(&table).await?),
        TableLayout::Bordered(table) => results.extend(extractor.bordered(&table).await?),
        TableLayout::None => info!("no tables found on {}", url),
    }

    Ok(results)
}

// ── Tests ──
