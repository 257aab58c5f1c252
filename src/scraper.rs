use std::time::Instant;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::artifacts::ArtifactStore;
use crate::extract;
use crate::ocr::TextRecognizer;
use crate::output::{PageOutcome, PageResult};
use crate::session::Session;

/// Presentation-only override injected before extraction: bigger
/// high-contrast cells and an unclamped table OCR far better. No effect
/// on the extracted data.
const READABILITY_SCRIPT: &str = concat!(
    r#"document.styleSheets[0].insertRule("td { font-size: 2em !important; "#,
    r#"max-width: 100% !important; background-color: #ffffff !important; }", 0); "#,
    r#"document.styleSheets[0].insertRule("table { height: max-content !important; "#,
    r#"width: max-content !important; }", 0);"#,
);

/// Batch totals computed after completion.
pub struct BatchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

impl BatchStats {
    pub fn of(entries: &[(String, PageOutcome)]) -> Self {
        let ok = entries
            .iter()
            .filter(|(_, o)| matches!(o, PageOutcome::Success(_)))
            .count();
        Self {
            total: entries.len(),
            ok,
            errors: entries.len() - ok,
        }
    }
}

/// Process every URL through the one reused session, sequentially. Each
/// URL gets its own outcome; a failing page is recorded and the batch
/// moves on.
pub async fn scrape_pages<S: Session, R: TextRecognizer>(
    session: &S,
    recognizer: &R,
    urls: &[String],
    artifacts: Option<&ArtifactStore>,
) -> Result<Vec<(String, PageOutcome)>> {
    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut entries = Vec::with_capacity(urls.len());
    for url in urls {
        let outcome = match scrape_one(session, recognizer, url, artifacts).await {
            Ok(rows) => PageOutcome::Success(rows),
            Err(e) => {
                warn!("ERR on {}: {:#}", url, e);
                PageOutcome::Failure(format!("{:#}", e))
            }
        };
        entries.push((url.clone(), outcome));
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(entries)
}

async fn scrape_one<S: Session, R: TextRecognizer>(
    session: &S,
    recognizer: &R,
    url: &str,
    artifacts: Option<&ArtifactStore>,
) -> Result<PageResult> {
    session.clear_cookies().await?;

    let t_load = Instant::now();
    session.navigate(url).await?;
    info!("load: {:.2} sec", t_load.elapsed().as_secs_f64());
    session.settle().await?;

    session.execute_script(READABILITY_SCRIPT).await?;

    let t_process = Instant::now();
    let rows = extract::process_page(session, recognizer, url, artifacts).await?;
    info!("processed: {:.2} sec", t_process.elapsed().as_secs_f64());
    Ok(rows)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::extract::locate;
    use crate::ocr::OcrError;
    use crate::output::CellValue;
    use crate::session::testing::{row, shot_cell, table, text_cell, FakeSession};

    struct FakeRecognizer;

    impl TextRecognizer for FakeRecognizer {
        fn recognize(&self, _image: &[u8]) -> Result<String, OcrError> {
            Ok("50%".to_string())
        }
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|u| u.to_string()).collect()
    }

    #[tokio::test]
    async fn failing_url_does_not_abort_batch() {
        let t = table(
            Vec::new(),
            vec![row(vec![text_cell("1"), text_cell("2. Sales"), shot_cell()])],
        );
        let session = FakeSession {
            selectors: HashMap::from([(locate::COMPACT_SELECTOR.to_string(), vec![t])]),
            failing_urls: vec!["https://b".to_string()],
        };

        let entries = scrape_pages(
            &session,
            &FakeRecognizer,
            &urls(&["https://a", "https://b", "https://c"]),
            None,
        )
        .await
        .unwrap();

        assert_eq!(entries.len(), 3);
        assert!(matches!(entries[0].1, PageOutcome::Success(_)));
        assert!(matches!(entries[1].1, PageOutcome::Failure(_)));
        assert!(matches!(entries[2].1, PageOutcome::Success(_)));

        let map = crate::output::result_map(&entries);
        let keys: Vec<_> = map.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["https://a", "https://c"]);

        let stats = BatchStats::of(&entries);
        assert_eq!((stats.total, stats.ok, stats.errors), (3, 2, 1));
    }

    #[tokio::test]
    async fn successful_page_rows_reach_the_outcome() {
        let t = table(
            Vec::new(),
            vec![row(vec![text_cell("1"), text_cell("2. Sales"), shot_cell()])],
        );
        let session = FakeSession {
            selectors: HashMap::from([(locate::COMPACT_SELECTOR.to_string(), vec![t])]),
            ..Default::default()
        };

        let entries = scrape_pages(&session, &FakeRecognizer, &urls(&["https://a"]), None)
            .await
            .unwrap();

        match &entries[0].1 {
            PageOutcome::Success(rows) => {
                assert_eq!(
                    rows[0],
                    vec![CellValue::text("Sales"), CellValue::text("50%")]
                );
            }
            PageOutcome::Failure(e) => panic!("unexpected failure: {}", e),
        }
    }
}
