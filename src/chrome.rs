use anyhow::{anyhow, Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::ClearBrowserCookiesParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::{Element, Page};
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error};

use crate::session::{ElementHandle, Session, WaitPolicy};

/// Oversized window so wide bordered tables render without clipping
/// before cells are screenshotted.
const WINDOW_WIDTH: u32 = 60_000;
const WINDOW_HEIGHT: u32 = 6_000;

/// Owns the headless Chrome process and its CDP event loop. Launched once
/// before the batch and closed exactly once after it; dropping the driver
/// also kills the child process, so early error returns don't leak it.
pub struct ChromeDriver {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl ChromeDriver {
    pub async fn launch() -> Result<Self> {
        let config = BrowserConfig::builder()
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .build()
            .map_err(|e| anyhow!("Invalid browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch headless Chrome")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    error!("CDP event handler error: {}", e);
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    pub async fn new_session(&self, wait: WaitPolicy) -> Result<ChromeSession> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open page")?;
        Ok(ChromeSession { page, wait })
    }

    pub async fn close(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .context("Failed to close browser")?;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }
}

/// One browser tab plus the wait policy applied after each navigation.
pub struct ChromeSession {
    page: Page,
    wait: WaitPolicy,
}

impl Session for ChromeSession {
    type Element = ChromeElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Failed to load {}", url))?;
        Ok(())
    }

    async fn clear_cookies(&self) -> Result<()> {
        self.page
            .execute(ClearBrowserCookiesParams::default())
            .await
            .context("Failed to clear cookies")?;
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> Result<()> {
        self.page
            .evaluate(script)
            .await
            .context("Script execution failed")?;
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ChromeElement>> {
        let found = self
            .page
            .find_elements(selector)
            .await
            .with_context(|| format!("Query failed for {:?}", selector))?;
        Ok(found.into_iter().map(ChromeElement).collect())
    }

    async fn settle(&self) -> Result<()> {
        match &self.wait {
            WaitPolicy::Fixed(delay) => sleep(*delay).await,
            WaitPolicy::Selector { css, timeout, poll } => {
                let deadline = tokio::time::Instant::now() + *timeout;
                loop {
                    let found = self.page.find_elements(css.as_str()).await;
                    if matches!(&found, Ok(els) if !els.is_empty()) {
                        break;
                    }
                    if tokio::time::Instant::now() >= deadline {
                        debug!("settle: selector {:?} never matched", css);
                        break;
                    }
                    sleep(*poll).await;
                }
            }
        }
        Ok(())
    }
}

pub struct ChromeElement(Element);

impl ElementHandle for ChromeElement {
    async fn text(&self) -> Result<String> {
        let text = self
            .0
            .inner_text()
            .await
            .context("Failed to read element text")?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Self>> {
        let found = self
            .0
            .find_elements(selector)
            .await
            .with_context(|| format!("Child query failed for {:?}", selector))?;
        Ok(found.into_iter().map(ChromeElement).collect())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.0
            .screenshot(CaptureScreenshotFormat::Png)
            .await
            .context("Failed to capture cell screenshot")
    }
}
