use std::time::Duration;

use anyhow::Result;

/// How long to let client-side rendering settle after navigation.
#[derive(Debug, Clone)]
pub enum WaitPolicy {
    /// Fixed wall-clock delay.
    Fixed(Duration),
    /// Poll a selector until it matches or the timeout elapses.
    Selector {
        css: String,
        timeout: Duration,
        poll: Duration,
    },
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy::Fixed(Duration::from_millis(1000))
    }
}

/// Page-rendering session capability. The extraction core only ever sees
/// this trait, never a concrete browser type.
#[allow(async_fn_in_trait)]
pub trait Session {
    type Element: ElementHandle;

    async fn navigate(&self, url: &str) -> Result<()>;
    async fn clear_cookies(&self) -> Result<()>;
    async fn execute_script(&self, script: &str) -> Result<()>;
    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Element>>;
    /// Apply the session's wait policy after navigation.
    async fn settle(&self) -> Result<()>;
}

/// A located element: trimmed text, child cells, screenshot.
#[allow(async_fn_in_trait)]
pub trait ElementHandle: Sized {
    async fn text(&self) -> Result<String>;
    async fn find_all(&self, selector: &str) -> Result<Vec<Self>>;
    /// PNG-encoded image of the element as rendered.
    async fn screenshot(&self) -> Result<Vec<u8>>;
}

// ── Test doubles ──
