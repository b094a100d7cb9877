//! Browser control boundary.
//!
//! The scroll loop is written against these traits; the chromiumoxide
//! implementation lives in [`super::browser`].

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// One controllable page in a browser session.
#[async_trait]
pub trait PageDriver: Send {
    /// Navigate to `url` and wait for the initial document.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Current scrollable height of the document.
    async fn scroll_extent(&mut self) -> Result<u64>;

    /// Scroll the window to the bottom of the document.
    async fn scroll_to_bottom(&mut self) -> Result<()>;

    /// Wait until at least one element matches `selector`.
    ///
    /// Returns `false` when `timeout` elapsed without a match.
    async fn wait_for_presence(&mut self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Inner HTML of every element currently matching `selector`, in document order.
    async fn capture(&mut self, selector: &str) -> Result<Vec<String>>;

    /// End the session and release the browser.
    async fn close(&mut self) -> Result<()>;
}

/// Opens page drivers.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Driver: PageDriver;

    async fn launch(&self) -> Result<Self::Driver>;
}
