//! Chrome session for scrolling reply feeds.
//!
//! Uses chromiumoxide (CDP) against the user's own Chrome profile, so the
//! feed is served as it would be to the logged-in user.

mod config;

pub use config::BrowserEngineConfig;

#[cfg(feature = "browser")]
use std::path::PathBuf;
#[cfg(feature = "browser")]
use std::time::Duration;

use async_trait::async_trait;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;

use super::driver::{BrowserLauncher, PageDriver};
use crate::error::{Result, ScrapeError};

#[cfg(feature = "browser")]
fn browser_error(context: &str, e: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::Browser(format!("{}: {}", context, e))
}

/// Launches Chrome sessions from a [`BrowserEngineConfig`].
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    config: BrowserEngineConfig,
}

impl ChromiumLauncher {
    pub fn new(config: BrowserEngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BrowserEngineConfig {
        &self.config
    }

    /// Whether sessions connect to a running browser or launch their own.
    pub fn session_kind(&self) -> SessionKind {
        if self.config.remote_url.is_some() {
            SessionKind::Connected
        } else {
            SessionKind::Launched
        }
    }
}

/// How a session obtained its browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Chrome was started for this session.
    Launched,
    /// Attached to a browser at `remote_url` that someone else runs.
    Connected,
}

impl SessionKind {
    /// Only a launched browser is shut down when the session ends;
    /// a connected one just loses its tab.
    pub fn owns_browser(self) -> bool {
        matches!(self, SessionKind::Launched)
    }
}

#[cfg(feature = "browser")]
impl ChromiumLauncher {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/opt/google/chrome/google-chrome",
    ];

    /// Find the Chrome executable.
    fn find_chrome() -> Result<PathBuf> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(PathBuf::from(path));
                    }
                }
            }
        }

        Err(ScrapeError::Browser(
            "Chrome/Chromium not found. Please install it:\n\
             - Arch/Manjaro: sudo pacman -S chromium\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium\n\
             - Or download from: https://www.google.com/chrome/"
                .to_string(),
        ))
    }

    /// Launch a local Chrome on the configured profile.
    async fn launch_local(&self) -> Result<(Browser, chromiumoxide::Handler)> {
        info!("Launching browser (headless={})", self.config.headless);

        let chrome_path = Self::find_chrome()?;
        let (width, height) = self.config.window_size;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(width, height)
            .arg(format!(
                "--profile-directory={}",
                self.config.profile_directory
            ))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        match self.config.resolved_profile_root() {
            Some(root) => {
                debug!("Using Chrome profile root {:?}", root);
                builder = builder.user_data_dir(root);
            }
            None => warn!("No Chrome profile directory found; session will not be logged in"),
        }

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| ScrapeError::Browser(format!("Failed to build browser config: {}", e)))?;

        Browser::launch(config)
            .await
            .map_err(|e| browser_error("Failed to launch browser", e))
    }

    /// Connect to a remote Chrome instance.
    async fn connect_remote(&self, url: &str) -> Result<(Browser, chromiumoxide::Handler)> {
        info!("Connecting to remote browser at {}", url);

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .map_err(|e| browser_error("Failed to connect to remote browser", e))?
            .json()
            .await
            .map_err(|e| browser_error("Failed to parse browser version info", e))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ScrapeError::Browser("No webSocketDebuggerUrl in response".into()))?;

        info!("Connecting to WebSocket: {}", ws_url);
        Browser::connect(ws_url)
            .await
            .map_err(|e| browser_error("Failed to connect to remote browser", e))
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    type Driver = ChromiumDriver;

    async fn launch(&self) -> Result<ChromiumDriver> {
        let kind = self.session_kind();
        let (mut browser, mut handler) = match self.config.remote_url.as_deref() {
            Some(url) => self.connect_remote(url).await?,
            None => self.launch_local().await?,
        };

        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        match browser.new_page("about:blank").await {
            Ok(page) => Ok(ChromiumDriver {
                browser: Some(browser),
                page,
                handler,
                kind,
            }),
            Err(e) => {
                if kind.owns_browser() {
                    let _ = browser.close().await;
                }
                handler.abort();
                Err(browser_error("Failed to open page", e))
            }
        }
    }
}

/// One page in a live Chrome session.
#[cfg(feature = "browser")]
pub struct ChromiumDriver {
    browser: Option<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    kind: SessionKind,
}

#[cfg(feature = "browser")]
impl ChromiumDriver {
    const POLL_INTERVAL: Duration = Duration::from_millis(250);

    async fn count_matches(page: &Page, selector: &str) -> usize {
        // A lookup can fail while the DOM is being replaced; treat it as no match yet.
        page.find_elements(selector)
            .await
            .map(|elements| elements.len())
            .unwrap_or(0)
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| browser_error("Navigation failed", e))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| browser_error("Navigation failed", e))?;
        Ok(())
    }

    async fn scroll_extent(&mut self) -> Result<u64> {
        self.page
            .evaluate("document.body.scrollHeight")
            .await
            .map_err(|e| browser_error("Failed to read scroll height", e))?
            .into_value::<u64>()
            .map_err(|e| browser_error("Unexpected scroll height", e))
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .map_err(|e| browser_error("Failed to scroll", e))?;
        Ok(())
    }

    async fn wait_for_presence(&mut self, selector: &str, timeout: Duration) -> Result<bool> {
        let page = self.page.clone();
        let poll = async move {
            while Self::count_matches(&page, selector).await == 0 {
                tokio::time::sleep(Self::POLL_INTERVAL).await;
            }
        };
        Ok(tokio::time::timeout(timeout, poll).await.is_ok())
    }

    async fn capture(&mut self, selector: &str) -> Result<Vec<String>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| browser_error("Failed to query containers", e))?;

        let mut fragments = Vec::with_capacity(elements.len());
        for element in elements {
            match element.inner_html().await {
                Ok(Some(html)) => fragments.push(html),
                Ok(None) => {}
                // Detached by virtualized scrolling between query and read.
                Err(e) => debug!("Skipping detached container: {}", e),
            }
        }
        Ok(fragments)
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };

        if !self.kind.owns_browser() {
            // Leave the user's browser running, only drop our tab.
            let result = self
                .page
                .clone()
                .close()
                .await
                .map_err(|e| browser_error("Failed to close page", e));
            self.handler.abort();
            drop(browser);
            return result;
        }

        let result = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| browser_error("Failed to close browser", e));
        let _ = browser.wait().await;
        self.handler.abort();
        result
    }
}

#[cfg(feature = "browser")]
impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        // Browser's own drop kills a launched child process; a connected
        // browser has none and keeps running.
        self.handler.abort();
    }
}

/// Stub driver when browser support is not compiled in.
#[cfg(not(feature = "browser"))]
pub struct ChromiumDriver;

#[cfg(not(feature = "browser"))]
#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(&mut self, _url: &str) -> Result<()> {
        Err(not_compiled())
    }

    async fn scroll_extent(&mut self) -> Result<u64> {
        Err(not_compiled())
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        Err(not_compiled())
    }

    async fn wait_for_presence(
        &mut self,
        _selector: &str,
        _timeout: std::time::Duration,
    ) -> Result<bool> {
        Err(not_compiled())
    }

    async fn capture(&mut self, _selector: &str) -> Result<Vec<String>> {
        Err(not_compiled())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    type Driver = ChromiumDriver;

    async fn launch(&self) -> Result<ChromiumDriver> {
        Err(not_compiled())
    }
}

#[cfg(not(feature = "browser"))]
fn not_compiled() -> ScrapeError {
    ScrapeError::Browser(
        "Browser support not compiled. Rebuild with: cargo build --features browser".to_string(),
    )
}
