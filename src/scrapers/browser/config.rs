//! Browser session configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scrapers::ScrollOptions;

/// Browser session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserEngineConfig {
    /// Run in headless mode (default: false).
    /// The reply feed is only served to a logged-in profile, which is
    /// usually set up in a headful session.
    #[serde(default)]
    pub headless: bool,

    /// Chrome user data directory holding the authenticated profile.
    /// Defaults to the platform's Chrome directory.
    #[serde(default)]
    pub profile_root: Option<PathBuf>,

    /// Profile directory name inside `profile_root`.
    #[serde(default = "default_profile_directory")]
    pub profile_directory: String,

    /// Window size; the feed renders more replies per screen on large windows.
    #[serde(default = "default_window_size")]
    pub window_size: (u32, u32),

    /// Seconds to wait for a reply container to appear after each scroll.
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_secs: u64,

    /// Pause after each scroll so lazy content can render, in milliseconds.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Upper bound on scroll rounds for a single page.
    #[serde(default = "default_max_scroll_rounds")]
    pub max_scroll_rounds: usize,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,
}

fn default_profile_directory() -> String {
    "Default".to_string()
}

fn default_window_size() -> (u32, u32) {
    (2560, 1440)
}

fn default_wait_timeout() -> u64 {
    10
}

fn default_settle_delay() -> u64 {
    2000
}

fn default_max_scroll_rounds() -> usize {
    200
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            headless: false,
            profile_root: None,
            profile_directory: default_profile_directory(),
            window_size: default_window_size(),
            wait_timeout_secs: default_wait_timeout(),
            settle_delay_ms: default_settle_delay(),
            max_scroll_rounds: default_max_scroll_rounds(),
            chrome_args: Vec::new(),
            remote_url: None,
        }
    }
}

impl BrowserEngineConfig {
    /// Apply environment variable overrides.
    ///
    /// - `CHROME_PROFILE_DIR` - Chrome user data directory
    /// - `BROWSER_URL` - remote DevTools URL
    /// - `BROWSER_HEADLESS` - `1`/`true` to run headless
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dir) = std::env::var("CHROME_PROFILE_DIR")
            .ok()
            .filter(|s| !s.is_empty())
        {
            self.profile_root = Some(PathBuf::from(shellexpand::tilde(&dir).as_ref()));
        }
        if let Some(url) = std::env::var("BROWSER_URL").ok().filter(|s| !s.is_empty()) {
            self.remote_url = Some(url);
        }
        if let Ok(val) = std::env::var("BROWSER_HEADLESS") {
            self.headless = val == "1" || val.eq_ignore_ascii_case("true");
        }
        self
    }

    /// Profile root, falling back to the platform's Chrome user data directory.
    pub fn resolved_profile_root(&self) -> Option<PathBuf> {
        self.profile_root.clone().or_else(default_chrome_user_data_dir)
    }

    /// Scroll loop parameters derived from this config.
    pub fn scroll_options(&self) -> ScrollOptions {
        ScrollOptions {
            wait_timeout: Duration::from_secs(self.wait_timeout_secs),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            max_rounds: self.max_scroll_rounds,
        }
    }
}

/// Where Chrome keeps its user data on this platform.
fn default_chrome_user_data_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        dirs::data_local_dir().map(|d| d.join("Google").join("Chrome").join("User Data"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir().map(|d| d.join("Google").join("Chrome"))
    } else {
        dirs::config_dir().map(|d| d.join("google-chrome"))
    }
}
