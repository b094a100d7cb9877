//! Reply thread scraping: browser control, scrolling and extraction.

pub mod browser;
pub mod driver;
pub mod extract;
pub mod scroll;

pub use browser::{BrowserEngineConfig, ChromiumDriver, ChromiumLauncher, SessionKind};
pub use driver::{BrowserLauncher, PageDriver};
pub use extract::{extract_replies, extract_reply, ReplyFilters, ReplySelectors};
pub use scroll::{fetch_fragments, scroll_page, CapturedPage, ScrollOptions};
