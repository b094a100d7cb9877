//! Shared helper functions for CLI commands.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Settings;
use crate::scrapers::ChromiumLauncher;
use crate::services::{ReplyService, ReplySource, ThreadReplies};

/// Spinner shown while the browser scrolls.
pub fn spinner(message: impl Into<String>) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Reply service backed by a real Chrome session.
pub fn chrome_service(settings: &Settings) -> ReplyService<ChromiumLauncher> {
    ReplyService::new(ChromiumLauncher::new(settings.browser.clone()), settings)
}

/// One-line summary of where a thread's replies came from.
pub fn print_thread_summary(thread: &ThreadReplies) {
    let origin = match thread.source {
        ReplySource::Cache => style("cached").dim(),
        ReplySource::Scraped => style("scraped").green(),
    };
    println!(
        "{} {} replies for {} ({})",
        style("✓").green(),
        thread.replies.len(),
        style(&thread.key).bold(),
        origin
    );
}

/// Shorten text to one line for terminal listings.
pub fn one_line(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut)
}
