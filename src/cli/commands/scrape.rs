//! Scrape command.

use console::style;

use crate::cli::helpers::{chrome_service, one_line, print_thread_summary, spinner};
use crate::config::Settings;

/// Scrape (or load from cache) the replies of a post and print them.
pub async fn cmd_scrape(settings: &Settings, url: &str, refresh: bool) -> anyhow::Result<()> {
    let service = chrome_service(settings);

    let pb = spinner(format!("Scrolling replies of {}...", url))?;
    let outcome = service.replies(url, refresh).await;
    pb.finish_and_clear();
    let thread = outcome?;

    print_thread_summary(&thread);
    for (author, body) in &thread.replies {
        println!("  {} {}", style(author).cyan(), one_line(body, 100));
    }
    println!(
        "{} {}",
        style("→").cyan(),
        service.cache().raw_path(&thread.key).display()
    );
    Ok(())
}
