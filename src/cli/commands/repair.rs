//! Selector repair command.

use console::style;

use crate::cli::helpers::{chrome_service, spinner};
use crate::config::Settings;

/// Re-derive all selectors from the configured reference post.
pub async fn cmd_repair(settings: &Settings, container_class: &str) -> anyhow::Result<()> {
    let mut service = chrome_service(settings);

    let pb = spinner(format!("Reading reference post {}...", settings.reference.url))?;
    let outcome = service.repair(container_class).await;
    pb.finish_and_clear();
    let repaired = outcome?;

    println!("{} Selectors repaired", style("✓").green());
    println!("  {:<16} {}", "reply_container", repaired.reply_container);
    println!("  {:<16} {}", "author", repaired.author);
    println!("  {:<16} {}", "body", repaired.body);
    println!(
        "{} {}",
        style("→").cyan(),
        service.store().path().display()
    );
    Ok(())
}
