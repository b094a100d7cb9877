//! Proposals command.

use console::style;

use crate::cli::helpers::{chrome_service, print_thread_summary, spinner};
use crate::config::Settings;
use crate::llm::LlmClient;
use crate::services::ThreadProposals;

/// Scrape a post, extract the proposals of each reply and print the tally.
pub async fn cmd_proposals(
    settings: &Settings,
    url: &str,
    subject: &str,
    model: Option<String>,
    refresh: bool,
) -> anyhow::Result<()> {
    let mut llm = settings.llm.clone();
    if let Some(model) = model {
        llm.set_model(model);
    }
    let client = LlmClient::new(llm)?;
    if !client.is_available().await {
        anyhow::bail!(
            "{} not available at {} (model {})",
            client.config().provider_name(),
            client.config().endpoint(),
            client.config().model()
        );
    }

    let service = chrome_service(settings);

    let pb = spinner(format!("Collecting proposals from {}...", url))?;
    let outcome = service.proposals(&client, url, subject, refresh).await;
    pb.finish_and_clear();
    let ThreadProposals { thread, proposals } = outcome?;
    print_thread_summary(&thread);

    println!(
        "\n{} ({} of {} replies)",
        style(format!("Proposed {}", subject)).bold(),
        proposals.len(),
        thread.replies.len()
    );
    for (author, answer) in proposals.iter() {
        println!("  {} {}", style(author).cyan(), answer);
    }

    let tally = proposals.tally();
    if !tally.is_empty() {
        println!("\n{}", style("Tally").bold());
        let mut ranked: Vec<_> = tally.into_iter().collect();
        ranked.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));
        for (name, supporters) in ranked {
            println!("  {:>4}  {}", style(supporters.len()).green(), name);
        }
    }

    println!(
        "{} {}",
        style("→").cyan(),
        service.cache().proposals_path(&thread.key).display()
    );
    Ok(())
}
