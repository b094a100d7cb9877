//! Selector inspection commands.

use console::style;

use crate::config::Settings;
use crate::selectors::{SelectorField, SelectorStore};

/// Print the stored selectors.
pub fn cmd_selectors_show(settings: &Settings) -> anyhow::Result<()> {
    let store = SelectorStore::in_dir(&settings.data_dir);

    println!("\n{}", style("Selectors").bold());
    for field in SelectorField::ALL {
        match store.get(field) {
            Some(value) => println!("  {:<16} {}", field, value),
            None => println!("  {:<16} {}", field, style("unset").yellow()),
        }
    }
    if !store.selectors().is_complete() {
        println!(
            "\n{} Run `stc repair <container-class>` to derive missing selectors",
            style("!").yellow()
        );
    }
    println!("{} {}", style("→").cyan(), store.path().display());
    Ok(())
}

/// Overwrite one selector after checking it parses as CSS.
pub fn cmd_selectors_set(
    settings: &Settings,
    field: SelectorField,
    value: &str,
) -> anyhow::Result<()> {
    if let Err(e) = scraper::Selector::parse(value) {
        anyhow::bail!("'{}' is not a valid CSS selector: {}", value, e);
    }

    let mut store = SelectorStore::in_dir(&settings.data_dir);
    store.set(field, value);
    store.persist()?;

    println!("{} {} = {}", style("✓").green(), field, value);
    Ok(())
}
