//! Operator CLI over the catalog reconciliation boundary operations
//!
//! Drives sync, orphan checks, purge, search, backup listing and restore
//! from the terminal, printing each operation's result DTO as JSON.

use anyhow::{anyhow, bail, Result};
use serde::Serialize;

use catalog_sync::application::AppState;
use catalog_sync::infrastructure::config::ConfigManager;
use catalog_sync::infrastructure::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        print_usage();
        return Ok(());
    };
    if command == "help" || command == "--help" {
        print_usage();
        return Ok(());
    }

    let manager = ConfigManager::new()?;
    let config = manager.initialize_on_first_run().await?;
    logging::init_logging_with_config(&config.logging)?;

    let state = AppState::from_config(config).await?;

    match command {
        "status" => {
            print_json(&state.sync.get_sync_status().await?)?;
        }
        "sync" => {
            let url = feed_url(&args, &state)?;
            let limit = flag_value(&args, "--limit")
                .map(|raw| raw.parse::<u32>().map_err(|_| anyhow!("--limit expects a number")))
                .transpose()?;
            print_json(&state.sync.sync_from_feed(&url, limit).await?)?;
        }
        "orphans" => {
            let url = feed_url(&args, &state)?;
            print_json(&state.orphans.check_orphaned_products(&url).await?)?;
        }
        "purge" => {
            let ids: Vec<String> = args[1..]
                .iter()
                .filter(|a| !a.starts_with("--"))
                .cloned()
                .collect();
            print_json(&state.orphans.delete_orphaned_products(&ids).await?)?;
        }
        "search" => {
            let query = args[1..].join(" ");
            print_json(&state.backups.find_product_by_name(&query).await?)?;
        }
        "backups" => match args.get(1).map(String::as_str) {
            Some("list") => print_json(&state.backups.list_marketing_backups().await?)?,
            Some("stats") | None => print_json(&state.backups.get_backup_stats().await?)?,
            Some(other) => bail!("Unknown backups subcommand: {other}"),
        },
        "restore" => {
            let product_id = args
                .get(1)
                .ok_or_else(|| anyhow!("Usage: restore <product-id> <backup-sku>"))?;
            let backup_key = args
                .get(2)
                .ok_or_else(|| anyhow!("Usage: restore <product-id> <backup-sku>"))?;
            print_json(
                &state
                    .backups
                    .restore_backup_to_product(product_id, backup_key)
                    .await?,
            )?;
        }
        other => {
            print_usage();
            bail!("Unknown command: {other}");
        }
    }

    Ok(())
}

/// Resolve the feed URL: `--url` flag first, configured URL otherwise.
fn feed_url(args: &[String], state: &AppState) -> Result<String> {
    if let Some(url) = flag_value(args, "--url") {
        return Ok(url);
    }
    let configured = state.config.feed.url.trim();
    if configured.is_empty() {
        bail!("No feed URL configured; set feed.url in the config file or pass --url");
    }
    Ok(configured.to_string())
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_usage() {
    println!(
        "catalog-sync {}\n\n\
         Usage: catalog-sync <command> [options]\n\n\
         Commands:\n\
           status                          catalog counts and last sync time\n\
           sync [--url U] [--limit N]      reconcile the feed into the catalog\n\
           orphans [--url U]               list products missing from the feed\n\
           purge <id> [<id> ...]           back up and delete the given products\n\
           search <query>                  find live products by name\n\
           backups [stats|list]            backup statistics or full listing\n\
           restore <product-id> <sku>      restore the latest backup onto a product",
        env!("CARGO_PKG_VERSION")
    );
}
