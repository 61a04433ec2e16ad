//! Sequel rescan command handler

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::db::Store;
use crate::services::{NotifyService, SeasonSequelPolicy, SequelService};

pub async fn cmd_scan_sequels(config: &Config, user: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size);

    let notify = Arc::new(NotifyService::new(store.clone(), event_bus));
    let sequels = SequelService::new(
        store,
        notify,
        Arc::new(SeasonSequelPolicy),
        config.detector.min_confidence,
    );

    println!("Scanning consumed history for user {user}...");
    let stats = sequels.scan_user(user).await?;

    println!();
    println!("Scan complete: {} consumed entities checked", stats.triggers);
    println!("  New notifications: {}", stats.created);
    println!("  Already notified:  {}", stats.suppressed);

    Ok(())
}
