//! Import command handler

use std::path::Path;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::clients::TmdbClient;
use crate::config::Config;
use crate::constants::import::DEFAULT_SOURCE_TAG;
use crate::db::Store;
use crate::parser::TitleParser;
use crate::services::{
    CatalogService, DefaultImportService, EnrichmentService, ImportService, NotifyService,
    SeasonSequelPolicy, SequelService,
};

pub async fn cmd_import(
    config: &Config,
    file: &str,
    user: &str,
    source: Option<&str>,
) -> anyhow::Result<()> {
    let path = Path::new(file);
    if !path.exists() {
        println!("Path does not exist: {file}");
        return Ok(());
    }

    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size);

    let notify = Arc::new(NotifyService::new(store.clone(), event_bus.clone()));
    let sequels = Arc::new(SequelService::new(
        store.clone(),
        notify,
        Arc::new(SeasonSequelPolicy),
        config.detector.min_confidence,
    ));

    let enrichment = if config.enrichment.enabled {
        Some(Arc::new(EnrichmentService::new(
            store.clone(),
            Arc::new(TmdbClient::from_config(&config.enrichment)),
            config.enrichment.cache_ttl_hours,
            event_bus.clone(),
        )))
    } else {
        None
    };

    let catalog = Arc::new(CatalogService::new(
        store.clone(),
        enrichment,
        Arc::clone(&sequels),
        event_bus.clone(),
    ));

    let importer = DefaultImportService::new(
        store.clone(),
        TitleParser::new(&config.parser),
        catalog,
        sequels,
        event_bus,
        &config.import,
    );

    // Ctrl-C stops the batch between records; finished rows stay committed.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let source_tag = source.unwrap_or(DEFAULT_SOURCE_TAG);
    println!("Importing {file} for user {user}...");

    let summary = importer.import_csv(user, path, source_tag, cancel).await?;

    println!();
    println!("{:-<70}", "");
    println!("Import complete!");
    println!("  Created entities: {}", summary.created);
    println!("  Linked existing:  {}", summary.linked_existing);
    println!("  Skipped (empty):  {}", summary.skipped_empty);
    println!("  Failed:           {}", summary.failed.len());

    if !summary.failed.is_empty() {
        println!();
        println!("Failures:");
        for failure in summary.failed.iter().take(10) {
            println!("  [{}] {}", failure.index, failure.reason);
        }
        if summary.failed.len() > 10 {
            println!("  ... and {} more", summary.failed.len() - 10);
        }
    }

    let unread = store.unread_notification_count(user).await?;
    if unread > 0 {
        println!();
        println!(
            "{unread} unread notification(s). See: bingarr notifications --user {user} --unread"
        );
    }

    Ok(())
}
