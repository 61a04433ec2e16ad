//! Entity listing and detail command handlers

use crate::config::Config;
use crate::db::Store;
use crate::services::Provenance;

pub async fn cmd_entities(config: &Config, limit: u64) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let entities = store.recent_entities(limit).await?;

    if entities.is_empty() {
        println!("Catalog is empty.");
        return Ok(());
    }

    println!("Entities (newest {}):", entities.len());
    println!("{:-<70}", "");

    for entity in entities {
        println!("• [{}] {}", entity.id, entity.title);
        let mut detail = format!("  Kind: {}", entity.kind);
        if let Some(base) = &entity.base_title {
            detail.push_str(&format!(" | Base: {base}"));
        }
        if let Some(season) = entity.season_number {
            detail.push_str(&format!(" | Season: {season}"));
        }
        println!("{detail}");
    }

    Ok(())
}

pub async fn cmd_entity_info(config: &Config, id: i32) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let Some(entity) = store.get_entity(id).await? else {
        println!("Entity with ID {id} not found.");
        return Ok(());
    };

    println!("Entity Info");
    println!("{:-<60}", "");
    println!("Title:    {}", entity.title);
    println!("ID:       {}", entity.id);
    println!("Kind:     {}", entity.kind);
    if let Some(base) = &entity.base_title {
        println!("Series:   {base}");
    }
    if let Some(season) = entity.season_number {
        println!("Season:   {season}");
    }
    println!("Added:    {}", entity.created_at);

    match &entity.last_enriched_at {
        Some(at) => {
            let total_seasons = entity
                .total_seasons
                .map_or_else(|| "?".to_string(), |s| s.to_string());
            let total_episodes = entity
                .total_episodes
                .map_or_else(|| "?".to_string(), |e| e.to_string());
            println!("Aired:    {total_seasons} season(s), {total_episodes} episode(s)");
            println!("Enriched: {at}");
        }
        None => println!("Enriched: not yet"),
    }

    let watchers = store.consumption_count_for_entity(id).await?;
    println!("Watched:  {watchers} user(s)");

    let provenance = Provenance::parse(&entity.provenance);
    if !provenance.imports.is_empty() {
        println!();
        println!("Import history ({}):", provenance.imports.len());
        for stamp in provenance.imports.iter().take(10) {
            println!("  • {} at {}", stamp.source, stamp.imported_at);
        }
        if provenance.imports.len() > 10 {
            println!("  ... and {} more", provenance.imports.len() - 10);
        }
    }
    if !provenance.raw_titles.is_empty() {
        println!();
        println!("Raw titles seen:");
        for raw in &provenance.raw_titles {
            println!("  • {raw}");
        }
    }

    println!();
    Ok(())
}
