//! Catalog command handler

use std::collections::{BTreeMap, BTreeSet};

use crate::config::Config;
use crate::db::Store;
use crate::domain::MediaKind;
use crate::entities::media_entities;

pub async fn cmd_catalog(config: &Config, user: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let entities = store.entities_for_user(user).await?;

    if entities.is_empty() {
        println!("No catalog entries for user {user}.");
        return Ok(());
    }

    let mut series: BTreeMap<String, Vec<&media_entities::Model>> = BTreeMap::new();
    let mut movies: Vec<&media_entities::Model> = Vec::new();
    let mut other: Vec<&media_entities::Model> = Vec::new();

    for entity in &entities {
        match MediaKind::parse(&entity.kind) {
            MediaKind::SeriesEpisode => {
                let base = entity
                    .base_title
                    .clone()
                    .unwrap_or_else(|| entity.title.clone());
                series.entry(base).or_default().push(entity);
            }
            MediaKind::Movie => movies.push(entity),
            MediaKind::Unknown => other.push(entity),
        }
    }

    println!("Catalog for user {} ({} titles):", user, entities.len());
    println!("{:-<70}", "");

    if !series.is_empty() {
        println!("Series:");
        for (base, episodes) in &series {
            let seasons: BTreeSet<i32> =
                episodes.iter().filter_map(|e| e.season_number).collect();
            let season_list = seasons
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");

            if season_list.is_empty() {
                println!("• {} - {} episode(s)", base, episodes.len());
            } else {
                println!(
                    "• {} - {} episode(s), season(s) {}",
                    base,
                    episodes.len(),
                    season_list
                );
            }

            if let Some(entity) = episodes.iter().find(|e| e.total_seasons.is_some()) {
                let total_seasons = entity
                    .total_seasons
                    .map_or_else(|| "?".to_string(), |s| s.to_string());
                let total_episodes = entity
                    .total_episodes
                    .map_or_else(|| "?".to_string(), |e| e.to_string());
                println!("  Aired: {total_seasons} season(s), {total_episodes} episode(s)");
            }
        }
    }

    if !movies.is_empty() {
        println!();
        println!("Movies:");
        for movie in &movies {
            println!("• {}", movie.title);
        }
    }

    if !other.is_empty() {
        println!();
        println!("Other:");
        for entity in &other {
            println!("• {}", entity.title);
        }
    }

    Ok(())
}
