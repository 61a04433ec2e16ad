use anyhow::Result;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::{enrichment_cache, prelude::*};

pub mod status {
    pub const FOUND: &str = "found";
    pub const NOT_FOUND: &str = "not_found";
}

pub struct EnrichmentCacheRepository {
    conn: DatabaseConnection,
}

impl EnrichmentCacheRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Returns the cached entry for a normalized query, if it is younger
    /// than the TTL. Timestamps are RFC 3339 strings, which order lexically.
    pub async fn get_fresh(
        &self,
        query: &str,
        ttl_hours: i64,
    ) -> Result<Option<enrichment_cache::Model>> {
        let threshold = Utc::now()
            .checked_sub_signed(chrono::Duration::hours(ttl_hours))
            .map_or_else(String::new, |t| t.to_rfc3339());

        let entry = EnrichmentCache::find()
            .filter(enrichment_cache::Column::Query.eq(query))
            .filter(enrichment_cache::Column::FetchedAt.gt(threshold))
            .one(&self.conn)
            .await?;
        Ok(entry)
    }

    /// Upserts a lookup verdict. Both hits and confirmed misses are stored;
    /// transient provider failures must never reach this method.
    pub async fn store(
        &self,
        query: &str,
        status: &str,
        total_seasons: Option<i32>,
        total_episodes: Option<i32>,
    ) -> Result<()> {
        let model = enrichment_cache::ActiveModel {
            query: Set(query.to_string()),
            status: Set(status.to_string()),
            total_seasons: Set(total_seasons),
            total_episodes: Set(total_episodes),
            fetched_at: Set(Utc::now().to_rfc3339()),
            ..Default::default()
        };

        EnrichmentCache::insert(model)
            .on_conflict(
                OnConflict::column(enrichment_cache::Column::Query)
                    .update_columns([
                        enrichment_cache::Column::Status,
                        enrichment_cache::Column::TotalSeasons,
                        enrichment_cache::Column::TotalEpisodes,
                        enrichment_cache::Column::FetchedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;
        Ok(())
    }
}
