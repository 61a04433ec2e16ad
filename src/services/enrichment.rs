//! Metadata enrichment - cache-first series lookups.
//!
//! Enrichment is advisory and runs off the import critical path. A verdict
//! from the provider (hit or confirmed miss) is cached; a transient failure
//! is reported as `Unavailable` and never cached, so the next import retries.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::db::Store;
use crate::db::repositories::enrichment::status;
use crate::domain::events::PipelineEvent;
use crate::entities::enrichment_cache;

/// Verdict of a metadata lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentResult {
    Found {
        total_seasons: Option<i32>,
        total_episodes: Option<i32>,
    },
    /// The provider answered and does not know the title.
    NotFound,
    /// The provider could not be consulted. Says nothing about the title.
    Unavailable,
}

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn lookup(&self, query: &str) -> EnrichmentResult;
}

pub struct EnrichmentService {
    store: Store,
    provider: Arc<dyn MetadataProvider>,
    cache_ttl_hours: i64,
    event_bus: broadcast::Sender<PipelineEvent>,
}

impl EnrichmentService {
    #[must_use]
    pub fn new(
        store: Store,
        provider: Arc<dyn MetadataProvider>,
        cache_ttl_hours: i64,
        event_bus: broadcast::Sender<PipelineEvent>,
    ) -> Self {
        Self {
            store,
            provider,
            cache_ttl_hours,
            event_bus,
        }
    }

    /// Cache-first lookup keyed on the trimmed, lowercased query.
    pub async fn enrich(&self, query: &str) -> EnrichmentResult {
        let key = query.trim().to_lowercase();
        if key.is_empty() {
            return EnrichmentResult::NotFound;
        }

        match self.store.get_fresh_enrichment(&key, self.cache_ttl_hours).await {
            Ok(Some(entry)) => {
                metrics::counter!("enrichment_lookups_total", "outcome" => "cache_hit")
                    .increment(1);
                debug!(query = %key, status = %entry.status, "Enrichment cache hit");
                return cached_result(&entry);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(query = %key, "Enrichment cache read failed: {}", e);
            }
        }

        let result = self.provider.lookup(query).await;

        match result {
            EnrichmentResult::Found {
                total_seasons,
                total_episodes,
            } => {
                metrics::counter!("enrichment_lookups_total", "outcome" => "found").increment(1);
                if let Err(e) = self
                    .store
                    .store_enrichment(&key, status::FOUND, total_seasons, total_episodes)
                    .await
                {
                    warn!(query = %key, "Failed to cache enrichment verdict: {}", e);
                }
            }
            EnrichmentResult::NotFound => {
                metrics::counter!("enrichment_lookups_total", "outcome" => "not_found")
                    .increment(1);
                if let Err(e) = self
                    .store
                    .store_enrichment(&key, status::NOT_FOUND, None, None)
                    .await
                {
                    warn!(query = %key, "Failed to cache enrichment verdict: {}", e);
                }
            }
            EnrichmentResult::Unavailable => {
                metrics::counter!("enrichment_lookups_total", "outcome" => "unavailable")
                    .increment(1);
                debug!(query = %key, "Metadata provider unavailable, verdict not cached");
            }
        }

        result
    }

    /// Looks up metadata for an entity and fills its season/episode totals
    /// when the verdict is a hit and the fields are still empty. Returns
    /// whether this call filled them. Failures are logged, never propagated.
    pub async fn enrich_and_apply(&self, entity_id: i32, query: &str) -> bool {
        let EnrichmentResult::Found {
            total_seasons,
            total_episodes,
        } = self.enrich(query).await
        else {
            return false;
        };

        match self
            .store
            .apply_entity_enrichment(entity_id, total_seasons, total_episodes)
            .await
        {
            Ok(true) => {
                info!(
                    event = "enrichment_applied",
                    entity_id = entity_id,
                    total_seasons = ?total_seasons,
                    total_episodes = ?total_episodes,
                    "Applied series totals"
                );
                let _ = self.event_bus.send(PipelineEvent::EnrichmentApplied {
                    entity_id,
                    total_seasons,
                    total_episodes,
                });
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(entity_id = entity_id, "Failed to write enrichment: {}", e);
                false
            }
        }
    }
}

fn cached_result(entry: &enrichment_cache::Model) -> EnrichmentResult {
    if entry.status == status::FOUND {
        EnrichmentResult::Found {
            total_seasons: entry.total_seasons,
            total_episodes: entry.total_episodes,
        }
    } else {
        EnrichmentResult::NotFound
    }
}
