//! Catalog service - find-or-create of canonical media entities.
//!
//! The catalog dedups on the case-insensitive title key. Creation is
//! optimistic: two concurrent imports of the same new title race on the
//! unique column and the loser adopts the winner's row.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::db::{InsertOutcome, NewEntity, Store};
use crate::domain::MediaKind;
use crate::domain::events::PipelineEvent;
use crate::entities::media_entities;
use crate::parser::ParsedTitle;
use crate::services::enrichment::EnrichmentService;
use crate::services::sequels::SequelService;

/// Provenance trail stored on each entity: one stamp per import sighting
/// plus every distinct raw title that mapped to this entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default)]
    pub imports: Vec<ImportStamp>,
    #[serde(default)]
    pub raw_titles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportStamp {
    pub source: String,
    pub imported_at: String,
}

impl Provenance {
    /// Lenient parse: a missing or corrupt trail starts fresh rather than
    /// failing the import.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    pub fn stamp(&mut self, source: &str, imported_at: &str, raw_title: &str) {
        self.imports.push(ImportStamp {
            source: source.to_string(),
            imported_at: imported_at.to_string(),
        });
        if !self.raw_titles.iter().any(|t| t == raw_title) {
            self.raw_titles.push(raw_title.to_string());
        }
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

pub struct CatalogService {
    store: Store,
    enrichment: Option<Arc<EnrichmentService>>,
    sequels: Arc<SequelService>,
    event_bus: broadcast::Sender<PipelineEvent>,
}

impl CatalogService {
    #[must_use]
    pub fn new(
        store: Store,
        enrichment: Option<Arc<EnrichmentService>>,
        sequels: Arc<SequelService>,
        event_bus: broadcast::Sender<PipelineEvent>,
    ) -> Self {
        Self {
            store,
            enrichment,
            sequels,
            event_bus,
        }
    }

    /// Resolves a parsed title to its canonical entity and reports whether
    /// this call created it. Both paths stamp the provenance trail; on a
    /// match the stored kind is upgraded only when it was unknown, and base
    /// title and season number are never altered.
    pub async fn find_or_create(
        &self,
        user_id: &str,
        parsed: &ParsedTitle,
        source_tag: &str,
        raw_title: &str,
    ) -> Result<(media_entities::Model, bool)> {
        let now = Utc::now().to_rfc3339();

        let mut provenance = Provenance::default();
        provenance.stamp(source_tag, &now, raw_title);

        let outcome = self
            .store
            .insert_or_get_entity(NewEntity {
                title: parsed.matching_title().to_string(),
                base_title: parsed.base_title().map(str::to_string),
                kind: parsed.kind(),
                season_number: parsed.season_number(),
                provenance: provenance.to_json(),
            })
            .await?;

        match outcome {
            InsertOutcome::Inserted(entity) => {
                info!(
                    event = "entity_created",
                    entity_id = entity.id,
                    title = %entity.title,
                    kind = %entity.kind,
                    "Canonical entity created"
                );
                let _ = self.event_bus.send(PipelineEvent::EntityCreated {
                    entity_id: entity.id,
                    title: entity.title.clone(),
                });
                self.spawn_enrichment(user_id, entity.id, parsed);
                Ok((entity, true))
            }
            InsertOutcome::Conflict(existing) => {
                let mut provenance = Provenance::parse(&existing.provenance);
                provenance.stamp(source_tag, &now, raw_title);

                let upgraded_kind = match (MediaKind::parse(&existing.kind), parsed.kind()) {
                    (MediaKind::Unknown, new_kind) if new_kind != MediaKind::Unknown => {
                        Some(new_kind)
                    }
                    _ => None,
                };

                let updated = self
                    .store
                    .record_entity_sighting(existing.id, provenance.to_json(), upgraded_kind)
                    .await?;
                Ok((updated, false))
            }
        }
    }

    /// Kicks off enrichment for a freshly created series entity. Runs
    /// detached so the import never waits on the network; a late hit
    /// re-runs detection for the importing user, since season totals can
    /// change what counts as related.
    fn spawn_enrichment(&self, user_id: &str, entity_id: i32, parsed: &ParsedTitle) {
        if parsed.kind() != MediaKind::SeriesEpisode {
            return;
        }
        let Some(enrichment) = self.enrichment.clone() else {
            return;
        };

        let sequels = Arc::clone(&self.sequels);
        let store = self.store.clone();
        let user_id = user_id.to_string();
        let query = parsed.enrichment_query().to_string();

        tokio::spawn(async move {
            if !enrichment.enrich_and_apply(entity_id, &query).await {
                return;
            }
            match store.get_entity(entity_id).await {
                Ok(Some(entity)) => {
                    if let Err(e) = sequels.detect_for_entity(&user_id, &entity).await {
                        warn!(
                            entity_id = entity_id,
                            "Post-enrichment detection failed: {}", e
                        );
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        entity_id = entity_id,
                        "Failed to reload entity after enrichment: {}", e
                    );
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provenance_appends_stamps_and_dedups_raw_titles() {
        let mut provenance = Provenance::default();
        provenance.stamp("netflix-csv", "2026-01-01T00:00:00+00:00", "Dark: Staffel 1: Folge 1");
        provenance.stamp("export-file", "2026-02-01T00:00:00+00:00", "Dark: Staffel 1: Folge 1");
        provenance.stamp("export-file", "2026-03-01T00:00:00+00:00", "DARK: Staffel 1: FOLGE 1");

        assert_eq!(provenance.imports.len(), 3);
        assert_eq!(provenance.raw_titles.len(), 2);
        assert_eq!(provenance.imports[0].source, "netflix-csv");
    }

    #[test]
    fn provenance_survives_corrupt_json() {
        let provenance = Provenance::parse("not json at all");
        assert!(provenance.imports.is_empty());
        assert!(provenance.raw_titles.is_empty());
    }

    #[test]
    fn provenance_round_trips_through_json() {
        let mut provenance = Provenance::default();
        provenance.stamp("export-file", "2026-01-01T00:00:00+00:00", "Arcane");

        let parsed = Provenance::parse(&provenance.to_json());
        assert_eq!(parsed.imports.len(), 1);
        assert_eq!(parsed.raw_titles, vec!["Arcane".to_string()]);
    }
}
