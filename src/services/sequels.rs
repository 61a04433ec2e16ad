//! Sequel detection - relates a freshly imported entity to other catalog
//! entries the user has not consumed yet.
//!
//! The relation test is pluggable. The default policy works off normalized
//! base titles: a later season of a series the user watched scores highest,
//! anything else sharing the base title scores a notch lower.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use anyhow::Result;
use regex::Regex;
use tracing::{debug, info};

use crate::constants::confidence;
use crate::db::Store;
use crate::domain::MediaKind;
use crate::entities::media_entities;
use crate::services::notify::NotifyService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    SeasonSequel,
    SameSeries,
}

impl RelationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SeasonSequel => "season_sequel",
            Self::SameSeries => "same_series",
        }
    }
}

/// A candidate judged related to a trigger entity.
#[derive(Debug, Clone)]
pub struct RelatedMatch {
    pub confidence: f32,
    pub kind: RelationKind,
    pub reason: String,
}

/// Decides whether a candidate entity is related to the trigger. Returning
/// `None` means unrelated; matches below the configured confidence floor are
/// discarded by the caller.
pub trait RelationPolicy: Send + Sync {
    fn relate(
        &self,
        trigger: &media_entities::Model,
        candidate: &media_entities::Model,
    ) -> Option<RelatedMatch>;
}

/// Default policy: same normalized base title relates, a strictly later
/// season of a series relates strongest.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeasonSequelPolicy;

impl RelationPolicy for SeasonSequelPolicy {
    fn relate(
        &self,
        trigger: &media_entities::Model,
        candidate: &media_entities::Model,
    ) -> Option<RelatedMatch> {
        let trigger_base = normalize_title(effective_base(trigger));
        let candidate_base = normalize_title(effective_base(candidate));

        if trigger_base.is_empty() || trigger_base != candidate_base {
            return None;
        }

        let both_series = MediaKind::parse(&trigger.kind) == MediaKind::SeriesEpisode
            && MediaKind::parse(&candidate.kind) == MediaKind::SeriesEpisode;

        if both_series {
            if let (Some(trigger_season), Some(candidate_season)) =
                (trigger.season_number, candidate.season_number)
            {
                if candidate_season > trigger_season {
                    return Some(RelatedMatch {
                        confidence: confidence::SEASON_INCREMENT,
                        kind: RelationKind::SeasonSequel,
                        reason: format!(
                            "Season {} of {} follows season {}",
                            candidate_season,
                            effective_base(candidate),
                            trigger_season
                        ),
                    });
                }
            }
        }

        Some(RelatedMatch {
            confidence: confidence::SAME_TITLE,
            kind: RelationKind::SameSeries,
            reason: format!("Shares the series {}", effective_base(candidate)),
        })
    }
}

/// Stats from one detection pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectionStats {
    pub examined: usize,
    pub matched: usize,
    pub created: usize,
    pub suppressed: usize,
}

/// Stats from a whole-history rescan.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanStats {
    pub triggers: usize,
    pub created: usize,
    pub suppressed: usize,
}

pub struct SequelService {
    store: Store,
    notify: Arc<NotifyService>,
    policy: Arc<dyn RelationPolicy>,
    min_confidence: f32,
}

impl SequelService {
    #[must_use]
    pub fn new(
        store: Store,
        notify: Arc<NotifyService>,
        policy: Arc<dyn RelationPolicy>,
        min_confidence: f32,
    ) -> Self {
        Self {
            store,
            notify,
            policy,
            min_confidence,
        }
    }

    /// Runs the relation policy for one trigger entity against every catalog
    /// entry the user has not consumed. Each accepted match is handed to the
    /// notification emitter, which keeps the operation idempotent.
    pub async fn detect_for_entity(
        &self,
        user_id: &str,
        trigger: &media_entities::Model,
    ) -> Result<DetectionStats> {
        let consumed: HashSet<i32> = self
            .store
            .consumed_entity_ids(user_id)
            .await?
            .into_iter()
            .collect();

        let mut stats = DetectionStats::default();

        for candidate in self.store.all_entities().await? {
            if candidate.id == trigger.id || consumed.contains(&candidate.id) {
                continue;
            }
            stats.examined += 1;

            let Some(related) = self.policy.relate(trigger, &candidate) else {
                continue;
            };
            if related.confidence < self.min_confidence {
                debug!(
                    trigger_id = trigger.id,
                    candidate_id = candidate.id,
                    confidence = related.confidence,
                    "Match below confidence floor, discarded"
                );
                continue;
            }
            stats.matched += 1;

            if self
                .notify
                .emit(user_id, trigger.id, candidate.id, &related)
                .await?
            {
                stats.created += 1;
            } else {
                stats.suppressed += 1;
            }
        }

        if stats.matched > 0 {
            info!(
                event = "sequel_detection",
                user_id = %user_id,
                trigger_id = trigger.id,
                matched = stats.matched,
                created = stats.created,
                "Related content detected"
            );
        }

        Ok(stats)
    }

    /// Re-runs detection across everything the user has consumed. Used by
    /// the rescan command and after late enrichment changes an entity.
    pub async fn scan_user(&self, user_id: &str) -> Result<ScanStats> {
        let mut scan = ScanStats::default();

        for entity_id in self.store.consumed_entity_ids(user_id).await? {
            let Some(trigger) = self.store.get_entity(entity_id).await? else {
                continue;
            };
            scan.triggers += 1;

            let stats = self.detect_for_entity(user_id, &trigger).await?;
            scan.created += stats.created;
            scan.suppressed += stats.suppressed;
        }

        Ok(scan)
    }
}

fn effective_base(entity: &media_entities::Model) -> &str {
    entity.base_title.as_deref().unwrap_or(&entity.title)
}

/// Normalizes a title for comparison: lowercase, trailing parenthesized
/// year dropped, leading article dropped, punctuation stripped, whitespace
/// collapsed.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let without_year = year_suffix_re().replace(&lowered, "");
    let without_punct = punct_re().replace_all(&without_year, " ");

    let mut words = without_punct.split_whitespace().peekable();
    if let Some(&first) = words.peek() {
        if matches!(first, "the" | "a" | "an") {
            words.next();
        }
    }

    words.collect::<Vec<_>>().join(" ")
}

fn year_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\(\d{4}\)\s*$").expect("Invalid regex pattern defined in code")
    })
}

fn punct_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[^\p{L}\p{N}\s]+").expect("Invalid regex pattern defined in code")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(
        id: i32,
        title: &str,
        kind: MediaKind,
        base: Option<&str>,
        season: Option<i32>,
    ) -> media_entities::Model {
        media_entities::Model {
            id,
            title: title.to_string(),
            title_key: title.to_lowercase(),
            kind: kind.as_str().to_string(),
            base_title: base.map(str::to_string),
            season_number: season,
            total_seasons: None,
            total_episodes: None,
            last_enriched_at: None,
            provenance: "{}".to_string(),
            created_at: "2026-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn normalizes_year_articles_and_punctuation() {
        assert_eq!(normalize_title("The Office (2005)"), "office");
        assert_eq!(normalize_title("Arcane"), "arcane");
        assert_eq!(normalize_title("  K-Pop: Demon   Hunters!  "), "k pop demon hunters");
        assert_eq!(normalize_title("An American Tail"), "american tail");
    }

    #[test]
    fn year_only_stripped_from_the_end() {
        assert_eq!(normalize_title("1984 (1984)"), "1984");
        assert_eq!(normalize_title("Blade Runner 2049"), "blade runner 2049");
    }

    #[test]
    fn later_season_scores_season_increment() {
        let trigger = entity(
            1,
            "Dark: Season 1: Episode 1",
            MediaKind::SeriesEpisode,
            Some("Dark"),
            Some(1),
        );
        let candidate = entity(
            2,
            "Dark: Season 2: Episode 1",
            MediaKind::SeriesEpisode,
            Some("Dark"),
            Some(2),
        );

        let related = SeasonSequelPolicy
            .relate(&trigger, &candidate)
            .expect("seasons of the same series should relate");
        assert_eq!(related.kind, RelationKind::SeasonSequel);
        assert!((related.confidence - confidence::SEASON_INCREMENT).abs() < f32::EPSILON);
    }

    #[test]
    fn earlier_season_scores_same_series() {
        let trigger = entity(
            1,
            "Dark: Season 2: Episode 1",
            MediaKind::SeriesEpisode,
            Some("Dark"),
            Some(2),
        );
        let candidate = entity(
            2,
            "Dark: Season 1: Episode 1",
            MediaKind::SeriesEpisode,
            Some("Dark"),
            Some(1),
        );

        let related = SeasonSequelPolicy
            .relate(&trigger, &candidate)
            .expect("seasons of the same series should relate");
        assert_eq!(related.kind, RelationKind::SameSeries);
        assert!((related.confidence - confidence::SAME_TITLE).abs() < f32::EPSILON);
    }

    #[test]
    fn movie_sharing_base_relates_as_same_series() {
        let trigger = entity(1, "Dune (2021)", MediaKind::Movie, None, None);
        let candidate = entity(2, "Dune", MediaKind::Movie, None, None);

        let related = SeasonSequelPolicy
            .relate(&trigger, &candidate)
            .expect("same base movies should relate");
        assert_eq!(related.kind, RelationKind::SameSeries);
    }

    #[test]
    fn unrelated_titles_do_not_match() {
        let trigger = entity(1, "Arcane", MediaKind::Movie, None, None);
        let candidate = entity(2, "Dark", MediaKind::Movie, None, None);

        assert!(SeasonSequelPolicy.relate(&trigger, &candidate).is_none());
    }
}
