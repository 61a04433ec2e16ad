//! Domain events for the application.
//!
//! These events are published on the process-wide broadcast bus. Delivery
//! collaborators (mail sender, progress UI) subscribe there; a publish with
//! no subscribers is silently dropped.

use serde::Serialize;

/// Events published by the ingestion pipeline.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum PipelineEvent {
    ImportStarted {
        job_id: i32,
        user_id: String,
        total: usize,
    },
    ImportProgress {
        job_id: i32,
        processed: usize,
        total: usize,
    },
    ImportFinished {
        job_id: i32,
        created: usize,
        linked_existing: usize,
        skipped_empty: usize,
        failed: usize,
    },

    EntityCreated {
        entity_id: i32,
        title: String,
    },
    EnrichmentApplied {
        entity_id: i32,
        total_seasons: Option<i32>,
        total_episodes: Option<i32>,
    },

    NotificationQueued {
        notification_id: i32,
        user_id: String,
        trigger_entity_id: i32,
        related_entity_id: i32,
        confidence: f32,
    },

    Error {
        message: String,
    },
}
