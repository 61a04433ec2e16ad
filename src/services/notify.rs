//! Notification emitter - exactly-once queueing per (user, related entity).

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::db::{EmitOutcome, Store};
use crate::domain::events::PipelineEvent;
use crate::services::sequels::RelatedMatch;

pub struct NotifyService {
    store: Store,
    event_bus: broadcast::Sender<PipelineEvent>,
}

impl NotifyService {
    #[must_use]
    pub const fn new(store: Store, event_bus: broadcast::Sender<PipelineEvent>) -> Self {
        Self { store, event_bus }
    }

    /// Queues a notification for a detected relation and announces it on the
    /// event bus. Returns whether a new row was created; a repeat detection
    /// of the same (user, related entity) pair is suppressed by the unique
    /// index, not by the caller.
    pub async fn emit(
        &self,
        user_id: &str,
        trigger_entity_id: i32,
        related_entity_id: i32,
        related: &RelatedMatch,
    ) -> anyhow::Result<bool> {
        let outcome = self
            .store
            .insert_notification(
                user_id,
                trigger_entity_id,
                related_entity_id,
                related.confidence,
                &related.reason,
            )
            .await?;

        match outcome {
            EmitOutcome::Created(row) => {
                metrics::counter!("notifications_created_total").increment(1);
                info!(
                    event = "notification_created",
                    user_id = %user_id,
                    notification_id = row.id,
                    related_entity_id = related_entity_id,
                    kind = related.kind.as_str(),
                    confidence = related.confidence,
                    "Notification queued"
                );
                let _ = self.event_bus.send(PipelineEvent::NotificationQueued {
                    notification_id: row.id,
                    user_id: user_id.to_string(),
                    trigger_entity_id,
                    related_entity_id,
                    confidence: related.confidence,
                });
                Ok(true)
            }
            EmitOutcome::AlreadySuppressed => {
                debug!(
                    user_id = %user_id,
                    related_entity_id = related_entity_id,
                    "Notification already queued, suppressed"
                );
                Ok(false)
            }
        }
    }
}
