use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::{notifications, prelude::*};

/// Result of queueing a notification. The (user, related entity) pair is
/// unique, so a second detection of the same pair is suppressed rather than
/// duplicated.
#[derive(Debug)]
pub enum EmitOutcome {
    Created(notifications::Model),
    AlreadySuppressed,
}

pub struct NotificationRepository {
    conn: DatabaseConnection,
}

impl NotificationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &self,
        user_id: &str,
        trigger_entity_id: i32,
        related_entity_id: i32,
        confidence: f32,
        reason: &str,
    ) -> Result<EmitOutcome> {
        let model = notifications::ActiveModel {
            user_id: Set(user_id.to_string()),
            trigger_entity_id: Set(trigger_entity_id),
            related_entity_id: Set(related_entity_id),
            confidence: Set(confidence),
            reason: Set(reason.to_string()),
            is_read: Set(false),
            emailed: Set(false),
            created_at: Set(Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let inserted_rows = Notifications::insert(model)
            .on_conflict(
                OnConflict::columns([
                    notifications::Column::UserId,
                    notifications::Column::RelatedEntityId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        if inserted_rows == 0 {
            return Ok(EmitOutcome::AlreadySuppressed);
        }

        let row = Notifications::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::RelatedEntityId.eq(related_entity_id))
            .one(&self.conn)
            .await?
            .context("Notification row missing immediately after insert")?;

        Ok(EmitOutcome::Created(row))
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u64,
    ) -> Result<Vec<notifications::Model>> {
        let mut query = Notifications::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id)
            .limit(limit);

        if unread_only {
            query = query.filter(notifications::Column::IsRead.eq(false));
        }

        let rows = query.all(&self.conn).await?;
        Ok(rows)
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<u64> {
        let count = Notifications::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .count(&self.conn)
            .await?;
        Ok(count)
    }

    /// Marks one notification read. Returns false when the id is unknown.
    pub async fn mark_read(&self, id: i32) -> Result<bool> {
        let result = Notifications::update_many()
            .col_expr(
                notifications::Column::IsRead,
                sea_orm::sea_query::Expr::value(true),
            )
            .filter(notifications::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn mark_all_read(&self, user_id: &str) -> Result<u64> {
        let result = Notifications::update_many()
            .col_expr(
                notifications::Column::IsRead,
                sea_orm::sea_query::Expr::value(true),
            )
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn mark_emailed(&self, id: i32) -> Result<()> {
        let model = notifications::ActiveModel {
            id: Set(id),
            emailed: Set(true),
            ..Default::default()
        };
        model.update(&self.conn).await?;
        Ok(())
    }
}
