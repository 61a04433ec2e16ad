use anyhow::Result;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entities::{consumption_records, prelude::*};

/// Result of recording a consumption. The (user, entity) pair is unique, so
/// a repeated sighting collapses into `AlreadyExists`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Created,
    AlreadyExists,
}

pub struct ConsumptionRepository {
    conn: DatabaseConnection,
}

impl ConsumptionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Records that a user consumed an entity. Idempotent: re-importing the
    /// same history never duplicates the link.
    pub async fn record(
        &self,
        user_id: &str,
        entity_id: i32,
        source_tag: &str,
        consumed_at: Option<String>,
        raw_payload: String,
    ) -> Result<RecordOutcome> {
        let model = consumption_records::ActiveModel {
            user_id: Set(user_id.to_string()),
            entity_id: Set(entity_id),
            source_tag: Set(source_tag.to_string()),
            consumed_at: Set(consumed_at),
            raw_payload: Set(raw_payload),
            created_at: Set(Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let inserted_rows = ConsumptionRecords::insert(model)
            .on_conflict(
                OnConflict::columns([
                    consumption_records::Column::UserId,
                    consumption_records::Column::EntityId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        if inserted_rows > 0 {
            Ok(RecordOutcome::Created)
        } else {
            Ok(RecordOutcome::AlreadyExists)
        }
    }

    pub async fn has_consumed(&self, user_id: &str, entity_id: i32) -> Result<bool> {
        let count = ConsumptionRecords::find()
            .filter(consumption_records::Column::UserId.eq(user_id))
            .filter(consumption_records::Column::EntityId.eq(entity_id))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn entity_ids_for_user(&self, user_id: &str) -> Result<Vec<i32>> {
        let ids = ConsumptionRecords::find()
            .select_only()
            .column(consumption_records::Column::EntityId)
            .filter(consumption_records::Column::UserId.eq(user_id))
            .order_by_asc(consumption_records::Column::EntityId)
            .into_tuple::<i32>()
            .all(&self.conn)
            .await?;
        Ok(ids)
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<consumption_records::Model>> {
        let records = ConsumptionRecords::find()
            .filter(consumption_records::Column::UserId.eq(user_id))
            .order_by_asc(consumption_records::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(records)
    }

    pub async fn count_for_entity(&self, entity_id: i32) -> Result<u64> {
        let count = ConsumptionRecords::find()
            .filter(consumption_records::Column::EntityId.eq(entity_id))
            .count(&self.conn)
            .await?;
        Ok(count)
    }
}
