use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::domain::MediaKind;
use crate::entities::{consumption_records, media_entities, prelude::*};

/// Input for a canonical entity row. The repository derives the
/// case-insensitive `title_key` and the creation timestamp itself.
#[derive(Debug, Clone)]
pub struct NewEntity {
    pub title: String,
    pub base_title: Option<String>,
    pub kind: MediaKind,
    pub season_number: Option<i32>,
    pub provenance: String,
}

/// Result of an optimistic insert against the unique `title_key` column.
#[derive(Debug)]
pub enum InsertOutcome {
    /// This call created the row.
    Inserted(media_entities::Model),
    /// Another row already owned the key; the existing row is returned.
    Conflict(media_entities::Model),
}

pub struct CatalogRepository {
    conn: DatabaseConnection,
}

impl CatalogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts a canonical entity, or returns the existing row when the
    /// title key is already taken. Conflicts are resolved without raising:
    /// the insert is attempted with ON CONFLICT DO NOTHING and a zero
    /// rows-affected count means another writer (or an earlier import)
    /// got there first.
    pub async fn insert_or_get(&self, entity: NewEntity) -> Result<InsertOutcome> {
        let title_key = entity.title.to_lowercase();

        let model = media_entities::ActiveModel {
            title: Set(entity.title),
            title_key: Set(title_key.clone()),
            base_title: Set(entity.base_title),
            kind: Set(entity.kind.as_str().to_string()),
            season_number: Set(entity.season_number),
            provenance: Set(entity.provenance),
            created_at: Set(Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let inserted_rows = MediaEntities::insert(model)
            .on_conflict(
                OnConflict::column(media_entities::Column::TitleKey)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        let row = self
            .find_by_title_key(&title_key)
            .await?
            .context("Entity row missing immediately after insert")?;

        if inserted_rows > 0 {
            Ok(InsertOutcome::Inserted(row))
        } else {
            Ok(InsertOutcome::Conflict(row))
        }
    }

    pub async fn find_by_title_key(&self, title_key: &str) -> Result<Option<media_entities::Model>> {
        let entity = MediaEntities::find()
            .filter(media_entities::Column::TitleKey.eq(title_key))
            .one(&self.conn)
            .await?;
        Ok(entity)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<media_entities::Model>> {
        let entity = MediaEntities::find_by_id(id).one(&self.conn).await?;
        Ok(entity)
    }

    /// Updates the provenance trail of an existing row, optionally upgrading
    /// its kind. Title, base title and season number are never touched here.
    pub async fn record_sighting(
        &self,
        id: i32,
        provenance: String,
        upgraded_kind: Option<MediaKind>,
    ) -> Result<media_entities::Model> {
        let mut model = media_entities::ActiveModel {
            id: Set(id),
            provenance: Set(provenance),
            ..Default::default()
        };

        if let Some(kind) = upgraded_kind {
            model.kind = Set(kind.as_str().to_string());
        }

        let updated = model.update(&self.conn).await?;
        Ok(updated)
    }

    /// Writes enrichment totals onto an entity, but only once: rows that
    /// already carry a `last_enriched_at` timestamp are left alone. Returns
    /// whether this call filled the fields.
    pub async fn apply_enrichment(
        &self,
        id: i32,
        total_seasons: Option<i32>,
        total_episodes: Option<i32>,
    ) -> Result<bool> {
        let result = MediaEntities::update_many()
            .col_expr(media_entities::Column::TotalSeasons, Expr::value(total_seasons))
            .col_expr(media_entities::Column::TotalEpisodes, Expr::value(total_episodes))
            .col_expr(
                media_entities::Column::LastEnrichedAt,
                Expr::value(Some(Utc::now().to_rfc3339())),
            )
            .filter(media_entities::Column::Id.eq(id))
            .filter(media_entities::Column::LastEnrichedAt.is_null())
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn list_recent(&self, limit: u64) -> Result<Vec<media_entities::Model>> {
        let entities = MediaEntities::find()
            .order_by_desc(media_entities::Column::CreatedAt)
            .order_by_desc(media_entities::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await?;
        Ok(entities)
    }

    pub async fn list_all(&self) -> Result<Vec<media_entities::Model>> {
        let entities = MediaEntities::find()
            .order_by_asc(media_entities::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(entities)
    }

    /// All entities a user has a consumption record for.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<media_entities::Model>> {
        let entities = MediaEntities::find()
            .join(
                JoinType::InnerJoin,
                media_entities::Relation::ConsumptionRecords.def(),
            )
            .filter(consumption_records::Column::UserId.eq(user_id))
            .order_by_asc(media_entities::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(entities)
    }
}
