use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::domain::{ImportStatus, MediaKind};
use crate::entities::{
    consumption_records, enrichment_cache, import_jobs, media_entities, notifications,
};

pub mod migrator;
pub mod repositories;

pub use repositories::catalog::{InsertOutcome, NewEntity};
pub use repositories::consumption::RecordOutcome;
pub use repositories::jobs::JobCounters;
pub use repositories::notifications::EmitOutcome;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn catalog_repo(&self) -> repositories::catalog::CatalogRepository {
        repositories::catalog::CatalogRepository::new(self.conn.clone())
    }

    fn consumption_repo(&self) -> repositories::consumption::ConsumptionRepository {
        repositories::consumption::ConsumptionRepository::new(self.conn.clone())
    }

    fn notification_repo(&self) -> repositories::notifications::NotificationRepository {
        repositories::notifications::NotificationRepository::new(self.conn.clone())
    }

    fn enrichment_cache_repo(&self) -> repositories::enrichment::EnrichmentCacheRepository {
        repositories::enrichment::EnrichmentCacheRepository::new(self.conn.clone())
    }

    fn job_repo(&self) -> repositories::jobs::ImportJobRepository {
        repositories::jobs::ImportJobRepository::new(self.conn.clone())
    }

    pub async fn insert_or_get_entity(&self, entity: NewEntity) -> Result<InsertOutcome> {
        self.catalog_repo().insert_or_get(entity).await
    }

    pub async fn get_entity(&self, id: i32) -> Result<Option<media_entities::Model>> {
        self.catalog_repo().find_by_id(id).await
    }

    pub async fn get_entity_by_title_key(
        &self,
        title_key: &str,
    ) -> Result<Option<media_entities::Model>> {
        self.catalog_repo().find_by_title_key(title_key).await
    }

    pub async fn record_entity_sighting(
        &self,
        id: i32,
        provenance: String,
        upgraded_kind: Option<MediaKind>,
    ) -> Result<media_entities::Model> {
        self.catalog_repo()
            .record_sighting(id, provenance, upgraded_kind)
            .await
    }

    pub async fn apply_entity_enrichment(
        &self,
        id: i32,
        total_seasons: Option<i32>,
        total_episodes: Option<i32>,
    ) -> Result<bool> {
        self.catalog_repo()
            .apply_enrichment(id, total_seasons, total_episodes)
            .await
    }

    pub async fn recent_entities(&self, limit: u64) -> Result<Vec<media_entities::Model>> {
        self.catalog_repo().list_recent(limit).await
    }

    pub async fn all_entities(&self) -> Result<Vec<media_entities::Model>> {
        self.catalog_repo().list_all().await
    }

    pub async fn entities_for_user(&self, user_id: &str) -> Result<Vec<media_entities::Model>> {
        self.catalog_repo().list_for_user(user_id).await
    }

    pub async fn record_consumption(
        &self,
        user_id: &str,
        entity_id: i32,
        source_tag: &str,
        consumed_at: Option<String>,
        raw_payload: String,
    ) -> Result<RecordOutcome> {
        self.consumption_repo()
            .record(user_id, entity_id, source_tag, consumed_at, raw_payload)
            .await
    }

    pub async fn has_consumed(&self, user_id: &str, entity_id: i32) -> Result<bool> {
        self.consumption_repo()
            .has_consumed(user_id, entity_id)
            .await
    }

    pub async fn consumed_entity_ids(&self, user_id: &str) -> Result<Vec<i32>> {
        self.consumption_repo().entity_ids_for_user(user_id).await
    }

    pub async fn consumption_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<consumption_records::Model>> {
        self.consumption_repo().list_for_user(user_id).await
    }

    pub async fn consumption_count_for_entity(&self, entity_id: i32) -> Result<u64> {
        self.consumption_repo().count_for_entity(entity_id).await
    }

    pub async fn insert_notification(
        &self,
        user_id: &str,
        trigger_entity_id: i32,
        related_entity_id: i32,
        confidence: f32,
        reason: &str,
    ) -> Result<EmitOutcome> {
        self.notification_repo()
            .insert(
                user_id,
                trigger_entity_id,
                related_entity_id,
                confidence,
                reason,
            )
            .await
    }

    pub async fn notifications_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u64,
    ) -> Result<Vec<notifications::Model>> {
        self.notification_repo()
            .list_for_user(user_id, unread_only, limit)
            .await
    }

    pub async fn unread_notification_count(&self, user_id: &str) -> Result<u64> {
        self.notification_repo().unread_count(user_id).await
    }

    pub async fn mark_notification_read(&self, id: i32) -> Result<bool> {
        self.notification_repo().mark_read(id).await
    }

    pub async fn mark_all_notifications_read(&self, user_id: &str) -> Result<u64> {
        self.notification_repo().mark_all_read(user_id).await
    }

    pub async fn mark_notification_emailed(&self, id: i32) -> Result<()> {
        self.notification_repo().mark_emailed(id).await
    }

    pub async fn get_fresh_enrichment(
        &self,
        query: &str,
        ttl_hours: i64,
    ) -> Result<Option<enrichment_cache::Model>> {
        self.enrichment_cache_repo().get_fresh(query, ttl_hours).await
    }

    pub async fn store_enrichment(
        &self,
        query: &str,
        status: &str,
        total_seasons: Option<i32>,
        total_episodes: Option<i32>,
    ) -> Result<()> {
        self.enrichment_cache_repo()
            .store(query, status, total_seasons, total_episodes)
            .await
    }

    pub async fn create_import_job(
        &self,
        user_id: &str,
        source_tag: &str,
        total_rows: usize,
    ) -> Result<import_jobs::Model> {
        self.job_repo().create(user_id, source_tag, total_rows).await
    }

    pub async fn update_import_job_progress(&self, id: i32, counters: &JobCounters) -> Result<()> {
        self.job_repo().update_progress(id, counters).await
    }

    pub async fn finish_import_job(
        &self,
        id: i32,
        status: ImportStatus,
        counters: &JobCounters,
        errors_json: Option<String>,
    ) -> Result<()> {
        self.job_repo()
            .finish(id, status, counters, errors_json)
            .await
    }

    pub async fn get_import_job(&self, id: i32) -> Result<Option<import_jobs::Model>> {
        self.job_repo().find_by_id(id).await
    }

    pub async fn recent_import_jobs(&self, limit: u64) -> Result<Vec<import_jobs::Model>> {
        self.job_repo().recent(limit).await
    }
}
