use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set,
};

use crate::domain::ImportStatus;
use crate::entities::{import_jobs, prelude::*};

/// Running counters for an import job, flushed periodically and on finish.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobCounters {
    pub processed: usize,
    pub created: usize,
    pub linked: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct ImportJobRepository {
    conn: DatabaseConnection,
}

impl ImportJobRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        user_id: &str,
        source_tag: &str,
        total_rows: usize,
    ) -> Result<import_jobs::Model> {
        let model = import_jobs::ActiveModel {
            user_id: Set(user_id.to_string()),
            source_tag: Set(source_tag.to_string()),
            status: Set(ImportStatus::Processing.as_str().to_string()),
            total_rows: Set(to_count(total_rows)),
            processed_rows: Set(0),
            created_count: Set(0),
            linked_count: Set(0),
            skipped_count: Set(0),
            failed_count: Set(0),
            errors: Set("[]".to_string()),
            started_at: Set(Utc::now().to_rfc3339()),
            finished_at: Set(None),
            ..Default::default()
        };

        let result = ImportJobs::insert(model).exec(&self.conn).await?;
        let job = ImportJobs::find_by_id(result.last_insert_id)
            .one(&self.conn)
            .await?
            .context("Import job row missing immediately after insert")?;
        Ok(job)
    }

    pub async fn update_progress(&self, id: i32, counters: &JobCounters) -> Result<()> {
        counter_model(id, counters).update(&self.conn).await?;
        Ok(())
    }

    pub async fn finish(
        &self,
        id: i32,
        status: ImportStatus,
        counters: &JobCounters,
        errors_json: Option<String>,
    ) -> Result<()> {
        let mut model = counter_model(id, counters);
        model.status = Set(status.as_str().to_string());
        model.errors = Set(errors_json.unwrap_or_else(|| "[]".to_string()));
        model.finished_at = Set(Some(Utc::now().to_rfc3339()));
        model.update(&self.conn).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<import_jobs::Model>> {
        let job = ImportJobs::find_by_id(id).one(&self.conn).await?;
        Ok(job)
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<import_jobs::Model>> {
        let jobs = ImportJobs::find()
            .order_by_desc(import_jobs::Column::StartedAt)
            .order_by_desc(import_jobs::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await?;
        Ok(jobs)
    }
}

fn counter_model(id: i32, counters: &JobCounters) -> import_jobs::ActiveModel {
    import_jobs::ActiveModel {
        id: Set(id),
        processed_rows: Set(to_count(counters.processed)),
        created_count: Set(to_count(counters.created)),
        linked_count: Set(to_count(counters.linked)),
        skipped_count: Set(to_count(counters.skipped)),
        failed_count: Set(to_count(counters.failed)),
        ..Default::default()
    }
}

fn to_count(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
