//! Default import orchestrator.
//!
//! Drives each record through parse, find-or-create, consumption recording
//! and sequel detection. A failing record is captured in the summary and
//! the batch keeps going; the import job row tracks progress so long
//! batches stay observable.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ImportConfig;
use crate::constants;
use crate::db::{JobCounters, Store};
use crate::domain::ImportStatus;
use crate::domain::events::PipelineEvent;
use crate::parser::{TitleParser, parse_consumed_at};
use crate::services::catalog::CatalogService;
use crate::services::import::{
    ImportError, ImportService, ImportSummary, RawRecord, RecordFailure,
};
use crate::services::sequels::SequelService;

enum RowOutcome {
    Created,
    LinkedExisting,
}

pub struct DefaultImportService {
    store: Store,
    parser: TitleParser,
    catalog: Arc<CatalogService>,
    sequels: Arc<SequelService>,
    event_bus: broadcast::Sender<PipelineEvent>,
    progress_update_rows: usize,
    max_job_errors: usize,
}

impl DefaultImportService {
    #[must_use]
    pub fn new(
        store: Store,
        parser: TitleParser,
        catalog: Arc<CatalogService>,
        sequels: Arc<SequelService>,
        event_bus: broadcast::Sender<PipelineEvent>,
        config: &ImportConfig,
    ) -> Self {
        Self {
            store,
            parser,
            catalog,
            sequels,
            event_bus,
            progress_update_rows: config.progress_update_rows.max(1),
            max_job_errors: config.max_job_errors,
        }
    }

    /// One record through the full pipeline: parse, find-or-create, record
    /// consumption, detect related content.
    async fn process_record(&self, user_id: &str, record: &RawRecord) -> anyhow::Result<RowOutcome> {
        let parsed = self.parser.parse(&record.title);

        let (entity, created) = self
            .catalog
            .find_or_create(user_id, &parsed, &record.source_tag, &record.title)
            .await?;

        let consumed_at = record.consumed_at.as_deref().and_then(parse_consumed_at);
        let raw_payload = serde_json::to_string(record)?;

        self.store
            .record_consumption(user_id, entity.id, &record.source_tag, consumed_at, raw_payload)
            .await?;

        self.sequels.detect_for_entity(user_id, &entity).await?;

        Ok(if created {
            RowOutcome::Created
        } else {
            RowOutcome::LinkedExisting
        })
    }

    fn errors_json(&self, failed: &[RecordFailure]) -> Option<String> {
        if failed.is_empty() {
            return None;
        }
        let capped: Vec<&RecordFailure> = failed.iter().take(self.max_job_errors).collect();
        serde_json::to_string(&capped).ok()
    }
}

#[async_trait]
impl ImportService for DefaultImportService {
    async fn run_import(
        &self,
        user_id: &str,
        records: Vec<RawRecord>,
        cancel: CancellationToken,
    ) -> Result<ImportSummary, ImportError> {
        let total = records.len();
        let source_tag = records
            .first()
            .map_or(constants::import::DEFAULT_SOURCE_TAG, |r| {
                r.source_tag.as_str()
            })
            .to_string();

        let job = match self.store.create_import_job(user_id, &source_tag, total).await {
            Ok(job) => job,
            Err(e) => {
                let _ = self.event_bus.send(PipelineEvent::Error {
                    message: format!("Import could not start: {e}"),
                });
                return Err(e.into());
            }
        };

        info!(
            event = "import_started",
            job_id = job.id,
            user_id = %user_id,
            total = total,
            "Import batch started"
        );
        let _ = self.event_bus.send(PipelineEvent::ImportStarted {
            job_id: job.id,
            user_id: user_id.to_string(),
            total,
        });

        let mut summary = ImportSummary::default();
        let mut cancelled = false;

        for (index, record) in records.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                warn!(
                    job_id = job.id,
                    processed = index,
                    "Import cancelled, stopping between records"
                );
                break;
            }

            if record.title.trim().is_empty() {
                summary.skipped_empty += 1;
                metrics::counter!("import_rows_total", "outcome" => "skipped_empty").increment(1);
            } else {
                match self.process_record(user_id, record).await {
                    Ok(RowOutcome::Created) => {
                        summary.created += 1;
                        metrics::counter!("import_rows_total", "outcome" => "created").increment(1);
                    }
                    Ok(RowOutcome::LinkedExisting) => {
                        summary.linked_existing += 1;
                        metrics::counter!("import_rows_total", "outcome" => "linked_existing")
                            .increment(1);
                    }
                    Err(e) => {
                        warn!(
                            job_id = job.id,
                            index = index,
                            title = %record.title,
                            "Record failed: {}", e
                        );
                        summary.failed.push(RecordFailure {
                            index,
                            reason: e.to_string(),
                        });
                        metrics::counter!("import_rows_total", "outcome" => "failed").increment(1);
                    }
                }
            }

            let processed = summary.processed();
            if processed % self.progress_update_rows == 0 {
                if let Err(e) = self
                    .store
                    .update_import_job_progress(job.id, &job_counters(&summary))
                    .await
                {
                    warn!(job_id = job.id, "Failed to persist job progress: {}", e);
                }
                let _ = self.event_bus.send(PipelineEvent::ImportProgress {
                    job_id: job.id,
                    processed,
                    total,
                });
            }
        }

        let status = if cancelled {
            ImportStatus::Partial
        } else if !summary.failed.is_empty() && summary.failed.len() == total {
            ImportStatus::Failed
        } else if summary.failed.is_empty() {
            ImportStatus::Completed
        } else {
            ImportStatus::Partial
        };

        let errors_json = self.errors_json(&summary.failed);
        if let Err(e) = self
            .store
            .finish_import_job(job.id, status, &job_counters(&summary), errors_json)
            .await
        {
            warn!(job_id = job.id, "Failed to finalize import job row: {}", e);
        }

        info!(
            event = "import_finished",
            job_id = job.id,
            status = status.as_str(),
            created = summary.created,
            linked_existing = summary.linked_existing,
            skipped_empty = summary.skipped_empty,
            failed = summary.failed.len(),
            "Import batch finished"
        );
        let _ = self.event_bus.send(PipelineEvent::ImportFinished {
            job_id: job.id,
            created: summary.created,
            linked_existing: summary.linked_existing,
            skipped_empty: summary.skipped_empty,
            failed: summary.failed.len(),
        });

        Ok(summary)
    }

    async fn import_csv(
        &self,
        user_id: &str,
        path: &Path,
        source_tag: &str,
        cancel: CancellationToken,
    ) -> Result<ImportSummary, ImportError> {
        if !path.exists() {
            return Err(ImportError::PathNotFound(path.display().to_string()));
        }

        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();

        let title_idx =
            find_column(&headers, "title").ok_or(ImportError::MissingColumn("Title"))?;
        let date_idx = find_column(&headers, "date");

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let title = row.get(title_idx).unwrap_or_default().to_string();
            let consumed_at = date_idx
                .and_then(|idx| row.get(idx))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string);

            records.push(RawRecord {
                title,
                consumed_at,
                source_tag: source_tag.to_string(),
            });
        }

        info!(
            event = "export_loaded",
            path = %path.display(),
            rows = records.len(),
            "Viewing history export loaded"
        );

        self.run_import(user_id, records, cancel).await
    }
}

fn job_counters(summary: &ImportSummary) -> JobCounters {
    JobCounters {
        processed: summary.processed(),
        created: summary.created,
        linked: summary.linked_existing,
        skipped: summary.skipped_empty,
        failed: summary.failed.len(),
    }
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}
