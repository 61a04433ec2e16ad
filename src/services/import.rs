//! Import orchestration - trait and DTOs.
//!
//! One `RawRecord` per viewing-history row. Failures inside the pipeline
//! are captured per record and never abort the batch; `ImportError` is
//! reserved for conditions that stop the batch from running at all.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// One row of a viewing-history export, as handed to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub title: String,
    pub consumed_at: Option<String>,
    pub source_tag: String,
}

/// A per-record failure, indexed by the record's position in the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordFailure {
    pub index: usize,
    pub reason: String,
}

/// What one batch did. `created + linked_existing + skipped_empty +
/// failed.len()` accounts for every processed record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub linked_existing: usize,
    pub skipped_empty: usize,
    pub failed: Vec<RecordFailure>,
}

impl ImportSummary {
    #[must_use]
    pub fn processed(&self) -> usize {
        self.created + self.linked_existing + self.skipped_empty + self.failed.len()
    }
}

/// Batch-level failures: the job row could not be created, the source file
/// is unreadable, or the export cannot be decoded.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Export file missing a '{0}' column")]
    MissingColumn(&'static str),

    #[error("Malformed export file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for ImportError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait]
pub trait ImportService: Send + Sync {
    /// Runs a batch of records through the full pipeline for one user.
    /// Cancellation is honored between records; rows already processed
    /// stay committed.
    async fn run_import(
        &self,
        user_id: &str,
        records: Vec<RawRecord>,
        cancel: CancellationToken,
    ) -> Result<ImportSummary, ImportError>;

    /// Reads a CSV export (`Title` column required, `Date` optional,
    /// headers matched case-insensitively) and imports it.
    async fn import_csv(
        &self,
        user_id: &str,
        path: &Path,
        source_tag: &str,
        cancel: CancellationToken,
    ) -> Result<ImportSummary, ImportError>;
}
