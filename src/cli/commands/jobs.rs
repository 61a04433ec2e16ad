//! Import job listing command handler

use crate::config::Config;
use crate::db::Store;
use crate::services::RecordFailure;

pub async fn cmd_jobs(config: &Config, limit: u64) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let jobs = store.recent_import_jobs(limit).await?;

    if jobs.is_empty() {
        println!("No import jobs yet.");
        return Ok(());
    }

    println!("Import Jobs (last {}):", jobs.len());
    println!("{:-<70}", "");

    for job in jobs {
        println!(
            "• [{}] {} | {} | user {} | {} row(s)",
            job.id, job.started_at, job.status, job.user_id, job.total_rows
        );
        println!(
            "  Created: {} | Linked: {} | Skipped: {} | Failed: {}",
            job.created_count, job.linked_count, job.skipped_count, job.failed_count
        );
        if let Some(finished) = &job.finished_at {
            println!("  Finished: {finished}");
        }

        if job.failed_count > 0 {
            if let Ok(failures) = serde_json::from_str::<Vec<RecordFailure>>(&job.errors) {
                for failure in failures.iter().take(3) {
                    println!("    [{}] {}", failure.index, failure.reason);
                }
                if failures.len() > 3 {
                    println!("    ... and {} more", failures.len() - 3);
                }
            }
        }
    }

    Ok(())
}
