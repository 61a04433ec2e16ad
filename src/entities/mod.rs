pub mod prelude;

pub mod consumption_records;
pub mod enrichment_cache;
pub mod import_jobs;
pub mod media_entities;
pub mod notifications;
