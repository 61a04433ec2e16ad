pub use super::consumption_records::Entity as ConsumptionRecords;
pub use super::enrichment_cache::Entity as EnrichmentCache;
pub use super::import_jobs::Entity as ImportJobs;
pub use super::media_entities::Entity as MediaEntities;
pub use super::notifications::Entity as Notifications;
