mod catalog;
mod entities;
mod import;
mod jobs;
mod notifications;
mod scan_sequels;

pub use catalog::cmd_catalog;
pub use entities::{cmd_entities, cmd_entity_info};
pub use import::cmd_import;
pub use jobs::cmd_jobs;
pub use notifications::{cmd_mark_read, cmd_notifications};
pub use scan_sequels::cmd_scan_sequels;
