pub mod catalog;
pub mod consumption;
pub mod enrichment;
pub mod jobs;
pub mod notifications;
