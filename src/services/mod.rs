pub mod catalog;
pub use catalog::{CatalogService, ImportStamp, Provenance};

pub mod enrichment;
pub use enrichment::{EnrichmentResult, EnrichmentService, MetadataProvider};

pub mod sequels;
pub use sequels::{
    DetectionStats, RelatedMatch, RelationKind, RelationPolicy, ScanStats, SeasonSequelPolicy,
    SequelService,
};

pub mod notify;
pub use notify::NotifyService;

pub mod import;
pub mod import_impl;
pub use import::{ImportError, ImportService, ImportSummary, RawRecord, RecordFailure};
pub use import_impl::DefaultImportService;
