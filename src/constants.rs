pub mod cache {

    pub const ENRICHMENT_TTL_HOURS: i64 = 24;
}

pub mod confidence {

    pub const SEASON_INCREMENT: f32 = 0.95;

    pub const SAME_TITLE: f32 = 0.90;

    pub const MIN_THRESHOLD: f32 = 0.60;
}

pub mod import {

    pub const PROGRESS_UPDATE_ROWS: usize = 10;

    pub const MAX_JOB_ERRORS: usize = 100;

    pub const DEFAULT_SOURCE_TAG: &str = "export-file";
}

pub mod limits {

    pub const DEFAULT_NOTIFICATION_LIMIT: u64 = 50;

    pub const DEFAULT_JOB_LIMIT: u64 = 10;

    pub const DEFAULT_ENTITY_LIMIT: u64 = 25;
}
