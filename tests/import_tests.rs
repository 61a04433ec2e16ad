//! End-to-end tests for the import pipeline against a temp sqlite database.

use std::sync::Arc;

use bingarr::config::Config;
use bingarr::db::Store;
use bingarr::domain::events::PipelineEvent;
use bingarr::parser::TitleParser;
use bingarr::services::{
    CatalogService, DefaultImportService, ImportError, ImportService, NotifyService, RawRecord,
    SeasonSequelPolicy, SequelService,
};
use sea_orm::ConnectionTrait;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

const USER_A: &str = "11111111-1111-1111-1111-111111111111";
const USER_B: &str = "22222222-2222-2222-2222-222222222222";

async fn spawn_pipeline() -> (
    Store,
    DefaultImportService,
    broadcast::Sender<PipelineEvent>,
) {
    let db_path =
        std::env::temp_dir().join(format!("bingarr-import-test-{}.db", uuid::Uuid::new_v4()));

    let config = Config::default();
    let store = Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open test store");

    let (event_bus, _) = broadcast::channel(64);

    let notify = Arc::new(NotifyService::new(store.clone(), event_bus.clone()));
    let sequels = Arc::new(SequelService::new(
        store.clone(),
        notify,
        Arc::new(SeasonSequelPolicy),
        config.detector.min_confidence,
    ));
    let catalog = Arc::new(CatalogService::new(
        store.clone(),
        None,
        sequels.clone(),
        event_bus.clone(),
    ));
    let importer = DefaultImportService::new(
        store.clone(),
        TitleParser::new(&config.parser),
        catalog,
        sequels,
        event_bus.clone(),
        &config.import,
    );

    (store, importer, event_bus)
}

fn record(title: &str) -> RawRecord {
    RawRecord {
        title: title.to_string(),
        consumed_at: None,
        source_tag: "netflix-export".to_string(),
    }
}

#[tokio::test]
async fn import_dedups_titles_case_insensitively() {
    let (store, importer, _) = spawn_pipeline().await;

    let records = vec![
        record("Arcane: Staffel 1: Willkommen im Spielzeugland"),
        record("KPop Demon Hunters"),
        record("arcane: staffel 1: willkommen im spielzeugland"),
    ];

    let summary = importer
        .run_import(USER_A, records, CancellationToken::new())
        .await
        .expect("import should run");

    assert_eq!(summary.created, 2);
    assert_eq!(summary.linked_existing, 1);
    assert!(summary.failed.is_empty());

    let entity = store
        .get_entity_by_title_key("arcane: staffel 1: willkommen im spielzeugland")
        .await
        .expect("lookup should work")
        .expect("episode entity should exist");

    // The first spelling wins; the repeat only stamps provenance.
    assert_eq!(entity.title, "Arcane: Staffel 1: Willkommen im Spielzeugland");
    assert_eq!(entity.base_title.as_deref(), Some("Arcane"));
    assert_eq!(entity.season_number, Some(1));
    assert_eq!(entity.kind, "series_episode");

    let provenance: serde_json::Value =
        serde_json::from_str(&entity.provenance).expect("provenance should be json");
    assert_eq!(provenance["imports"].as_array().map(Vec::len), Some(2));
    assert_eq!(provenance["raw_titles"].as_array().map(Vec::len), Some(2));

    let movie = store
        .get_entity_by_title_key("kpop demon hunters")
        .await
        .expect("lookup should work")
        .expect("movie entity should exist");
    assert_eq!(movie.kind, "movie");
    assert_eq!(movie.base_title, None);

    let jobs = store.recent_import_jobs(10).await.expect("jobs should list");
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_eq!(job.status, "completed");
    assert_eq!(job.total_rows, 3);
    assert_eq!(job.processed_rows, 3);
    assert_eq!(job.created_count, 2);
    assert_eq!(job.linked_count, 1);
    assert_eq!(job.failed_count, 0);
    assert!(job.finished_at.is_some());
}

#[tokio::test]
async fn reimport_links_existing_rows() {
    let (store, importer, _) = spawn_pipeline().await;

    let batch = || {
        vec![
            record("Dark: Staffel 1: Geheimnisse"),
            record("KPop Demon Hunters"),
        ]
    };

    let first = importer
        .run_import(USER_A, batch(), CancellationToken::new())
        .await
        .expect("first import");
    assert_eq!(first.created, 2);

    let second = importer
        .run_import(USER_A, batch(), CancellationToken::new())
        .await
        .expect("second import");
    assert_eq!(second.created, 0);
    assert_eq!(second.linked_existing, 2);

    assert_eq!(store.all_entities().await.expect("list entities").len(), 2);

    // Consumption stays one row per (user, entity) no matter how often
    // the export is replayed.
    assert_eq!(
        store
            .consumption_for_user(USER_A)
            .await
            .expect("list consumption")
            .len(),
        2
    );
}

#[tokio::test]
async fn two_users_share_one_canonical_entity() {
    let (store, importer, _) = spawn_pipeline().await;

    let a = importer
        .run_import(
            USER_A,
            vec![record("KPop Demon Hunters")],
            CancellationToken::new(),
        )
        .await
        .expect("user a import");
    let b = importer
        .run_import(
            USER_B,
            vec![record("kpop demon hunters")],
            CancellationToken::new(),
        )
        .await
        .expect("user b import");

    assert_eq!(a.created, 1);
    assert_eq!(b.created, 0);
    assert_eq!(b.linked_existing, 1);

    let entities = store.all_entities().await.expect("list entities");
    assert_eq!(entities.len(), 1);

    let entity = &entities[0];
    assert!(store.has_consumed(USER_A, entity.id).await.expect("check a"));
    assert!(store.has_consumed(USER_B, entity.id).await.expect("check b"));

    assert_eq!(
        store
            .entities_for_user(USER_A)
            .await
            .expect("user a entities")
            .len(),
        1
    );
}

#[tokio::test]
async fn episodes_aggregate_under_one_base() {
    let (store, importer, _) = spawn_pipeline().await;

    let records: Vec<RawRecord> = (1..=3)
        .flat_map(|season| (1..=3).map(move |ep| format!("Arcane: Season {season}: Chapter {ep}")))
        .map(|title| record(&title))
        .collect();

    let summary = importer
        .run_import(USER_A, records, CancellationToken::new())
        .await
        .expect("import should run");

    assert_eq!(summary.created, 9);
    assert_eq!(summary.linked_existing, 0);

    // Grouping by base yields one series with nine episodes across three seasons.
    let entities = store.entities_for_user(USER_A).await.expect("user catalog");
    assert_eq!(entities.len(), 9);
    assert!(
        entities
            .iter()
            .all(|e| e.base_title.as_deref() == Some("Arcane"))
    );

    let per_season = |s: i32| {
        entities
            .iter()
            .filter(|e| e.season_number == Some(s))
            .count()
    };
    assert_eq!(per_season(1), 3);
    assert_eq!(per_season(2), 3);
    assert_eq!(per_season(3), 3);

    assert_eq!(
        store
            .consumption_for_user(USER_A)
            .await
            .expect("consumption rows")
            .len(),
        9
    );
}

#[tokio::test]
async fn blank_titles_are_skipped_not_failed() {
    let (store, importer, _) = spawn_pipeline().await;

    let records = vec![record("KPop Demon Hunters"), record(""), record("   ")];

    let summary = importer
        .run_import(USER_A, records, CancellationToken::new())
        .await
        .expect("import should run");

    assert_eq!(summary.created, 1);
    assert_eq!(summary.skipped_empty, 2);
    assert!(summary.failed.is_empty());

    let job = &store.recent_import_jobs(1).await.expect("jobs")[0];
    assert_eq!(job.status, "completed");
    assert_eq!(job.skipped_count, 2);
}

#[tokio::test]
async fn one_bad_row_does_not_abort_the_batch() {
    let (store, importer, _) = spawn_pipeline().await;

    store
        .conn
        .execute_unprepared(
            "CREATE TRIGGER reject_poison BEFORE INSERT ON media_entities \
             WHEN NEW.title_key LIKE '%poison%' \
             BEGIN SELECT RAISE(ABORT, 'poison title rejected'); END",
        )
        .await
        .expect("create poison trigger");

    let records = vec![
        record("Dark: Staffel 1: Geheimnisse"),
        record("Poison Row"),
        record("KPop Demon Hunters"),
    ];

    let summary = importer
        .run_import(USER_A, records, CancellationToken::new())
        .await
        .expect("batch should finish despite the bad row");

    assert_eq!(summary.created, 2);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].index, 1);
    assert!(!summary.failed[0].reason.is_empty());

    assert_eq!(store.all_entities().await.expect("entities").len(), 2);

    let job = &store.recent_import_jobs(1).await.expect("jobs")[0];
    assert_eq!(job.status, "partial");
    assert_eq!(job.failed_count, 1);
}

#[tokio::test]
async fn large_batch_finishes_partial_with_error_log() {
    let (store, importer, _) = spawn_pipeline().await;

    store
        .conn
        .execute_unprepared(
            "CREATE TRIGGER reject_poison BEFORE INSERT ON media_entities \
             WHEN NEW.title_key LIKE '%poison%' \
             BEGIN SELECT RAISE(ABORT, 'poison title rejected'); END",
        )
        .await
        .expect("create poison trigger");

    let records: Vec<RawRecord> = (0..100)
        .map(|i| match i {
            10 | 20 => record(""),
            50 => record("Poison Row: Season 1: X"),
            _ => record(&format!("Series {i}: Season 1: Pilot")),
        })
        .collect();

    let summary = importer
        .run_import(USER_A, records, CancellationToken::new())
        .await
        .expect("batch should finish");

    assert_eq!(summary.created, 97);
    assert_eq!(summary.skipped_empty, 2);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].index, 50);
    assert_eq!(summary.processed(), 100);

    let job = &store.recent_import_jobs(1).await.expect("jobs")[0];
    assert_eq!(job.status, "partial");
    assert_eq!(job.processed_rows, 100);
    assert_eq!(job.created_count, 97);

    let errors: Vec<serde_json::Value> =
        serde_json::from_str(&job.errors).expect("errors column should hold a json array");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["index"], 50);
}

#[tokio::test]
async fn cancellation_stops_between_records() {
    let (store, importer, _) = spawn_pipeline().await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let records = vec![
        record("Dark: Staffel 1: Geheimnisse"),
        record("KPop Demon Hunters"),
    ];

    let summary = importer
        .run_import(USER_A, records, cancel)
        .await
        .expect("cancelled import still returns a summary");

    assert_eq!(summary.processed(), 0);

    // The job row is finalized even when nothing ran.
    let job = &store.recent_import_jobs(1).await.expect("jobs")[0];
    assert_eq!(job.status, "partial");
    assert_eq!(job.processed_rows, 0);
    assert!(job.finished_at.is_some());
}

#[tokio::test]
async fn csv_export_import_reads_title_and_date() {
    let (store, importer, _) = spawn_pipeline().await;

    let dir = std::env::temp_dir().join(format!("bingarr-csv-{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(&dir).await.expect("create dir");
    let csv_path = dir.join("NetflixViewingActivity.csv");
    tokio::fs::write(
        &csv_path,
        "Title,Date\n\
         \"Arcane: Season 2: Heavy Is the Crown\",1/15/24\n\
         KPop Demon Hunters,\n\
         ,3/1/24\n",
    )
    .await
    .expect("write export");

    let summary = importer
        .import_csv(USER_A, &csv_path, "netflix-export", CancellationToken::new())
        .await
        .expect("csv import should run");

    assert_eq!(summary.created, 2);
    assert_eq!(summary.skipped_empty, 1);

    let rows = store
        .consumption_for_user(USER_A)
        .await
        .expect("list consumption");
    let dated: Vec<&str> = rows.iter().filter_map(|r| r.consumed_at.as_deref()).collect();
    assert_eq!(dated, vec!["2024-01-15T00:00:00+00:00"]);
}

#[tokio::test]
async fn csv_headers_match_case_insensitively() {
    let (_, importer, _) = spawn_pipeline().await;

    let dir = std::env::temp_dir().join(format!("bingarr-csv-{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(&dir).await.expect("create dir");
    let csv_path = dir.join("history.csv");
    tokio::fs::write(&csv_path, "TITLE,DATE\nKPop Demon Hunters,2024-01-15\n")
        .await
        .expect("write export");

    let summary = importer
        .import_csv(USER_A, &csv_path, "netflix-export", CancellationToken::new())
        .await
        .expect("csv import should run");

    assert_eq!(summary.created, 1);
}

#[tokio::test]
async fn csv_without_title_column_is_rejected() {
    let (store, importer, _) = spawn_pipeline().await;

    let dir = std::env::temp_dir().join(format!("bingarr-csv-{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(&dir).await.expect("create dir");
    let csv_path = dir.join("broken.csv");
    tokio::fs::write(&csv_path, "Name,Date\nKPop Demon Hunters,1/15/24\n")
        .await
        .expect("write export");

    let err = importer
        .import_csv(USER_A, &csv_path, "netflix-export", CancellationToken::new())
        .await
        .expect_err("import should refuse an export without a title column");

    assert!(matches!(err, ImportError::MissingColumn("Title")));

    // Nothing ran, so no job row either.
    assert!(store.recent_import_jobs(1).await.expect("jobs").is_empty());
}

#[tokio::test]
async fn missing_export_path_is_rejected() {
    let (_, importer, _) = spawn_pipeline().await;

    let err = importer
        .import_csv(
            USER_A,
            std::path::Path::new("/nonexistent/bingarr-history.csv"),
            "netflix-export",
            CancellationToken::new(),
        )
        .await
        .expect_err("import should refuse a missing path");

    assert!(matches!(err, ImportError::PathNotFound(_)));
}

#[tokio::test]
async fn concurrent_imports_converge_on_one_entity() {
    let (store, importer, _) = spawn_pipeline().await;

    let (a, b) = tokio::join!(
        importer.run_import(
            USER_A,
            vec![record("KPop Demon Hunters")],
            CancellationToken::new(),
        ),
        importer.run_import(
            USER_B,
            vec![record("KPop Demon Hunters")],
            CancellationToken::new(),
        ),
    );

    let a = a.expect("user a import");
    let b = b.expect("user b import");

    // Exactly one of the two racing batches created the entity.
    assert_eq!(a.created + b.created, 1);
    assert_eq!(a.linked_existing + b.linked_existing, 1);
    assert_eq!(store.all_entities().await.expect("entities").len(), 1);
}

#[tokio::test]
async fn pipeline_events_bracket_the_batch() {
    let (_, importer, event_bus) = spawn_pipeline().await;
    let mut rx = event_bus.subscribe();

    importer
        .run_import(
            USER_A,
            vec![
                record("Dark: Staffel 1: Geheimnisse"),
                record("KPop Demon Hunters"),
            ],
            CancellationToken::new(),
        )
        .await
        .expect("import should run");

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert!(matches!(
        events.first(),
        Some(PipelineEvent::ImportStarted { total: 2, .. })
    ));
    assert!(matches!(
        events.last(),
        Some(PipelineEvent::ImportFinished { created: 2, .. })
    ));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, PipelineEvent::EntityCreated { .. }))
    );
}
