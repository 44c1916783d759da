mod common;

use std::{sync::Arc, time::Duration};

use agriguard_lib::{
    db::models::{ActivityKind, NotificationKind, Priority},
    field::FieldGrid,
    models::ResultSource,
    pipeline::PipelineStatus,
    FailureKind, PipelineConfig, PipelineError,
};
use agriguard_lib::session::DATABASE_FILE;
use common::{
    fast_config, green_canopy, grey_rock, open, settled_statuses, unavailable, ScriptedLoader,
};
use rand::{rngs::StdRng, SeedableRng};
use tempfile::tempdir;

#[tokio::test]
async fn identical_images_hit_the_cache_and_mutate_once() {
    let dir = tempdir().unwrap();
    let loader = ScriptedLoader::new(&[("ear, spike, capitulum", 0.72)]);
    let session = open(dir.path(), fast_config(), Arc::new(loader)).await;
    let before = session.grid().await.zone("A1").cloned().unwrap();

    let first = session.analyze(green_canopy()).await.unwrap();
    let after_first = session.grid().await;
    let second = session.analyze(green_canopy()).await.unwrap();
    let after_second = session.grid().await;

    assert_eq!(first.source, ResultSource::Computed);
    assert_eq!(second.source, ResultSource::Cache);
    assert_eq!(first.result, second.result);
    assert_eq!(first.fingerprint, second.fingerprint);

    assert_eq!(first.result.risk, 72);
    assert_eq!(first.result.pattern, "Minor Stress Pattern");
    assert_eq!(first.result.affected_area, 0);
    assert_eq!(first.result.affected_regions, vec!["A1"]);

    // one mutation for the computed run, none for the replay
    assert_eq!(after_first.zone("A1").unwrap().health, before.health - 25);
    assert_eq!(after_first.zones(), after_second.zones());

    let (hits, _, entries) = session.pipeline().cache_stats().await;
    assert_eq!(hits, 1);
    assert_eq!(entries, 1);

    let feed = session.notifications().recent_activity(5).await.unwrap();
    assert_eq!(
        feed[0].text,
        "Cache Hit: Retrieved deterministic result for existing image."
    );
    assert_eq!(feed[1].text, "Neural Evaluation Complete: Minor Stress Pattern [Conf: 72%]");

    session.shutdown().await;
}

#[tokio::test]
async fn computed_runs_scan_and_cache_hits_skip_scanning() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig {
        preprocess_delay: Duration::from_millis(30),
        scan_delay: Duration::from_millis(30),
        cache_hit_delay: Duration::from_millis(30),
        ..fast_config()
    };
    let loader = ScriptedLoader::new(&[("ear, spike, capitulum", 0.72)]);
    let session = open(dir.path(), config, Arc::new(loader)).await;

    let watcher = tokio::spawn(settled_statuses(session.pipeline().subscribe()));
    let first = session.analyze(green_canopy()).await.unwrap();
    assert_eq!(first.source, ResultSource::Computed);
    assert_eq!(
        watcher.await.unwrap(),
        vec![
            PipelineStatus::Preprocessing,
            PipelineStatus::Scanning,
            PipelineStatus::Completed
        ]
    );

    let watcher = tokio::spawn(settled_statuses(session.pipeline().subscribe()));
    let replay = session.analyze(green_canopy()).await.unwrap();
    assert_eq!(replay.source, ResultSource::Cache);
    assert_eq!(
        watcher.await.unwrap(),
        vec![PipelineStatus::Preprocessing, PipelineStatus::Completed]
    );

    session.shutdown().await;
}

#[tokio::test]
async fn lost_alert_does_not_fail_a_committed_run() {
    let dir = tempdir().unwrap();
    let loader = ScriptedLoader::new(&[("ear, spike, capitulum", 0.72)]);
    let session = open(dir.path(), fast_config(), Arc::new(loader)).await;
    let before = session.grid().await.zone("A1").cloned().unwrap();

    rusqlite::Connection::open(dir.path().join(DATABASE_FILE))
        .unwrap()
        .execute_batch("DROP TABLE notifications;")
        .unwrap();

    let report = session.analyze(green_canopy()).await.unwrap();

    assert_eq!(report.source, ResultSource::Computed);
    assert_eq!(report.result.risk, 72);
    assert_eq!(session.pipeline().snapshot().status, PipelineStatus::Completed);
    assert_eq!(
        session.grid().await.zone("A1").unwrap().health,
        before.health - 25
    );
    assert!(session.notifications().list().await.is_err());

    let feed = session.notifications().recent_activity(1).await.unwrap();
    assert_eq!(
        feed[0].text,
        "Neural Evaluation Complete: Minor Stress Pattern [Conf: 72%]"
    );

    session.shutdown().await;
}

#[tokio::test]
async fn risk_above_threshold_raises_one_medium_alert() {
    let dir = tempdir().unwrap();
    let loader = ScriptedLoader::new(&[("ear, spike, capitulum", 0.72)]);
    let session = open(dir.path(), fast_config(), Arc::new(loader)).await;

    session.analyze(green_canopy()).await.unwrap();
    session.analyze(green_canopy()).await.unwrap();

    let alerts = session.notifications().list().await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, NotificationKind::Pest);
    assert_eq!(alerts[0].priority, Priority::Medium);
    assert_eq!(
        alerts[0].message,
        "AI Detection: Minor Stress Pattern (72% confidence) identified in scanning workflow."
    );

    session.shutdown().await;
}

#[tokio::test]
async fn confident_insect_detection_is_high_priority() {
    let dir = tempdir().unwrap();
    let loader = ScriptedLoader::new(&[("leaf beetle, chrysomelid", 0.9), ("daisy", 0.05)]);
    let session = open(dir.path(), fast_config(), Arc::new(loader)).await;

    let report = session.analyze(green_canopy()).await.unwrap();
    assert_eq!(report.result.pattern, "Pest Infestation: leaf beetle");

    let alerts = session.notifications().list().await.unwrap();
    assert_eq!(alerts[0].priority, Priority::High);

    let feed = session.notifications().recent_activity(1).await.unwrap();
    assert_eq!(feed[0].kind, ActivityKind::Warning);

    session.shutdown().await;
}

#[tokio::test]
async fn rejected_subject_leaves_the_field_untouched() {
    let dir = tempdir().unwrap();
    let loader = ScriptedLoader::new(&[("rock", 0.64)]);
    let session = open(dir.path(), fast_config(), Arc::new(loader)).await;
    let before = session.grid().await;

    let report = session.analyze(grey_rock()).await.unwrap();

    assert!(report.result.is_incompatible_subject());
    assert_eq!(report.result.pattern, "Incompatible Subject: rock");
    assert_eq!(report.result.risk, 0);
    assert_eq!(report.result.confidence, 64);
    assert!(report.result.affected_regions.is_empty());
    assert_eq!(session.grid().await.zones(), before.zones());
    assert!(session.notifications().list().await.unwrap().is_empty());

    let snapshot = session.pipeline().snapshot();
    assert_eq!(snapshot.status, PipelineStatus::Completed);
    assert_eq!(snapshot.last_result, Some(report.result.clone()));

    let feed = session.notifications().recent_activity(1).await.unwrap();
    assert_eq!(feed[0].kind, ActivityKind::Warning);
    assert_eq!(feed[0].text, "Neural Reject: Subject identified as \"rock\"");

    // rejected results are deterministic too
    let again = session.analyze(grey_rock()).await.unwrap();
    assert_eq!(again.source, ResultSource::Cache);

    session.shutdown().await;
}

#[tokio::test]
async fn missing_model_parks_the_pipeline_in_failed() {
    let dir = tempdir().unwrap();
    let session = open(dir.path(), fast_config(), unavailable()).await;

    let err = session.analyze(green_canopy()).await.unwrap_err();
    assert!(matches!(err, PipelineError::ModelUnavailable(_)));

    let snapshot = session.pipeline().snapshot();
    assert_eq!(snapshot.status, PipelineStatus::Failed);
    assert_eq!(snapshot.failure, Some(FailureKind::ModelUnavailable));
    assert!(snapshot.last_result.is_none());

    let (_, _, entries) = session.pipeline().cache_stats().await;
    assert_eq!(entries, 0);
    assert_eq!(session.pipeline().latest_risk(), 12);

    let feed = session.notifications().recent_activity(1).await.unwrap();
    assert_eq!(feed[0].kind, ActivityKind::Error);

    session.pipeline().reset().await;
    let snapshot = session.pipeline().snapshot();
    assert_eq!(snapshot.status, PipelineStatus::Idle);
    assert!(snapshot.failure.is_none());

    session.shutdown().await;
}

#[tokio::test]
async fn corrupt_payload_is_an_unreadable_image() {
    let dir = tempdir().unwrap();
    let loader = ScriptedLoader::new(&[("corn", 0.9)]);
    let session = open(dir.path(), fast_config(), Arc::new(loader)).await;

    let err = session
        .analyze(b"definitely not a png".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnreadableImage(_)));
    assert_eq!(
        session.pipeline().snapshot().failure,
        Some(FailureKind::UnreadableImage)
    );

    session.shutdown().await;
}

#[tokio::test]
async fn oversized_upload_is_rejected_before_any_transition() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig {
        max_upload_bytes: 16,
        ..fast_config()
    };
    let loader = ScriptedLoader::new(&[("corn", 0.9)]);
    let loads = loader.loads.clone();
    let session = open(dir.path(), config, Arc::new(loader)).await;

    let err = session.analyze(vec![0u8; 17]).await.unwrap_err();
    match err {
        PipelineError::InputTooLarge { size, limit } => {
            assert_eq!(size, 17);
            assert_eq!(limit, 16);
        }
        other => panic!("unexpected error {other:?}"),
    }

    let snapshot = session.pipeline().snapshot();
    assert_eq!(snapshot.status, PipelineStatus::Idle);
    assert_eq!(snapshot.run_id, 0);
    assert_eq!(loads.load(std::sync::atomic::Ordering::SeqCst), 0);

    session.shutdown().await;
}

#[tokio::test]
async fn newer_upload_supersedes_an_in_flight_run() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig {
        preprocess_delay: Duration::from_millis(200),
        ..fast_config()
    };
    let loader = ScriptedLoader::new(&[("ear, spike, capitulum", 0.72)]);
    let loads = loader.loads.clone();
    let session = open(dir.path(), config, Arc::new(loader)).await;

    let pipeline = session.pipeline().clone();
    let first = tokio::spawn(async move { pipeline.analyze(green_canopy()).await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = session.analyze(green_canopy()).await.unwrap();

    let first = first.await.unwrap();
    assert!(matches!(first, Err(PipelineError::Superseded(1))));
    assert_eq!(second.run_id, 2);
    assert_eq!(second.source, ResultSource::Computed);

    // only the surviving run committed
    assert_eq!(session.notifications().list().await.unwrap().len(), 1);
    let a1 = session.grid().await.zone("A1").cloned().unwrap();
    let untouched = FieldGrid::generate(&mut StdRng::seed_from_u64(common::SEED));
    assert_eq!(a1.health, untouched.zone("A1").unwrap().health - 25);

    assert_eq!(loads.load(std::sync::atomic::Ordering::SeqCst), 1);

    session.shutdown().await;
}

#[tokio::test]
async fn reset_abandons_the_run_in_flight() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig {
        scan_delay: Duration::from_millis(200),
        ..fast_config()
    };
    let loader = ScriptedLoader::new(&[("ear, spike, capitulum", 0.72)]);
    let session = open(dir.path(), config, Arc::new(loader)).await;
    let mut updates = session.pipeline().subscribe();

    let pipeline = session.pipeline().clone();
    let run = tokio::spawn(async move { pipeline.analyze(green_canopy()).await });

    // wait until the run reaches Scanning
    updates
        .wait_for(|state| state.status == PipelineStatus::Scanning)
        .await
        .unwrap();
    session.pipeline().reset().await;

    assert!(matches!(run.await.unwrap(), Err(PipelineError::Superseded(1))));
    let snapshot = session.pipeline().snapshot();
    assert_eq!(snapshot.status, PipelineStatus::Idle);
    assert!(snapshot.last_result.is_none());
    assert!(session.notifications().list().await.unwrap().is_empty());

    session.shutdown().await;
}

#[tokio::test]
async fn evicted_fingerprints_are_recomputed() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig {
        cache_capacity: 1,
        ..fast_config()
    };
    let loader = ScriptedLoader::new(&[("corn", 0.3)]);
    let session = open(dir.path(), config, Arc::new(loader)).await;

    let a = common::png(32, 32, [40, 160, 50]);
    let b = common::png(32, 32, [50, 170, 60]);

    session.analyze(a.clone()).await.unwrap();
    session.analyze(b).await.unwrap();
    let replay = session.analyze(a).await.unwrap();

    assert_eq!(replay.source, ResultSource::Computed);
    let (hits, misses, entries) = session.pipeline().cache_stats().await;
    assert_eq!((hits, misses, entries), (0, 3, 1));

    session.shutdown().await;
}
