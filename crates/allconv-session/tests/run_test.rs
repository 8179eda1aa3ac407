//! Run driver integration tests.
//!
//! Run with: `cargo test -p allconv-session --test run_test`

mod helpers;

use allconv_core::{FileStatus, SettingsUpdate};
use allconv_processing::{default_converter, RasterFormat};
use allconv_session::{ConversionSessionStore, SessionEvent};
use helpers::converters::ScriptedConverter;
use helpers::fixtures::{png_file, png_files, video_file};
use helpers::sinks::RecordingSink;
use helpers::{fast_config, setup_session, setup_session_with, wait_until};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_run_converts_every_file_in_order() {
    let session = setup_session();
    let store = &session.store;
    store.update_settings(SettingsUpdate::format("webp")).await;
    store
        .enqueue(png_files(&["a.png", "b.png", "c.png"]))
        .await;

    let summary = store.start_run().await;

    assert!(summary.started);
    assert_eq!(summary.completed, 3);
    assert_eq!(summary.failed, 0);

    let files = store.files().await;
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
    for file in &files {
        assert_eq!(file.status, FileStatus::Completed);
        assert_eq!(file.progress, 100);
        let output = file.output.as_ref().unwrap();
        assert!(output.name.ends_with(".webp"));
        assert_eq!(output.id, format!("output-{}", file.id));
        assert_eq!(output.mime_type, "image/webp");
        assert!(store.resources().is_live(&output.download));
    }
    assert_eq!(session.converter.called_names(), vec!["a.png", "b.png", "c.png"]);

    let run_state = store.run_state().await;
    assert!(!run_state.is_running);
    assert!(run_state.current_file.is_none());
}

#[tokio::test]
async fn test_failed_conversion_is_recorded_on_the_file() {
    let session = setup_session_with(fast_config(), ScriptedConverter::failing());
    let store = &session.store;
    let ids = store.enqueue(vec![png_file("broken.png")]).await;

    let summary = store.start_run().await;

    assert_eq!(summary.failed, 1);
    let file = store.file(ids[0]).await.unwrap();
    assert_eq!(file.status, FileStatus::Error);
    assert_eq!(file.error_message.as_deref(), Some("Conversion failed"));
    assert!(file.output.is_none());
    assert!(!store.run_state().await.is_running);
}

#[tokio::test]
async fn test_failure_does_not_stop_the_run() {
    let session = setup_session_with(fast_config(), ScriptedConverter::failing_on(&["b.png"]));
    let store = &session.store;
    store
        .enqueue(png_files(&["a.png", "b.png", "c.png"]))
        .await;

    let summary = store.start_run().await;

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 1);
    let statuses: Vec<FileStatus> = store.files().await.iter().map(|f| f.status).collect();
    assert_eq!(
        statuses,
        vec![FileStatus::Completed, FileStatus::Error, FileStatus::Completed]
    );
}

#[tokio::test]
async fn test_at_most_one_file_converting() {
    let config = allconv_core::SessionConfig {
        tick_interval: Duration::from_millis(2),
        ..fast_config()
    };
    let session = setup_session_with(config, ScriptedConverter::new());
    let store = &session.store;
    store
        .enqueue(png_files(&["a.png", "b.png", "c.png"]))
        .await;

    let handle = store.spawn_run().await;
    let mut saw_converting = false;
    while !handle.is_finished() {
        let snapshot = store.snapshot().await;
        let converting = snapshot.converting_count();
        assert!(converting <= 1, "{} files converting at once", converting);
        saw_converting |= converting == 1;
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    handle.await.unwrap();
    assert!(saw_converting);
}

#[tokio::test]
async fn test_events_follow_one_file_at_a_time() {
    let session = setup_session();
    let store = &session.store;
    store.enqueue(png_files(&["a.png", "b.png"])).await;
    let mut events = store.subscribe();

    store.start_run().await;

    let mut in_flight = None;
    let mut finished = false;
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::FileStarted { id } => {
                assert!(in_flight.is_none(), "file started while another converts");
                in_flight = Some(id);
            }
            SessionEvent::Progress { id, .. } => assert_eq!(Some(id), in_flight),
            SessionEvent::FileCompleted { id, .. } | SessionEvent::FileFailed { id, .. } => {
                assert_eq!(in_flight.take(), Some(id));
            }
            SessionEvent::RunFinished { summary } => {
                assert_eq!(summary.completed, 2);
                finished = true;
            }
            _ => {}
        }
    }
    assert!(finished);
}

#[tokio::test]
async fn test_progress_reaches_every_step() {
    let session = setup_session();
    let store = &session.store;
    let ids = store.enqueue(vec![png_file("a.png")]).await;
    let mut events = store.subscribe();

    store.start_run().await;

    let mut steps = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Progress { id, progress } = event {
            assert_eq!(id, ids[0]);
            steps.push(progress);
        }
    }
    assert_eq!(steps, vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
}

#[tokio::test]
async fn test_rerun_skips_completed_files() {
    let session = setup_session_with(fast_config(), ScriptedConverter::failing_on(&["b.png"]));
    let store = &session.store;
    let ids = store.enqueue(png_files(&["a.png", "b.png"])).await;
    store.start_run().await;

    let before = store.file(ids[0]).await.unwrap();
    let summary = store.start_run().await;
    let after = store.file(ids[0]).await.unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(before.output, after.output);
    assert_eq!(after.progress, 100);
    assert_eq!(
        session.converter.called_names(),
        vec!["a.png", "b.png", "b.png"]
    );
}

#[tokio::test]
async fn test_empty_queue_run_is_a_noop() {
    let session = setup_session();
    let summary = session.store.start_run().await;
    assert!(summary.started);
    assert_eq!(summary.completed + summary.failed + summary.skipped, 0);
    assert!(!session.store.run_state().await.is_running);
    assert!(session.converter.calls().is_empty());
}

#[tokio::test]
async fn test_second_start_while_running_is_ignored() {
    let config = allconv_core::SessionConfig {
        tick_interval: Duration::from_millis(5),
        ..fast_config()
    };
    let session = setup_session_with(config, ScriptedConverter::new());
    let store = &session.store;
    store.enqueue(png_files(&["a.png", "b.png"])).await;

    let handle = store.spawn_run().await;
    let second = store.start_run().await;
    assert!(!second.started);

    let summary = handle.await.unwrap();
    assert_eq!(summary.completed, 2);
    assert_eq!(session.converter.calls().len(), 2);
}

#[tokio::test]
async fn test_settings_changed_mid_run_apply_to_later_files() {
    let config = allconv_core::SessionConfig {
        tick_interval: Duration::from_millis(5),
        ..fast_config()
    };
    let session = setup_session_with(config, ScriptedConverter::new());
    let store = &session.store;
    let ids = store.enqueue(png_files(&["a.png", "b.png"])).await;

    let handle = store.spawn_run().await;
    wait_until(store, |s| s.run_state.current_file == Some(ids[0])).await;
    store.update_settings(SettingsUpdate::format("png")).await;
    handle.await.unwrap();

    let calls = session.converter.calls();
    assert_eq!(calls[0].settings.format, "png");
    assert_eq!(calls[1].settings.format, "png");
    let files = store.files().await;
    assert_eq!(files[1].output.as_ref().unwrap().name, "b.png");
}

#[tokio::test]
async fn test_file_removed_during_run_is_dropped() {
    let config = allconv_core::SessionConfig {
        tick_interval: Duration::from_millis(5),
        ..fast_config()
    };
    let session = setup_session_with(config, ScriptedConverter::new());
    let store = &session.store;
    let ids = store
        .enqueue(png_files(&["a.png", "b.png", "c.png"]))
        .await;

    let handle = store.spawn_run().await;
    wait_until(store, |s| s.run_state.current_file == Some(ids[0])).await;
    assert!(store.remove(ids[1]).await);
    let summary = handle.await.unwrap();

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.removed, 1);
    assert_eq!(session.converter.called_names(), vec!["a.png", "c.png"]);
    // Only the two remaining previews and their two artifacts stay live.
    assert_eq!(store.resources().live_count(), 4);
}

#[tokio::test]
async fn test_file_removed_while_converter_is_running_is_dropped() {
    let converter = ScriptedConverter::new().with_delay(Duration::from_millis(150));
    let session = setup_session_with(fast_config(), converter);
    let store = &session.store;
    let ids = store.enqueue(png_files(&["a.png", "b.png"])).await;

    let handle = store.spawn_run().await;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while session.converter.calls().is_empty() {
        assert!(tokio::time::Instant::now() < deadline, "Converter never called");
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert!(store.remove(ids[0]).await);
    let summary = handle.await.unwrap();

    assert_eq!(summary.removed, 1);
    assert_eq!(summary.completed, 1);
    assert_eq!(session.converter.called_names(), vec!["a.png", "b.png"]);

    let files = store.files().await;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].id, ids[1]);
    assert_eq!(files[0].status, FileStatus::Completed);
    // The late result for a.png was never registered: only b's preview and artifact live.
    assert_eq!(store.resources().live_count(), 2);
    assert_eq!(store.download_all().await, 1);
    assert_eq!(session.sink.names(), vec!["b.jpeg"]);
}

#[tokio::test]
async fn test_undecodable_image_is_recorded_as_conversion_failure() {
    let store = ConversionSessionStore::new(
        fast_config(),
        default_converter(),
        Arc::new(RecordingSink::new()),
    );
    let ids = store
        .enqueue(vec![
            allconv_core::RawFile::new("broken.png", "image/png", vec![0u8, 1, 2, 3]),
            png_file("ok.png"),
        ])
        .await;

    let summary = store.start_run().await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.completed, 1);
    let broken = store.file(ids[0]).await.unwrap();
    assert_eq!(broken.status, FileStatus::Error);
    assert_eq!(broken.error_message.as_deref(), Some("Conversion failed"));
}

#[tokio::test]
async fn test_image_backend_reencodes_to_target_format() {
    let store = ConversionSessionStore::new(
        fast_config(),
        default_converter(),
        Arc::new(RecordingSink::new()),
    );
    store
        .enqueue(vec![png_file("photo.png"), video_file("clip.mp4", 64)])
        .await;

    let summary = store.start_run().await;
    assert_eq!(summary.completed, 2);

    let files = store.files().await;
    let photo = files[0].output.as_ref().unwrap();
    assert_eq!(photo.name, "photo.jpeg");
    assert_eq!(photo.mime_type, RasterFormat::Jpeg.to_mime_type());
    let bytes = store.resources().resolve(&photo.download).unwrap().data;
    assert_eq!(
        image::guess_format(&bytes).unwrap(),
        image::ImageFormat::Jpeg
    );

    // Non-image input goes through the pass-through backend untouched.
    let clip = files[1].output.as_ref().unwrap();
    assert_eq!(clip.name, "clip.jpeg");
    assert_eq!(clip.size_bytes, 64);
}
