//! Test helpers: session stores wired to recording collaborators.
//!
//! Run from workspace root: `cargo test -p allconv-session`.

pub mod converters;
pub mod fixtures;
pub mod sinks;

use allconv_core::{SessionConfig, SessionSnapshot};
use allconv_processing::Converter;
use allconv_session::ConversionSessionStore;
use std::sync::Arc;
use std::time::Duration;

use converters::ScriptedConverter;
use sinks::RecordingSink;

/// Store plus handles on its collaborators.
pub struct TestSession {
    pub store: ConversionSessionStore,
    pub converter: Arc<ScriptedConverter>,
    pub sink: Arc<RecordingSink>,
}

/// Config with millisecond ticks so whole runs finish quickly.
pub fn fast_config() -> SessionConfig {
    SessionConfig {
        tick_interval: Duration::from_millis(1),
        download_stagger: Duration::from_millis(1),
        ..SessionConfig::default()
    }
}

pub fn setup_session() -> TestSession {
    setup_session_with(fast_config(), ScriptedConverter::new())
}

pub fn setup_session_with(config: SessionConfig, converter: ScriptedConverter) -> TestSession {
    let converter = Arc::new(converter);
    let sink = Arc::new(RecordingSink::new());
    let store = ConversionSessionStore::new(
        config,
        converter.clone() as Arc<dyn Converter>,
        sink.clone(),
    );
    TestSession {
        store,
        converter,
        sink,
    }
}

/// Polls the store until `predicate` holds, panicking after five seconds.
pub async fn wait_until<F>(store: &ConversionSessionStore, mut predicate: F) -> SessionSnapshot
where
    F: FnMut(&SessionSnapshot) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let snapshot = store.snapshot().await;
        if predicate(&snapshot) {
            return snapshot;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "Condition not reached in time: {:?}",
            snapshot.run_state
        );
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}
