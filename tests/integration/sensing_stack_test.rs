//! End-to-end runs over the device adapters
//!
//! Offline text generator, a static network list and file-backed history in
//! a temp directory. No inference server or wireless interface is needed.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::runtime::Handle;

use sensing_cascade::models::settings::{AppConfig, FusionMode};
use sensing_cascade::services::cascade::PhaseOrchestrator;
use sensing_cascade::services::sensing::SensingStack;
use sensing_cascade::storage::ConfigService;
use sensing_cascade_core::{CascadeConfig, HistoryReader, Phase, ProgressKind};

use super::support::{settle, until_idle, EventLog};

fn offline_config(networks: &[&str]) -> AppConfig {
    let mut config = AppConfig::default();
    config.offline = true;
    config.scanner.static_networks = networks.iter().map(|n| n.to_string()).collect();
    config
}

#[tokio::test(start_paused = true)]
async fn test_offline_cascade_persists_and_reports() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(&["eduroam", "Library-Guest"]);
    let stack = SensingStack::build(&config, dir.path(), Handle::current()).unwrap();

    let host = Arc::new(());
    let orchestrator = PhaseOrchestrator::with_handle(
        Handle::current(),
        CascadeConfig::default().with_motion_duration(Duration::from_millis(3_500)),
        stack.collaborators(Arc::new(Arc::downgrade(&host))),
    )
    .unwrap();
    let log = EventLog::default();

    orchestrator.start(log.callback());
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    until_idle(&orchestrator).await;

    let samples = log
        .texts()
        .into_iter()
        .filter(|t| t.starts_with("Detected motions: "))
        .count();
    assert_eq!(samples, 3);

    let complete = log.last().unwrap();
    assert_eq!(complete.kind, ProgressKind::Completed);
    assert!(complete.text.starts_with("=== Motion Analysis Results ===\n["));
    assert!(complete.text.contains("=== Location Analysis Results ===\nOffline mode"));

    let fused = log
        .events()
        .into_iter()
        .find(|e| e.phase == Phase::Fusion && e.text.starts_with("Context summary"))
        .unwrap();
    assert!(fused.text.contains("Location: Offline mode"));

    assert_eq!(stack.motion_store.records().unwrap().len(), 3);
    assert!(stack.location_store.read_history().is_some());
    assert_eq!(orchestrator.current_phase(), Phase::None);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_host_aborts_the_run() {
    let dir = TempDir::new().unwrap();
    let config = offline_config(&["home"]);
    let stack = SensingStack::build(&config, dir.path(), Handle::current()).unwrap();

    let host = Arc::new(());
    let orchestrator = PhaseOrchestrator::with_handle(
        Handle::current(),
        CascadeConfig::default(),
        stack.collaborators(Arc::new(Arc::downgrade(&host))),
    )
    .unwrap();
    let log = EventLog::default();

    orchestrator.start(log.callback());
    settle().await;
    drop(host);
    tokio::time::sleep(Duration::from_secs(10)).await;
    settle().await;

    let last = log.last().unwrap();
    assert_eq!(last.text, "Analysis context is no longer available");
    assert_eq!(last.phase, Phase::None);
    assert!(stack.location_store.read_history().is_none());
}

#[test]
fn test_config_file_drives_the_stack() {
    let dir = TempDir::new().unwrap();
    let mut service = ConfigService::from_path(dir.path().join("config.json")).unwrap();
    service
        .update_config(sensing_cascade::SettingsUpdate {
            fusion_mode: Some(FusionMode::Inference),
            data_dir: Some(dir.path().join("history")),
            offline: Some(true),
            ..Default::default()
        })
        .unwrap();

    let reloaded = ConfigService::from_path(dir.path().join("config.json")).unwrap();
    assert_eq!(reloaded.get_config().fusion_mode, FusionMode::Inference);
    assert!(reloaded.get_config().offline);
    assert_eq!(reloaded.data_dir().unwrap(), dir.path().join("history"));
}
