//! Reload supervisor behavior against real files.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use common::{default_config, loader, rewrite, write_file, write_json, TestConfig};
use strata::{Duration, Options, Shutdown, Supervisor};

fn counter() -> (Arc<AtomicUsize>, impl Fn(&TestConfig) + Send + Sync + 'static) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    (calls, move |_: &TestConfig| {
        seen.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn test_unchanged_files_do_not_reload() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(dir.path(), "config.json", &default_config());
    let (calls, on_change) = counter();

    let supervisor = Supervisor::start(
        Arc::new(loader(Options::default(), &[], &[])),
        TestConfig::default(),
        &[&file],
    )
    .unwrap()
    .on_change(on_change);

    for _ in 0..3 {
        assert!(!supervisor.poll().unwrap());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(*supervisor.current(), default_config());
}

#[test]
fn test_modified_file_reloads_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = default_config();
    let file = write_json(dir.path(), "config.json", &config);
    let (calls, on_change) = counter();

    let supervisor = Supervisor::start(
        Arc::new(loader(Options::default(), &[("DBPassword", "from-env")], &[])),
        TestConfig::default(),
        &[&file],
    )
    .unwrap()
    .on_change(on_change);
    let live = supervisor.live();
    let before = live.load();

    config.app_name = "reloaded".into();
    rewrite(&file, &serde_json::to_string(&config).unwrap(), 60);

    assert!(supervisor.poll().unwrap());
    assert!(!supervisor.poll().unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let after = live.load();
    assert_eq!(after.app_name, "reloaded");
    // Every layer runs again on reload.
    assert_eq!(after.db.password, "from-env");
    assert_eq!(before.app_name, "confgo");
}

#[test]
fn test_new_sibling_file_triggers_reload() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(dir.path(), "config.json", &default_config());
    let options = Options {
        env: "staging".into(),
        ..Options::default()
    };
    let supervisor = Supervisor::start(
        Arc::new(loader(options, &[], &[])),
        TestConfig::default(),
        &[&file],
    )
    .unwrap();

    write_file(dir.path(), "config.staging.json", r#"{"db": {"name": "staging"}}"#);
    assert!(supervisor.poll().unwrap());
    assert_eq!(supervisor.current().db.name, "staging");
}

#[test]
fn test_sibling_created_for_missing_base_triggers_reload() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_json(dir.path(), "base.json", &default_config());
    let missing = dir.path().join("local.json");
    let options = Options {
        env: "staging".into(),
        ..Options::default()
    };
    let supervisor = Supervisor::start(
        Arc::new(loader(options, &[], &[])),
        TestConfig::default(),
        &[&first, &missing],
    )
    .unwrap();
    assert!(!supervisor.poll().unwrap());

    write_file(dir.path(), "local.staging.json", r#"{"app_name": "staged"}"#);
    assert!(supervisor.poll().unwrap());
    assert_eq!(supervisor.current().app_name, "staged");
}

#[test]
fn test_failed_reload_keeps_previous_record() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = default_config();
    let file = write_json(dir.path(), "config.json", &config);
    let (calls, on_change) = counter();

    let supervisor = Supervisor::start(
        Arc::new(loader(Options::default(), &[], &[])),
        TestConfig::default(),
        &[&file],
    )
    .unwrap()
    .on_change(on_change);

    config.db.password.clear();
    rewrite(&file, &serde_json::to_string(&config).unwrap(), 60);
    let err = supervisor.poll().unwrap_err();
    assert_eq!(err.missing_fields(), ["db.password"]);
    assert_eq!(supervisor.current().db.password, "confgo");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    config.db.password = "rotated".into();
    rewrite(&file, &serde_json::to_string(&config).unwrap(), 120);
    assert!(supervisor.poll().unwrap());
    assert_eq!(supervisor.current().db.password, "rotated");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_spawn_requires_auto_reload() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_json(dir.path(), "config.json", &default_config());
    let supervisor = Supervisor::start(
        Arc::new(loader(Options::default(), &[], &[])),
        TestConfig::default(),
        &[&file],
    )
    .unwrap();

    assert!(Arc::new(supervisor)
        .spawn_if_enabled(&Shutdown::new())
        .is_none());
}

#[tokio::test]
async fn test_background_task_reloads_until_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = default_config();
    let file = write_json(dir.path(), "config.json", &config);
    let options = Options {
        auto_reload: true,
        auto_reload_interval: Duration::from_msecs(20),
        ..Options::default()
    };
    let supervisor = Arc::new(
        Supervisor::start(
            Arc::new(loader(options, &[], &[])),
            TestConfig::default(),
            &[&file],
        )
        .unwrap(),
    );
    let live = supervisor.live();
    let shutdown = Shutdown::new();
    let task = Arc::clone(&supervisor)
        .spawn_if_enabled(&shutdown)
        .expect("auto reload is enabled");

    config.number = 7;
    rewrite(&file, &serde_json::to_string(&config).unwrap(), 60);

    let reloaded = tokio::time::timeout(StdDuration::from_secs(5), async {
        while live.load().number != 7 {
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
    })
    .await;
    assert!(reloaded.is_ok(), "background task never published the change");

    assert_eq!(shutdown.trigger(), 1);
    tokio::time::timeout(StdDuration::from_secs(5), task)
        .await
        .expect("task stops after shutdown")
        .unwrap();
}
