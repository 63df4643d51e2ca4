// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot collection tick against a real git workspace, with an
//! external-script device standing in for a network device.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use sweet::config::{DeviceConfig, Options};
use sweet::git;
use sweet::hub::Hub;
use sweet::scheduler::run_collectors;
use sweet::status::{DeviceState, StatusStore};

async fn git_workspace(path: &Path) -> anyhow::Result<()> {
    git::ensure_repo(path).await?;
    for (key, value) in [("user.email", "sweet@localhost"), ("user.name", "sweet")] {
        let status = tokio::process::Command::new("git")
            .args(["config", key, value])
            .current_dir(path)
            .status()
            .await?;
        anyhow::ensure!(status.success(), "git config failed");
    }
    Ok(())
}

fn one_shot_options(workspace: &Path, devices: Vec<DeviceConfig>) -> Options {
    Options {
        workspace: workspace.to_path_buf(),
        interval: Duration::ZERO,
        timeout: Duration::from_secs(30),
        concurrency: 4,
        push: false,
        insecure: false,
        use_syslog: false,
        web_enabled: false,
        web_listen: String::new(),
        web_auth: None,
        to_email: None,
        from_email: None,
        smtp: "localhost:25".to_owned(),
        launch_dir: PathBuf::from("/"),
        devices,
    }
}

fn external_device(hostname: &str, script: &str) -> DeviceConfig {
    let mut options = BTreeMap::new();
    options.insert("script".to_owned(), script.to_owned());
    DeviceConfig {
        hostname: hostname.to_owned(),
        target: hostname.to_owned(),
        method: "external".to_owned(),
        timeout: Duration::from_secs(30),
        command_timeout: Duration::from_secs(5),
        options,
    }
}

#[tokio::test]
async fn fresh_workspace_tick_commits_a_new_snapshot() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    git_workspace(dir.path()).await?;

    let device = external_device("routerA", "/bin/sh -c 'printf hello'");
    let opts = Arc::new(one_shot_options(dir.path(), vec![device]));
    let store = Arc::new(StatusStore::new(Hub::new()));

    run_collectors(Arc::clone(&opts), Arc::clone(&store)).await?;

    // The artifact landed under its deterministic filename.
    assert_eq!(std::fs::read_to_string(dir.path().join("routerA-config"))?, "hello");

    // The status table saw the whole lifecycle and recorded a new-file diff.
    let status = store.get("routerA").ok_or_else(|| anyhow::anyhow!("status missing"))?;
    assert_eq!(status.state, DeviceState::Success);
    assert_eq!(status.configs.get("config").map(String::as_str), Some("hello"));
    let diff = status.diffs.get("config").ok_or_else(|| anyhow::anyhow!("diff missing"))?;
    assert!(diff.new_file);

    // Exactly one commit, message starting with the fixed prefix.
    let log = git::log_oneline(dir.path(), 10).await?;
    assert_eq!(log.len(), 1);
    let message = tokio::process::Command::new("git")
        .args(["log", "-1", "--format=%B"])
        .current_dir(dir.path())
        .output()
        .await?;
    let message = String::from_utf8_lossy(&message.stdout).into_owned();
    assert!(message.starts_with("Sweet commit:\n"), "got message: {message:?}");
    assert!(message.contains("routerA-config"));
    Ok(())
}

#[tokio::test]
async fn second_tick_with_changes_records_counts() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    git_workspace(dir.path()).await?;

    let marker = dir.path().join("grown");
    let script = format!(
        "/bin/sh -c 'if [ -e {marker} ]; then printf \"a\\nb\\nc\\n\"; else printf \"a\\nb\\n\"; fi'",
        marker = marker.display()
    );
    let device = external_device("routerA", &script);
    let opts = Arc::new(one_shot_options(dir.path(), vec![device]));
    let store = Arc::new(StatusStore::new(Hub::new()));

    run_collectors(Arc::clone(&opts), Arc::clone(&store)).await?;
    std::fs::write(&marker, "")?;
    run_collectors(Arc::clone(&opts), Arc::clone(&store)).await?;

    let status = store.get("routerA").ok_or_else(|| anyhow::anyhow!("status missing"))?;
    let diff = status.diffs.get("config").ok_or_else(|| anyhow::anyhow!("diff missing"))?;
    assert!(!diff.new_file);
    assert_eq!((diff.added, diff.removed), (1, 0));

    let log = git::log_oneline(dir.path(), 10).await?;
    assert_eq!(log.len(), 2);
    Ok(())
}

#[tokio::test]
async fn a_failing_device_does_not_stop_the_tick() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    git_workspace(dir.path()).await?;

    let devices = vec![
        external_device("bad1", "/bin/sh -c 'echo nope >&2; exit 1'"),
        external_device("good1", "/bin/sh -c 'printf fine'"),
    ];
    let opts = Arc::new(one_shot_options(dir.path(), devices));
    let store = Arc::new(StatusStore::new(Hub::new()));

    run_collectors(Arc::clone(&opts), Arc::clone(&store)).await?;

    let bad = store.get("bad1").ok_or_else(|| anyhow::anyhow!("status missing"))?;
    assert_eq!(bad.state, DeviceState::Error);
    assert!(bad.error_message.contains("bad1"));
    assert!(bad.error_message.contains("nope"));

    let good = store.get("good1").ok_or_else(|| anyhow::anyhow!("status missing"))?;
    assert_eq!(good.state, DeviceState::Success);
    assert_eq!(std::fs::read_to_string(dir.path().join("good1-config"))?, "fine");
    Ok(())
}
