// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;

use crate::config::DeviceConfig;
use crate::error::CollectError;

use super::collect;

fn device(script: &str, timeout: Duration) -> DeviceConfig {
    let mut options = BTreeMap::new();
    options.insert("script".to_owned(), script.to_owned());
    DeviceConfig {
        hostname: "ext1".to_owned(),
        target: "ext1".to_owned(),
        method: "external".to_owned(),
        timeout,
        command_timeout: Duration::from_secs(5),
        options,
    }
}

#[tokio::test]
async fn stdout_becomes_the_config_artifact() -> anyhow::Result<()> {
    let d = device("/bin/echo hello config", Duration::from_secs(10));
    let artifacts = collect(&d, Path::new("/")).await?;
    assert_eq!(artifacts.get("config").map(String::as_str), Some("hello config\n"));
    Ok(())
}

#[tokio::test]
async fn relative_script_resolves_against_launch_dir() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let script = dir.path().join("dump.sh");
    std::fs::write(&script, "#!/bin/sh\necho scripted\n")?;
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))?;

    let d = device("dump.sh", Duration::from_secs(10));
    let artifacts = collect(&d, dir.path()).await?;
    assert_eq!(artifacts.get("config").map(String::as_str), Some("scripted\n"));
    Ok(())
}

#[tokio::test]
async fn nonzero_exit_reports_stderr() {
    let d = device("/bin/sh -c 'echo boom >&2; exit 3'", Duration::from_secs(10));
    match collect(&d, Path::new("/")).await {
        Err(CollectError::ExternalScript(msg)) => assert!(msg.contains("boom"), "got: {msg}"),
        other => unreachable!("expected ExternalScript, got {other:?}"),
    }
}

#[tokio::test]
async fn dropped_collect_future_interrupts_the_child() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let pid_file = dir.path().join("pid");
    let script = format!(
        "/bin/sh -c 'echo $$ > {pid}; exec /bin/sleep 30'",
        pid = pid_file.display()
    );
    let d = device(&script, Duration::from_secs(60));

    // The whole-job race lives in the scheduler; at the deadline it just
    // drops this future. The child's guard must clean up.
    let raced = tokio::time::timeout(Duration::from_millis(300), collect(&d, Path::new("/"))).await;
    assert!(raced.is_err(), "collect finished before the deadline");

    let pid: i32 = std::fs::read_to_string(&pid_file)?.trim().parse()?;
    assert!(process_exits(pid).await, "script child survived the dropped future");
    Ok(())
}

/// Poll until the process is gone or a zombie awaiting reap.
async fn process_exits(pid: i32) -> bool {
    for _ in 0..100 {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(stat) if !stat.contains(") Z") => {}
            _ => return true,
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn missing_script_option_is_config_error() {
    let mut d = device("x", Duration::from_secs(1));
    d.options.remove("script");
    match collect(&d, Path::new("/")).await {
        Err(CollectError::ConfigInvalid(_)) => {}
        other => unreachable!("expected ConfigInvalid, got {other:?}"),
    }
}
