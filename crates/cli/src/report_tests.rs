// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{DeviceConfig, Options};
use crate::hub::Hub;
use crate::status::{ConfigDiff, DeviceState, DeviceStatus, StatusStore};

use super::build_report;

fn device(hostname: &str) -> DeviceConfig {
    DeviceConfig {
        hostname: hostname.to_owned(),
        target: hostname.to_owned(),
        method: "cisco".to_owned(),
        timeout: Duration::from_secs(60),
        command_timeout: Duration::from_secs(10),
        options: BTreeMap::new(),
    }
}

fn options(hostnames: &[&str]) -> Options {
    Options {
        workspace: PathBuf::from("/tmp"),
        interval: Duration::ZERO,
        timeout: Duration::from_secs(60),
        concurrency: 1,
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
        devices: hostnames.iter().map(|h| device(h)).collect(),
    }
}

fn success(hostname: &str, diffs: BTreeMap<String, ConfigDiff>) -> DeviceStatus {
    let mut status = DeviceStatus::pending(device(hostname), DeviceState::Pending);
    status.transition(DeviceState::Success);
    status.diffs = diffs;
    status
}

#[tokio::test]
async fn quiet_devices_report_no_changes() {
    let opts = options(&["r1"]);
    let store = StatusStore::new(Hub::new());
    store.set(success("r1", BTreeMap::new()));

    let (report, diffs) = build_report(&opts, &store);
    assert_eq!(report, "r1: no changes\n");
    assert!(diffs.is_empty());
}

#[tokio::test]
async fn changed_devices_list_artifacts_and_append_diffs() {
    let opts = options(&["r1"]);
    let store = StatusStore::new(Hub::new());
    let mut diffs = BTreeMap::new();
    diffs.insert("config".to_owned(), ConfigDiff {
        diff: "+snmp on".to_owned(),
        added: 1,
        removed: 0,
        new_file: false,
    });
    diffs.insert("version".to_owned(), ConfigDiff { new_file: true, ..ConfigDiff::default() });
    store.set(success("r1", diffs));

    let (report, diff_text) = build_report(&opts, &store);
    assert!(report.starts_with("r1: changes!\n"));
    assert!(report.contains("\tconfig: +1 -0\n"));
    assert!(report.contains("\tversion: new config\n"));
    assert!(diff_text.contains("---- Diff for r1 config:\n+snmp on"));
    // New files have no diff body to append.
    assert!(!diff_text.contains("version"));
}

#[tokio::test]
async fn failed_devices_report_their_error() {
    let opts = options(&["r1", "r2"]);
    let store = StatusStore::new(Hub::new());
    store.set(success("r1", BTreeMap::new()));
    let mut failed = DeviceStatus::pending(device("r2"), DeviceState::Pending);
    failed.transition(DeviceState::Error);
    failed.error_message = "collection error for r2: Bad username or password".to_owned();
    store.set(failed);

    let (report, _) = build_report(&opts, &store);
    // Devices appear in configuration order.
    assert_eq!(
        report,
        "r1: no changes\nr2: error: collection error for r2: Bad username or password\n"
    );
}

#[tokio::test]
async fn never_collected_devices_still_show_up() {
    let opts = options(&["ghost"]);
    let store = StatusStore::new(Hub::new());
    let (report, _) = build_report(&opts, &store);
    assert_eq!(report, "ghost: error: never collected\n");
}
