// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-run change pipeline: walk the artifacts of every successful
//! collection, derive diff records against the committed snapshots, then
//! commit the tick's changes. Runs between ticks, single-threaded by
//! construction — nothing else touches the workspace.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::config::Options;
use crate::error::CollectError;
use crate::git;
use crate::status::{ConfigDiff, DeviceState, StatusStore};
use crate::util::clean_name;

/// Refresh each device's per-artifact diff records from the VCS.
pub async fn update_diffs(opts: &Options, store: &StatusStore) -> Result<(), CollectError> {
    for device in &opts.devices {
        let Some(mut status) = store.get(&device.hostname) else {
            continue;
        };
        if status.state != DeviceState::Success {
            continue;
        }

        let mut diffs = BTreeMap::new();
        for name in status.configs.keys() {
            let file_name = format!("{}-{}", device.hostname, clean_name(name));
            let line = git::status_short(&opts.workspace, Some(&file_name)).await?;
            if line.starts_with("??") {
                diffs.insert(name.clone(), ConfigDiff { new_file: true, ..ConfigDiff::default() });
            } else if line.starts_with(" M") {
                let diff = git::diff_unified(&opts.workspace, &file_name).await?;
                let (added, removed) = git::diff_numstat(&opts.workspace, &file_name).await?;
                diffs.insert(name.clone(), ConfigDiff { diff, added, removed, new_file: false });
            } else if line.trim().is_empty() {
                // unchanged artifact, no record
            } else {
                return Err(CollectError::Vcs(format!(
                    "unexpected git status response: {line}"
                )));
            }
        }
        status.diffs = diffs;
        store.set(status);
    }
    Ok(())
}

/// Commit everything the tick wrote; a no-op on a clean tree. Push
/// failures are logged and swallowed — the snapshots are already safe in
/// the local repository.
pub async fn commit_changes(opts: &Options) -> Result<(), CollectError> {
    let status_text = git::status_short(&opts.workspace, None).await?;
    if status_text.is_empty() {
        info!("no changes to commit");
        return Ok(());
    }

    git::add_all(&opts.workspace).await?;
    git::commit_all(&opts.workspace, &format!("Sweet commit:\n{status_text}")).await?;
    if opts.push {
        if let Err(e) = git::push(&opts.workspace).await {
            warn!("push failed, continuing anyway: {e}");
        }
    }
    info!("committed changes");
    Ok(())
}

#[cfg(test)]
#[path = "changes_tests.rs"]
mod tests;
