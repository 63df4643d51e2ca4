// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The collection scheduler: a repeating tick that fans every device out
//! to its driver under a concurrency cap, joins all collectors, then runs
//! the change pipeline and the reporter before sleeping to the next tick.
//!
//! All collector tasks for a tick complete before the pipeline runs, so a
//! device can never have two in-flight collections — even when a tick
//! overruns its interval.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::changes;
use crate::config::{DeviceConfig, Options};
use crate::driver::{self, Artifacts};
use crate::error::CollectError;
use crate::report;
use crate::status::{DeviceState, DeviceStatus, StatusStore};
use crate::util::clean_name;

/// Run collection ticks forever; with `interval == 0`, run one tick and
/// return. VCS failures in the change pipeline are fatal.
pub async fn run_collectors(opts: Arc<Options>, store: Arc<StatusStore>) -> anyhow::Result<()> {
    loop {
        let deadline = tokio::time::Instant::now() + opts.interval;
        info!(
            "starting {} collectors (concurrency={})",
            opts.devices.len(),
            opts.concurrency
        );

        let slots = Arc::new(Semaphore::new(opts.concurrency));
        let mut collectors = JoinSet::new();
        for device in opts.devices.iter().cloned() {
            // Acquire before spawning so launches themselves respect the
            // cap, in configuration order.
            let permit = match slots.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_closed) => break,
            };
            let opts = Arc::clone(&opts);
            let store = Arc::clone(&store);
            collectors.spawn(async move {
                let _permit = permit;
                collect_one(&device, &opts, &store).await;
            });
        }
        while let Some(joined) = collectors.join_next().await {
            if let Err(e) = joined {
                // Isolation: one device's panic must not end the tick.
                error!("collector task failed: {e}");
            }
        }
        info!("all {} collectors finished", opts.devices.len());

        if let Err(e) = changes::update_diffs(&opts, &store).await {
            anyhow::bail!("updating config diffs: {e}");
        }
        if let Err(e) = changes::commit_changes(&opts).await {
            anyhow::bail!("committing changes: {e}");
        }
        report::run_reporter(&opts, &store).await;

        if opts.interval.is_zero() {
            info!("interval set to 0 - exiting");
            return Ok(());
        }
        let now = tokio::time::Instant::now();
        if now < deadline {
            info!("sleeping {}s", (deadline - now).as_secs());
            tokio::time::sleep_until(deadline).await;
        }
    }
}

/// Collect one device: write the Pending status, race the driver against
/// the whole-job timeout, persist artifacts, and record the outcome.
async fn collect_one(device: &DeviceConfig, opts: &Options, store: &StatusStore) {
    info!(host = %device.hostname, "starting collector");
    let previous = store.get(&device.hostname).map(|s| s.state).unwrap_or(DeviceState::Pending);
    let mut status = DeviceStatus::pending(device.clone(), previous);
    store.set(status.clone());

    match tokio::time::timeout(device.timeout, driver::collect(device, &opts.launch_dir)).await {
        Ok(Ok(artifacts)) => match persist_artifacts(device, &artifacts, &opts.workspace) {
            Ok(()) => {
                status.transition(DeviceState::Success);
                status.configs = artifacts;
            }
            Err(e) => {
                status.transition(DeviceState::Error);
                status.error_message =
                    format!("error saving results for {}: {e}", device.hostname);
                error!("{}", status.error_message);
            }
        },
        Ok(Err(e)) => {
            let state = match e {
                CollectError::Timeout => DeviceState::Timeout,
                _ => DeviceState::Error,
            };
            status.transition(state);
            status.error_message = format!("collection error for {}: {e}", device.hostname);
            error!("{}", status.error_message);
        }
        Err(_elapsed) => {
            // Dropping the driver future tears the transport down: the
            // session pump kills and reaps the SSH child, and the external
            // script guard interrupts its process.
            status.transition(DeviceState::Timeout);
            status.error_message = format!(
                "collection error for {}: timed out after {}s",
                device.hostname,
                device.timeout.as_secs()
            );
            error!("{}", status.error_message);
        }
    }

    store.set(status);
    info!(host = %device.hostname, "finished collector");
}

/// Write every artifact to `<hostname>-<cleanName>` in the workspace.
/// Tempfile-then-rename keeps a torn write from ever reaching the VCS.
fn persist_artifacts(
    device: &DeviceConfig,
    artifacts: &Artifacts,
    workspace: &Path,
) -> Result<(), CollectError> {
    use std::io::Write;

    for (name, value) in artifacts {
        let file_name = format!("{}-{}", device.hostname, clean_name(name));
        info!(host = %device.hostname, artifact = %name, "saving result");
        let mut tmp = tempfile::NamedTempFile::new_in(workspace)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(workspace.join(&file_name)).map_err(|e| CollectError::Workspace(e.error))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
