// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collection via a caller-supplied external script.
//!
//! The script's stdout becomes the `config` artifact. The scheduler races
//! this whole call against the device's whole-job timeout; losing the
//! race drops the future, and the child's guard interrupts the process —
//! SIGINT first, SIGKILL as backstop — so no script is ever orphaned.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use crate::config::DeviceConfig;
use crate::error::CollectError;

use super::Artifacts;

pub async fn collect(
    device: &DeviceConfig,
    launch_dir: &Path,
) -> Result<Artifacts, CollectError> {
    let script = device
        .opt("script")
        .ok_or_else(|| CollectError::ConfigInvalid("external method requires script".to_owned()))?;

    // Relative paths resolve against the directory the process started in,
    // not the workspace.
    let script_path = if Path::new(script).is_absolute() {
        script.to_owned()
    } else {
        launch_dir.join(script).to_string_lossy().into_owned()
    };

    let argv = shell_words::split(&script_path)
        .map_err(|e| CollectError::ConfigInvalid(format!("bad script value ({script}): {e}")))?;
    let (program, args) = match argv.split_first() {
        Some(parts) => parts,
        None => return Err(CollectError::ConfigInvalid("empty script value".to_owned())),
    };

    let mut child = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| CollectError::ExternalScript(format!("{script_path}: {e}")))?;

    let stdout = read_pipe(child.stdout.take());
    let stderr = read_pipe(child.stderr.take());
    let mut child = ScriptChild { child };

    let status = child
        .wait()
        .await
        .map_err(|e| CollectError::ExternalScript(format!("{script_path}: {e}")))?;

    let stdout = stdout.await.unwrap_or_default();
    let stderr = stderr.await.unwrap_or_default();
    if !status.success() {
        let detail = stderr.trim_end_matches('\n');
        return Err(CollectError::ExternalScript(format!("{script_path}: {detail}")));
    }

    let mut artifacts = Artifacts::new();
    artifacts.insert("config".to_owned(), stdout);
    Ok(artifacts)
}

/// Drain one of the child's output pipes in the background so the child
/// can never block on a full pipe before exiting.
fn read_pipe<R>(pipe: Option<R>) -> tokio::task::JoinHandle<String>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            use tokio::io::AsyncReadExt;
            let _ = pipe.read_to_end(&mut buf).await;
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Owns the running script process. Dropping the guard — on a normal
/// return or because the whole-job race dropped the collect future —
/// sends SIGINT and a short grace; the inner handle's drop then delivers
/// SIGKILL and hands the child to the runtime's reaper.
struct ScriptChild {
    child: tokio::process::Child,
}

impl ScriptChild {
    async fn wait(&mut self) -> std::io::Result<std::process::ExitStatus> {
        self.child.wait().await
    }
}

impl Drop for ScriptChild {
    fn drop(&mut self) {
        if matches!(self.child.try_wait(), Ok(Some(_))) {
            return;
        }
        if let Some(pid) = self.child.id() {
            let _ = kill(Pid::from_raw(pid as i32), Signal::SIGINT);
            std::thread::sleep(Duration::from_millis(50));
        }
    }
}

#[cfg(test)]
#[path = "external_tests.rs"]
mod tests;
