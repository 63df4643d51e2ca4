// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin async wrappers over the `git` CLI, always run inside the
//! workspace directory. These are the only external commands the engine
//! depends on besides `ssh`.

use std::path::Path;

use tracing::debug;

use crate::error::CollectError;

/// Run git with the given arguments; non-zero exit becomes a `Vcs` error
/// carrying the captured stderr.
async fn run(workspace: &Path, args: &[&str]) -> Result<String, CollectError> {
    debug!(?args, "running git");
    let output = tokio::process::Command::new("git")
        .args(args)
        .current_dir(workspace)
        .output()
        .await
        .map_err(|e| CollectError::Vcs(format!("git {} error: {e}", args.first().unwrap_or(&""))))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CollectError::Vcs(format!(
            "git {} error: {}",
            args.first().unwrap_or(&""),
            stderr.trim_end()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `git init` the workspace if it is not already a repository.
pub async fn ensure_repo(workspace: &Path) -> Result<(), CollectError> {
    if workspace.join(".git").exists() {
        return Ok(());
    }
    run(workspace, &["init"]).await.map(|_| ())
}

/// `git status -s`, optionally limited to one file. Empty output means a
/// clean tree (or an unchanged file).
pub async fn status_short(workspace: &Path, file: Option<&str>) -> Result<String, CollectError> {
    match file {
        Some(file) => run(workspace, &["status", "-s", file]).await,
        None => run(workspace, &["status", "-s"]).await,
    }
}

pub async fn add_all(workspace: &Path) -> Result<(), CollectError> {
    run(workspace, &["add", "."]).await.map(|_| ())
}

pub async fn commit_all(workspace: &Path, message: &str) -> Result<(), CollectError> {
    run(workspace, &["commit", "-a", "-m", message]).await.map(|_| ())
}

pub async fn push(workspace: &Path) -> Result<(), CollectError> {
    run(workspace, &["push"]).await.map(|_| ())
}

/// Unified diff with four lines of context for one file, with the four
/// header lines (`diff --git`, `index`, `---`, `+++`) stripped.
pub async fn diff_unified(workspace: &Path, file: &str) -> Result<String, CollectError> {
    let raw = run(workspace, &["diff", "-U4", file]).await?;
    if raw.is_empty() {
        return Ok(raw);
    }
    let lines: Vec<&str> = raw.split('\n').collect();
    if lines.len() > 4 {
        Ok(lines[4..].join("\n"))
    } else {
        Ok(raw)
    }
}

/// Added/removed line counts for one file from `git diff --numstat`.
pub async fn diff_numstat(workspace: &Path, file: &str) -> Result<(u64, u64), CollectError> {
    let raw = run(workspace, &["diff", "--numstat", file]).await?;
    let mut fields = raw.split_whitespace();
    let added = fields.next().and_then(|f| f.parse().ok());
    let removed = fields.next().and_then(|f| f.parse().ok());
    match (added, removed) {
        (Some(added), Some(removed)) => Ok((added, removed)),
        _ => Err(CollectError::Vcs(format!("unexpected git numstat response: {raw}"))),
    }
}

/// Recent history, one line per commit.
pub async fn log_oneline(workspace: &Path, count: usize) -> Result<Vec<String>, CollectError> {
    let raw = run(workspace, &["log", &format!("-n{count}"), "--format=oneline"]).await?;
    Ok(raw.lines().map(str::to_owned).collect())
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
