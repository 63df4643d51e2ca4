// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process bootstrap: resolve options, prepare the workspace, start the
//! web edge, and hand control to the collection scheduler.

use std::sync::Arc;

use anyhow::Context;
use tracing::error;

use crate::config::{Config, Options};
use crate::git;
use crate::hub::Hub;
use crate::scheduler;
use crate::status::StatusStore;
use crate::web;

pub async fn run(cli: Config) -> anyhow::Result<()> {
    let launch_dir = std::env::current_dir().context("resolving working directory")?;
    let ini_text = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("reading config file {}", cli.config.display()))?;
    let opts = Options::load(&cli, &ini_text, launch_dir)?;

    init_logging(&opts);

    // Runtime dependency: every snapshot lands in a git repository.
    let git_present = tokio::process::Command::new("git")
        .arg("--version")
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false);
    if !git_present {
        anyhow::bail!("couldn't find the git command in your path");
    }

    std::fs::create_dir_all(&opts.workspace)
        .with_context(|| format!("creating workspace {}", opts.workspace.display()))?;
    git::ensure_repo(&opts.workspace).await.map_err(|e| anyhow::anyhow!("{e}"))?;

    let hub = Hub::new();
    let store = Arc::new(StatusStore::new(hub.clone()));
    let opts = Arc::new(opts);

    if opts.web_enabled {
        let web_opts = Arc::clone(&opts);
        let web_store = Arc::clone(&store);
        tokio::spawn(async move {
            if let Err(e) = web::serve(web_opts, web_store, hub).await {
                error!("web server failed: {e:#}");
            }
        });
    }

    scheduler::run_collectors(opts, store).await
}

fn init_logging(opts: &Options) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    // The syslog flag selects machine-readable output for the collector;
    // routing stderr into the system log is the service manager's job.
    let result = if opts.use_syslog { builder.json().try_init() } else { builder.try_init() };
    if let Err(e) = result {
        eprintln!("logging init failed: {e}");
    }
}
