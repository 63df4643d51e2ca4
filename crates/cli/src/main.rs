// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;

use sweet::config::Config;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    if let Err(e) = sweet::run::run(config).await {
        // Logging may not be up yet if the configuration failed to load.
        eprintln!("fatal: {e:#}");
        std::process::exit(1);
    }
}
