// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collection driver for Cisco IOS-family and ASA devices.
//!
//! The `assword:` sentinel deliberately drops the first character to
//! tolerate both `Password:` and `password:` prompts.

use tracing::debug;

use crate::config::DeviceConfig;
use crate::error::CollectError;
use crate::expect;
use crate::session::Session;

use super::{run_step, send, Artifacts};

const PASSWORD_PROMPT: &str = "assword:";

pub async fn collect(
    device: &DeviceConfig,
    session: &mut Session,
) -> Result<Artifacts, CollectError> {
    let pass = device.opt("pass").unwrap_or_default().to_owned();

    expect::discard_until(&mut session.receive, PASSWORD_PROMPT)
        .await
        .map_err(|e| CollectError::at_step("login", e))?;
    send(session, format!("{pass}\n")).await?;

    let matched =
        expect::multi_until(&mut session.receive, &["#", ">", PASSWORD_PROMPT]).await?;
    match matched.as_str() {
        PASSWORD_PROMPT => {
            return Err(CollectError::AuthFailed("Bad username or password".to_owned()));
        }
        ">" => {
            // Unprivileged shell: escalate before scraping.
            debug!(host = %device.hostname, "entering enable mode");
            let enable = device.opt("enable").or(device.opt("pass")).unwrap_or_default();
            send(session, "enable\n".to_owned()).await?;
            expect::discard_until(&mut session.receive, PASSWORD_PROMPT)
                .await
                .map_err(|_| enable_failed())?;
            send(session, format!("{enable}\n")).await?;
            expect::discard_until(&mut session.receive, "#")
                .await
                .map_err(|_| enable_failed())?;
        }
        _ => {} // already privileged
    }

    // IOS and ASA spell pagination-off differently; issue both.
    run_step(session, "terminal length 0", "#").await?;
    run_step(session, "terminal pager 0", "#").await?;

    let mut artifacts = Artifacts::new();

    send(session, "show running-config\n".to_owned()).await?;
    let raw = expect::save_until_timeout(&mut session.receive, "#", device.command_timeout)
        .await
        .map_err(|e| CollectError::at_step("show running-config", e))?;
    artifacts.insert("config".to_owned(), trim_capture(&raw, "show running-config"));

    send(session, "show version\n".to_owned()).await?;
    let raw = expect::save_until_timeout(&mut session.receive, "#", device.command_timeout)
        .await
        .map_err(|e| CollectError::at_step("show version", e))?;
    artifacts.insert("version".to_owned(), trim_capture(&raw, "show version"));

    send(session, "exit\n".to_owned()).await?;

    Ok(artifacts)
}

fn enable_failed() -> CollectError {
    CollectError::AuthFailed("Bad enable password".to_owned())
}

/// Drop the echoed command and the ASA `Building configuration...` banner
/// from the head of captured output.
fn trim_capture(raw: &str, command: &str) -> String {
    let mut kept = Vec::new();
    let mut head = true;
    for line in raw.lines() {
        if head {
            let t = line.trim();
            if t.is_empty() || t == command || t == "Building configuration..." {
                continue;
            }
            head = false;
        }
        kept.push(line);
    }
    kept.join("\n")
}

#[cfg(test)]
#[path = "cisco_tests.rs"]
mod tests;
