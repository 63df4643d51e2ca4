// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collection driver for Juniper JunOS devices.

use tracing::debug;

use crate::config::DeviceConfig;
use crate::error::CollectError;
use crate::expect::{self, ExpectError};
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

    let matched = expect::multi_until(&mut session.receive, &[">", PASSWORD_PROMPT]).await?;
    if matched == PASSWORD_PROMPT {
        return Err(CollectError::AuthFailed("Bad username or password".to_owned()));
    }

    run_step(session, "set cli screen-length 0", ">").await?;

    send(session, "show configuration\n".to_owned()).await?;
    // JunOS config listings end without a clean prompt sentinel; ride the
    // read deadline out and take whatever arrived.
    let config =
        match expect::save_until_timeout(&mut session.receive, "#\n", device.command_timeout)
            .await
        {
            Ok(text) => text,
            Err(ExpectError::Timeout { partial }) => {
                debug!(host = %device.hostname, "accepting partial configuration at deadline");
                partial
            }
            Err(e @ ExpectError::Closed) => return Err(e.into()),
        };

    send(session, "exit\n".to_owned()).await?;

    let mut artifacts = Artifacts::new();
    artifacts.insert("config".to_owned(), config);
    Ok(artifacts)
}

#[cfg(test)]
#[path = "junos_tests.rs"]
mod tests;
