// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-method collection drivers.
//!
//! Each driver is a straight-line state machine over a [`Session`]: send a
//! command, expect a prompt, repeat. The protocols are short and the error
//! messages differ meaningfully between steps, so no table-driven
//! machinery — just the shared send-then-expect helpers below.

pub mod cisco;
pub mod external;
pub mod junos;

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::DeviceConfig;
use crate::error::CollectError;
use crate::expect;
use crate::session::Session;

/// Named text artifacts scraped from one device (`config`, `version`, ...).
pub type Artifacts = BTreeMap<String, String>;

/// Run the device's collection driver and return its artifacts.
///
/// `cisco` and `junos` open an interactive SSH session; `external` runs
/// the configured script and needs no session at all.
pub async fn collect(
    device: &DeviceConfig,
    launch_dir: &Path,
) -> Result<Artifacts, CollectError> {
    match device.method.as_str() {
        "cisco" => {
            let mut session = Session::open(device)?;
            cisco::collect(device, &mut session).await
        }
        "junos" => {
            let mut session = Session::open(device)?;
            junos::collect(device, &mut session).await
        }
        "external" => external::collect(device, launch_dir).await,
        other => Err(CollectError::Protocol(format!("unknown access method: {other}"))),
    }
}

/// Write a raw payload to the session (passwords, pre-terminated lines).
pub(crate) async fn send(session: &Session, payload: String) -> Result<(), CollectError> {
    session.send.send(payload).await.map_err(|_| CollectError::ConnectionClosed)
}

/// Send `command` and wait for `prompt`; failures are annotated with the
/// command so the operator can see which step of the login dance broke.
pub(crate) async fn run_step(
    session: &mut Session,
    command: &str,
    prompt: &str,
) -> Result<(), CollectError> {
    send(session, format!("{command}\n")).await?;
    expect::discard_until(&mut session.receive, prompt)
        .await
        .map_err(|e| CollectError::at_step(command, e))
}
