// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interactive SSH session driver.
//!
//! One pump task owns the PTY and the child: it forwards output chunks to
//! the receive channel and drains the send channel into the PTY. Dropping
//! the [`Session`] closes the send channel, which ends the pump; the pump
//! then drops the PTY, killing and reaping the child exactly once. Any
//! expect call still waiting observes a closed receive channel.

use nix::libc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::DeviceConfig;
use crate::error::CollectError;
use crate::pty::{read_chunk, write_all, Pty};

/// Output chunk size; chunks may span line boundaries and may include
/// terminal control bytes.
const CHUNK_SIZE: usize = 1024;

/// Channel depth between the pump and the adapter.
const CHANNEL_DEPTH: usize = 64;

/// An interactive session with a device, exposed as a pair of text
/// channels. Adapters write commands to `send` (terminated with `\n`)
/// and consume prompt/output chunks from `receive`.
pub struct Session {
    pub send: mpsc::Sender<String>,
    pub receive: mpsc::Receiver<String>,
}

impl Session {
    /// Open an SSH session to the device under a fresh PTY.
    pub fn open(device: &DeviceConfig) -> Result<Self, CollectError> {
        let user = device.opt("user").unwrap_or_default();
        let mut argv = vec!["ssh".to_owned()];
        if device.insecure() {
            argv.push("-oStrictHostKeyChecking=no".to_owned());
        }
        argv.push(format!("{user}@{}", device.target));

        Self::spawn(&argv).map_err(|e| CollectError::ConnectionOpenFailed {
            target: device.target.clone(),
            detail: format!("{e:#}"),
        })
    }

    /// Spawn `argv` under a PTY and wire it to a fresh channel pair.
    fn spawn(argv: &[String]) -> anyhow::Result<Self> {
        let pty = Pty::spawn(argv)?;
        let (send_tx, send_rx) = mpsc::channel(CHANNEL_DEPTH);
        let (receive_tx, receive_rx) = mpsc::channel(CHANNEL_DEPTH);
        tokio::spawn(pump(pty, receive_tx, send_rx));
        Ok(Self { send: send_tx, receive: receive_rx })
    }

    /// Build a session from bare channel halves, with no child process
    /// behind it. Used to script device responses in adapter tests.
    pub fn scripted(send: mpsc::Sender<String>, receive: mpsc::Receiver<String>) -> Self {
        Self { send, receive }
    }
}

/// Shuttle bytes between the PTY and the session channels until either
/// side goes away. Owns the PTY, so child teardown happens here.
async fn pump(pty: Pty, receive_tx: mpsc::Sender<String>, mut send_rx: mpsc::Receiver<String>) {
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        tokio::select! {
            result = read_chunk(pty.master(), &mut buf) => match result {
                Ok(0) => break,
                Ok(n) => {
                    if receive_tx.send(decode_chunk(&buf[..n])).await.is_err() {
                        break;
                    }
                }
                // Linux PTYs report EIO once the child side is gone.
                Err(e) if e.raw_os_error() == Some(libc::EIO) => break,
                Err(e) => {
                    debug!(pid = pty.child_pid().as_raw(), "session read failed: {e}");
                    break;
                }
            },
            command = send_rx.recv() => match command {
                Some(command) => {
                    if let Err(e) = write_all(pty.master(), command.as_bytes()).await {
                        debug!(pid = pty.child_pid().as_raw(), "session write failed: {e}");
                        break;
                    }
                }
                // Session handle dropped: tear the child down.
                None => break,
            },
        }
    }
}

/// NUL bytes are stripped; everything else passes through lossily.
fn decode_chunk(chunk: &[u8]) -> String {
    let cleaned: Vec<u8> = chunk.iter().copied().filter(|&b| b != 0).collect();
    String::from_utf8_lossy(&cleaned).into_owned()
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
