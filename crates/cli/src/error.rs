// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::io;

use crate::expect::ExpectError;

/// Errors raised while collecting from a single device or while running
/// the change pipeline. Adapters return these without the hostname; the
/// scheduler prefixes the device name when it builds the status message.
#[derive(Debug)]
pub enum CollectError {
    /// Spawning the SSH child (or its PTY) failed.
    ConnectionOpenFailed { target: String, detail: String },
    /// The peer closed the session before the expected output arrived.
    ConnectionClosed,
    /// A per-command read deadline or the whole-job timeout expired.
    Timeout,
    /// Login or enable escalation was rejected.
    AuthFailed(String),
    /// The device answered with something the adapter did not expect,
    /// or the device's access method tag is unknown.
    Protocol(String),
    /// An external collection script exited non-zero.
    ExternalScript(String),
    /// Writing artifacts to the workspace failed.
    Workspace(io::Error),
    /// A VCS invocation failed or returned an unexpected status line.
    Vcs(String),
    /// Bad or incomplete configuration.
    ConfigInvalid(String),
}

impl CollectError {
    /// Protocol error for a failed send-then-expect step, named by the
    /// command that was in flight.
    pub fn at_step(step: &str, source: ExpectError) -> Self {
        match source {
            ExpectError::Closed => Self::Protocol(format!("'{step}' failed: connection closed")),
            ExpectError::Timeout { .. } => Self::Protocol(format!("'{step}' failed: timed out")),
        }
    }
}

impl fmt::Display for CollectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionOpenFailed { target, detail } => {
                write!(f, "unable to connect to {target}: {detail}")
            }
            Self::ConnectionClosed => f.write_str("connection closed unexpectedly"),
            Self::Timeout => f.write_str("connection timeout"),
            Self::AuthFailed(msg) | Self::Protocol(msg) | Self::Vcs(msg) => f.write_str(msg),
            Self::ExternalScript(msg) => write!(f, "external collection script failed: {msg}"),
            Self::Workspace(e) => write!(f, "workspace write failed: {e}"),
            Self::ConfigInvalid(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Workspace(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ExpectError> for CollectError {
    fn from(e: ExpectError) -> Self {
        match e {
            ExpectError::Closed => Self::ConnectionClosed,
            ExpectError::Timeout { .. } => Self::Timeout,
        }
    }
}

impl From<io::Error> for CollectError {
    fn from(e: io::Error) -> Self {
        Self::Workspace(e)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
