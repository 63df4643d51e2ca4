// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative "expect" combinators over a session's receive channel.
//!
//! Sentinels are literal substrings (usually a prompt character such as
//! `#` or `>`), never patterns — vendor prompts are sensitive to extra
//! matching, so no regex engine is involved. All operations consume the
//! stream strictly in order and suspend only while waiting for a chunk
//! or a timer.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;

/// Failure modes of an expect operation.
#[derive(Debug)]
pub enum ExpectError {
    /// The receive channel closed before the sentinel appeared.
    Closed,
    /// The deadline expired. `partial` is everything accumulated so far;
    /// callers that can live without a trailing sentinel (JunOS output
    /// has none) may accept it.
    Timeout { partial: String },
}

impl fmt::Display for ExpectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("connection closed unexpectedly"),
            Self::Timeout { .. } => f.write_str("connection timeout"),
        }
    }
}

impl std::error::Error for ExpectError {}

/// Drain chunks until the accumulated buffer contains `sentinel`.
pub async fn discard_until(
    receive: &mut mpsc::Receiver<String>,
    sentinel: &str,
) -> Result<(), ExpectError> {
    save_until(receive, sentinel).await.map(|_| ())
}

/// Drain chunks until the accumulated buffer contains `sentinel`; return
/// the buffer truncated at the first occurrence (the sentinel itself and
/// anything after it in the same chunk are discarded).
pub async fn save_until(
    receive: &mut mpsc::Receiver<String>,
    sentinel: &str,
) -> Result<String, ExpectError> {
    let mut all = String::new();
    loop {
        if let Some(at) = all.find(sentinel) {
            all.truncate(at);
            return Ok(all);
        }
        match receive.recv().await {
            Some(chunk) => all.push_str(&chunk),
            None => return Err(ExpectError::Closed),
        }
    }
}

/// Drain chunks until the buffer contains any one of `sentinels`; return
/// the sentinel that matched. When a single chunk completes more than one
/// sentinel, the earliest in the supplied list wins.
pub async fn multi_until(
    receive: &mut mpsc::Receiver<String>,
    sentinels: &[&str],
) -> Result<String, ExpectError> {
    let mut all = String::new();
    loop {
        for sentinel in sentinels {
            if all.contains(sentinel) {
                return Ok((*sentinel).to_owned());
            }
        }
        match receive.recv().await {
            Some(chunk) => all.push_str(&chunk),
            None => return Err(ExpectError::Closed),
        }
    }
}

/// Like [`save_until`], but bounded by a deadline of `timeout` from the
/// call start. On expiry the call fails with [`ExpectError::Timeout`]
/// carrying whatever accumulated; chunks that have not arrived by the
/// deadline are never included.
pub async fn save_until_timeout(
    receive: &mut mpsc::Receiver<String>,
    sentinel: &str,
    timeout: Duration,
) -> Result<String, ExpectError> {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut all = String::new();
    loop {
        if let Some(at) = all.find(sentinel) {
            all.truncate(at);
            return Ok(all);
        }
        tokio::select! {
            chunk = receive.recv() => match chunk {
                Some(chunk) => all.push_str(&chunk),
                None => return Err(ExpectError::Closed),
            },
            _ = tokio::time::sleep_until(deadline) => {
                return Err(ExpectError::Timeout { partial: all });
            }
        }
    }
}

#[cfg(test)]
#[path = "expect_tests.rs"]
mod tests;
