// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use tokio::sync::mpsc;

use super::{discard_until, multi_until, save_until, save_until_timeout, ExpectError};

fn scripted(chunks: &[&str]) -> (mpsc::Sender<String>, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(chunks.len().max(1));
    for chunk in chunks {
        // Capacity covers every chunk, so try_send never fails here.
        let _ = tx.try_send((*chunk).to_owned());
    }
    (tx, rx)
}

#[tokio::test]
async fn save_until_truncates_at_first_sentinel() -> anyhow::Result<()> {
    let (_tx, mut rx) = scripted(&["testString1\n", "testString2\n", "testString3\n"]);
    let saved = save_until(&mut rx, "2").await?;
    assert_eq!(saved, "testString1\ntestString");
    // The third chunk was never consumed.
    assert_eq!(rx.recv().await.as_deref(), Some("testString3\n"));
    Ok(())
}

#[tokio::test]
async fn discard_until_stops_at_sentinel() -> anyhow::Result<()> {
    let (_tx, mut rx) = scripted(&["testString1\n", "testString2\n", "testString3\n"]);
    discard_until(&mut rx, "2").await?;
    assert_eq!(rx.recv().await.as_deref(), Some("testString3\n"));
    Ok(())
}

#[tokio::test]
async fn multi_until_returns_first_match_in_list_order() -> anyhow::Result<()> {
    let (_tx, mut rx) = scripted(&["testString1\n", "testString2\n", "testString3\n"]);
    let matched = multi_until(&mut rx, &["2", "Z", "3"]).await?;
    assert_eq!(matched, "2");
    Ok(())
}

#[tokio::test]
async fn multi_until_tie_in_one_chunk_breaks_by_list_order() -> anyhow::Result<()> {
    let (_tx, mut rx) = scripted(&["foo3bar2baz\n"]);
    // Both sentinels complete in the same chunk; list order decides.
    let matched = multi_until(&mut rx, &["2", "3"]).await?;
    assert_eq!(matched, "2");
    Ok(())
}

#[tokio::test]
async fn save_until_reports_closed_channel() {
    let (tx, mut rx) = mpsc::channel::<String>(1);
    drop(tx);
    match save_until(&mut rx, "#").await {
        Err(ExpectError::Closed) => {}
        other => unreachable!("expected Closed, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn save_until_timeout_keeps_partial_and_drops_late_chunks() {
    let timeout = Duration::from_millis(100);
    let (tx, mut rx) = mpsc::channel::<String>(4);

    tokio::spawn(async move {
        let _ = tx.send("a\n".to_owned()).await;
        tokio::time::sleep(timeout - Duration::from_millis(1)).await;
        let _ = tx.send("b\n".to_owned()).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        let _ = tx.send("c\n".to_owned()).await;
    });

    match save_until_timeout(&mut rx, "#", timeout).await {
        Err(ExpectError::Timeout { partial }) => assert_eq!(partial, "a\nb\n"),
        other => unreachable!("expected Timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn save_until_timeout_truncates_when_sentinel_arrives_in_time() -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel::<String>(4);
    tokio::spawn(async move {
        let _ = tx.send("interface eth0\n".to_owned()).await;
        let _ = tx.send("!\nrouter# ".to_owned()).await;
    });

    let saved = save_until_timeout(&mut rx, "#", Duration::from_secs(5)).await?;
    assert_eq!(saved, "interface eth0\n!\nrouter");
    Ok(())
}
