// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status broadcast bus.
//!
//! A single hub task owns the subscriber set and services register,
//! unregister, and broadcast inputs. Fan-out is non-blocking: a
//! subscriber whose buffer is full is evicted, never waited on, so
//! collectors are never delayed by dashboard clients. An evicted or
//! departed subscriber's channel is dropped immediately — the set never
//! holds a closed sender.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::status::DeviceStatus;
use crate::util::device_id;

/// Outbound buffer per subscriber; overflow means eviction.
const SUBSCRIBER_BUFFER: usize = 256;

/// One JSON message on the dashboard wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub message_type: &'static str,
    /// Dashboard id (hostname with `.` removed); empty for metrics.
    pub device: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BTreeMap<String, String>>,
}

impl Event {
    pub fn device(status: &DeviceStatus) -> Self {
        Self {
            message_type: "device",
            device: device_id(&status.device.hostname),
            status: Some(status.clone()),
            metrics: None,
        }
    }

    pub fn metric(metrics: BTreeMap<String, String>) -> Self {
        Self { message_type: "metric", device: String::new(), status: None, metrics: Some(metrics) }
    }
}

enum HubInput {
    Register { id: u64, tx: mpsc::Sender<Event> },
    Unregister(u64),
    Broadcast(Event),
}

/// A live subscription; dropping the receiver gets the subscriber evicted
/// on its next missed event, but polite clients call `unsubscribe`.
pub struct Subscription {
    pub id: u64,
    pub events: mpsc::Receiver<Event>,
}

/// Cloneable handle to the hub task.
#[derive(Clone)]
pub struct Hub {
    input: mpsc::UnboundedSender<HubInput>,
    next_id: Arc<AtomicU64>,
}

impl Hub {
    /// Spawn the hub task. It runs until every handle is dropped.
    pub fn new() -> Self {
        let (input, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx));
        Self { input, next_id: Arc::new(AtomicU64::new(1)) }
    }

    pub fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let _ = self.input.send(HubInput::Register { id, tx });
        Subscription { id, events: rx }
    }

    pub fn unsubscribe(&self, id: u64) {
        let _ = self.input.send(HubInput::Unregister(id));
    }

    pub fn broadcast(&self, event: Event) {
        let _ = self.input.send(HubInput::Broadcast(event));
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

async fn run(mut input: mpsc::UnboundedReceiver<HubInput>) {
    let mut subscribers: HashMap<u64, mpsc::Sender<Event>> = HashMap::new();
    while let Some(msg) = input.recv().await {
        match msg {
            HubInput::Register { id, tx } => {
                subscribers.insert(id, tx);
            }
            HubInput::Unregister(id) => {
                subscribers.remove(&id);
            }
            HubInput::Broadcast(event) => {
                subscribers.retain(|id, tx| match tx.try_send(event.clone()) {
                    Ok(()) => true,
                    Err(_full_or_gone) => {
                        debug!(subscriber = *id, "evicting slow or departed subscriber");
                        false
                    }
                });
            }
        }
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
