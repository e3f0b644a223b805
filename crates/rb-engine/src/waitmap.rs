// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `WaitMap`: single-producer/multi-consumer rendezvous keyed by runbook
//! path (§4.4). `chan(key)` blocks until `set(key, v)` is called, or
//! returns immediately if it already was.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

struct Slot<V> {
    value: Option<V>,
    notify: Arc<Notify>,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            value: None,
            notify: Arc::new(Notify::new()),
        }
    }
}

pub struct WaitMap<V> {
    slots: Mutex<HashMap<String, Slot<V>>>,
    closed: Mutex<bool>,
}

impl<V: Clone + Send + Sync> WaitMap<V> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            closed: Mutex::new(false),
        }
    }

    /// Store `v` under `key` and wake every current and future waiter.
    pub async fn set(&self, key: &str, v: V) {
        let mut slots = self.slots.lock().await;
        let slot = slots.entry(key.to_string()).or_default();
        slot.value = Some(v);
        slot.notify.notify_waiters();
    }

    /// Resolve once `set(key, ...)` is called (or immediately if it
    /// already was). Resolves to `None` if the map is closed first.
    pub async fn chan(&self, key: &str) -> Option<V> {
        loop {
            let mut slots = self.slots.lock().await;
            let slot = slots.entry(key.to_string()).or_default();
            if let Some(v) = &slot.value {
                return Some(v.clone());
            }
            // Register as a waiter while `slots` is still held, so a `set()`
            // racing this check (it needs the same lock) can never finish
            // between our "no value yet" check and our subscription.
            let notify = slot.notify.clone();
            let notified = notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            drop(slots);

            if *self.closed.lock().await {
                return None;
            }

            notified.await;

            let slots = self.slots.lock().await;
            if let Some(slot) = slots.get(key) {
                if let Some(v) = &slot.value {
                    return Some(v.clone());
                }
            }
            if *self.closed.lock().await {
                return None;
            }
        }
    }

    /// Wake every outstanding waiter without a value; must be called
    /// exactly once at `RunN` completion.
    pub async fn close(&self) {
        *self.closed.lock().await = true;
        let slots = self.slots.lock().await;
        for slot in slots.values() {
            slot.notify.notify_waiters();
        }
    }
}

impl<V: Clone + Send + Sync> Default for WaitMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "waitmap_tests.rs"]
mod tests;
