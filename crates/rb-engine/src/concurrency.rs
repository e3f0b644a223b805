// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The planner's concurrency group (§4.4 Scheduling, §5): a global
//! `concmax` slot limiter plus tag-based mutual exclusion so at most one
//! operator holding a given `concurrency:` tag runs at a time.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, Semaphore};
use tracing::Instrument;

pub struct ConcurrencyGroup {
    concmax: Arc<Semaphore>,
    tag_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ConcurrencyGroup {
    pub fn new(concmax: usize) -> Self {
        Self {
            concmax: Arc::new(Semaphore::new(concmax.max(1))),
            tag_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquires a global slot plus every tag lock `tags` names (tags are
    /// sorted first so two operators that share two-or-more tags always
    /// acquire them in the same order and cannot deadlock), runs `f`,
    /// then releases both in reverse order.
    pub async fn run<F, Fut, T>(&self, tags: &[String], f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _permit = self
            .concmax
            .acquire()
            .await
            .expect("concurrency semaphore is never closed");

        let mut sorted_tags = tags.to_vec();
        sorted_tags.sort();

        let locks: Vec<Arc<AsyncMutex<()>>> = {
            let mut map = self.tag_locks.lock();
            sorted_tags
                .iter()
                .map(|tag| map.entry(tag.clone()).or_default().clone())
                .collect()
        };

        let mut guards: Vec<OwnedMutexGuard<()>> = Vec::with_capacity(locks.len());
        for lock in locks {
            guards.push(lock.lock_owned().await);
        }

        let span = tracing::info_span!("schedule", concurrency_tags = %sorted_tags.join(","));
        let result = f().instrument(span).await;
        drop(guards);
        result
    }
}

#[cfg(test)]
#[path = "concurrency_tests.rs"]
mod tests;
