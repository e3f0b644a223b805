// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Injectable time source.
//!
//! Elapsed times recorded on `StepResult`/`RunResult` and the `interval`
//! sleeps between steps go through this trait so tests can run loop and
//! interval semantics without real wall-clock waits.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;

    /// Sleep for `d`. Real clocks await `tokio::time::sleep`; fake clocks
    /// advance their internal instant without actually blocking.
    fn sleep(&self, d: Duration) -> impl std::future::Future<Output = ()> + Send + '_;
}

#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, d: Duration) {
        tokio::time::sleep(d).await;
    }
}

/// Deterministic clock for tests: `now()` is a fixed point that advances
/// only when `sleep` is called, and `sleep` never actually blocks.
#[derive(Debug, Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<Instant>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Instant::now())),
        }
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        let mut guard = self.inner.lock();
        *guard += d;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.inner.lock()
    }

    async fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}
