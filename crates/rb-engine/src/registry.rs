// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps a step's chosen [`RunnerKind`] to a registered [`Runner`] (§9
//! design note "Dynamic runner dispatch"). `include` is not resolved
//! here — the operator special-cases it before consulting the registry.

use rb_runbook::RunnerKind;
use rb_runners::Runner;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

type SharedRunner = Arc<AsyncMutex<Box<dyn Runner>>>;

#[derive(Default, Clone)]
pub struct RunnerRegistry {
    named: HashMap<String, SharedRunner>,
    generic: Option<SharedRunner>,
}

impl RunnerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, runner: Box<dyn Runner>) {
        self.named
            .insert(name.into(), Arc::new(AsyncMutex::new(runner)));
    }

    /// Registers the fallback `runnerRunner` consulted when a step's key
    /// matches none of the named runners.
    pub fn register_generic(&mut self, runner: Box<dyn Runner>) {
        self.generic = Some(Arc::new(AsyncMutex::new(runner)));
    }

    pub fn resolve(&self, kind: &RunnerKind) -> Option<SharedRunner> {
        self.named
            .get(kind.label())
            .cloned()
            .or_else(|| self.generic.clone())
    }

    /// Closes every registered runner. Non-force closes skip runners whose
    /// target/dsn is empty (test-scaffolding injected runners); `force`
    /// bypasses that check and closes regardless.
    pub async fn close_all(&self, force: bool) {
        for runner in self.named.values() {
            let mut guard = runner.lock().await;
            if force || !guard.target_is_empty() {
                let _ = guard.close().await;
            }
        }
        if let Some(generic) = &self.generic {
            let mut guard = generic.lock().await;
            if force || !guard.target_is_empty() {
                let _ = guard.close().await;
            }
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
