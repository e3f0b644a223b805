// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Runner` trait every step body implements (§6).

use async_trait::async_trait;
use indexmap::IndexMap;
use rb_core::StoreValue;

use crate::RunnerError;

/// Carries a step's already-template-expanded payload in, and the
/// runner's recorded outcome plus any cookie-jar updates out.
#[derive(Debug, Default)]
pub struct StepContext {
    pub step_name: String,
    pub payload: serde_json::Value,
    result: Option<StoreValue>,
    cookies: IndexMap<String, StoreValue>,
}

impl StepContext {
    pub fn new(step_name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            step_name: step_name.into(),
            payload,
            result: None,
            cookies: IndexMap::new(),
        }
    }

    pub fn set_result(&mut self, value: StoreValue) {
        self.result = Some(value);
    }

    pub fn take_result(&mut self) -> Option<StoreValue> {
        self.result.take()
    }

    pub fn set_cookie(&mut self, name: impl Into<String>, value: StoreValue) {
        self.cookies.insert(name.into(), value);
    }

    pub fn take_cookies(&mut self) -> IndexMap<String, StoreValue> {
        std::mem::take(&mut self.cookies)
    }
}

/// A runner executes one step's payload against an external system (or,
/// for the minimal implementations here, a stand-in for one) and records
/// its outcome on the context.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, ctx: &mut StepContext) -> Result<(), RunnerError>;

    /// Reinitialize between loop iterations or after a host-rule change.
    /// Most runners have nothing to renew.
    async fn renew(&mut self) -> Result<(), RunnerError> {
        Ok(())
    }

    /// Release held resources (connections, sessions). Best-effort: the
    /// caller swallows errors (§5 Close semantics).
    async fn close(&mut self) -> Result<(), RunnerError> {
        Ok(())
    }

    /// True when this runner was constructed with no target/dsn — test
    /// scaffolding that must not be closed alongside real runners.
    fn target_is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
