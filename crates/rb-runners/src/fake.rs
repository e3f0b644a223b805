// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test-only fakes (gated the same way as the teacher's adapter fakes):
//! a canned [`Runner`] for engine-level tests that don't care which kind
//! of runner executes, plus one backend fake per documented contract.

use async_trait::async_trait;
use parking_lot::Mutex;
use rb_core::StoreValue;
use std::sync::Arc;

use crate::cdp::CdpBackend;
use crate::db::DbBackend;
use crate::grpc::GrpcBackend;
use crate::ssh::SshBackend;
use crate::{Runner, RunnerError, StepContext};

/// Records every payload it was asked to run and returns a preconfigured
/// result (or error) each time.
pub struct FakeRunner {
    result: StoreValue,
    calls: Arc<Mutex<Vec<serde_json::Value>>>,
    fail_with: Option<String>,
}

impl FakeRunner {
    pub fn succeeding(result: StoreValue) -> Self {
        Self {
            result,
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(cause: impl Into<String>) -> Self {
        Self {
            result: StoreValue::Null,
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(cause.into()),
        }
    }

    pub fn calls(&self) -> Vec<serde_json::Value> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Runner for FakeRunner {
    async fn run(&self, ctx: &mut StepContext) -> Result<(), RunnerError> {
        self.calls.lock().push(ctx.payload.clone());
        if let Some(cause) = &self.fail_with {
            return Err(RunnerError::Definition {
                step: ctx.step_name.clone(),
                cause: cause.clone(),
            });
        }
        ctx.set_result(self.result.clone());
        Ok(())
    }

    fn target_is_empty(&self) -> bool {
        true
    }
}

pub struct FakeDbBackend(pub StoreValue);

#[async_trait]
impl DbBackend for FakeDbBackend {
    async fn query(&self, _payload: &serde_json::Value) -> Result<StoreValue, String> {
        Ok(self.0.clone())
    }
}

pub struct FakeGrpcBackend(pub StoreValue);

#[async_trait]
impl GrpcBackend for FakeGrpcBackend {
    async fn call(&self, _payload: &serde_json::Value) -> Result<StoreValue, String> {
        Ok(self.0.clone())
    }
}

pub struct FakeCdpBackend(pub StoreValue);

#[async_trait]
impl CdpBackend for FakeCdpBackend {
    async fn act(&self, _payload: &serde_json::Value) -> Result<StoreValue, String> {
        Ok(self.0.clone())
    }
}

pub struct FakeSshBackend(pub StoreValue);

#[async_trait]
impl SshBackend for FakeSshBackend {
    async fn exec(&self, _payload: &serde_json::Value) -> Result<StoreValue, String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
