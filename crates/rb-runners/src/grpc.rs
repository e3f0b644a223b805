// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `grpc`: documented contract for a gRPC request runner (§4.8). Real
//! transport is out of scope; a caller wires up its own [`GrpcBackend`].

use async_trait::async_trait;
use rb_core::StoreValue;

use crate::{Runner, RunnerError, StepContext};

#[async_trait]
pub trait GrpcBackend: Send + Sync {
    async fn call(&self, payload: &serde_json::Value) -> Result<StoreValue, String>;
}

pub struct GrpcRunner {
    target: Option<String>,
    backend: Option<Box<dyn GrpcBackend>>,
}

impl GrpcRunner {
    pub fn new() -> Self {
        Self {
            target: None,
            backend: None,
        }
    }

    pub fn with_backend(target: impl Into<String>, backend: Box<dyn GrpcBackend>) -> Self {
        Self {
            target: Some(target.into()),
            backend: Some(backend),
        }
    }
}

impl Default for GrpcRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Runner for GrpcRunner {
    async fn run(&self, ctx: &mut StepContext) -> Result<(), RunnerError> {
        let backend = self.backend.as_ref().ok_or_else(|| RunnerError::Grpc {
            step: ctx.step_name.clone(),
            cause: "no gRPC backend configured".to_string(),
        })?;
        let value = backend
            .call(&ctx.payload)
            .await
            .map_err(|cause| RunnerError::Grpc {
                step: ctx.step_name.clone(),
                cause,
            })?;
        ctx.set_result(value);
        Ok(())
    }

    fn target_is_empty(&self) -> bool {
        self.target.is_none()
    }
}

#[cfg(test)]
#[path = "grpc_tests.rs"]
mod tests;
