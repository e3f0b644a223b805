// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ssh`: documented contract for a remote-command runner (§4.8). Real
//! transport is out of scope; a caller wires up its own [`SshBackend`].

use async_trait::async_trait;
use rb_core::StoreValue;

use crate::{Runner, RunnerError, StepContext};

#[async_trait]
pub trait SshBackend: Send + Sync {
    async fn exec(&self, payload: &serde_json::Value) -> Result<StoreValue, String>;
}

pub struct SshRunner {
    target: Option<String>,
    backend: Option<Box<dyn SshBackend>>,
}

impl SshRunner {
    pub fn new() -> Self {
        Self {
            target: None,
            backend: None,
        }
    }

    pub fn with_backend(target: impl Into<String>, backend: Box<dyn SshBackend>) -> Self {
        Self {
            target: Some(target.into()),
            backend: Some(backend),
        }
    }
}

impl Default for SshRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Runner for SshRunner {
    async fn run(&self, ctx: &mut StepContext) -> Result<(), RunnerError> {
        let backend = self.backend.as_ref().ok_or_else(|| RunnerError::Ssh {
            step: ctx.step_name.clone(),
            cause: "no ssh backend configured".to_string(),
        })?;
        let value = backend
            .exec(&ctx.payload)
            .await
            .map_err(|cause| RunnerError::Ssh {
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
#[path = "ssh_tests.rs"]
mod tests;
