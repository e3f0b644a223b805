// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cdp`: documented contract for a Chrome DevTools Protocol action runner
//! (§4.8). Real browser automation is out of scope; a caller wires up its
//! own [`CdpBackend`].

use async_trait::async_trait;
use rb_core::StoreValue;

use crate::{Runner, RunnerError, StepContext};

#[async_trait]
pub trait CdpBackend: Send + Sync {
    async fn act(&self, payload: &serde_json::Value) -> Result<StoreValue, String>;
}

pub struct CdpRunner {
    target: Option<String>,
    backend: Option<Box<dyn CdpBackend>>,
}

impl CdpRunner {
    pub fn new() -> Self {
        Self {
            target: None,
            backend: None,
        }
    }

    pub fn with_backend(target: impl Into<String>, backend: Box<dyn CdpBackend>) -> Self {
        Self {
            target: Some(target.into()),
            backend: Some(backend),
        }
    }
}

impl Default for CdpRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Runner for CdpRunner {
    async fn run(&self, ctx: &mut StepContext) -> Result<(), RunnerError> {
        let backend = self.backend.as_ref().ok_or_else(|| RunnerError::Cdp {
            step: ctx.step_name.clone(),
            cause: "no cdp backend configured".to_string(),
        })?;
        let value = backend
            .act(&ctx.payload)
            .await
            .map_err(|cause| RunnerError::Cdp {
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
#[path = "cdp_tests.rs"]
mod tests;
