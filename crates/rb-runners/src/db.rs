// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `db`: documented contract for a query runner (§4.8). Real drivers are
//! out of scope; a caller wires up its own [`DbBackend`] or relies on the
//! test-only fake.

use async_trait::async_trait;
use rb_core::StoreValue;

use crate::{Runner, RunnerError, StepContext};

/// A pluggable query executor. No implementation ships in this crate.
#[async_trait]
pub trait DbBackend: Send + Sync {
    async fn query(&self, payload: &serde_json::Value) -> Result<StoreValue, String>;
}

/// Runs a query payload against a registered [`DbBackend`].
pub struct DbRunner {
    target: Option<String>,
    backend: Option<Box<dyn DbBackend>>,
}

impl DbRunner {
    pub fn new() -> Self {
        Self {
            target: None,
            backend: None,
        }
    }

    pub fn with_backend(dsn: impl Into<String>, backend: Box<dyn DbBackend>) -> Self {
        Self {
            target: Some(dsn.into()),
            backend: Some(backend),
        }
    }
}

impl Default for DbRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Runner for DbRunner {
    async fn run(&self, ctx: &mut StepContext) -> Result<(), RunnerError> {
        let backend = self.backend.as_ref().ok_or_else(|| RunnerError::Db {
            step: ctx.step_name.clone(),
            cause: "no db backend configured".to_string(),
        })?;
        let value = backend
            .query(&ctx.payload)
            .await
            .map_err(|cause| RunnerError::Db {
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
#[path = "db_tests.rs"]
mod tests;
